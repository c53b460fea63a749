//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `nxsconfig` command-line tool, one file per subcommand.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct with the command-specific arguments, derived using
//!   `clap`.
//! - An `execute` function taking the parsed `Args` and the
//!   [`GlobalOptions`] shared by all commands.
//!
//! Commands build a [`Configurator`] over a [`DirectoryStore`] and call into
//! the `nxsconfig` library for the actual work.

pub mod completions;
pub mod create;
pub mod info;
pub mod ls;
pub mod merge;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use log::debug;

use nxsconfig::config::Settings;
use nxsconfig::configurator::Configurator;
use nxsconfig::defaults::DEFAULT_SETTINGS_FILENAME;
use nxsconfig::error::Error;
use nxsconfig::store::{DirectoryStore, FragmentStore};
use nxsconfig::suggestions;

/// Options accepted by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Directory holding `components/`, `datasources/` and `mandatory.txt`.
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        env = "NXSCONFIG_STORE",
        default_value = "."
    )]
    pub store: PathBuf,

    /// Settings file with variables, step datasources and rule overrides.
    ///
    /// Defaults to `nxsconfig.yaml` inside the store directory, when present.
    #[arg(long, global = true, value_name = "FILE", env = "NXSCONFIG_CONFIG")]
    pub config: Option<PathBuf>,
}

impl GlobalOptions {
    /// Loads the settings file, or the defaults when there is none.
    pub fn settings(&self) -> Result<Settings> {
        let path = match &self.config {
            Some(path) if !path.exists() => return Err(suggestions::settings_not_found(path)),
            Some(path) => path.clone(),
            None => {
                let default = self.store.join(DEFAULT_SETTINGS_FILENAME);
                if !default.is_file() {
                    return Ok(Settings::default());
                }
                default
            }
        };
        debug!("Loading settings from {}", path.display());
        Settings::from_file(&path).map_err(|e| {
            anyhow::anyhow!("Failed to load settings from {}: {}", path.display(), e)
        })
    }

    /// A configurator over the store directory with the settings applied.
    pub fn configurator(&self) -> Result<Configurator<DirectoryStore>> {
        if !self.store.is_dir() {
            return Err(suggestions::store_not_found(&self.store));
        }
        let settings = self.settings()?;
        Ok(Configurator::new(DirectoryStore::new(&self.store)).with_settings(&settings))
    }
}

/// Turns a library error into a CLI error with hints about registered names.
pub fn explain<S: FragmentStore>(configurator: &Configurator<S>, error: Error) -> anyhow::Error {
    let components = configurator.available_components().unwrap_or_default();
    let datasources = configurator.available_datasources().unwrap_or_default();
    suggestions::explain(error, &components, &datasources)
}

/// Writes `text` to `output`, or to stdout when no file is given.
pub fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;
            debug!("Wrote {} bytes to {}", text.len(), path.display());
        }
        None if text.is_empty() => {}
        None if text.ends_with('\n') => print!("{}", text),
        None => println!("{}", text),
    }
    Ok(())
}
