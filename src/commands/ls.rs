//! # Ls Command Implementation
//!
//! This module implements the `ls` subcommand, which lists what the store
//! holds: component names, datasource names, or the components added to
//! every request. Names are printed one per line.

use anyhow::Result;
use clap::{Args, ValueEnum};

use super::GlobalOptions;

/// List registered records
#[derive(Args, Debug)]
pub struct LsArgs {
    /// What to list.
    #[arg(value_enum, default_value = "components")]
    pub kind: ListKind,

    /// Show only the number of entries.
    #[arg(long)]
    pub count: bool,
}

/// Record lists `ls` can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ListKind {
    /// All registered components
    #[default]
    Components,
    /// All registered datasources
    Datasources,
    /// Components merged into every configuration
    Mandatory,
}

/// Execute the `ls` command.
pub fn execute(args: LsArgs, global: &GlobalOptions) -> Result<()> {
    let configurator = global.configurator()?;
    let names: Vec<String> = match args.kind {
        ListKind::Components => configurator.available_components()?.into_iter().collect(),
        ListKind::Datasources => configurator.available_datasources()?.into_iter().collect(),
        ListKind::Mandatory => configurator.mandatory_components()?,
    };

    if args.count {
        println!("{}", names.len());
        return Ok(());
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}
