//! # Merge Command Implementation
//!
//! This module implements the `merge` subcommand. It merges the mandatory
//! components, the named components and all of their dependencies, and prints
//! the compact document. `$var.`, `$components.` and `$datasources.` markers
//! are left as they are; use `create` for a resolved configuration.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::GlobalOptions;

/// Merge components without resolving placeholders
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Names of the components to merge.
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,

    /// Write the document to a file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the `merge` command.
pub fn execute(args: MergeArgs, global: &GlobalOptions) -> Result<()> {
    let configurator = global.configurator()?;
    let xml = configurator
        .merge(&args.names)
        .map_err(|e| super::explain(&configurator, e))?;
    super::emit(&xml, args.output.as_deref())
}
