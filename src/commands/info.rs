//! # Info Command Implementation
//!
//! This module implements the `info` subcommand, which reports what a set of
//! components pulls in without building a configuration:
//!
//! - **Components**: the requested names and their dependency closure.
//! - **Variables**: every `$var.` marker used across that closure.
//! - **Datasources**: the datasources the merged document reads from.
//!
//! This command is read-only.

use anyhow::Result;
use clap::Args;

use nxsconfig::discovery::DataSourceRef;
use nxsconfig::error::Error;

use super::GlobalOptions;

/// Show dependencies, variables and datasources of components
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Names of the components to inspect.
    #[arg(required = true, value_name = "NAME")]
    pub names: Vec<String>,
}

fn describe(reference: &DataSourceRef) -> String {
    if reference.is_from_db() {
        format!("{} (stored)", reference.name)
    } else if reference.kind.is_empty() {
        format!("{} (inline)", reference.name)
    } else {
        format!("{} (inline, {})", reference.name, reference.kind)
    }
}

/// Execute the `info` command.
pub fn execute(args: InfoArgs, global: &GlobalOptions) -> Result<()> {
    let configurator = global.configurator()?;
    let explain = |e: Error| super::explain(&configurator, e);

    let components = configurator.dependent_components(&args.names).map_err(explain)?;
    let variables = configurator.components_variables(&args.names).map_err(explain)?;
    let datasources = configurator.components_datasources(&args.names).map_err(explain)?;

    println!("Components: {}", components.len());
    for name in &components {
        println!("  • {}", name);
    }
    println!("\nVariables: {}", variables.len());
    for name in &variables {
        println!("  • {}", name);
    }
    println!("\nDatasources: {}", datasources.len());
    for reference in &datasources {
        println!("  • {}", describe(reference));
    }
    Ok(())
}
