//! # Create Command Implementation
//!
//! This module implements the `create` subcommand, which builds the fully
//! resolved configuration: variables substituted, component markers erased,
//! datasources inlined, the whole document merged again and pretty-printed.
//!
//! Variables and step datasources given on the command line are added to the
//! ones from the settings file; a `--var` overrides a settings variable of the
//! same name.

use anyhow::Result;
use clap::Args;
use log::debug;
use std::path::PathBuf;

use nxsconfig::suggestions;

use super::GlobalOptions;

/// Build a resolved configuration
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Names of the components to include.
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,

    /// Set a variable, as NAME=VALUE. May be repeated.
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Variables as a JSON object, applied before any --var.
    #[arg(long, value_name = "JSON")]
    pub vars_json: Option<String>,

    /// Switch INIT/FINAL strategies reading from this datasource to STEP.
    /// May be repeated.
    #[arg(long = "step-datasource", value_name = "NAME")]
    pub step_datasources: Vec<String>,

    /// Write the configuration to a file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

fn parse_var(argument: &str) -> Result<(String, String)> {
    match argument.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(suggestions::invalid_variable(argument)),
    }
}

/// Execute the `create` command.
pub fn execute(args: CreateArgs, global: &GlobalOptions) -> Result<()> {
    let mut configurator = global.configurator()?;

    let mut variables = configurator.variables().clone();
    if let Some(json) = &args.vars_json {
        configurator
            .set_variables_json(json)
            .map_err(|e| anyhow::anyhow!("Invalid --vars-json: {}", e))?;
        variables.extend(configurator.variables().clone());
    }
    for argument in &args.vars {
        let (name, value) = parse_var(argument)?;
        variables.insert(name, value);
    }
    debug!("Using {} variables", variables.len());
    configurator.set_variables(variables);

    let mut step_datasources = configurator.step_datasources().clone();
    step_datasources.extend(args.step_datasources.iter().cloned());
    configurator.set_step_datasources(step_datasources);

    if let Err(e) = configurator.create_configuration(&args.names) {
        return Err(super::explain(&configurator, e));
    }
    super::emit(
        configurator.xml_string().unwrap_or_default(),
        args.output.as_deref(),
    )
}
