//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, GlobalOptions};

/// NXS Configuration - Merge XML components into one configuration
#[derive(Parser, Debug)]
#[command(name = "nxsconfig")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge components and print the document with placeholders unresolved
    Merge(commands::merge::MergeArgs),

    /// Build the fully resolved configuration for a set of components
    Create(commands::create::CreateArgs),

    /// List registered components, datasources or mandatory components
    Ls(commands::ls::LsArgs),

    /// Show dependencies, variables and datasources of components
    Info(commands::info::InfoArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Merge(args) => commands::merge::execute(args, &self.global),
            Commands::Create(args) => commands::create::execute(args, &self.global),
            Commands::Ls(args) => commands::ls::execute(args, &self.global),
            Commands::Info(args) => commands::info::execute(args, &self.global),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `RUST_LOG` takes precedence over `--log-level` when set.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
