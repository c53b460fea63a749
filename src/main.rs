//! # NXS Configuration CLI
//!
//! This is the binary entry point for the `nxsconfig` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Initialising logging from the `--log-level` flag.
//! - Dispatching to the command implementations and reporting their errors.
//!
//! The merge engine itself lives in the `nxsconfig` library crate; the
//! binary only reads fragments from a directory store and prints results.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
