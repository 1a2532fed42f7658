//! # homesync CLI
//!
//! Binary entry point for the `homesync` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Translating library errors into user-friendly output and a non-zero
//!   exit status.
//!
//! The reconciliation logic lives in the `homesync` library crate; the
//! binary only sequences it and prints the reports.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
