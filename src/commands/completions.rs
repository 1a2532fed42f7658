//! # Completions Command Implementation
//!
//! Prints a shell completion script generated by `clap_complete`:
//!
//! ```bash
//! homesync completions bash > ~/.local/share/bash-completion/completions/homesync
//! homesync completions zsh > ~/.zfunc/_homesync
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io::{self, Write};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn execute(args: CompletionsArgs) -> Result<()> {
    write_completions(args.shell, &mut io::stdout())
}

fn write_completions(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "homesync", out);
    Ok(())
}
