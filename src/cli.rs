//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;

/// homesync - Reconcile a shared dotfiles repository with this machine
#[derive(Parser, Debug)]
#[command(name = "homesync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    settings: Settings,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

/// Locations and identity shared by every command.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Dotfiles repository root
    #[arg(long, global = true, value_name = "DIR", env = "HOMESYNC_REPO", default_value = ".")]
    pub repo: PathBuf,

    /// Rule document (defaults to `<repo>/homesync.yaml`)
    #[arg(long, global = true, value_name = "FILE", env = "HOMESYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Live home directory (defaults to the user's home)
    #[arg(long, global = true, value_name = "DIR", env = "HOMESYNC_HOME")]
    pub home: Option<PathBuf>,

    /// Host identifier (defaults to the machine name)
    #[arg(long, global = true, value_name = "NAME", env = "HOMESYNC_HOST")]
    pub host: Option<String>,

    /// Where backups are stored (defaults to `~/.homesync-backups`)
    #[arg(long, global = true, value_name = "DIR", env = "HOMESYNC_BACKUP_ROOT")]
    pub backup_root: Option<PathBuf>,

    /// Filesystem root for system paths
    #[arg(long, global = true, value_name = "DIR", env = "HOMESYNC_SYSTEM_ROOT", hide = true)]
    pub system_root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Summarize the rules and managed paths for this host
    Status(commands::status::StatusArgs),

    /// Audit every managed path against the repository and the live tree
    Validate(commands::validate::ValidateArgs),

    /// List live entries blocking symlink deployment, optionally clearing them
    Conflicts(commands::conflicts::ConflictsArgs),

    /// Move host-specific paths out of shared directories
    Reorganize(commands::reorganize::ReorganizeArgs),

    /// List backups for this host
    Backups(commands::backups::BackupsArgs),

    /// Restore a backup (the latest one by default)
    Rollback(commands::rollback::RollbackArgs),

    /// Find repository entries matching exclusion patterns
    Cleanup(commands::cleanup::CleanupArgs),

    /// Find live entries no rule accounts for
    Discover(commands::discover::DiscoverArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let color = self.color.as_str();
        let settings = &self.settings;
        match self.command {
            Commands::Status(args) => commands::status::execute(args, settings, color),
            Commands::Validate(args) => commands::validate::execute(args, settings, color),
            Commands::Conflicts(args) => commands::conflicts::execute(args, settings, color),
            Commands::Reorganize(args) => commands::reorganize::execute(args, settings, color),
            Commands::Backups(args) => commands::backups::execute(args, settings, color),
            Commands::Rollback(args) => commands::rollback::execute(args, settings, color),
            Commands::Cleanup(args) => commands::cleanup::execute(args, settings, color),
            Commands::Discover(args) => commands::discover::execute(args, settings, color),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
