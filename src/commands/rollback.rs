//! # Rollback Command Implementation
//!
//! Restores a backup into the live tree. Without an ID the newest backup of
//! the active host is used. Restoration is best-effort: every entry is
//! attempted and failures are listed at the end.

use anyhow::Result;
use clap::Args;

use homesync::error::Error;
use homesync::output::{emoji, OutputConfig};

use super::{confirmer, Workspace};
use crate::cli::Settings;

/// Restore a backup (the latest one by default)
#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Backup to restore, as listed by `homesync backups`
    #[arg(value_name = "ID")]
    pub id: Option<String>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub fn execute(args: RollbackArgs, settings: &Settings, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let ws = Workspace::load(settings)?;
    let store = ws.backups();

    let id = match args.id {
        Some(id) => id,
        None => match store.latest()? {
            Some(manifest) => manifest.id,
            None => {
                return Err(anyhow::anyhow!("No backups available for {}", ws.host));
            }
        },
    };

    println!("{} Rolling back from {}", emoji(&out, "🔄", "[RESTORE]"), id);
    let confirm = confirmer(args.yes);
    match store.restore(&id, confirm.as_ref()) {
        Ok(report) if report.declined => {
            println!("{} Rollback cancelled", emoji(&out, "❌", "[CANCEL]"));
            Ok(())
        }
        Ok(report) => {
            for path in &report.skipped {
                println!(
                    "   {} {} was not backed up, left as is",
                    emoji(&out, "⚠️", "[WARN]"),
                    path
                );
            }
            println!(
                "{} Restored {} entr(ies)",
                emoji(&out, "✅", "[OK]"),
                report.restored.len()
            );
            Ok(())
        }
        Err(Error::RestorePartial {
            id,
            restored,
            failed,
        }) => {
            for (path, reason) in &failed {
                println!("   {} {}: {}", emoji(&out, "❌", "[ERR]"), path, reason);
            }
            Err(anyhow::anyhow!(
                "Partial rollback from {}: {} restored, {} failed",
                id,
                restored.len(),
                failed.len()
            ))
        }
        Err(e) => Err(e.into()),
    }
}
