//! # Backups Command Implementation
//!
//! Lists the snapshots stored for the active host, oldest first.

use anyhow::Result;
use clap::Args;

use homesync::output::{emoji, OutputConfig};

use super::Workspace;
use crate::cli::Settings;

/// List backups for this host
#[derive(Args, Debug)]
pub struct BackupsArgs {
    /// Also list the entries of each backup
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn execute(args: BackupsArgs, settings: &Settings, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let ws = Workspace::load(settings)?;
    let store = ws.backups();
    let manifests = store.list()?;

    if manifests.is_empty() {
        println!(
            "{} No backups for {} in {}",
            emoji(&out, "📭", "[EMPTY]"),
            ws.host,
            store.host_dir().display()
        );
        return Ok(());
    }

    println!(
        "{} {} backup(s) for {}:",
        emoji(&out, "💾", "[BACKUP]"),
        manifests.len(),
        ws.host
    );
    for manifest in &manifests {
        let failed = manifest.failures().len();
        let status = if failed == 0 {
            String::new()
        } else {
            format!(" ({} failed)", failed)
        };
        println!(
            "   {}  {}  {} entr(ies){}",
            manifest.id,
            manifest.created.format("%Y-%m-%d %H:%M:%S"),
            manifest.entries.len(),
            status
        );
        if args.verbose {
            for entry in &manifest.entries {
                println!("      {}", entry);
            }
        }
    }
    Ok(())
}
