//! # Reorganize Command Implementation
//!
//! Moves host-specific paths out of shared directories in the repository.
//! Reports whether the repository changed so the user knows a commit is
//! due.

use anyhow::Result;
use clap::Args;

use homesync::error::Error;
use homesync::output::{emoji, OutputConfig};
use homesync::precedence::PrecedenceResolver;
use homesync::reorganize::{detect_overlaps, Reorganizer};

use super::{confirmer, Workspace};
use crate::cli::Settings;

/// Move host-specific paths out of shared directories
#[derive(Args, Debug)]
pub struct ReorganizeArgs {
    /// Show the planned moves without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub fn execute(args: ReorganizeArgs, settings: &Settings, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let ws = Workspace::load(settings)?;

    let groups = detect_overlaps(&ws.rules);
    if groups.is_empty() {
        println!("{} No override conflicts", emoji(&out, "✅", "[OK]"));
        return Ok(());
    }
    for group in &groups {
        println!("{} shared {}", emoji(&out, "📁", "[DIR]"), group.shared_dir);
        for item in &group.items {
            println!("   {} -> {}", item.normalized, item.host);
        }
    }

    let resolver = PrecedenceResolver::new(&ws.rules);
    let confirm = confirmer(args.yes);
    let reorganizer =
        Reorganizer::new(&resolver, &ws.layout, &ws.host, confirm.as_ref()).dry_run(args.dry_run);

    let report = match reorganizer.migrate(&groups) {
        Ok(report) => report,
        Err(Error::MigrationAbort { completed, failed }) => {
            for path in &completed {
                println!("   {} Moved {}", emoji(&out, "✅", "[OK]"), path);
            }
            for (path, reason) in &failed {
                println!("   {} {}: {}", emoji(&out, "❌", "[ERR]"), path, reason);
            }
            return Err(anyhow::anyhow!(
                "Reorganization aborted after {} move(s); the repository may need a commit or a manual fix",
                completed.len()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let verb = if args.dry_run { "Would move" } else { "Moved" };
    for item in &report.migrated {
        println!(
            "   {} {} {} to {}",
            emoji(&out, "➡️", "[MOVE]"),
            verb,
            item.path,
            item.to.display()
        );
    }
    for item in &report.skipped {
        println!("   Skipped {} ({}): {}", item.path, item.host, item.reason);
    }
    if report.repo_modified {
        println!(
            "\n{} Repository modified; commit the changes",
            emoji(&out, "💡", "[NOTE]")
        );
    }
    Ok(())
}
