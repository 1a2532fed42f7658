//! # Cleanup Command Implementation
//!
//! Lists repository entries that match exclusion patterns. With `--apply`
//! they are deleted after confirmation.

use anyhow::Result;
use clap::Args;

use homesync::cleanup::CleanupScanner;
use homesync::output::{emoji, OutputConfig};
use homesync::precedence::PrecedenceResolver;

use super::{confirmer, Workspace};
use crate::cli::Settings;

/// Find repository entries matching exclusion patterns
#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Delete the listed entries
    #[arg(long)]
    pub apply: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub fn execute(args: CleanupArgs, settings: &Settings, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let ws = Workspace::load(settings)?;
    let resolver = PrecedenceResolver::new(&ws.rules);
    let confirm = confirmer(args.yes);
    let scanner = CleanupScanner::new(&resolver, &ws.layout, confirm.as_ref()).dry_run(!args.apply);

    let scan = scanner.scan()?;
    for (path, reason) in &scan.errors {
        println!("   {} {}: {}", emoji(&out, "❌", "[ERR]"), path.display(), reason);
    }
    if scan.candidates.is_empty() {
        println!("{} Repository is clean", emoji(&out, "✅", "[OK]"));
        return Ok(());
    }

    println!(
        "{} {} excluded entr(ies) in the repository:",
        emoji(&out, "🧹", "[CLEAN]"),
        scan.candidates.len()
    );
    for candidate in &scan.candidates {
        println!(
            "   {}/{}  (matches '{}')",
            candidate.package, candidate.relative, candidate.pattern
        );
    }

    if !args.apply {
        println!("\nRun with --apply to delete them");
        return Ok(());
    }

    let report = scanner.remove(&scan);
    if report.declined {
        println!("{} Cleanup cancelled", emoji(&out, "❌", "[CANCEL]"));
        return Ok(());
    }
    for (path, reason) in &report.failed {
        println!("   {} {}: {}", emoji(&out, "❌", "[ERR]"), path.display(), reason);
    }
    println!(
        "{} Removed {} entr(ies)",
        emoji(&out, "✅", "[OK]"),
        report.removed.len()
    );
    if report.repo_modified {
        println!("{} Commit the changes", emoji(&out, "💡", "[NOTE]"));
    }
    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!("{} entr(ies) could not be removed", report.failed.len()))
    }
}
