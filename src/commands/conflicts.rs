//! # Conflicts Command Implementation
//!
//! Lists live entries that would block symlink deployment. With
//! `--prepare`, backs them up and removes them, then prints the packages
//! that are ready for the symlink tool.

use anyhow::Result;
use clap::Args;

use homesync::deploy::{DeployPlanner, DeploymentPlan};
use homesync::detector::ConflictDetector;
use homesync::output::{emoji, OutputConfig};
use homesync::precedence::PrecedenceResolver;

use super::{confirmer, Workspace};
use crate::cli::Settings;

/// List live entries blocking symlink deployment, optionally clearing them
#[derive(Args, Debug)]
pub struct ConflictsArgs {
    /// Back up and remove the conflicting live entries
    #[arg(long)]
    pub prepare: bool,

    /// Show what --prepare would do without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub fn execute(args: ConflictsArgs, settings: &Settings, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let ws = Workspace::load(settings)?;
    let inventory = ws.inventory(false);
    let resolver = PrecedenceResolver::new(&ws.rules);
    let detector = ConflictDetector::new(&inventory, &resolver, &ws.layout);
    let backups = ws.backups();
    let confirm = confirmer(args.yes);
    let planner = DeployPlanner::new(&detector, &ws.layout, &ws.host, &backups, confirm.as_ref())
        .dry_run(args.dry_run);

    let plan = planner.plan()?;
    print_plan(&out, &plan);

    if !args.prepare || plan.conflicts.is_empty() {
        return if plan.errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("{} path(s) could not be inspected", plan.errors.len()))
        };
    }

    let prepared = planner.prepare(&plan)?;
    if prepared.declined {
        println!("{} Nothing changed", emoji(&out, "❌", "[CANCEL]"));
        return Ok(());
    }
    if let Some(manifest) = &prepared.manifest {
        println!(
            "\n{} Backup {} at {}",
            emoji(&out, "💾", "[BACKUP]"),
            manifest.id,
            manifest.dir.display()
        );
        if let Err(e) = manifest.ensure_complete() {
            println!("   {} {}", emoji(&out, "⚠️", "[WARN]"), e);
        }
    }
    let verb = if args.dry_run { "Would remove" } else { "Removed" };
    for path in &prepared.removed {
        println!("   {} {}", verb, path.display());
    }
    for (path, reason) in &prepared.kept {
        println!(
            "   {} Kept {}: {}",
            emoji(&out, "⚠️", "[WARN]"),
            path.display(),
            reason
        );
    }

    if !args.dry_run {
        let replanned = planner.plan()?;
        println!(
            "\n{} Ready packages: {}",
            emoji(&out, "📦", "[READY]"),
            replanned.ready_packages.join(", ")
        );
        if !replanned.is_ready() {
            println!(
                "{} Still blocked: {}",
                emoji(&out, "🚫", "[BLOCKED]"),
                replanned.blocked_packages.join(", ")
            );
        }
    }

    if prepared.kept.is_empty() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "{} conflicting entr(ies) left in place",
            prepared.kept.len()
        ))
    }
}

fn print_plan(out: &OutputConfig, plan: &DeploymentPlan) {
    if plan.conflicts.is_empty() {
        println!("{} No deployment conflicts", emoji(out, "✅", "[OK]"));
    } else {
        println!(
            "{} {} deployment conflict(s):",
            emoji(out, "⚠️", "[WARN]"),
            plan.conflicts.len()
        );
        for conflict in &plan.conflicts {
            println!(
                "   {} [{}] {:?} at {}",
                conflict.record.normalized,
                conflict.record.provenance,
                conflict.live_kind,
                conflict.live_path.display()
            );
        }
    }
    for error in &plan.errors {
        println!(
            "   {} {}: {}",
            emoji(out, "❌", "[ERR]"),
            error.normalized,
            error.reason
        );
    }
    if !plan.ready_packages.is_empty() {
        println!(
            "{} Ready packages: {}",
            emoji(out, "📦", "[READY]"),
            plan.ready_packages.join(", ")
        );
    }
    if !plan.blocked_packages.is_empty() {
        println!(
            "{} Blocked packages: {}",
            emoji(out, "🚫", "[BLOCKED]"),
            plan.blocked_packages.join(", ")
        );
    }
}
