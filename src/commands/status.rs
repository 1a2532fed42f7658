//! # Status Command Implementation
//!
//! Read-only summary of the rule document as seen from the active host:
//! bucket sizes, the managed paths expanded for this host, and the number of
//! pending override conflicts.

use anyhow::Result;
use clap::Args;

use homesync::inventory::Provenance;
use homesync::output::{emoji, OutputConfig};
use homesync::reorganize::detect_overlaps;

use super::Workspace;
use crate::cli::Settings;

/// Summarize the rules and managed paths for this host
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Include system paths in the managed-path summary
    #[arg(long)]
    pub system: bool,
}

pub fn execute(args: StatusArgs, settings: &Settings, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let ws = Workspace::load(settings)?;

    println!("{} {}", emoji(&out, "📊", "[INFO]"), out.bold("homesync status"));
    println!("   Host:       {}", ws.host);
    println!("   Repository: {}", ws.layout.repo_root().display());
    println!("   Live tree:  {}", ws.layout.live_root().display());
    println!("   Rules:      {}", ws.store.path().display());

    println!("\n{} Buckets:", emoji(&out, "📁", "[RULES]"));
    println!("   shared:  {}", ws.rules.shared().len());
    println!("   exclude: {}", ws.rules.exclude().len());
    println!("   system:  {}", ws.rules.system().len());
    for (host, paths) in ws.rules.hosts() {
        let marker = if host == ws.host { " (this host)" } else { "" };
        println!("   {}: {}{}", host, paths.len(), marker);
    }

    let inventory = ws.inventory(args.system);
    let count = |wanted: fn(&Provenance) -> bool| {
        inventory
            .concrete()
            .filter(|r| wanted(&r.provenance))
            .count()
    };
    println!("\n{} Managed paths: {}", emoji(&out, "🔗", "[PATHS]"), inventory.len());
    println!("   shared: {}", count(|p| *p == Provenance::Shared));
    println!("   host:   {}", count(Provenance::is_host));
    if args.system {
        println!("   system: {}", count(|p| *p == Provenance::System));
    }
    if inventory.claims_entire_tree() {
        println!(
            "   {} shared claims the whole live tree",
            emoji(&out, "🌐", "[ALL]")
        );
    }

    let overlaps: usize = detect_overlaps(&ws.rules).iter().map(|g| g.items.len()).sum();
    if overlaps > 0 {
        println!(
            "\n{} {} host path(s) inside shared directories; run `homesync reorganize`",
            emoji(&out, "⚠️", "[WARN]"),
            overlaps
        );
    }
    Ok(())
}
