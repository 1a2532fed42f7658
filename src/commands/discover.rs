//! # Discover Command Implementation
//!
//! Lists live entries that no rule accounts for. With `--interactive`, asks
//! for each entry whether to share it, keep it host-specific, exclude it or
//! skip it, and saves the accepted additions to the rule document.

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Select};

use homesync::config::Bucket;
use homesync::discovery::{Discovery, UnmanagedEntry};
use homesync::output::{emoji, OutputConfig};
use homesync::precedence::PrecedenceResolver;

use super::Workspace;
use crate::cli::Settings;

/// Find live entries no rule accounts for
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Decide what to do with each entry and update the rules
    #[arg(short, long)]
    pub interactive: bool,
}

pub fn execute(args: DiscoverArgs, settings: &Settings, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let ws = Workspace::load(settings)?;
    let inventory = ws.inventory(false);
    let resolver = PrecedenceResolver::new(&ws.rules);
    let discovery = Discovery::new(&inventory, &resolver, ws.layout.live_root());

    println!(
        "{} Scanning {} for unmanaged entries",
        emoji(&out, "🔍", "[SCAN]"),
        ws.layout.live_root().display()
    );
    let scan = discovery.scan_unmanaged();
    for (path, reason) in &scan.errors {
        println!("   {} {}: {}", emoji(&out, "❌", "[ERR]"), path.display(), reason);
    }
    if scan.entries.is_empty() {
        println!("{} Every entry is accounted for", emoji(&out, "✅", "[OK]"));
        return Ok(());
    }

    println!(
        "{} {} unmanaged entr(ies)",
        emoji(&out, "📁", "[FOUND]"),
        scan.entries.len()
    );
    let shown = &scan.entries[..scan.entries.len().min(args.limit)];

    if !args.interactive {
        for entry in shown {
            println!(
                "   {}{}  (exclude with '{}')",
                entry.path,
                if entry.is_dir { "/" } else { "" },
                Discovery::suggest_exclusion(&entry.path, entry.is_dir)
            );
        }
        if shown.len() < scan.entries.len() {
            println!("   ... and {} more", scan.entries.len() - shown.len());
        }
        return Ok(());
    }

    let mut additions = Vec::new();
    for entry in shown {
        if let Some(addition) = ask(entry, &ws.host)? {
            additions.push(addition);
        }
    }
    if additions.is_empty() {
        println!("{} No changes", emoji(&out, "📝", "[NOTE]"));
        return Ok(());
    }

    let updated = Discovery::apply(&ws.rules, &additions);
    ws.store.save(&updated)?;
    println!(
        "{} Added {} rule(s) to {}",
        emoji(&out, "✅", "[OK]"),
        additions.len(),
        ws.store.path().display()
    );
    Ok(())
}

fn ask(entry: &UnmanagedEntry, host: &str) -> Result<Option<(Bucket, String)>> {
    let choices = [
        "share with every host".to_string(),
        format!("keep for {} only", host),
        "exclude".to_string(),
        "skip".to_string(),
    ];
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(entry.path.as_str())
        .items(&choices)
        .default(3)
        .interact()?;

    let path = if entry.is_dir {
        format!("{}/", entry.path)
    } else {
        entry.path.clone()
    };
    Ok(match choice {
        0 => Some((Bucket::Shared, path)),
        1 => Some((Bucket::Host(host.to_string()), path)),
        2 => Some((
            Bucket::Exclude,
            Discovery::suggest_exclusion(&entry.path, entry.is_dir),
        )),
        _ => None,
    })
}
