//! # Validate Command Implementation
//!
//! Audits every managed path of the active host and prints the findings
//! grouped by category. This command is read-only; it fails (non-zero exit
//! status) when any issue is found.

use anyhow::Result;
use clap::Args;

use homesync::detector::{ConflictCategory, ConflictDetector};
use homesync::output::{category_heading, emoji, OutputConfig};
use homesync::precedence::PrecedenceResolver;

use super::Workspace;
use crate::cli::Settings;

/// Audit every managed path against the repository and the live tree
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also audit the system bucket
    #[arg(long)]
    pub system: bool,
}

pub fn execute(args: ValidateArgs, settings: &Settings, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let ws = Workspace::load(settings)?;
    println!(
        "{} Validating managed paths for {}",
        emoji(&out, "🔍", "[SCAN]"),
        ws.host
    );

    let inventory = ws.inventory(args.system);
    let resolver = PrecedenceResolver::new(&ws.rules);
    let detector = ConflictDetector::new(&inventory, &resolver, &ws.layout);
    let report = detector.validate();

    for category in ConflictCategory::ALL {
        let count = report.count(category);
        if count == 0 {
            continue;
        }
        let (heading, color) = category_heading(category);
        println!(
            "\n{} ({}):",
            out.paint(heading, color),
            count
        );
        for record in report.in_category(category) {
            println!(
                "   {} [{}] {}",
                record.normalized, record.provenance, record.reason
            );
        }
    }

    println!(
        "\n   {} path(s) checked, {} healthy, {} issue(s)",
        report.scanned,
        report.healthy(),
        report.records.len()
    );

    if report.is_clean() {
        println!("{} Everything is in place", emoji(&out, "✅", "[OK]"));
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Validation found {} issue(s)",
            report.records.len()
        ))
    }
}
