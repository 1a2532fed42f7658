//! # Reorganizer
//!
//! Resolves override conflicts: a shared directory rule (trailing `/`) and a
//! host rule declaring a path strictly inside that directory. The host's
//! version must live under the host package, so the entry is moved out of
//! the shared package:
//!
//! 1. Overlaps are grouped by the shared directory they fall under. A host
//!    path inside nested shared directories belongs to the innermost one.
//! 2. Each item is classified by the precedence resolver for the active
//!    host and skipped when the result excludes it. Items declared by the
//!    active host are always included; items of other hosts are dropped when
//!    they match an exclusion.
//! 3. The entry is copied (recursively for directories) to the host
//!    location and the copy is verified.
//! 4. Only then is the shared original removed. A missing source is a skip,
//!    never a removal.
//! 5. The first failure aborts the batch with [`Error::MigrationAbort`];
//!    migrations already completed are left in place.

use log::{debug, error, info, warn};
use std::path::PathBuf;

use crate::config::RuleSet;
use crate::confirm::Confirm;
use crate::error::{Error, Result};
use crate::filesystem::{self, EntryKind};
use crate::inventory::Provenance;
use crate::layout::Layout;
use crate::path::{is_dir_rule, is_strictly_within, normalize, trim_dir};
use crate::precedence::PrecedenceResolver;

/// A host path declared inside a shared directory rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub host: String,
    /// The host rule as written
    pub declared: String,
    pub normalized: String,
}

/// Overlaps falling under one shared directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapGroup {
    /// The shared rule as written
    pub shared_declared: String,
    pub shared_dir: String,
    pub items: Vec<Overlap>,
}

/// Find every override conflict in `rules`, across all host buckets.
///
/// Groups follow the order of the shared rules; items follow host and
/// declaration order.
pub fn detect_overlaps(rules: &RuleSet) -> Vec<OverlapGroup> {
    let shared_dirs: Vec<(&String, String)> = rules
        .shared()
        .iter()
        .filter(|declared| is_dir_rule(declared))
        .map(|declared| (declared, normalize(declared)))
        .filter(|(_, normalized)| !trim_dir(normalized).is_empty())
        .collect();

    let mut groups: Vec<OverlapGroup> = shared_dirs
        .iter()
        .map(|(declared, normalized)| OverlapGroup {
            shared_declared: (*declared).clone(),
            shared_dir: normalized.clone(),
            items: Vec::new(),
        })
        .collect();

    for (host, paths) in rules.hosts() {
        for declared in paths {
            let normalized = normalize(declared);
            let innermost = shared_dirs
                .iter()
                .enumerate()
                .filter(|(_, (_, dir))| is_strictly_within(&normalized, dir))
                .max_by_key(|(_, (_, dir))| trim_dir(dir).len())
                .map(|(index, _)| index);
            if let Some(index) = innermost {
                debug!(
                    "Override conflict: {} ({}) inside shared {}",
                    normalized, host, groups[index].shared_dir
                );
                groups[index].items.push(Overlap {
                    host: host.to_string(),
                    declared: declared.clone(),
                    normalized,
                });
            }
        }
    }

    groups.retain(|group| !group.items.is_empty());
    groups
}

/// A completed (or, in dry-run mode, planned) migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratedItem {
    pub path: String,
    pub host: String,
    pub kind: EntryKind,
    pub from: PathBuf,
    pub to: PathBuf,
}

/// An overlap that did not need or could not get a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub path: String,
    pub host: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub migrated: Vec<MigratedItem>,
    pub skipped: Vec<SkippedItem>,
    /// Whether the repository tree changed; the caller decides whether to
    /// commit.
    pub repo_modified: bool,
}

/// Moves host-specific entries out of shared directories.
pub struct Reorganizer<'a> {
    resolver: &'a PrecedenceResolver<'a>,
    layout: &'a Layout,
    host: &'a str,
    confirm: &'a dyn Confirm,
    dry_run: bool,
}

impl<'a> Reorganizer<'a> {
    pub fn new(
        resolver: &'a PrecedenceResolver<'a>,
        layout: &'a Layout,
        host: &'a str,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            resolver,
            layout,
            host,
            confirm,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Detect overlaps in the resolver's rules and migrate them.
    pub fn reorganize(&self) -> Result<MigrationReport> {
        let groups = detect_overlaps(self.resolver.rules());
        self.migrate(&groups)
    }

    /// Migrate the given overlap groups.
    pub fn migrate(&self, groups: &[OverlapGroup]) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();
        let total: usize = groups.iter().map(|g| g.items.len()).sum();
        if total == 0 {
            return Ok(report);
        }

        if !self.dry_run
            && !self.confirm.confirm(&format!(
                "Move {} host-specific path(s) out of {} shared director{}?",
                total,
                groups.len(),
                if groups.len() == 1 { "y" } else { "ies" }
            ))
        {
            info!("Reorganization declined");
            for item in groups.iter().flat_map(|g| &g.items) {
                report.skipped.push(skip(item, "declined"));
            }
            return Ok(report);
        }

        for group in groups {
            let shared_dir = self.layout.repo_path(&Provenance::Shared, &group.shared_dir);
            if !filesystem::exists(&shared_dir)? {
                warn!(
                    "Shared directory {} does not exist, skipping {} item(s)",
                    shared_dir.display(),
                    group.items.len()
                );
                for item in &group.items {
                    report
                        .skipped
                        .push(skip(item, "shared directory not in repository"));
                }
                continue;
            }

            info!("Processing shared directory {}", group.shared_dir);
            for item in &group.items {
                if let Err(reason) = self.migrate_item(item, &mut report) {
                    error!("Migration of {} failed: {}", item.normalized, reason);
                    return Err(Error::MigrationAbort {
                        completed: report.migrated.iter().map(|m| m.path.clone()).collect(),
                        failed: vec![(item.normalized.clone(), reason)],
                    });
                }
            }
        }

        Ok(report)
    }

    fn migrate_item(
        &self,
        item: &Overlap,
        report: &mut MigrationReport,
    ) -> std::result::Result<(), String> {
        let classification = self.resolver.classify(&item.normalized, self.host);
        if !classification.include {
            info!(
                "Not migrating {} ({}): {} for {}",
                item.normalized, item.host, classification.reason, self.host
            );
            report.skipped.push(skip(item, &classification.reason.to_string()));
            return Ok(());
        }

        let host = Provenance::Host(item.host.clone());
        let source = self.layout.repo_path(&Provenance::Shared, &item.normalized);
        let dest = self.layout.repo_path(&host, &item.normalized);

        let source_kind = filesystem::probe(&source).map_err(|e| e.to_string())?;
        if !source_kind.is_present() {
            let dest_exists = filesystem::exists(&dest).map_err(|e| e.to_string())?;
            let reason = if dest_exists {
                "already in host location"
            } else {
                "not present in shared location"
            };
            debug!("Skipping {}: {}", item.normalized, reason);
            report.skipped.push(skip(item, reason));
            return Ok(());
        }

        if self.dry_run {
            info!("[dry-run] Would move {} -> {}", source.display(), dest.display());
        } else {
            filesystem::copy_entry(&source, &dest).map_err(|e| e.to_string())?;
            if !filesystem::verify_copy(&source, &dest) {
                return Err(format!("copy at {} could not be verified", dest.display()));
            }
            report.repo_modified = true;
            filesystem::remove_entry(&source).map_err(|e| e.to_string())?;
            info!("Moved {} -> {}", source.display(), dest.display());
        }

        report.migrated.push(MigratedItem {
            path: item.normalized.clone(),
            host: item.host.clone(),
            kind: source_kind,
            from: source,
            to: dest,
        });
        Ok(())
    }
}

fn skip(item: &Overlap, reason: &str) -> SkippedItem {
    SkippedItem {
        path: item.normalized.clone(),
        host: item.host.clone(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse, DocumentFormat};
    use crate::confirm::{Decline, Unattended};
    use crate::precedence::Reason;
    use std::fs;
    use tempfile::TempDir;

    fn rules() -> RuleSet {
        parse(
            r#"
shared: [.config/, .config/nvim/, .bashrc]
desk: [.config/nvim/local.lua, .config/kitty/kitty.conf]
laptop: [.config/kitty/, .zshrc]
"#,
            DocumentFormat::Yaml,
        )
        .unwrap()
    }

    #[test]
    fn test_detect_overlaps_groups_innermost() {
        let groups = detect_overlaps(&rules());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].shared_dir, ".config/");
        let paths: Vec<(&str, &str)> = groups[0]
            .items
            .iter()
            .map(|o| (o.normalized.as_str(), o.host.as_str()))
            .collect();
        assert_eq!(
            paths,
            vec![(".config/kitty/kitty.conf", "desk"), (".config/kitty/", "laptop")]
        );
        assert_eq!(groups[1].shared_dir, ".config/nvim/");
        assert_eq!(groups[1].items[0].normalized, ".config/nvim/local.lua");
    }

    #[test]
    fn test_same_directory_is_not_an_overlap() {
        let rules = parse("shared: [.config/]\nhost: [.config/]\n", DocumentFormat::Yaml).unwrap();
        assert!(detect_overlaps(&rules).is_empty());
    }

    fn setup() -> (TempDir, Layout) {
        let temp = TempDir::new().unwrap();
        let layout = Layout::new(temp.path().join("repo"), temp.path().join("home"));
        let shared = layout.content_root(&Provenance::Shared);
        fs::create_dir_all(shared.join(".config/nvim")).unwrap();
        fs::create_dir_all(shared.join(".config/kitty")).unwrap();
        fs::write(shared.join(".config/nvim/local.lua"), "desk lua").unwrap();
        fs::write(shared.join(".config/nvim/init.lua"), "shared lua").unwrap();
        fs::write(shared.join(".config/kitty/kitty.conf"), "kitty").unwrap();
        (temp, layout)
    }

    #[test]
    fn test_migrate_moves_and_preserves_content() {
        let (_temp, layout) = setup();
        let rules = rules();
        let resolver = PrecedenceResolver::new(&rules);
        let report = Reorganizer::new(&resolver, &layout, "desk", &Unattended)
            .reorganize()
            .unwrap();

        assert!(report.repo_modified);
        let moved: Vec<(&str, &str)> = report
            .migrated
            .iter()
            .map(|m| (m.path.as_str(), m.host.as_str()))
            .collect();
        assert_eq!(
            moved,
            vec![
                (".config/kitty/kitty.conf", "desk"),
                (".config/kitty/", "laptop"),
                (".config/nvim/local.lua", "desk"),
            ]
        );

        let desk = layout.content_root(&Provenance::Host("desk".into()));
        let shared = layout.content_root(&Provenance::Shared);
        assert_eq!(
            fs::read_to_string(desk.join(".config/nvim/local.lua")).unwrap(),
            "desk lua"
        );
        assert!(!shared.join(".config/nvim/local.lua").exists());
        assert!(shared.join(".config/nvim/init.lua").exists());
        assert!(!shared.join(".config/kitty").exists());

        let laptop = layout.content_root(&Provenance::Host("laptop".into()));
        assert!(laptop.join(".config/kitty").is_dir());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let (_temp, layout) = setup();
        let rules = rules();
        let resolver = PrecedenceResolver::new(&rules);
        let report = Reorganizer::new(&resolver, &layout, "desk", &Decline)
            .dry_run(true)
            .reorganize()
            .unwrap();
        assert!(!report.repo_modified);
        assert_eq!(report.migrated.len(), 3);
        let shared = layout.content_root(&Provenance::Shared);
        assert!(shared.join(".config/nvim/local.lua").exists());
    }

    #[test]
    fn test_declined_migrates_nothing() {
        let (_temp, layout) = setup();
        let rules = rules();
        let resolver = PrecedenceResolver::new(&rules);
        let report = Reorganizer::new(&resolver, &layout, "desk", &Decline)
            .reorganize()
            .unwrap();
        assert!(report.migrated.is_empty());
        assert_eq!(report.skipped.len(), 3);
        assert!(!report.repo_modified);
    }

    #[test]
    fn test_missing_shared_directory_is_skipped() {
        let temp = TempDir::new().unwrap();
        let layout = Layout::new(temp.path().join("repo"), temp.path().join("home"));
        let rules = rules();
        let resolver = PrecedenceResolver::new(&rules);
        let report = Reorganizer::new(&resolver, &layout, "desk", &Unattended)
            .reorganize()
            .unwrap();
        assert!(report.migrated.is_empty());
        assert_eq!(report.skipped.len(), 3);
    }

    #[test]
    fn test_copy_failure_aborts_and_keeps_source() {
        let (_temp, layout) = setup();
        // a file where the host package expects a directory
        let desk = layout.content_root(&Provenance::Host("desk".into()));
        fs::create_dir_all(&desk).unwrap();
        fs::write(desk.join(".config"), "not a directory").unwrap();

        let rules = rules();
        let resolver = PrecedenceResolver::new(&rules);
        let result = Reorganizer::new(&resolver, &layout, "desk", &Unattended).reorganize();

        match result {
            Err(Error::MigrationAbort { completed, failed }) => {
                assert!(completed.is_empty());
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].0, ".config/kitty/kitty.conf");
            }
            other => panic!("expected MigrationAbort, got {:?}", other),
        }
        let shared = layout.content_root(&Provenance::Shared);
        assert!(shared.join(".config/kitty/kitty.conf").exists());
        assert!(shared.join(".config/nvim/local.lua").exists());
    }

    #[test]
    fn test_other_host_item_matching_exclusion_is_skipped() {
        let temp = TempDir::new().unwrap();
        let layout = Layout::new(temp.path().join("repo"), temp.path().join("home"));
        let shared = layout.content_root(&Provenance::Shared);
        fs::create_dir_all(shared.join(".config/secret")).unwrap();
        fs::write(shared.join(".config/secret/key"), "desk key").unwrap();
        let rules = parse(
            r#"
shared: [.config/]
exclude: [".config/secret/**"]
desk: [.config/secret/key]
"#,
            DocumentFormat::Yaml,
        )
        .unwrap();
        let resolver = PrecedenceResolver::new(&rules);

        let report = Reorganizer::new(&resolver, &layout, "laptop", &Unattended)
            .reorganize()
            .unwrap();
        assert!(report.migrated.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].host, "desk");
        assert_eq!(report.skipped[0].reason, Reason::Excluded.to_string());
        assert!(!report.repo_modified);
        assert!(shared.join(".config/secret/key").exists());

        // the declaring host still migrates it
        let report = Reorganizer::new(&resolver, &layout, "desk", &Unattended)
            .reorganize()
            .unwrap();
        assert_eq!(report.migrated.len(), 1);
        assert!(!shared.join(".config/secret/key").exists());
    }
}
