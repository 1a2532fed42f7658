//! Discovery of live-tree entries no rule accounts for.
//!
//! Without the whole-tree sentinel, an entry is accounted for when it lies
//! at or under a shared or host managed path, or matches an exclusion. When
//! the shared bucket claims the whole tree, everything is synchronized by
//! default, so an entry is accounted for only when the host explicitly
//! includes it or it is excluded; the rest is reported for review.
//!
//! Directories holding managed paths are descended into. Any other
//! unaccounted directory is reported once, without its contents.

use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::{Bucket, RuleSet};
use crate::inventory::{Inventory, Provenance};
use crate::path::{is_strictly_within, is_within, to_forward_slashes};
use crate::precedence::PrecedenceResolver;

/// Directory names never walked into.
const SKIP_DIRS: &[&str] = &[".cache"];

/// A live entry not covered by any rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnmanagedEntry {
    /// Relative to the live root
    pub path: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryScan {
    /// Sorted by path
    pub entries: Vec<UnmanagedEntry>,
    pub errors: Vec<(PathBuf, String)>,
}

pub struct Discovery<'a> {
    inventory: &'a Inventory,
    resolver: &'a PrecedenceResolver<'a>,
    live_root: &'a Path,
}

impl<'a> Discovery<'a> {
    pub fn new(
        inventory: &'a Inventory,
        resolver: &'a PrecedenceResolver<'a>,
        live_root: &'a Path,
    ) -> Self {
        Self {
            inventory,
            resolver,
            live_root,
        }
    }

    /// Walk the live tree and collect unaccounted entries.
    pub fn scan_unmanaged(&self) -> DiscoveryScan {
        let mut scan = DiscoveryScan::default();
        let mut walker = WalkDir::new(self.live_root)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !self.is_pruned(e));

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.live_root.to_path_buf());
                    warn!("Cannot read {}: {}", path.display(), e);
                    scan.errors.push((path, e.to_string()));
                    continue;
                }
            };
            let Some(relative) = self.relative(entry.path()) else {
                continue;
            };
            let is_dir = entry.file_type().is_dir();

            if self.is_accounted_for(&relative) {
                continue;
            }
            if is_dir && self.holds_managed(&relative) {
                continue;
            }
            if is_dir {
                walker.skip_current_dir();
            }
            debug!("Unmanaged: {}", relative);
            scan.entries.push(UnmanagedEntry {
                path: relative,
                is_dir,
            });
        }

        scan.entries.sort();
        scan
    }

    /// Whether a rule accounts for `path`.
    pub fn is_accounted_for(&self, path: &str) -> bool {
        if self.resolver.is_excluded(path) {
            return true;
        }
        if self.inventory.claims_entire_tree() {
            return self
                .resolver
                .is_explicitly_included(path, self.inventory.host());
        }
        self.home_records()
            .any(|record| is_within(path, &record.normalized))
    }

    /// The exclusion pattern to add for `path`.
    pub fn suggest_exclusion(path: &str, is_dir: bool) -> String {
        let path = to_forward_slashes(path);
        let path = path.trim_end_matches('/');
        if is_dir {
            format!("{}/**", path)
        } else {
            path.to_string()
        }
    }

    /// Fold accepted additions into a new rule set.
    pub fn apply(rules: &RuleSet, additions: &[(Bucket, String)]) -> RuleSet {
        additions.iter().fold(rules.clone(), |acc, (bucket, path)| {
            acc.with_appended(bucket, [path.as_str()])
        })
    }

    fn home_records(&self) -> impl Iterator<Item = &crate::inventory::ManagedPathRecord> {
        self.inventory
            .concrete()
            .filter(|r| r.provenance != Provenance::System)
    }

    /// Whether a managed path lies strictly beneath `dir`.
    fn holds_managed(&self, dir: &str) -> bool {
        if self.inventory.claims_entire_tree() {
            return self
                .resolver
                .has_explicit_descendant(dir, self.inventory.host());
        }
        self.home_records()
            .any(|record| is_strictly_within(&record.normalized, dir))
    }

    fn is_pruned(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with(".git") || SKIP_DIRS.contains(&name.as_ref()) {
            return true;
        }
        match self.relative(entry.path()) {
            Some(relative) => self.resolver.is_excluded(&relative),
            None => false,
        }
    }

    fn relative(&self, path: &Path) -> Option<String> {
        path.strip_prefix(self.live_root)
            .ok()
            .map(|relative| to_forward_slashes(&relative.to_string_lossy()))
    }
}
