//! # Conflict Detector
//!
//! Compares the repository, the live tree and the symlinks between them for
//! every managed path. Two modes share the same probing primitives:
//!
//! - **Deployment scan** ([`ConflictDetector::deployment_conflicts`]): run
//!   before symlinks are materialized. A path conflicts when its repository
//!   copy exists and something other than the correct symlink occupies the
//!   live location.
//! - **Validation** ([`ConflictDetector::validate`]): audits an already
//!   deployed system and puts every managed path into exactly one category,
//!   or treats it as healthy.
//!
//! | repo | live | correct symlink | category |
//! |------|------|-----------------|----------|
//! | no   | no   | -               | `MissingEverywhere` |
//! | no   | yes  | -               | `MissingInRepo` |
//! | yes  | any  | no              | `MissingSymlink` |
//! | yes  | yes  | yes             | healthy |
//!
//! Before the table, a record that matches an exclusion pattern without
//! being explicitly included by the host is reported as `OrphanedConfig`.
//! An I/O failure on one path becomes an `AccessError` record and the scan
//! continues.

use log::{debug, warn};
use rayon::prelude::*;
use std::fmt;
use std::path::PathBuf;

use crate::error::Result;
use crate::filesystem::{self, EntryKind};
use crate::inventory::{Inventory, ManagedPathRecord, Provenance};
use crate::layout::Layout;
use crate::precedence::PrecedenceResolver;

/// Validation issue categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConflictCategory {
    /// Declared and matching an exclusion without a host override
    OrphanedConfig,
    /// Present in the live tree but not version-controlled
    MissingInRepo,
    /// Version-controlled but not deployed as the correct symlink
    MissingSymlink,
    /// Declared but present nowhere
    MissingEverywhere,
    /// The path could not be inspected
    AccessError,
}

impl ConflictCategory {
    pub const ALL: [ConflictCategory; 5] = [
        ConflictCategory::OrphanedConfig,
        ConflictCategory::MissingInRepo,
        ConflictCategory::MissingSymlink,
        ConflictCategory::MissingEverywhere,
        ConflictCategory::AccessError,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConflictCategory::OrphanedConfig => "orphaned_config",
            ConflictCategory::MissingInRepo => "missing_in_repo",
            ConflictCategory::MissingSymlink => "missing_symlink",
            ConflictCategory::MissingEverywhere => "missing_everywhere",
            ConflictCategory::AccessError => "access_error",
        }
    }
}

impl fmt::Display for ConflictCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a versioned path is not correctly deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymlinkIssue {
    /// Nothing at the live location
    NotDeployed,
    /// A real file or directory occupies the live location
    RealEntry,
    /// A symlink resolving somewhere else
    WrongTarget,
}

/// One finding of a validation scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    pub declared: String,
    pub normalized: String,
    pub provenance: Provenance,
    pub category: ConflictCategory,
    pub repo_exists: bool,
    pub live_exists: bool,
    pub is_correct_symlink: bool,
    pub symlink_issue: Option<SymlinkIssue>,
    pub repo_path: PathBuf,
    pub live_path: PathBuf,
    /// Human-readable explanation
    pub reason: String,
}

/// Aggregated validation result, in inventory order.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Concrete records inspected
    pub scanned: usize,
    pub records: Vec<ConflictRecord>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count(&self, category: ConflictCategory) -> usize {
        self.in_category(category).count()
    }

    pub fn in_category(&self, category: ConflictCategory) -> impl Iterator<Item = &ConflictRecord> {
        self.records.iter().filter(move |r| r.category == category)
    }

    /// Number of records that need no action.
    pub fn healthy(&self) -> usize {
        self.scanned - self.records.len()
    }
}

/// A live entry standing where a symlink should be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentConflict {
    pub record: ManagedPathRecord,
    pub live_path: PathBuf,
    pub repo_path: PathBuf,
    pub live_kind: EntryKind,
}

/// Result of the pre-deployment scan.
#[derive(Debug, Clone, Default)]
pub struct DeploymentScan {
    pub conflicts: Vec<DeploymentConflict>,
    /// Paths that could not be inspected (category `AccessError`)
    pub errors: Vec<ConflictRecord>,
}

impl DeploymentScan {
    pub fn is_clear(&self) -> bool {
        self.conflicts.is_empty() && self.errors.is_empty()
    }
}

/// Probes managed paths against the repository and the live tree.
pub struct ConflictDetector<'a> {
    inventory: &'a Inventory,
    resolver: &'a PrecedenceResolver<'a>,
    layout: &'a Layout,
}

struct Probe {
    repo_exists: bool,
    live_kind: EntryKind,
    is_correct_symlink: bool,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(
        inventory: &'a Inventory,
        resolver: &'a PrecedenceResolver<'a>,
        layout: &'a Layout,
    ) -> Self {
        Self {
            inventory,
            resolver,
            layout,
        }
    }

    /// Mode A: live entries that would block symlink deployment.
    pub fn deployment_conflicts(&self) -> DeploymentScan {
        let mut scan = DeploymentScan::default();
        for record in self.inventory.concrete() {
            let repo_path = self.layout.record_repo_path(record);
            let live_path = self.layout.record_live_path(record);
            let probe = match self.probe(&repo_path, &live_path) {
                Ok(probe) => probe,
                Err(e) => {
                    warn!("Skipping {}: {}", record.normalized, e);
                    scan.errors.push(self.access_error(record, repo_path, live_path, e));
                    continue;
                }
            };
            if !probe.repo_exists || !probe.live_kind.is_present() || probe.is_correct_symlink {
                continue;
            }
            debug!(
                "Deployment conflict at {} ({:?})",
                live_path.display(),
                probe.live_kind
            );
            scan.conflicts.push(DeploymentConflict {
                record: record.clone(),
                live_path,
                repo_path,
                live_kind: probe.live_kind,
            });
        }
        scan
    }

    /// Mode B: classify every managed path.
    ///
    /// Paths are inspected in parallel; the report keeps inventory order.
    pub fn validate(&self) -> ValidationReport {
        let concrete: Vec<&ManagedPathRecord> = self.inventory.concrete().collect();
        let records = concrete
            .par_iter()
            .filter_map(|record| self.inspect(record))
            .collect();
        ValidationReport {
            scanned: concrete.len(),
            records,
        }
    }

    /// Classify one record. `None` means healthy.
    pub fn inspect(&self, record: &ManagedPathRecord) -> Option<ConflictRecord> {
        let repo_path = self.layout.record_repo_path(record);
        let live_path = self.layout.record_live_path(record);

        if self.resolver.is_excluded(&record.normalized)
            && !self
                .resolver
                .is_explicitly_included(&record.normalized, self.inventory.host())
        {
            return Some(ConflictRecord {
                declared: record.declared.clone(),
                normalized: record.normalized.clone(),
                provenance: record.provenance.clone(),
                category: ConflictCategory::OrphanedConfig,
                repo_exists: false,
                live_exists: false,
                is_correct_symlink: false,
                symlink_issue: None,
                repo_path,
                live_path,
                reason: format!(
                    "matches an exclusion pattern but is declared in {}",
                    record.provenance
                ),
            });
        }

        let probe = match self.probe(&repo_path, &live_path) {
            Ok(probe) => probe,
            Err(e) => {
                warn!("Cannot inspect {}: {}", record.normalized, e);
                return Some(self.access_error(record, repo_path, live_path, e));
            }
        };
        let live_exists = probe.live_kind.is_present();

        let (category, symlink_issue, reason) = match (probe.repo_exists, live_exists) {
            (false, false) => (
                ConflictCategory::MissingEverywhere,
                None,
                "declared but exists neither in the repository nor the live tree".to_string(),
            ),
            (false, true) => (
                ConflictCategory::MissingInRepo,
                None,
                "exists in the live tree but is not version-controlled".to_string(),
            ),
            (true, _) if !probe.is_correct_symlink => {
                let issue = match probe.live_kind {
                    EntryKind::Missing => SymlinkIssue::NotDeployed,
                    EntryKind::Symlink => SymlinkIssue::WrongTarget,
                    EntryKind::File | EntryKind::Dir => SymlinkIssue::RealEntry,
                };
                let reason = match issue {
                    SymlinkIssue::NotDeployed => "versioned but not deployed",
                    SymlinkIssue::WrongTarget => "live symlink points elsewhere",
                    SymlinkIssue::RealEntry => "real entry must be replaced by a symlink",
                };
                (ConflictCategory::MissingSymlink, Some(issue), reason.to_string())
            }
            _ => return None,
        };

        Some(ConflictRecord {
            declared: record.declared.clone(),
            normalized: record.normalized.clone(),
            provenance: record.provenance.clone(),
            category,
            repo_exists: probe.repo_exists,
            live_exists,
            is_correct_symlink: probe.is_correct_symlink,
            symlink_issue,
            repo_path,
            live_path,
            reason,
        })
    }

    fn probe(&self, repo_path: &std::path::Path, live_path: &std::path::Path) -> Result<Probe> {
        let repo_exists = filesystem::exists(repo_path)?;
        let live_kind = filesystem::probe(live_path)?;
        let is_correct_symlink = repo_exists
            && live_kind == EntryKind::Symlink
            && filesystem::is_symlink_to(live_path, repo_path)?;
        Ok(Probe {
            repo_exists,
            live_kind,
            is_correct_symlink,
        })
    }

    fn access_error(
        &self,
        record: &ManagedPathRecord,
        repo_path: PathBuf,
        live_path: PathBuf,
        error: crate::error::Error,
    ) -> ConflictRecord {
        ConflictRecord {
            declared: record.declared.clone(),
            normalized: record.normalized.clone(),
            provenance: record.provenance.clone(),
            category: ConflictCategory::AccessError,
            repo_exists: false,
            live_exists: false,
            is_correct_symlink: false,
            symlink_issue: None,
            repo_path,
            live_path,
            reason: error.to_string(),
        }
    }
}
