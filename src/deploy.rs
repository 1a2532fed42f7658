//! Pre-deployment preparation.
//!
//! Symlinks are materialized by an external tool, one package (`common` or
//! the host directory) at a time. Before that, every live entry blocking a
//! symlink is backed up and removed. A package is ready when its directory
//! exists in the repository and none of its records still conflict.

use log::{info, warn};
use std::path::PathBuf;

use crate::backup::{BackupManifest, BackupStore};
use crate::confirm::Confirm;
use crate::detector::{ConflictDetector, ConflictRecord, DeploymentConflict};
use crate::error::Result;
use crate::filesystem;
use crate::inventory::Provenance;
use crate::layout::Layout;

/// Result of [`DeployPlanner::plan`].
#[derive(Debug, Clone, Default)]
pub struct DeploymentPlan {
    pub conflicts: Vec<DeploymentConflict>,
    /// Paths that could not be inspected
    pub errors: Vec<ConflictRecord>,
    /// Packages that can be handed to the symlink tool as-is
    pub ready_packages: Vec<String>,
    /// Packages held back by conflicts or inspection errors
    pub blocked_packages: Vec<String>,
}

impl DeploymentPlan {
    pub fn is_ready(&self) -> bool {
        self.conflicts.is_empty() && self.errors.is_empty()
    }
}

/// Result of [`DeployPlanner::prepare`].
#[derive(Debug, Clone, Default)]
pub struct PreparedDeployment {
    pub manifest: Option<BackupManifest>,
    pub removed: Vec<PathBuf>,
    /// Conflicting entries left in place, with the reason
    pub kept: Vec<(PathBuf, String)>,
    pub declined: bool,
}

pub struct DeployPlanner<'a> {
    detector: &'a ConflictDetector<'a>,
    layout: &'a Layout,
    host: &'a str,
    backups: &'a BackupStore,
    confirm: &'a dyn Confirm,
    dry_run: bool,
}

impl<'a> DeployPlanner<'a> {
    pub fn new(
        detector: &'a ConflictDetector<'a>,
        layout: &'a Layout,
        host: &'a str,
        backups: &'a BackupStore,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            detector,
            layout,
            host,
            backups,
            confirm,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the deployment scan and sort packages into ready and blocked.
    pub fn plan(&self) -> Result<DeploymentPlan> {
        let scan = self.detector.deployment_conflicts();
        let mut plan = DeploymentPlan {
            conflicts: scan.conflicts,
            errors: scan.errors,
            ..DeploymentPlan::default()
        };

        for provenance in [Provenance::Shared, Provenance::Host(self.host.to_string())] {
            let name = Layout::package_name(&provenance).to_string();
            if !filesystem::exists(&self.layout.package_dir(&provenance))? {
                info!("Package {} has no repository directory", name);
                continue;
            }
            let blocked = plan
                .conflicts
                .iter()
                .map(|c| &c.record.provenance)
                .chain(plan.errors.iter().map(|e| &e.provenance))
                .any(|p| *p == provenance);
            if blocked {
                plan.blocked_packages.push(name);
            } else {
                plan.ready_packages.push(name);
            }
        }
        Ok(plan)
    }

    /// Back up and remove the live entries blocking `plan`.
    ///
    /// An entry is removed only when its backup succeeded.
    pub fn prepare(&self, plan: &DeploymentPlan) -> Result<PreparedDeployment> {
        let mut prepared = PreparedDeployment::default();
        if plan.conflicts.is_empty() {
            return Ok(prepared);
        }

        let paths: Vec<PathBuf> = plan.conflicts.iter().map(|c| c.live_path.clone()).collect();
        if self.dry_run {
            for path in &paths {
                info!("[dry-run] Would back up and remove {}", path.display());
            }
            prepared.removed = paths;
            return Ok(prepared);
        }

        if !self.confirm.confirm(&format!(
            "Back up and remove {} conflicting live entr{}?",
            paths.len(),
            if paths.len() == 1 { "y" } else { "ies" }
        )) {
            info!("Deployment preparation declined");
            prepared.declined = true;
            prepared.kept = paths
                .into_iter()
                .map(|p| (p, "declined".to_string()))
                .collect();
            return Ok(prepared);
        }

        let manifest = self.backups.snapshot(&paths)?;
        for (path, entry) in paths.into_iter().zip(&manifest.entries) {
            if !entry.is_ok() {
                warn!("Keeping {}: backup failed", path.display());
                prepared.kept.push((path, "backup failed".to_string()));
                continue;
            }
            match filesystem::remove_entry(&path) {
                Ok(()) => {
                    info!("Removed {}", path.display());
                    prepared.removed.push(path);
                }
                Err(e) => {
                    warn!("Could not remove {}: {}", path.display(), e);
                    prepared.kept.push((path, e.to_string()));
                }
            }
        }
        prepared.manifest = Some(manifest);
        Ok(prepared)
    }
}
