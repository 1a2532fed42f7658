//! Repository cleanup: entries committed to a package that the exclusion
//! patterns say should never be synchronized.
//!
//! The shared package (`common/home`) is checked against the exclusions
//! alone. A host package (`<host>/home`) is checked the same way, except
//! that paths the host explicitly includes, and directories holding such
//! paths, are kept. A listed directory is not descended into.

use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::confirm::Confirm;
use crate::error::{Error, Result};
use crate::filesystem;
use crate::inventory::Provenance;
use crate::layout::{Layout, SHARED_PACKAGE, SYSTEM_PACKAGE};
use crate::path::to_forward_slashes;
use crate::precedence::PrecedenceResolver;

/// A repository entry matching an exclusion pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupCandidate {
    pub path: PathBuf,
    /// Path relative to the package's live-tree mirror
    pub relative: String,
    pub package: String,
    pub pattern: String,
    pub is_dir: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CleanupScan {
    pub candidates: Vec<CleanupCandidate>,
    /// Entries that could not be read
    pub errors: Vec<(PathBuf, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub declined: bool,
    pub repo_modified: bool,
}

pub struct CleanupScanner<'a> {
    resolver: &'a PrecedenceResolver<'a>,
    layout: &'a Layout,
    confirm: &'a dyn Confirm,
    dry_run: bool,
}

impl<'a> CleanupScanner<'a> {
    pub fn new(
        resolver: &'a PrecedenceResolver<'a>,
        layout: &'a Layout,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            resolver,
            layout,
            confirm,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// List excluded entries in the shared package and every host package.
    pub fn scan(&self) -> Result<CleanupScan> {
        let mut scan = CleanupScan::default();
        self.scan_package(&Provenance::Shared, &mut scan);
        for host in self.host_packages()? {
            self.scan_package(&Provenance::Host(host), &mut scan);
        }
        Ok(scan)
    }

    /// Delete the candidates of `scan`.
    pub fn remove(&self, scan: &CleanupScan) -> CleanupReport {
        let mut report = CleanupReport::default();
        if scan.candidates.is_empty() {
            return report;
        }
        if self.dry_run {
            for candidate in &scan.candidates {
                info!("[dry-run] Would remove {}", candidate.path.display());
            }
            return report;
        }
        if !self.confirm.confirm(&format!(
            "Remove {} excluded entr{} from the repository?",
            scan.candidates.len(),
            if scan.candidates.len() == 1 { "y" } else { "ies" }
        )) {
            info!("Cleanup declined");
            report.declined = true;
            return report;
        }

        for candidate in &scan.candidates {
            match filesystem::remove_entry(&candidate.path) {
                Ok(()) => {
                    info!("Removed {}", candidate.path.display());
                    report.repo_modified = true;
                    report.removed.push(candidate.path.clone());
                }
                Err(e) => {
                    warn!("Could not remove {}: {}", candidate.path.display(), e);
                    report.failed.push((candidate.path.clone(), e.to_string()));
                }
            }
        }
        report
    }

    /// Top-level repository directories that are host packages.
    fn host_packages(&self) -> Result<Vec<String>> {
        let root = self.layout.repo_root();
        let read_dir = match fs::read_dir(root) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::access(root, &e)),
        };
        let mut hosts = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| Error::access(root, &e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.')
                || name == SHARED_PACKAGE
                || name == SYSTEM_PACKAGE
                || !entry.path().is_dir()
            {
                continue;
            }
            hosts.push(name);
        }
        hosts.sort();
        Ok(hosts)
    }

    fn scan_package(&self, provenance: &Provenance, scan: &mut CleanupScan) {
        let content_root = self.layout.content_root(provenance);
        if !content_root.is_dir() {
            debug!("No content directory at {}", content_root.display());
            return;
        }
        let package = Layout::package_name(provenance).to_string();

        let mut walker = WalkDir::new(&content_root).min_depth(1).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| content_root.clone());
                    warn!("Cannot read {}: {}", path.display(), e);
                    scan.errors.push((path, e.to_string()));
                    continue;
                }
            };
            let relative = match entry.path().strip_prefix(&content_root) {
                Ok(relative) => to_forward_slashes(&relative.to_string_lossy()),
                Err(_) => continue,
            };
            let Some(pattern) = self.resolver.exclusions().first_match(&relative) else {
                continue;
            };
            if let Provenance::Host(host) = provenance {
                if self.resolver.is_explicitly_included(&relative, host)
                    || self.resolver.has_explicit_descendant(&relative, host)
                {
                    debug!("Keeping {} in {}: explicitly included", relative, host);
                    continue;
                }
            }

            let is_dir = entry.file_type().is_dir();
            if is_dir {
                walker.skip_current_dir();
            }
            scan.candidates.push(CleanupCandidate {
                path: entry.path().to_path_buf(),
                relative,
                package: package.clone(),
                pattern: pattern.to_string(),
                is_dir,
            });
        }
    }
}
