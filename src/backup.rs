//! # Backup & Rollback
//!
//! Snapshots of live entries taken before a destructive step, and the
//! best-effort restore that undoes it.
//!
//! ```text
//! <backup_root>/<host>/backup_20250101_120000/
//!     backup_metadata.txt
//!     .bashrc
//!     .config/nvim/...
//!     _system/etc/hosts
//! ```
//!
//! The manifest is plain text:
//!
//! ```text
//! created: 2025-01-01T12:00:00+01:00
//! host: desk
//! entries: 2
//!
//! files:
//! FILE: .bashrc
//! ERROR DIR: .config/nvim - Permission denied (os error 13)
//! ```
//!
//! Entry paths are relative to the live root, or absolute for entries
//! outside it. A manifest is written even when some entries failed, and is
//! never modified afterwards. Backups are never deleted here.

use chrono::{DateTime, FixedOffset, Local};
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::confirm::Confirm;
use crate::error::{Error, Result};
use crate::filesystem::{self, EntryKind};

pub const MANIFEST_FILE: &str = "backup_metadata.txt";
/// Prefix of backup directory names.
pub const BACKUP_PREFIX: &str = "backup_";
/// Subdirectory holding entries that live outside the live root.
const ABSOLUTE_DIR: &str = "_system";
const ID_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    File,
    Dir,
}

impl BackupKind {
    fn label(self) -> &'static str {
        match self {
            BackupKind::File => "FILE",
            BackupKind::Dir => "DIR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    Ok,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub path: String,
    pub kind: BackupKind,
    pub status: EntryStatus,
}

impl BackupEntry {
    pub fn is_ok(&self) -> bool {
        self.status == EntryStatus::Ok
    }
}

impl fmt::Display for BackupEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            EntryStatus::Ok => write!(f, "{}: {}", self.kind.label(), self.path),
            EntryStatus::Error(reason) => {
                write!(f, "ERROR {}: {} - {}", self.kind.label(), self.path, reason)
            }
        }
    }
}

/// A persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupManifest {
    pub id: String,
    pub host: String,
    pub created: DateTime<FixedOffset>,
    pub entries: Vec<BackupEntry>,
    /// Directory holding the copied tree
    pub dir: PathBuf,
}

impl BackupManifest {
    pub fn is_complete(&self) -> bool {
        self.entries.iter().all(BackupEntry::is_ok)
    }

    /// `(path, reason)` for every entry that could not be copied.
    pub fn failures(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.status {
                EntryStatus::Error(reason) => Some((entry.path.clone(), reason.clone())),
                EntryStatus::Ok => None,
            })
            .collect()
    }

    /// Turn a partial snapshot into [`Error::BackupPartial`].
    pub fn ensure_complete(&self) -> Result<()> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(Error::BackupPartial {
                id: self.id.clone(),
                failed: self.failures(),
            })
        }
    }

    /// Whether the entry for `path` was backed up successfully.
    pub fn is_backed_up(&self, path: &str) -> bool {
        self.entries.iter().any(|e| e.path == path && e.is_ok())
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "created: {}\nhost: {}\nentries: {}\n\nfiles:\n",
            self.created.to_rfc3339(),
            self.host,
            self.entries.len()
        );
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }

    /// Parse a manifest written by [`BackupManifest::render`].
    pub fn parse(id: &str, dir: PathBuf, content: &str) -> Result<Self> {
        let malformed = |what: &str| Error::Filesystem {
            message: format!("Malformed backup manifest {}: {}", id, what),
        };

        let mut created = None;
        let mut host = None;
        let mut entries = Vec::new();
        let mut in_files = false;

        for line in content.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if in_files {
                entries.push(parse_entry(line).ok_or_else(|| malformed(line))?);
                continue;
            }
            match line.split_once(':') {
                Some(("files", _)) => in_files = true,
                Some(("created", value)) => {
                    let parsed = DateTime::parse_from_rfc3339(value.trim())
                        .map_err(|e| malformed(&e.to_string()))?;
                    created = Some(parsed);
                }
                Some(("host", value)) => host = Some(value.trim().to_string()),
                Some(("entries", _)) => {}
                _ => return Err(malformed(line)),
            }
        }

        Ok(Self {
            id: id.to_string(),
            host: host.ok_or_else(|| malformed("missing host"))?,
            created: created.ok_or_else(|| malformed("missing created"))?,
            entries,
            dir,
        })
    }
}

/// A failure reason that fits on one manifest line and never contains the
/// ` - ` separator, so the last separator on an `ERROR` line always ends the
/// path.
fn manifest_reason(reason: &str) -> String {
    reason
        .split(['\n', '\r'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" - ", " -- ")
}

fn parse_entry(line: &str) -> Option<BackupEntry> {
    let (failed, rest) = match line.strip_prefix("ERROR ") {
        Some(rest) => (true, rest),
        None => (false, line),
    };
    let (label, rest) = rest.split_once(": ")?;
    let kind = match label {
        "FILE" => BackupKind::File,
        "DIR" => BackupKind::Dir,
        _ => return None,
    };
    let (path, status) = if failed {
        let (path, reason) = rest.rsplit_once(" - ").unwrap_or((rest, ""));
        (path, EntryStatus::Error(reason.to_string()))
    } else {
        (rest, EntryStatus::Ok)
    };
    Some(BackupEntry {
        path: path.to_string(),
        kind,
        status,
    })
}

/// Outcome of a rollback.
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    pub id: String,
    pub restored: Vec<String>,
    /// Entries whose backup had failed and were not touched
    pub skipped: Vec<String>,
    pub declined: bool,
}

/// Backups of one host under a backup root.
#[derive(Debug, Clone)]
pub struct BackupStore {
    host_dir: PathBuf,
    host: String,
    live_root: PathBuf,
}

impl BackupStore {
    pub fn new(
        backup_root: impl AsRef<Path>,
        host: &str,
        live_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host_dir: backup_root.as_ref().join(host),
            host: host.to_string(),
            live_root: live_root.into(),
        }
    }

    /// Directory holding this host's backups.
    pub fn host_dir(&self) -> &Path {
        &self.host_dir
    }

    /// Copy every path in `paths` into a new timestamped backup.
    ///
    /// Per-entry failures are recorded in the manifest; only failing to
    /// create the backup directory or to write the manifest is an error.
    pub fn snapshot(&self, paths: &[PathBuf]) -> Result<BackupManifest> {
        let now = Local::now();
        let dir = self.create_backup_dir(&now.format(ID_FORMAT).to_string())?;
        let id = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Creating backup {} with {} entr(ies)", id, paths.len());

        let entries = paths
            .iter()
            .map(|live| {
                let path = self.entry_key(live);
                let target = backup_location(&dir, &path);
                match filesystem::copy_entry(live, &target) {
                    Ok(kind) => {
                        debug!("Backed up {} -> {}", live.display(), target.display());
                        BackupEntry {
                            path,
                            kind: backup_kind(kind),
                            status: EntryStatus::Ok,
                        }
                    }
                    Err(e) => {
                        warn!("Backup of {} failed: {}", live.display(), e);
                        let kind = filesystem::probe(live).map(backup_kind).unwrap_or(BackupKind::File);
                        BackupEntry {
                            path,
                            kind,
                            status: EntryStatus::Error(manifest_reason(&e.to_string())),
                        }
                    }
                }
            })
            .collect();

        let manifest = BackupManifest {
            id,
            host: self.host.clone(),
            created: now.fixed_offset(),
            entries,
            dir,
        };
        let manifest_path = manifest.dir.join(MANIFEST_FILE);
        fs::write(&manifest_path, manifest.render()).map_err(|e| Error::Filesystem {
            message: format!("Failed to write '{}': {}", manifest_path.display(), e),
        })?;
        Ok(manifest)
    }

    /// Every readable backup, oldest first.
    pub fn list(&self) -> Result<Vec<BackupManifest>> {
        let read_dir = match fs::read_dir(&self.host_dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::access(&self.host_dir, &e)),
        };

        let mut manifests = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| Error::access(&self.host_dir, &e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(BACKUP_PREFIX) || !entry.path().is_dir() {
                continue;
            }
            match self.load(&name) {
                Ok(manifest) => manifests.push(manifest),
                Err(e) => warn!("Ignoring backup {}: {}", name, e),
            }
        }
        manifests.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(manifests)
    }

    pub fn latest(&self) -> Result<Option<BackupManifest>> {
        Ok(self.list()?.pop())
    }

    pub fn load(&self, id: &str) -> Result<BackupManifest> {
        let dir = self.host_dir.join(id);
        let manifest_path = dir.join(MANIFEST_FILE);
        let content = match fs::read_to_string(&manifest_path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::BackupNotFound {
                    host: self.host.clone(),
                    id: id.to_string(),
                })
            }
            Err(e) => return Err(Error::access(&manifest_path, &e)),
        };
        BackupManifest::parse(id, dir, &content)
    }

    /// Put every successfully backed-up entry of `id` back in place.
    ///
    /// Each live target is removed before the copy. A failing entry does not
    /// stop the others; failures surface as [`Error::RestorePartial`] after
    /// the whole manifest has been processed.
    pub fn restore(&self, id: &str, confirm: &dyn Confirm) -> Result<RestoreReport> {
        let manifest = self.load(id)?;
        let mut report = RestoreReport {
            id: manifest.id.clone(),
            ..RestoreReport::default()
        };

        if !confirm.confirm(&format!(
            "Restore {} entr(ies) from {}?",
            manifest.entries.len(),
            manifest.id
        )) {
            info!("Rollback from {} declined", manifest.id);
            report.declined = true;
            return Ok(report);
        }

        let mut failed = Vec::new();
        for entry in &manifest.entries {
            if !entry.is_ok() {
                warn!("Not restoring {}: its backup failed", entry.path);
                report.skipped.push(entry.path.clone());
                continue;
            }
            let source = backup_location(&manifest.dir, &entry.path);
            let live = self.live_location(&entry.path);
            let result = filesystem::remove_entry(&live)
                .and_then(|_| filesystem::copy_entry(&source, &live));
            match result {
                Ok(_) => {
                    info!("Restored {}", live.display());
                    report.restored.push(entry.path.clone());
                }
                Err(e) => {
                    warn!("Restoring {} failed: {}", live.display(), e);
                    failed.push((entry.path.clone(), e.to_string()));
                }
            }
        }

        if failed.is_empty() {
            Ok(report)
        } else {
            Err(Error::RestorePartial {
                id: report.id,
                restored: report.restored,
                failed,
            })
        }
    }

    fn create_backup_dir(&self, stamp: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.host_dir).map_err(|e| Error::Filesystem {
            message: format!("Failed to create '{}': {}", self.host_dir.display(), e),
        })?;
        let mut attempt = 0;
        loop {
            let name = if attempt == 0 {
                format!("{}{}", BACKUP_PREFIX, stamp)
            } else {
                format!("{}{}_{}", BACKUP_PREFIX, stamp, attempt)
            };
            let dir = self.host_dir.join(name);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok(dir),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => {
                    return Err(Error::Filesystem {
                        message: format!("Failed to create '{}': {}", dir.display(), e),
                    })
                }
            }
        }
    }

    /// Manifest key of a live path.
    fn entry_key(&self, live: &Path) -> String {
        match live.strip_prefix(&self.live_root) {
            Ok(relative) => crate::path::to_forward_slashes(&relative.to_string_lossy()),
            Err(_) => crate::path::to_forward_slashes(&live.to_string_lossy()),
        }
    }

    fn live_location(&self, key: &str) -> PathBuf {
        if key.starts_with('/') {
            PathBuf::from(key)
        } else {
            self.live_root.join(key)
        }
    }
}

fn backup_location(dir: &Path, key: &str) -> PathBuf {
    match key.strip_prefix('/') {
        Some(absolute) => dir.join(ABSOLUTE_DIR).join(absolute),
        None => dir.join(key),
    }
}

fn backup_kind(kind: EntryKind) -> BackupKind {
    match kind {
        EntryKind::Dir => BackupKind::Dir,
        _ => BackupKind::File,
    }
}
