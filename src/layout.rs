//! Mapping between managed paths and their repository / live-tree locations.
//!
//! ```text
//! <repo>/common/home/<path>          shared records
//! <repo>/<host>/home/<path>          host records
//! <repo>/system_configs/<path>       system records
//! ```
//!
//! Shared and host records live at `<home>/<path>`, system records at
//! `<system_root>/<path>`. The top-level repository directories (`common`,
//! `<host>`) are the packages handed to the symlink deployment tool.

use std::path::{Path, PathBuf};

use crate::inventory::{ManagedPathRecord, Provenance};

/// Repository directory holding shared content.
pub const SHARED_PACKAGE: &str = "common";
/// Repository directory holding system content.
pub const SYSTEM_PACKAGE: &str = "system_configs";
/// Subdirectory of a package that mirrors the live tree.
pub const HOME_DIR: &str = "home";

/// Resolves repository and live-tree locations.
#[derive(Debug, Clone)]
pub struct Layout {
    repo_root: PathBuf,
    live_root: PathBuf,
    system_root: PathBuf,
}

impl Layout {
    pub fn new(repo_root: impl Into<PathBuf>, live_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            live_root: live_root.into(),
            system_root: PathBuf::from("/"),
        }
    }

    /// Override where system records live (tests use a temporary root).
    pub fn with_system_root(mut self, system_root: impl Into<PathBuf>) -> Self {
        self.system_root = system_root.into();
        self
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn live_root(&self) -> &Path {
        &self.live_root
    }

    /// Name of the repository package for a provenance.
    pub fn package_name(provenance: &Provenance) -> &str {
        match provenance {
            Provenance::Shared => SHARED_PACKAGE,
            Provenance::System => SYSTEM_PACKAGE,
            Provenance::Host(host) => host,
        }
    }

    /// Root directory of a package inside the repository.
    pub fn package_dir(&self, provenance: &Provenance) -> PathBuf {
        self.repo_root.join(Self::package_name(provenance))
    }

    /// Directory of a package that mirrors the live tree.
    pub fn content_root(&self, provenance: &Provenance) -> PathBuf {
        match provenance {
            Provenance::System => self.package_dir(provenance),
            _ => self.package_dir(provenance).join(HOME_DIR),
        }
    }

    /// Expected repository location of `normalized` for `provenance`.
    pub fn repo_path(&self, provenance: &Provenance, normalized: &str) -> PathBuf {
        join_relative(&self.content_root(provenance), normalized)
    }

    /// Live location of `normalized` for `provenance`.
    pub fn live_path(&self, provenance: &Provenance, normalized: &str) -> PathBuf {
        match provenance {
            Provenance::System => join_relative(&self.system_root, normalized),
            _ => join_relative(&self.live_root, normalized),
        }
    }

    pub fn record_repo_path(&self, record: &ManagedPathRecord) -> PathBuf {
        self.repo_path(&record.provenance, &record.normalized)
    }

    pub fn record_live_path(&self, record: &ManagedPathRecord) -> PathBuf {
        self.live_path(&record.provenance, &record.normalized)
    }
}

/// Join a `/`-separated relative path without letting a leading `/` or a
/// trailing separator escape or alter `base`.
fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |acc, segment| acc.join(segment))
}
