//! Default values for homesync settings.
//!
//! Every default here can be overridden by a CLI flag or its environment
//! variable (`HOMESYNC_REPO`, `HOMESYNC_CONFIG`, `HOMESYNC_HOME`,
//! `HOMESYNC_HOST`, `HOMESYNC_BACKUP_ROOT`).

use std::fs;
use std::path::{Path, PathBuf};

/// Name of the rule document inside the repository.
pub const DEFAULT_CONFIG_FILENAME: &str = "homesync.yaml";

/// Name of the backup root directory under the home directory.
pub const BACKUP_DIRNAME: &str = ".homesync-backups";

/// Host identifier used when the machine name cannot be determined.
pub const FALLBACK_HOST: &str = "localhost";

/// The user's home directory, or the current directory as a last resort.
pub fn default_home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Backup root: `~/.homesync-backups`.
pub fn default_backup_root() -> PathBuf {
    default_home().join(BACKUP_DIRNAME)
}

/// Rule document of a repository.
pub fn default_config_path(repo: &Path) -> PathBuf {
    repo.join(DEFAULT_CONFIG_FILENAME)
}

/// The machine name from `/etc/hostname`, falling back to `localhost`.
pub fn default_host() -> String {
    host_from_file(Path::new("/etc/hostname")).unwrap_or_else(|| FALLBACK_HOST.to_string())
}

fn host_from_file(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let host = content.lines().next()?.trim();
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}
