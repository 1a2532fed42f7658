//! # Error Handling
//!
//! This module defines the centralized error type for `homesync`. It uses the
//! `thiserror` library to derive a single `Error` enum covering every failure
//! mode of a reconciliation pass, and a `Result<T>` alias used throughout the
//! library.
//!
//! ## Propagation policy
//!
//! - Configuration I/O (`ConfigNotFound`, `ConfigCorrupt`, `ConfigWrite`) is
//!   fatal and aborts the whole run.
//! - `PathAccess` describes a per-path scan failure. Scanners record it in
//!   their report and keep going; it only surfaces as an `Err` from helpers
//!   that operate on a single path.
//! - `MigrationAbort` is fatal to a reorganization batch but not to the
//!   process. It carries the completed and failed items so the caller can
//!   decide whether to retry, roll back or stop.
//! - `BackupPartial` and `RestorePartial` are raised after the whole batch has
//!   been attempted, so partial work is always auditable.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for homesync operations
#[derive(Error, Debug)]
pub enum Error {
    /// The rule document does not exist.
    #[error("Configuration not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// The rule document exists but is not a `bucket -> [path]` mapping.
    #[error("Configuration is corrupt: {}: {message}", path.display())]
    ConfigCorrupt { path: PathBuf, message: String },

    /// The rule document could not be persisted.
    #[error("Failed to write configuration {}: {message}", path.display())]
    ConfigWrite { path: PathBuf, message: String },

    /// A single path could not be inspected.
    #[error("Cannot access {}: {message}", path.display())]
    PathAccess { path: PathBuf, message: String },

    /// A reorganization batch stopped at its first failure.
    ///
    /// `completed` lists the paths migrated before the failure, `failed`
    /// lists `(path, reason)` pairs. Completed migrations are left in place.
    #[error("Migration aborted after {} completed item(s): {}", completed.len(), format_failures(failed))]
    MigrationAbort {
        completed: Vec<String>,
        failed: Vec<(String, String)>,
    },

    /// A snapshot was written but at least one entry could not be copied.
    #[error("Backup {id} is partial: {}", format_failures(failed))]
    BackupPartial {
        id: String,
        failed: Vec<(String, String)>,
    },

    /// A rollback finished but at least one entry could not be restored.
    #[error("Restore from {id} is partial ({} restored): {}", restored.len(), format_failures(failed))]
    RestorePartial {
        id: String,
        restored: Vec<String>,
        failed: Vec<(String, String)>,
    },

    /// The requested backup does not exist for the host.
    #[error("No backup {id} found for host {host}")]
    BackupNotFound { host: String, id: String },

    /// A filesystem mutation failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

fn format_failures(failed: &[(String, String)]) -> String {
    failed
        .iter()
        .map(|(path, reason)| format!("{} ({})", path, reason))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Build a `PathAccess` error from an I/O failure on `path`.
    pub fn access(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Error::PathAccess {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config_not_found() {
        let error = Error::ConfigNotFound {
            path: PathBuf::from("/tmp/rules.yaml"),
        };
        let display = format!("{}", error);
        assert!(display.contains("Configuration not found"));
        assert!(display.contains("/tmp/rules.yaml"));
    }

    #[test]
    fn test_error_display_config_corrupt() {
        let error = Error::ConfigCorrupt {
            path: PathBuf::from("rules.json"),
            message: "expected a mapping".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("corrupt"));
        assert!(display.contains("expected a mapping"));
    }

    #[test]
    fn test_error_display_migration_abort() {
        let error = Error::MigrationAbort {
            completed: vec![".config/a".to_string()],
            failed: vec![(".config/b".to_string(), "permission denied".to_string())],
        };
        let display = format!("{}", error);
        assert!(display.contains("1 completed"));
        assert!(display.contains(".config/b (permission denied)"));
    }

    #[test]
    fn test_error_display_restore_partial() {
        let error = Error::RestorePartial {
            id: "backup_20260101_120000".to_string(),
            restored: vec![".bashrc".to_string(), ".vimrc".to_string()],
            failed: vec![(".zshrc".to_string(), "read-only".to_string())],
        };
        let display = format!("{}", error);
        assert!(display.contains("backup_20260101_120000"));
        assert!(display.contains("2 restored"));
        assert!(display.contains(".zshrc (read-only)"));
    }

    #[test]
    fn test_error_access_helper() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = Error::access("/root/.ssh", &io_error);
        match error {
            Error::PathAccess { path, message } => {
                assert_eq!(path, PathBuf::from("/root/.ssh"));
                assert!(message.contains("denied"));
            }
            other => panic!("Expected PathAccess, got {:?}", other),
        }
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(format!("{}", error).contains("YAML parsing error"));
    }
}
