//! Shared test utilities for integration and E2E tests.
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_rules(configs::BASIC);
//!     fixture.command().arg("status").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    pub use super::TestFixture;
}

/// Rule documents used across tests.
#[allow(dead_code)]
pub mod configs {
    /// Shared files plus one host-specific override.
    pub const BASIC: &str = r#"
shared:
  - .bashrc
  - .config/nvim/
exclude:
  - ".cache/**"
desk:
  - .config/nvim/local.lua
"#;

    /// The precedence scenario from the docs.
    pub const NOTES: &str = r#"
shared: ["notes/"]
exclude: ["notes/drafts/**"]
desk: ["notes/drafts/secret.md"]
"#;
}

/// The host every fixture command runs as.
pub const HOST: &str = "desk";

/// A temporary repository, live home directory and backup root.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("repo")
            .create_dir_all()
            .expect("Failed to create repo");
        temp_dir
            .child("home")
            .create_dir_all()
            .expect("Failed to create home");
        Self { temp_dir }
    }

    /// Write `homesync.yaml` into the repository.
    pub fn with_rules(self, content: &str) -> Self {
        self.temp_dir
            .child("repo/homesync.yaml")
            .write_str(content)
            .expect("Failed to write rules");
        self
    }

    /// Write a file under `<repo>/<package>/home/`.
    pub fn with_repo_file(self, package: &str, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(format!("repo/{}/home/{}", package, path))
            .write_str(content)
            .expect("Failed to write repo file");
        self
    }

    /// Write a file into the live home directory.
    pub fn with_live_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(format!("home/{}", path))
            .write_str(content)
            .expect("Failed to write live file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn repo(&self) -> PathBuf {
        self.temp_dir.path().join("repo")
    }

    pub fn home(&self) -> PathBuf {
        self.temp_dir.path().join("home")
    }

    pub fn backups(&self) -> PathBuf {
        self.temp_dir.path().join("backups")
    }

    pub fn repo_file(&self, package: &str, path: &str) -> PathBuf {
        self.repo().join(package).join("home").join(path)
    }

    /// Symlink a live path to its repository copy.
    #[cfg(unix)]
    pub fn deploy(&self, package: &str, path: &str) {
        let live = self.home().join(path);
        std::fs::create_dir_all(live.parent().expect("live path has a parent"))
            .expect("Failed to create live parent");
        std::os::unix::fs::symlink(self.repo_file(package, path), live)
            .expect("Failed to create symlink");
    }

    /// The binary, pointed at this fixture, without colors or prompts.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("homesync");
        for var in [
            "HOMESYNC_REPO",
            "HOMESYNC_CONFIG",
            "HOMESYNC_HOME",
            "HOMESYNC_HOST",
            "HOMESYNC_BACKUP_ROOT",
            "HOMESYNC_SYSTEM_ROOT",
            "RUST_LOG",
        ] {
            cmd.env_remove(var);
        }
        cmd.arg("--color")
            .arg("never")
            .arg("--repo")
            .arg(self.repo())
            .arg("--home")
            .arg(self.home())
            .arg("--host")
            .arg(HOST)
            .arg("--backup-root")
            .arg(self.backups());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
