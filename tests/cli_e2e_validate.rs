//! End-to-end tests for the `validate` and `status` commands.
//!
//! These tests invoke the actual CLI binary against a temporary repository
//! and live tree.

mod common;

use common::prelude::*;

#[test]
fn test_validate_reports_categories() {
    let fixture = TestFixture::new()
        .with_rules(configs::BASIC)
        .with_repo_file("common", ".bashrc", "export EDITOR=vi")
        .with_live_file(".config/nvim/init.lua", "-- local only");

    fixture
        .command()
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("[SCAN] Validating managed paths for desk"))
        .stdout(predicate::str::contains(".bashrc [shared]"))
        .stdout(predicate::str::contains(".config/nvim/ [shared]"))
        .stderr(predicate::str::contains("Validation found 3 issue(s)"));
}

#[test]
#[cfg(unix)]
fn test_validate_clean_when_everything_is_linked() {
    let fixture = TestFixture::new()
        .with_rules("shared: [.bashrc]\ndesk: [.xprofile]\n")
        .with_repo_file("common", ".bashrc", "shared")
        .with_repo_file("desk", ".xprofile", "desk");
    fixture.deploy("common", ".bashrc");
    fixture.deploy("desk", ".xprofile");

    fixture
        .command()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 path(s) checked, 2 healthy, 0 issue(s)"))
        .stdout(predicate::str::contains("[OK] Everything is in place"));
}

#[test]
fn test_validate_missing_rules_fails() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot load rules"));
}

#[test]
fn test_validate_corrupt_rules_fails() {
    let fixture = TestFixture::new().with_rules("shared: [unclosed\n");

    fixture
        .command()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("homesync.yaml"));
}

#[test]
fn test_explicit_config_path() {
    let fixture = TestFixture::new();
    let config = fixture.path().join("rules.json");
    std::fs::write(&config, r#"{"shared": [], "exclude": []}"#).unwrap();

    fixture
        .command()
        .arg("validate")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 path(s) checked"));
}

#[test]
fn test_status_summarizes_buckets() {
    let fixture = TestFixture::new().with_rules(
        r#"
shared: [.config/, .bashrc]
exclude: [".cache/**"]
desk: [.config/kitty/kitty.conf]
laptop: [.zshrc]
"#,
    );

    fixture
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Host:       desk"))
        .stdout(predicate::str::contains("desk: 1 (this host)"))
        .stdout(predicate::str::contains("laptop: 1"))
        .stdout(predicate::str::contains("Managed paths: 3"))
        .stdout(predicate::str::contains(
            "1 host path(s) inside shared directories",
        ));
}

#[test]
fn test_host_from_environment() {
    let fixture = TestFixture::new().with_rules("shared: []\nlaptop: [.zshrc]\n");

    // --host on the command line wins over the environment
    fixture
        .command()
        .env("HOMESYNC_HOST", "laptop")
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Host:       desk"));
}
