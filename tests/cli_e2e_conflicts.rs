//! End-to-end tests for deployment preparation and rollback: `conflicts`,
//! `backups` and `rollback`.

mod common;

use common::prelude::*;
use std::fs;

fn fixture_with_conflict() -> TestFixture {
    TestFixture::new()
        .with_rules("shared: [.bashrc, .vimrc]\ndesk: [.xprofile]\n")
        .with_repo_file("common", ".bashrc", "from repo")
        .with_repo_file("common", ".vimrc", "from repo")
        .with_repo_file("desk", ".xprofile", "desk")
        .with_live_file(".bashrc", "local edits")
}

#[test]
fn test_conflicts_lists_blocking_entries() {
    let fixture = fixture_with_conflict();

    fixture
        .command()
        .arg("conflicts")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 deployment conflict(s)"))
        .stdout(predicate::str::contains(".bashrc [shared]"))
        .stdout(predicate::str::contains("Ready packages: desk"))
        .stdout(predicate::str::contains("Blocked packages: common"));

    // listing never touches the live tree
    assert_eq!(
        fs::read_to_string(fixture.home().join(".bashrc")).unwrap(),
        "local edits"
    );
}

#[test]
fn test_conflicts_prepare_dry_run_changes_nothing() {
    let fixture = fixture_with_conflict();

    fixture
        .command()
        .args(["conflicts", "--prepare", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would remove"));

    assert!(fixture.home().join(".bashrc").exists());
    assert!(!fixture.backups().exists());
}

#[test]
fn test_prepare_then_rollback() {
    let fixture = fixture_with_conflict();

    fixture
        .command()
        .args(["conflicts", "--prepare", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[BACKUP] Backup backup_"))
        .stdout(predicate::str::contains("Removed"))
        .stdout(predicate::str::contains("Ready packages: common, desk"));
    assert!(!fixture.home().join(".bashrc").exists());

    fixture
        .command()
        .args(["backups", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 backup(s) for desk"))
        .stdout(predicate::str::contains("FILE: .bashrc"));

    fixture
        .command()
        .args(["rollback", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored 1 entr(ies)"));
    assert_eq!(
        fs::read_to_string(fixture.home().join(".bashrc")).unwrap(),
        "local edits"
    );
}

#[test]
fn test_backups_empty() {
    let fixture = fixture_with_conflict();

    fixture
        .command()
        .arg("backups")
        .assert()
        .success()
        .stdout(predicate::str::contains("No backups for desk"));
}

#[test]
fn test_rollback_without_backups_fails() {
    let fixture = fixture_with_conflict();

    fixture
        .command()
        .args(["rollback", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No backups available for desk"));
}

#[test]
fn test_rollback_unknown_id_fails() {
    let fixture = fixture_with_conflict();

    fixture
        .command()
        .args(["rollback", "backup_19700101_000000", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("backup_19700101_000000"));
}
