//! Integration tests for a full reconciliation pass through the library:
//! rules, inventory, detection, migration and backup working together on a
//! real temporary filesystem.

mod common;

use common::prelude::*;
use std::fs;

use homesync::backup::BackupStore;
use homesync::config::{ConfigStore, DocumentFormat};
use homesync::confirm::Unattended;
use homesync::deploy::DeployPlanner;
use homesync::detector::{ConflictCategory, ConflictDetector};
use homesync::error::Error;
use homesync::inventory::{Inventory, Provenance};
use homesync::layout::Layout;
use homesync::precedence::{PrecedenceResolver, Reason};
use homesync::reorganize::Reorganizer;

fn load(fixture: &TestFixture) -> homesync::config::RuleSet {
    ConfigStore::new(fixture.repo().join("homesync.yaml"))
        .load()
        .unwrap()
}

#[test]
fn test_precedence_scenario_from_document() {
    let fixture = TestFixture::new().with_rules(configs::NOTES);
    let rules = load(&fixture);
    let resolver = PrecedenceResolver::new(&rules);

    let explicit = resolver.classify("notes/drafts/secret.md", common::HOST);
    assert!(explicit.include);
    assert_eq!(explicit.reason, Reason::ExplicitHost);

    let excluded = resolver.classify("notes/drafts/other.md", common::HOST);
    assert!(!excluded.include);
    assert_eq!(excluded.reason, Reason::Excluded);

    let shared = resolver.classify("notes/readme.md", common::HOST);
    assert!(shared.include);
    assert_eq!(shared.reason, Reason::DefaultShared);
}

#[test]
#[cfg(unix)]
fn test_conflict_cleared_by_backup_and_symlink() {
    let fixture = TestFixture::new()
        .with_rules("shared: [.bashrc]\n")
        .with_repo_file("common", ".bashrc", "from repo")
        .with_live_file(".bashrc", "local edits");
    let rules = load(&fixture);
    let layout = Layout::new(fixture.repo(), fixture.home());
    let inventory = Inventory::new(&rules, common::HOST, false);
    let resolver = PrecedenceResolver::new(&rules);
    let detector = ConflictDetector::new(&inventory, &resolver, &layout);
    let backups = BackupStore::new(fixture.backups(), common::HOST, fixture.home());
    let planner = DeployPlanner::new(&detector, &layout, common::HOST, &backups, &Unattended);

    let plan = planner.plan().unwrap();
    assert_eq!(plan.conflicts.len(), 1);
    assert_eq!(plan.conflicts[0].record.provenance, Provenance::Shared);

    let prepared = planner.prepare(&plan).unwrap();
    let manifest = prepared.manifest.unwrap();
    assert!(manifest.is_complete());
    assert_eq!(
        fs::read_to_string(manifest.dir.join(".bashrc")).unwrap(),
        "local edits"
    );

    fixture.deploy("common", ".bashrc");
    assert!(detector.deployment_conflicts().is_clear());
    assert!(detector.validate().is_clean());

    // rolling back puts the local edits back in place of the symlink
    backups.restore(&manifest.id, &Unattended).unwrap();
    assert_eq!(
        fs::read_to_string(fixture.home().join(".bashrc")).unwrap(),
        "local edits"
    );
    assert_eq!(
        detector.validate().records[0].category,
        ConflictCategory::MissingSymlink
    );
}

#[test]
fn test_every_path_gets_one_category() {
    let fixture = TestFixture::new()
        .with_rules(
            r#"
shared: [.a, .b, .c, .cache/x]
exclude: [".cache/**"]
desk: [.d]
"#,
        )
        .with_live_file(".a", "live only")
        .with_repo_file("common", ".b", "repo only")
        .with_repo_file("desk", ".d", "host");
    let rules = load(&fixture);
    let layout = Layout::new(fixture.repo(), fixture.home());
    let inventory = Inventory::new(&rules, common::HOST, false);
    let resolver = PrecedenceResolver::new(&rules);
    let report = ConflictDetector::new(&inventory, &resolver, &layout).validate();

    assert_eq!(report.scanned, inventory.len());
    let total: usize = ConflictCategory::ALL.iter().map(|c| report.count(*c)).sum();
    assert_eq!(total + report.healthy(), inventory.len());
    assert_eq!(report.count(ConflictCategory::MissingInRepo), 1);
    assert_eq!(report.count(ConflictCategory::MissingSymlink), 2);
    assert_eq!(report.count(ConflictCategory::MissingEverywhere), 1);
    assert_eq!(report.count(ConflictCategory::OrphanedConfig), 1);
}

#[test]
fn test_migration_moves_host_file_and_keeps_siblings() {
    let fixture = TestFixture::new()
        .with_rules(configs::BASIC)
        .with_repo_file("common", ".config/nvim/init.lua", "shared")
        .with_repo_file("common", ".config/nvim/local.lua", "desk only");
    let rules = load(&fixture);
    let layout = Layout::new(fixture.repo(), fixture.home());
    let resolver = PrecedenceResolver::new(&rules);

    let report = Reorganizer::new(&resolver, &layout, common::HOST, &Unattended)
        .reorganize()
        .unwrap();

    assert!(report.repo_modified);
    assert_eq!(report.migrated.len(), 1);
    assert_eq!(report.migrated[0].host, common::HOST);
    assert_eq!(
        fs::read_to_string(fixture.repo_file("desk", ".config/nvim/local.lua")).unwrap(),
        "desk only"
    );
    assert!(!fixture.repo_file("common", ".config/nvim/local.lua").exists());
    assert!(fixture.repo_file("common", ".config/nvim/init.lua").exists());
}

#[test]
fn test_aborted_migration_leaves_failed_source_untouched() {
    // the host package holds a file where a directory is needed
    let fixture = TestFixture::new()
        .with_rules(
            r#"
shared: [.config/]
desk: [.config/a.conf, .config/b.conf]
"#,
        )
        .with_repo_file("common", ".config/a.conf", "a")
        .with_repo_file("common", ".config/b.conf", "b")
        .with_repo_file("desk", ".config", "blocking file");

    let rules = load(&fixture);
    let layout = Layout::new(fixture.repo(), fixture.home());
    let resolver = PrecedenceResolver::new(&rules);
    let result = Reorganizer::new(&resolver, &layout, common::HOST, &Unattended).reorganize();

    match result {
        Err(Error::MigrationAbort { completed, failed }) => {
            assert!(completed.is_empty());
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].0, ".config/a.conf");
            for (path, _) in &failed {
                assert_eq!(
                    fs::read_to_string(fixture.repo_file("common", path)).unwrap(),
                    "a"
                );
            }
        }
        other => panic!("expected MigrationAbort, got {:?}", other),
    }
    assert!(fixture.repo_file("common", ".config/b.conf").exists());
    assert!(fixture.repo_file("desk", ".config").is_file());
}

#[test]
fn test_other_hosts_excluded_overlap_stays_shared() {
    let fixture = TestFixture::new()
        .with_rules(
            r#"
shared: [.config/]
exclude: [".config/secret/**"]
laptop: [.config/secret/key]
"#,
        )
        .with_repo_file("common", ".config/secret/key", "laptop key");
    let rules = load(&fixture);
    let layout = Layout::new(fixture.repo(), fixture.home());
    let resolver = PrecedenceResolver::new(&rules);

    let report = Reorganizer::new(&resolver, &layout, common::HOST, &Unattended)
        .reorganize()
        .unwrap();

    assert!(report.migrated.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].host, "laptop");
    assert!(!report.repo_modified);
    assert!(fixture.repo_file("common", ".config/secret/key").exists());
    assert!(!fixture.repo_file("laptop", ".config/secret/key").exists());
}

#[test]
fn test_json_rules_round_trip_through_store() {
    let fixture = TestFixture::new();
    let path = fixture.repo().join("config.json");
    fs::write(
        &path,
        r#"{"common": [".bashrc"], "ignore": [".cache/**"], "desk": [".xprofile"]}"#,
    )
    .unwrap();

    let store = ConfigStore::new(&path);
    assert_eq!(store.format(), DocumentFormat::Json);
    let rules = store.load().unwrap();
    assert_eq!(rules.shared(), [".bashrc".to_string()]);
    assert_eq!(rules.exclude(), [".cache/**".to_string()]);

    store.save(&rules).unwrap();
    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.contains("\"shared\""));
    assert!(!saved.contains("\"common\""));
    assert_eq!(store.load().unwrap(), rules);
}
