//! # Managed-Path Inventory
//!
//! Expands the rule document into one [`ManagedPathRecord`] per declared
//! path of the `shared` bucket, the active host's bucket and (optionally) the
//! `system` bucket. Expansion is pure: no filesystem access happens here.
//!
//! A shared entry equal to the empty string is a sentinel meaning "the shared
//! bucket claims the whole live tree". It still produces a record, so the
//! record count always equals the number of declared paths, but it is not a
//! concrete path: the lookup helpers and the detectors skip it.

use std::fmt;

use crate::config::RuleSet;
use crate::path::{is_within, normalize, trim_dir};

/// Which bucket a managed path came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Provenance {
    Shared,
    System,
    Host(String),
}

impl Provenance {
    pub fn is_host(&self) -> bool {
        matches!(self, Provenance::Host(_))
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Shared => f.write_str("shared"),
            Provenance::System => f.write_str("system"),
            Provenance::Host(host) => f.write_str(host),
        }
    }
}

/// A path the system is responsible for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedPathRecord {
    /// The path as written in the document
    pub declared: String,
    /// Relative to the live-tree root, or to `/` for system records
    pub normalized: String,
    pub provenance: Provenance,
}

impl ManagedPathRecord {
    fn new(declared: &str, provenance: Provenance) -> Self {
        let mut normalized = normalize(declared);
        if provenance == Provenance::System {
            normalized = normalized.trim_start_matches('/').to_string();
        }
        Self {
            declared: declared.to_string(),
            normalized,
            provenance,
        }
    }

    /// Whether this is the empty shared sentinel.
    pub fn is_whole_tree(&self) -> bool {
        self.provenance == Provenance::Shared && self.declared.is_empty()
    }
}

/// The expanded set of managed paths for one host.
#[derive(Debug, Clone)]
pub struct Inventory {
    host: String,
    records: Vec<ManagedPathRecord>,
}

/// Expand `rules` into managed-path records for `host`.
pub fn expand(rules: &RuleSet, host: &str, include_system: bool) -> Vec<ManagedPathRecord> {
    let shared = rules
        .shared()
        .iter()
        .map(|p| ManagedPathRecord::new(p, Provenance::Shared));
    let hosted = rules
        .host(host)
        .iter()
        .map(|p| ManagedPathRecord::new(p, Provenance::Host(host.to_string())));
    let system = rules
        .system()
        .iter()
        .filter(|_| include_system)
        .map(|p| ManagedPathRecord::new(p, Provenance::System));

    shared.chain(hosted).chain(system).collect()
}

impl Inventory {
    pub fn new(rules: &RuleSet, host: &str, include_system: bool) -> Self {
        Self {
            host: host.to_string(),
            records: expand(rules, host, include_system),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn records(&self) -> &[ManagedPathRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records that name a concrete path.
    pub fn concrete(&self) -> impl Iterator<Item = &ManagedPathRecord> {
        self.records.iter().filter(|r| !r.is_whole_tree())
    }

    /// Whether the shared bucket carries the whole-tree sentinel.
    pub fn claims_entire_tree(&self) -> bool {
        self.records.iter().any(ManagedPathRecord::is_whole_tree)
    }

    /// Whether `path` is declared exactly by some bucket.
    pub fn is_managed(&self, path: &str) -> bool {
        self.exact(path).next().is_some()
    }

    /// Provenance of the record declaring `path`, preferring the active host.
    pub fn source_of(&self, path: &str) -> Option<&Provenance> {
        let mut candidates = self.exact(path).map(|r| &r.provenance);
        let first = candidates.next()?;
        if first.is_host() {
            return Some(first);
        }
        Some(candidates.find(|p| p.is_host()).unwrap_or(first))
    }

    /// The most specific record whose path is `path` or one of its ancestors.
    ///
    /// Longest normalized path wins; on equal length the active host's record
    /// is preferred over shared, then declaration order decides.
    pub fn find_enclosing(&self, path: &str) -> Option<&ManagedPathRecord> {
        let path = normalize(path);
        let mut best: Option<&ManagedPathRecord> = None;
        for record in self.concrete() {
            if !is_within(&path, &record.normalized) {
                continue;
            }
            best = match best {
                None => Some(record),
                Some(current) => {
                    let len = trim_dir(&record.normalized).len();
                    let current_len = trim_dir(&current.normalized).len();
                    if len > current_len
                        || (len == current_len
                            && record.provenance.is_host()
                            && !current.provenance.is_host())
                    {
                        Some(record)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best
    }

    fn exact<'s>(&'s self, path: &str) -> impl Iterator<Item = &'s ManagedPathRecord> + 's {
        let wanted = trim_dir(&normalize(path)).to_string();
        self.concrete()
            .filter(move |r| trim_dir(&r.normalized) == wanted)
    }
}
