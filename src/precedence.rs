//! # Precedence Resolver
//!
//! Combines the three rule sources into a single decision per path. The
//! order is fixed and short-circuits on the first hit:
//!
//! 1. **Explicit host inclusion**: the path equals, or lies under a
//!    directory rule (trailing `/`) of, the host's own bucket.
//! 2. **Exclusion**: the path matches a pattern of the `exclude` bucket.
//! 3. **Default**: everything else is included as shared content.
//!
//! A host rule therefore always wins over an exclusion, and an exclusion
//! always wins over the shared default.

use log::debug;
use std::fmt;

use crate::config::RuleSet;
use crate::matcher::PatternSet;
use crate::path::{is_dir_rule, is_strictly_within, normalize, trim_dir};

/// Why a path was included or excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    ExplicitHost,
    Excluded,
    DefaultShared,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::ExplicitHost => "explicitly included by host",
            Reason::Excluded => "matches an exclusion pattern",
            Reason::DefaultShared => "included by shared default",
        };
        f.write_str(text)
    }
}

/// Result of [`PrecedenceResolver::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub include: bool,
    pub reason: Reason,
}

impl Classification {
    const fn new(include: bool, reason: Reason) -> Self {
        Self { include, reason }
    }
}

/// Applies host > exclude > shared precedence over a rule set.
#[derive(Debug, Clone)]
pub struct PrecedenceResolver<'a> {
    rules: &'a RuleSet,
    exclusions: PatternSet,
}

impl<'a> PrecedenceResolver<'a> {
    /// Build a resolver, compiling the exclusion patterns once.
    pub fn new(rules: &'a RuleSet) -> Self {
        Self {
            rules,
            exclusions: PatternSet::new(rules.exclude()),
        }
    }

    pub fn rules(&self) -> &'a RuleSet {
        self.rules
    }

    /// Classify `path` for `host`.
    pub fn classify(&self, path: &str, host: &str) -> Classification {
        if self.is_explicitly_included(path, host) {
            return Classification::new(true, Reason::ExplicitHost);
        }
        if self.is_excluded(path) {
            return Classification::new(false, Reason::Excluded);
        }
        Classification::new(true, Reason::DefaultShared)
    }

    /// Whether `host` declares `path` itself or a directory containing it.
    pub fn is_explicitly_included(&self, path: &str, host: &str) -> bool {
        let normalized = normalize(path);
        let hit = self.rules.host(host).iter().find(|declared| {
            let declared = normalize(declared);
            trim_dir(&declared) == trim_dir(&normalized)
                || (is_dir_rule(&declared) && is_strictly_within(&normalized, &declared))
        });
        if let Some(declared) = hit {
            debug!("{} is explicitly included by {} via '{}'", normalized, host, declared);
        }
        hit.is_some()
    }

    /// Whether `host` declares something strictly beneath `path`.
    pub fn has_explicit_descendant(&self, path: &str, host: &str) -> bool {
        let normalized = normalize(path);
        self.rules
            .host(host)
            .iter()
            .any(|declared| is_strictly_within(&normalize(declared), &normalized))
    }

    /// Whether `path` matches any exclusion pattern.
    ///
    /// A directory path is tried as written and without its trailing `/`, so
    /// `.cache/` is excluded by `.cache` just like the bare `.cache` is.
    pub fn is_excluded(&self, path: &str) -> bool {
        let normalized = normalize(path);
        let bare = trim_dir(&normalized);
        let hit = self.exclusions.first_match(&normalized).or_else(|| {
            (bare.len() < normalized.len())
                .then(|| self.exclusions.first_match(bare))
                .flatten()
        });
        match hit {
            Some(pattern) => {
                debug!("{} matches exclusion pattern '{}'", normalized, pattern);
                true
            }
            None => false,
        }
    }

    /// The compiled exclusion patterns.
    pub fn exclusions(&self) -> &PatternSet {
        &self.exclusions
    }
}
