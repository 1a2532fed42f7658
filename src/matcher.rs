//! # Exclusion Pattern Matching
//!
//! Decides whether a path matches a glob-style pattern from the `exclude`
//! bucket.
//!
//! - Patterns without `**` use single-level glob semantics: `*` never crosses
//!   a `/`.
//! - Patterns with `**` are turned into anchored regular expressions where
//!   `**` matches any run of characters (separators included) and `*` any
//!   run of non-separator characters. A leading `**/` or trailing `/**` also
//!   yields a derived pattern without it, so `**/b/c` matches `b/c` and
//!   `a/**` matches `a`.
//!
//! Matching never fails: a pattern that cannot be compiled falls back to
//! glob semantics, and a pattern that is not even a valid glob falls back to
//! literal comparison.
//!
//! Patterns are compiled once into [`CompiledPattern`] values. A
//! [`PatternSet`] holds the compiled form of every distinct pattern of a
//! bucket, keyed by pattern string.

use glob::{MatchOptions, Pattern};
use log::debug;
use regex::Regex;
use std::collections::HashMap;

use crate::path::to_forward_slashes;

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// One concrete way of matching a pattern string.
#[derive(Debug, Clone)]
enum Strategy {
    Regex(Regex),
    Glob(Pattern),
    Literal(String),
}

impl Strategy {
    fn glob_or_literal(pattern: &str) -> Self {
        match Pattern::new(pattern) {
            Ok(glob) => Strategy::Glob(glob),
            Err(e) => {
                debug!("Pattern '{}' is not a valid glob ({}), matching literally", pattern, e);
                Strategy::Literal(pattern.to_string())
            }
        }
    }

    fn recursive(pattern: &str) -> Self {
        let body = regex::escape(pattern)
            .replace(r"\*\*", ".*")
            .replace(r"\*", "[^/]*");
        match Regex::new(&format!("^{}$", body)) {
            Ok(regex) => Strategy::Regex(regex),
            Err(e) => {
                debug!("Pattern '{}' did not compile ({}), using glob semantics", pattern, e);
                Strategy::glob_or_literal(pattern)
            }
        }
    }

    fn is_match(&self, path: &str) -> bool {
        match self {
            Strategy::Regex(regex) => regex.is_match(path),
            Strategy::Glob(glob) => glob.matches_with(path, GLOB_OPTIONS),
            Strategy::Literal(literal) => literal == path,
        }
    }
}

/// A pattern compiled for repeated matching.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    raw: String,
    strategies: Vec<Strategy>,
}

impl CompiledPattern {
    /// Compile a pattern string.
    pub fn new(pattern: &str) -> Self {
        let normalized = to_forward_slashes(pattern);

        let strategies = if normalized.contains("**") {
            let mut variants = vec![normalized.clone()];
            if let Some(rest) = normalized.strip_prefix("**/") {
                variants.push(rest.to_string());
            }
            if let Some(rest) = normalized.strip_suffix("/**") {
                variants.push(rest.to_string());
            }
            variants.iter().map(|v| Strategy::recursive(v)).collect()
        } else {
            vec![Strategy::glob_or_literal(&normalized)]
        };

        Self {
            raw: pattern.to_string(),
            strategies,
        }
    }

    /// The pattern as written in the document.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `path` matches the pattern or one of its derived forms.
    pub fn matches(&self, path: &str) -> bool {
        let path = to_forward_slashes(path);
        self.strategies.iter().any(|s| s.is_match(&path))
    }
}

/// Match a single path against a single pattern.
pub fn matches(path: &str, pattern: &str) -> bool {
    CompiledPattern::new(pattern).matches(path)
}

/// The compiled patterns of one bucket, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    order: Vec<String>,
    compiled: HashMap<String, CompiledPattern>,
}

impl PatternSet {
    /// Compile every distinct pattern once.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut set = Self::default();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if !set.compiled.contains_key(pattern) {
                set.compiled
                    .insert(pattern.to_string(), CompiledPattern::new(pattern));
                set.order.push(pattern.to_string());
            }
        }
        set
    }

    /// The first pattern (in declaration order) that matches `path`.
    pub fn first_match(&self, path: &str) -> Option<&str> {
        self.order
            .iter()
            .find(|p| self.compiled.get(p.as_str()).is_some_and(|c| c.matches(path)))
            .map(String::as_str)
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.first_match(path).is_some()
    }

    /// Number of distinct patterns.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
