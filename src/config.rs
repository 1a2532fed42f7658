//! # Rule Document and Configuration Store
//!
//! The rule document is a mapping from bucket name to an ordered list of
//! paths:
//!
//! ```yaml
//! shared:
//!   - .bashrc
//!   - .config/nvim/
//! exclude:
//!   - "**/*.log"
//! archlinux:
//!   - .config/nvim/local.lua
//! system:
//!   - /etc/pacman.conf
//! ```
//!
//! ## Key Components
//!
//! - **`Bucket`**: tagged bucket identity. `shared`, `exclude` and `system`
//!   are reserved, every other key names a host. The legacy spellings
//!   `common`, `ignore` and `system_configs` are accepted on load.
//! - **`RuleSet`**: the in-memory document. Values are immutable from the
//!   point of view of the resolver; mutations go through `append_to_bucket`
//!   or produce a new value with `with_appended`.
//! - **`ConfigStore`**: loads and persists a `RuleSet`. Documents ending in
//!   `.json` use `serde_json`, everything else uses `serde_yaml`. Saving
//!   writes a temporary sibling and renames it over the target so readers
//!   never observe a half-written document.

use crate::error::{Error, Result};
use log::{debug, warn};
use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Canonical key of the shared bucket.
pub const SHARED_KEY: &str = "shared";
/// Canonical key of the exclusion bucket.
pub const EXCLUDE_KEY: &str = "exclude";
/// Canonical key of the system bucket.
pub const SYSTEM_KEY: &str = "system";

/// A named list of path patterns in the rule document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    /// Rules applying to every host
    Shared,
    /// Patterns that are never synchronized
    Exclude,
    /// Absolute paths outside the live tree
    System,
    /// Rules applying only to one host
    Host(String),
}

impl Bucket {
    /// Map a document key to its bucket, accepting legacy spellings.
    pub fn from_key(key: &str) -> Self {
        match key {
            SHARED_KEY | "common" => Bucket::Shared,
            EXCLUDE_KEY | "ignore" => Bucket::Exclude,
            SYSTEM_KEY | "system_configs" => Bucket::System,
            host => Bucket::Host(host.to_string()),
        }
    }

    /// The canonical document key.
    pub fn key(&self) -> &str {
        match self {
            Bucket::Shared => SHARED_KEY,
            Bucket::Exclude => EXCLUDE_KEY,
            Bucket::System => SYSTEM_KEY,
            Bucket::Host(host) => host,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The rule document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    shared: Vec<String>,
    exclude: Vec<String>,
    system: Vec<String>,
    /// Host buckets in document order
    hosts: Vec<(String, Vec<String>)>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths declared in any bucket. Unknown hosts yield an empty slice.
    pub fn bucket(&self, bucket: &Bucket) -> &[String] {
        match bucket {
            Bucket::Shared => &self.shared,
            Bucket::Exclude => &self.exclude,
            Bucket::System => &self.system,
            Bucket::Host(host) => self.host(host),
        }
    }

    pub fn shared(&self) -> &[String] {
        &self.shared
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    pub fn system(&self) -> &[String] {
        &self.system
    }

    /// Paths declared for `host`.
    pub fn host(&self, host: &str) -> &[String] {
        self.hosts
            .iter()
            .find(|(name, _)| name == host)
            .map(|(_, paths)| paths.as_slice())
            .unwrap_or(&[])
    }

    /// Every host bucket, in document order.
    pub fn hosts(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.hosts
            .iter()
            .map(|(name, paths)| (name.as_str(), paths.as_slice()))
    }

    /// Append paths to a bucket, creating it if needed.
    ///
    /// Order is preserved and duplicates are kept; callers dedupe upstream
    /// when they need to.
    pub fn append_to_bucket<I, S>(&mut self, bucket: &Bucket, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let target = match bucket {
            Bucket::Shared => &mut self.shared,
            Bucket::Exclude => &mut self.exclude,
            Bucket::System => &mut self.system,
            Bucket::Host(host) => {
                let index = match self.hosts.iter().position(|(name, _)| name == host) {
                    Some(index) => index,
                    None => {
                        self.hosts.push((host.clone(), Vec::new()));
                        self.hosts.len() - 1
                    }
                };
                &mut self.hosts[index].1
            }
        };
        let before = target.len();
        target.extend(paths.into_iter().map(Into::into));
        debug!(
            "Appended {} path(s) to bucket '{}'",
            target.len() - before,
            bucket
        );
    }

    /// Return a copy of this rule set with `paths` appended to `bucket`.
    pub fn with_appended<I, S>(&self, bucket: &Bucket, paths: I) -> RuleSet
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        next.append_to_bucket(bucket, paths);
        next
    }

    /// Total number of declared entries across all buckets.
    pub fn len(&self) -> usize {
        self.shared.len()
            + self.exclude.len()
            + self.system.len()
            + self.hosts.iter().map(|(_, p)| p.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for RuleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let reserved = if self.system.is_empty() { 2 } else { 3 };
        let mut map = serializer.serialize_map(Some(reserved + self.hosts.len()))?;
        map.serialize_entry(SHARED_KEY, &self.shared)?;
        map.serialize_entry(EXCLUDE_KEY, &self.exclude)?;
        if !self.system.is_empty() {
            map.serialize_entry(SYSTEM_KEY, &self.system)?;
        }
        for (host, paths) in &self.hosts {
            map.serialize_entry(host, paths)?;
        }
        map.end()
    }
}

/// A document value: a path list, a list holding something other than
/// strings, or a value that is not a list at all.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Paths(Option<Vec<String>>),
    Mixed(Vec<IgnoredAny>),
    Other(IgnoredAny),
}

struct RuleSetVisitor;

impl<'de> Visitor<'de> for RuleSetVisitor {
    type Value = RuleSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping from bucket name to a list of paths")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<RuleSet, A::Error> {
        let mut rules = RuleSet::new();
        while let Some(key) = access.next_key::<String>()? {
            let bucket = Bucket::from_key(&key);
            match access.next_value::<RawEntry>()? {
                RawEntry::Paths(paths) => {
                    rules.append_to_bucket(&bucket, paths.unwrap_or_default());
                }
                RawEntry::Mixed(_) => {
                    return Err(de::Error::custom(format!(
                        "bucket '{}' must list paths as strings",
                        key
                    )));
                }
                RawEntry::Other(_) if !matches!(bucket, Bucket::Host(_)) => {
                    return Err(de::Error::custom(format!(
                        "bucket '{}' must be a list of paths",
                        key
                    )));
                }
                RawEntry::Other(_) => {
                    warn!("Ignoring configuration key '{}': not a list of paths", key);
                }
            }
        }
        Ok(rules)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<RuleSet, E> {
        Ok(RuleSet::new())
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(RuleSetVisitor)
    }
}

/// On-disk encoding of the rule document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension (`.json` or anything else).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Parse a rule document from a string.
pub fn parse(content: &str, format: DocumentFormat) -> Result<RuleSet> {
    match format {
        DocumentFormat::Yaml => Ok(serde_yaml::from_str(content)?),
        DocumentFormat::Json => Ok(serde_json::from_str(content)?),
    }
}

/// Render a rule document to a string.
pub fn render(rules: &RuleSet, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Yaml => Ok(serde_yaml::to_string(rules)?),
        DocumentFormat::Json => {
            let mut out = serde_json::to_string_pretty(rules)?;
            out.push('\n');
            Ok(out)
        }
    }
}

/// Loads and persists the rule document at a fixed location.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    format: DocumentFormat,
}

impl ConfigStore {
    /// Create a store for `path`, inferring the format from its extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = DocumentFormat::from_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Read and parse the document.
    pub fn load(&self) -> Result<RuleSet> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ConfigNotFound {
                    path: self.path.clone(),
                }
            } else {
                Error::ConfigCorrupt {
                    path: self.path.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let rules = parse(&content, self.format).map_err(|e| Error::ConfigCorrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        debug!(
            "Loaded {} rule(s) from {}",
            rules.len(),
            self.path.display()
        );
        Ok(rules)
    }

    /// Persist the document atomically.
    pub fn save(&self, rules: &RuleSet) -> Result<()> {
        let content = render(rules, self.format).map_err(|e| self.write_error(e))?;
        write_atomic(&self.path, content.as_bytes()).map_err(|e| self.write_error(e))?;
        debug!("Saved configuration to {}", self.path.display());
        Ok(())
    }

    fn write_error(&self, err: impl fmt::Display) -> Error {
        Error::ConfigWrite {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }
}

/// Write `content` to a temporary sibling of `path`, then rename it into place.
fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = parent.join(temp_name);

    let result = (|| {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}
