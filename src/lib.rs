//! # homesync
//!
//! Path reconciliation and conflict resolution for a dotfiles repository
//! shared between several machines. The library decides which paths are
//! synchronized for a host, compares the repository with the live home
//! directory, and performs the reversible reorganizations needed before an
//! external tool creates the symlinks.
//!
//! ## Quick Example
//!
//! ```
//! use homesync::config::{parse, DocumentFormat};
//! use homesync::precedence::{PrecedenceResolver, Reason};
//!
//! let rules = parse(
//!     r#"
//! shared: ["notes/"]
//! exclude: ["notes/drafts/**"]
//! laptop: ["notes/drafts/secret.md"]
//! "#,
//!     DocumentFormat::Yaml,
//! )
//! .unwrap();
//!
//! let resolver = PrecedenceResolver::new(&rules);
//! assert_eq!(
//!     resolver.classify("notes/drafts/secret.md", "laptop").reason,
//!     Reason::ExplicitHost
//! );
//! assert!(!resolver.classify("notes/drafts/todo.md", "laptop").include);
//! ```
//!
//! ## Core Concepts
//!
//! - **Rules (`config`)**: the `bucket -> [path]` document with the reserved
//!   buckets `shared`, `exclude` and `system`; every other key is a host.
//! - **Matching (`matcher`, `precedence`)**: exclusion globs compiled once,
//!   combined with host rules into a host > exclude > shared decision.
//! - **Inventory (`inventory`, `layout`)**: the managed paths of one host and
//!   where each lives in the repository and in the live tree.
//! - **Detection (`detector`)**: pre-deployment conflicts and the
//!   categorized validation report.
//! - **Mutation (`reorganize`, `backup`, `deploy`, `cleanup`, `discovery`)**:
//!   every destructive step asks a [`confirm::Confirm`] first, and live
//!   entries are snapshotted before they are removed.
//!
//! ## Reconciliation Pass
//!
//! 1. Load the rule document.
//! 2. Expand the inventory for the active host.
//! 3. Detect conflicts.
//! 4. Optionally migrate overlapping paths and back up blocking entries.
//! 5. Hand the ready packages to the symlink tool.

pub mod backup;
pub mod cleanup;
pub mod config;
pub mod confirm;
pub mod defaults;
pub mod deploy;
pub mod detector;
pub mod discovery;
pub mod error;
pub mod filesystem;
pub mod inventory;
pub mod layout;
pub mod matcher;
pub mod output;
pub mod path;
pub mod precedence;
pub mod reorganize;

#[cfg(test)]
mod matcher_proptest;
