//! # CLI Command Implementations
//!
//! One file per subcommand. Each command module contains:
//! - An `Args` struct with the command-specific options, derived using `clap`.
//! - An `execute` function that loads a [`Workspace`], calls into the
//!   `homesync` library and prints the result.
//!
//! Commands that change files take a [`Confirm`] from [`confirmer`]:
//! an interactive prompt, or an automatic yes with `--yes`.

pub mod backups;
pub mod cleanup;
pub mod completions;
pub mod conflicts;
pub mod discover;
pub mod reorganize;
pub mod rollback;
pub mod status;
pub mod validate;

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm as Prompt};
use std::path::PathBuf;

use homesync::backup::BackupStore;
use homesync::config::{ConfigStore, RuleSet};
use homesync::confirm::{Confirm, Unattended};
use homesync::defaults;
use homesync::inventory::Inventory;
use homesync::layout::Layout;

use crate::cli::Settings;

/// Everything a command needs: resolved locations and the loaded rules.
pub struct Workspace {
    pub store: ConfigStore,
    pub rules: RuleSet,
    pub host: String,
    pub layout: Layout,
    pub backup_root: PathBuf,
}

impl Workspace {
    /// Resolve settings against their defaults and load the rule document.
    pub fn load(settings: &Settings) -> Result<Self> {
        let config_path = settings
            .config
            .clone()
            .unwrap_or_else(|| defaults::default_config_path(&settings.repo));
        let store = ConfigStore::new(config_path);
        let rules = store
            .load()
            .with_context(|| format!("Cannot load rules from {}", store.path().display()))?;

        let home = settings.home.clone().unwrap_or_else(defaults::default_home);
        let mut layout = Layout::new(settings.repo.clone(), home);
        if let Some(system_root) = &settings.system_root {
            layout = layout.with_system_root(system_root.clone());
        }

        Ok(Self {
            store,
            rules,
            host: settings.host.clone().unwrap_or_else(defaults::default_host),
            layout,
            backup_root: settings
                .backup_root
                .clone()
                .unwrap_or_else(defaults::default_backup_root),
        })
    }

    pub fn inventory(&self, include_system: bool) -> Inventory {
        Inventory::new(&self.rules, &self.host, include_system)
    }

    pub fn backups(&self) -> BackupStore {
        BackupStore::new(&self.backup_root, &self.host, self.layout.live_root())
    }
}

/// Asks on the terminal. Anything but an explicit yes counts as no.
struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        match Prompt::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                log::warn!("Cannot prompt for confirmation: {}", e);
                false
            }
        }
    }
}

/// The confirmation capability for a command.
pub fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(Unattended)
    } else {
        Box::new(TerminalConfirm)
    }
}
