//! # Output Configuration
//!
//! Controls how reports are printed: colors and emoji markers depend on the
//! terminal and on user preferences.
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ```rust,ignore
//! use homesync::output::{OutputConfig, emoji};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Scanning...", emoji(&out, "🔍", "[SCAN]"));
//! ```

use console::{Color, Style};
use std::env;

use crate::detector::ConflictCategory;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always", "never" or "auto".
    /// In auto mode colors are disabled by `NO_COLOR`, `CLICOLOR=0`,
    /// `TERM=dumb`, or a non-TTY stdout (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// Render `text` in `color` when colors are enabled.
    pub fn paint(&self, text: &str, color: Color) -> String {
        Style::new()
            .fg(color)
            .force_styling(self.use_color)
            .apply_to(text)
            .to_string()
    }

    /// Render `text` in bold when colors are enabled.
    pub fn bold(&self, text: &str) -> String {
        Style::new()
            .bold()
            .force_styling(self.use_color)
            .apply_to(text)
            .to_string()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Section heading and color for a validation category.
pub fn category_heading(category: ConflictCategory) -> (&'static str, Color) {
    match category {
        ConflictCategory::OrphanedConfig => ("Declared but excluded", Color::Magenta),
        ConflictCategory::MissingInRepo => ("Not version-controlled", Color::Yellow),
        ConflictCategory::MissingSymlink => ("Not deployed as symlink", Color::Cyan),
        ConflictCategory::MissingEverywhere => ("Missing everywhere", Color::Red),
        ConflictCategory::AccessError => ("Could not inspect", Color::Red),
    }
}
