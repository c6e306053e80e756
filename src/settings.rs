//! User settings persistence
//!
//! Remembers how the user answered the update prompt and when the release
//! feed was last consulted.

use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Whether new releases should be announced at all.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reminder {
    /// Announce new releases.
    #[default]
    Remind,
    /// Never announce new releases.
    Never,
}

/// Persistent user settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// Reminder policy chosen at the update prompt
    #[serde(default)]
    pub reminder: Reminder,

    /// Release tag the user asked to ignore
    #[serde(default)]
    pub ignored_version: Option<String>,

    /// When the release feed was last checked
    #[serde(default)]
    pub last_update_check: Option<DateTime<Utc>>,
}

impl Settings {
    /// Get the settings file path
    #[must_use]
    pub fn path() -> PathBuf {
        paths::settings_file()
    }

    /// Load settings from `path`, returning defaults if it is missing or invalid
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("Settings file not found, using defaults");
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    debug!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}", e);
                Self::default()
            }
        }
    }

    /// Save settings to `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be written.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        std::fs::write(path, content)?;
        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Whether a release tagged `latest` should be announced
    #[must_use]
    pub fn should_remind(&self, latest: &str) -> bool {
        self.reminder == Reminder::Remind && self.ignored_version.as_deref() != Some(latest)
    }

    /// Whether at least `interval` has passed since the last check
    #[must_use]
    pub fn due_for_check(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        let Some(last) = self.last_update_check else {
            return true;
        };
        let elapsed = now.signed_duration_since(last);
        elapsed
            .to_std()
            .ok()
            .is_none_or(|elapsed| elapsed >= interval)
    }

    /// Record that the feed was checked at `now`
    pub const fn record_check(&mut self, now: DateTime<Utc>) {
        self.last_update_check = Some(now);
    }

    /// "Remind me later": clears a previous `never`
    pub const fn remind_later(&mut self) {
        self.reminder = Reminder::Remind;
    }

    /// Stop announcing releases
    pub const fn never_remind(&mut self) {
        self.reminder = Reminder::Never;
    }

    /// Skip announcements for one release tag
    pub fn ignore_version(&mut self, version: &str) {
        self.ignored_version = Some(version.to_string());
    }
}
