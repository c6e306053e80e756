//! Configuration management for Depository

use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding an optional GitHub personal access token.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN_DEPOSITORY";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Directory all downloads are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum number of downloads running at once
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Base URL of the GitHub REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL for archive downloads and clone URLs
    #[serde(default = "default_web_url")]
    pub web_url: String,

    /// Endpoint describing the latest published release
    #[serde(default = "default_release_url")]
    pub release_url: String,

    /// Page opened in the browser when the user accepts an update
    #[serde(default = "default_release_page_url")]
    pub release_page_url: String,

    /// Items requested per page when listing repositories and branches
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Timeout for a single API request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout for a single download job, in seconds
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,

    /// Minimum time between two update checks, in seconds
    #[serde(default = "default_update_check_interval_secs")]
    pub update_check_interval_secs: u64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

const fn default_max_workers() -> usize {
    4
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_web_url() -> String {
    "https://github.com".to_string()
}

fn default_release_url() -> String {
    "https://api.github.com/repos/SSMG4/Depository/releases/latest".to_string()
}

fn default_release_page_url() -> String {
    "https://github.com/SSMG4/Depository/releases/latest".to_string()
}

const fn default_page_size() -> usize {
    100
}

const fn default_request_timeout_secs() -> u64 {
    15
}

const fn default_job_timeout_secs() -> u64 {
    600
}

const fn default_update_check_interval_secs() -> u64 {
    3600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_workers: default_max_workers(),
            api_url: default_api_url(),
            web_url: default_web_url(),
            release_url: default_release_url(),
            release_page_url: default_release_page_url(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout_secs(),
            job_timeout_secs: default_job_timeout_secs(),
            update_check_interval_secs: default_update_check_interval_secs(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// # Errors
    ///
    /// Returns an error if reading or parsing the config file fails
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory {}", parent.display())
            })?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn default_path() -> PathBuf {
        paths::config_file()
    }

    /// Worker cap for the executor; never below one
    #[must_use]
    pub fn workers(&self) -> usize {
        self.max_workers.max(1)
    }

    /// Per-request timeout for API calls
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Per-job timeout for downloads
    #[must_use]
    pub const fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Minimum spacing between update checks
    #[must_use]
    pub const fn update_check_interval(&self) -> Duration {
        Duration::from_secs(self.update_check_interval_secs)
    }
}

/// Optional bearer token for the GitHub API.
///
/// Without a token the API allows 60 requests per hour; with one, 5,000.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// No token configured
    #[must_use]
    pub const fn none() -> Self {
        Self { token: None }
    }

    /// Read the token from [`TOKEN_ENV_VAR`]
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_value(std::env::var(TOKEN_ENV_VAR).ok())
    }

    /// Build credentials from a raw value; blank values count as absent
    #[must_use]
    pub fn from_value(value: Option<String>) -> Self {
        let token = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Self { token }
    }

    /// The token, if one is configured
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether requests will be authenticated
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.token.is_some()
    }
}
