//! Release notifications for Depository.
//!
//! On startup (and periodically afterwards) Depository asks the release feed
//! for the latest published tag and, if it is newer than the running build,
//! offers to open the release page.

use crate::settings::Settings;
use anyhow::{Context, Result, anyhow, bail};
use semver::Version;
use serde::Deserialize;
use std::process::Command;
use std::time::Duration;
use ureq::Agent;

/// Tag of the running build, in the form releases are tagged.
pub const CURRENT_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// A published release that is newer than the running build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Release tag (or name when the tag is missing).
    pub tag: String,
    /// Release notes; empty when none were published.
    pub changelog: String,
    /// Release page, if the feed provided one.
    pub page_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    #[serde(default)]
    tag_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

/// Check the release feed at `url` for a release newer than `current`.
///
/// Returns `Ok(Some(ReleaseInfo))` if an update exists, or `Ok(None)` if not.
///
/// # Errors
///
/// Returns an error if the HTTP request fails or the response cannot be parsed.
pub fn check_for_update(url: &str, current: &str, timeout: Duration) -> Result<Option<ReleaseInfo>> {
    let config = ureq::config::Config::builder()
        .timeout_global(Some(timeout))
        .build();
    let agent: Agent = config.new_agent();
    let user_agent = format!("depository/{}", env!("CARGO_PKG_VERSION"));

    let response = match agent
        .get(url)
        .header("User-Agent", user_agent)
        .header("Accept", "application/vnd.github+json")
        .call()
    {
        Ok(response) => response,
        Err(ureq::Error::StatusCode(status)) => {
            return Err(anyhow!("Release check failed with status {status}"));
        }
        Err(err) => {
            return Err(anyhow!(err)).context("Failed to query the release feed");
        }
    };

    let body: ReleaseResponse = response
        .into_body()
        .read_json()
        .context("Failed to deserialize release response")?;

    let tag = body
        .tag_name
        .filter(|t| !t.trim().is_empty())
        .or(body.name)
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    if tag.is_empty() || !is_newer(&tag, current) {
        return Ok(None);
    }

    Ok(Some(ReleaseInfo {
        tag,
        changelog: body.body.map(|b| b.trim().to_string()).unwrap_or_default(),
        page_url: body.html_url,
    }))
}

/// Source of the latest published release.
pub trait ReleaseFeed {
    /// The latest release if it is newer than the running build.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed cannot be reached or parsed.
    fn newer_release(&self) -> Result<Option<ReleaseInfo>>;
}

/// Release feed served over HTTP, as published by GitHub releases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReleaseFeed {
    url: String,
    current: String,
    timeout: Duration,
}

impl HttpReleaseFeed {
    /// Feed at `url`, compared against the running build.
    #[must_use]
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            current: CURRENT_VERSION.to_string(),
            timeout,
        }
    }
}

impl ReleaseFeed for HttpReleaseFeed {
    fn newer_release(&self) -> Result<Option<ReleaseInfo>> {
        check_for_update(&self.url, &self.current, self.timeout)
    }
}

/// Whether release `latest` should be offered to a user running `current`.
///
/// When both tags carry a version number, semantic-version ordering decides;
/// otherwise any difference counts as newer.
#[must_use]
pub fn is_newer(latest: &str, current: &str) -> bool {
    match (lenient_version(latest), lenient_version(current)) {
        (Some(latest), Some(current)) => latest > current,
        _ => latest != current,
    }
}

/// Parse the version embedded in a tag such as `v2.1.0` or `release_v2.1`.
fn lenient_version(tag: &str) -> Option<Version> {
    let start = tag.find(|c: char| c.is_ascii_digit())?;
    let numeric = &tag[start..];
    if let Ok(version) = Version::parse(numeric) {
        return Some(version);
    }
    let parts: Vec<u64> = numeric
        .split('.')
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [major] => Some(Version::new(*major, 0, 0)),
        [major, minor] => Some(Version::new(*major, *minor, 0)),
        _ => None,
    }
}

/// Answer to the update prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateChoice {
    /// `y`: open the release page and exit.
    OpenBrowser,
    /// `n`: ask again next time.
    RemindLater,
    /// `i`: stay quiet about this release.
    IgnoreVersion,
    /// `x`: never ask again.
    NeverRemind,
}

impl UpdateChoice {
    /// Parse `y`, `n`, `i` or `x` (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "y" => Some(Self::OpenBrowser),
            "n" => Some(Self::RemindLater),
            "i" => Some(Self::IgnoreVersion),
            "x" => Some(Self::NeverRemind),
            _ => None,
        }
    }

    /// Record this answer for `release` in `settings`.
    pub fn apply(self, settings: &mut Settings, release: &ReleaseInfo) {
        match self {
            Self::OpenBrowser => {}
            Self::RemindLater => settings.remind_later(),
            Self::IgnoreVersion => settings.ignore_version(&release.tag),
            Self::NeverRemind => settings.never_remind(),
        }
    }
}

/// Open `url` with the platform's default handler.
///
/// # Errors
///
/// Returns an error if the opener cannot be started or exits unsuccessfully.
pub fn open_in_browser(url: &str) -> Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", "", url]);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    };

    let status = command.status().context("Failed to launch a browser")?;
    if !status.success() {
        bail!("Browser opener exited unsuccessfully: {status}");
    }
    Ok(())
}
