//! GitHub REST client for repository and branch listings.

use super::{BranchRef, Directory, DirectoryError, RepositoryRef};
use crate::config::{Config, Credentials};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use ureq::Agent;
use urlencoding::encode;

/// Largest page the GitHub API serves.
const MAX_PAGE_SIZE: usize = 100;

/// Blocking client for the GitHub REST API.
#[derive(Clone)]
pub struct GithubClient {
    agent: Agent,
    api_url: String,
    token: Option<String>,
    page_size: usize,
    user_agent: String,
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("api_url", &self.api_url)
            .field("authenticated", &self.token.is_some())
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl GithubClient {
    /// Create a client against `api_url` (e.g. `https://api.github.com`).
    #[must_use]
    pub fn new(api_url: &str, credentials: &Credentials, timeout: Duration) -> Self {
        let config = ureq::config::Config::builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.new_agent(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token: credentials.token().map(str::to_string),
            page_size: MAX_PAGE_SIZE,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }

    /// Create a client from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config, credentials: &Credentials) -> Self {
        Self::new(&config.api_url, credentials, config.request_timeout())
            .with_page_size(config.page_size)
    }

    /// Override the page size (clamped to `1..=100`).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Fetch every page of `path`, stopping at an empty or short page.
    fn paginate<T: DeserializeOwned>(
        &self,
        path: &str,
        not_found: &str,
    ) -> Result<Vec<T>, DirectoryError> {
        let url = format!("{}{path}", self.api_url);
        let per_page = self.page_size.to_string();
        let mut items = Vec::new();

        for page in 1usize.. {
            let page_param = page.to_string();
            let mut request = self
                .agent
                .get(&url)
                .query("per_page", &per_page)
                .query("page", &page_param)
                .header("User-Agent", &self.user_agent)
                .header("Accept", "application/vnd.github+json");
            if let Some(token) = &self.token {
                request = request.header("Authorization", format!("Bearer {token}"));
            }

            let response = request.call().map_err(|e| {
                warn!(url = %url, page, error = %e, "Directory request failed");
                DirectoryError::Transient(format!("Network error: {e}"))
            })?;

            let status = response.status().as_u16();
            match status {
                200 => {}
                404 => return Err(DirectoryError::NotFound(not_found.to_string())),
                403 | 429 => return Err(DirectoryError::RateLimited),
                other => {
                    return Err(DirectoryError::Transient(format!(
                        "Unexpected API error: HTTP {other}"
                    )));
                }
            }

            let batch: Vec<T> = response.into_body().read_json().map_err(|e| {
                DirectoryError::Transient(format!("Malformed API response: {e}"))
            })?;
            let fetched = batch.len();
            debug!(url = %url, page, fetched, "Fetched directory page");
            items.extend(batch);

            if fetched < self.page_size {
                break;
            }
        }

        Ok(items)
    }
}

impl Directory for GithubClient {
    fn list_repositories(&self, account: &str) -> Result<Vec<RepositoryRef>, DirectoryError> {
        self.paginate(
            &format!("/users/{}/repos", encode(account)),
            &format!("User '{account}'"),
        )
    }

    fn list_branches(&self, account: &str, repo: &str) -> Result<Vec<BranchRef>, DirectoryError> {
        self.paginate(
            &format!("/repos/{}/{}/branches", encode(account), encode(repo)),
            &format!("Repository '{repo}' under '{account}'"),
        )
    }
}
