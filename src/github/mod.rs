//! Remote directory of repositories and branches.
//!
//! The selection flow only needs two listings, both fully paginated. They sit
//! behind the [`Directory`] trait so tests can script the remote side.

mod client;

pub use client::GithubClient;

use serde::Deserialize;
use thiserror::Error;

/// A repository owned by the browsed account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryRef {
    /// Repository name.
    pub name: String,
    /// Free-form description, if the owner set one.
    #[serde(default)]
    pub description: Option<String>,
}

impl RepositoryRef {
    /// Convenience constructor for a repository without a description.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
        }
    }

    /// Trimmed description, or `None` when missing or blank.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// A branch of one repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BranchRef {
    /// Branch name.
    pub name: String,
}

impl BranchRef {
    /// Convenience constructor.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Failure of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The account or repository does not exist.
    #[error("{0} not found")]
    NotFound(String),
    /// The API refused the request because the hourly quota is spent.
    #[error("API rate limit reached; set GITHUB_TOKEN_DEPOSITORY to raise the limit to 5,000 requests/hour")]
    RateLimited,
    /// Network failure or an unexpected response.
    #[error("{0}")]
    Transient(String),
}

/// Listing operations the selection flow depends on.
pub trait Directory {
    /// All repositories of `account`, in API order, across every page.
    ///
    /// # Errors
    ///
    /// Returns a [`DirectoryError`] if any page cannot be fetched.
    fn list_repositories(&self, account: &str) -> Result<Vec<RepositoryRef>, DirectoryError>;

    /// All branches of `account/repo`, in API order, across every page.
    ///
    /// # Errors
    ///
    /// Returns a [`DirectoryError`] if any page cannot be fetched.
    fn list_branches(&self, account: &str, repo: &str) -> Result<Vec<BranchRef>, DirectoryError>;
}
