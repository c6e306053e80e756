//! Messages produced by selection transitions.

use super::menu::MenuError;
use crate::github::DirectoryError;
use std::fmt;

/// Something the user should be told about after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Input was malformed; the same prompt is shown again.
    Invalid(MenuError),
    /// The repository listing failed; the account has been cleared.
    ListingFailed(DirectoryError),
    /// The account exists but has no public repositories.
    NoRepositories(String),
    /// No valid repository was picked; the list is shown again.
    NothingSelected,
    /// A repository's branches could not be listed; it contributes no jobs.
    BranchesUnavailable {
        /// Repository name.
        repo: String,
        /// Why the listing failed, or `None` when it was simply empty.
        error: Option<DirectoryError>,
    },
    /// No valid branch was picked for a repository; it contributes no jobs.
    NoBranchesSelected(String),
    /// `back` during branch selection threw away the whole batch.
    BatchAborted,
    /// Every repository was skipped, so there is nothing to download.
    NoJobs,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(error) => write!(f, "{error}"),
            Self::ListingFailed(error) => write!(f, "{error}."),
            Self::NoRepositories(account) => {
                write!(f, "No public repositories found for '{account}'.")
            }
            Self::NothingSelected => f.write_str("No repositories selected."),
            Self::BranchesUnavailable { repo, error: Some(error) } => {
                write!(f, "{error}. Could not fetch branches for '{repo}'. Skipping.")
            }
            Self::BranchesUnavailable { repo, error: None } => {
                write!(f, "No branches found for '{repo}'. Skipping.")
            }
            Self::NoBranchesSelected(repo) => {
                write!(f, "No branches selected for '{repo}'. Skipping.")
            }
            Self::BatchAborted => f.write_str("Batch discarded. Back to repository selection."),
            Self::NoJobs => f.write_str("No valid download jobs queued."),
        }
    }
}

impl From<MenuError> for Notice {
    fn from(error: MenuError) -> Self {
        Self::Invalid(error)
    }
}

impl Notice {
    /// Whether the user should acknowledge this before the screen is redrawn.
    ///
    /// A rejected closed-choice token is answered by repeating the prompt
    /// line instead.
    #[must_use]
    pub const fn needs_pause(&self) -> bool {
        !matches!(self, Self::Invalid(MenuError::UnexpectedToken { .. }))
    }
}
