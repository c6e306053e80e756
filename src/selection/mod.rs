//! Interactive selection of repositories, branches and download methods.
//!
//! The flow is an explicit state machine. A [`Selector`] holds the current
//! [`Stage`] and a [`SelectionSession`]; input stages are advanced with
//! [`Selector::submit`], listing stages with [`Selector::fetch`]. Every
//! transition returns the [`Notice`]s the caller should show.
//!
//! ```text
//! AccountEntry -> RepositoryListing -> RepositorySelection -> MethodStrategy
//!   -> [BatchMethod] -> BranchListing(i) -> BranchSelection(i)
//!   -> [RepositoryMethod(i)] -> ... -> JobListReady -> Dispatched
//! ```
//!
//! `back` during repository selection clears the account. `back` during
//! branch selection discards the whole batch and returns to repository
//! selection, unlike an invalid token or an unreachable repository, which
//! only skip that one entry.

mod menu;
mod notice;
mod session;


pub use menu::{IndexSelection, MenuChoice, MenuError, parse_menu};
pub use notice::Notice;
pub use session::{MethodStrategy, SelectionSession};

use crate::github::{Directory, RepositoryRef};
use crate::job::{Account, DownloadMethod, Job, JobBatch};
use crate::report::Continuation;
use tracing::{debug, info};

/// Position in the selection flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Waiting for an account identifier.
    AccountEntry,
    /// Account known; repositories must be listed.
    RepositoryListing,
    /// Waiting for indices, `all` or `back` against the repository list.
    RepositorySelection,
    /// Waiting for the method strategy (`1` same, `2` per repository).
    MethodStrategy,
    /// Waiting for the single method used by the whole batch.
    BatchMethod,
    /// Branches of the picked repository at this slot must be listed.
    BranchListing(usize),
    /// Waiting for indices, `all` or `back` against the branch list.
    BranchSelection(usize),
    /// Waiting for the method of the repository at this slot.
    RepositoryMethod(usize),
    /// The batch is frozen and can be taken with [`Selector::take_jobs`].
    JobListReady,
    /// The batch was handed off; waiting for a [`Continuation`].
    Dispatched,
}

impl Stage {
    /// Whether this stage is advanced by user input.
    #[must_use]
    pub const fn wants_input(self) -> bool {
        matches!(
            self,
            Self::AccountEntry
                | Self::RepositorySelection
                | Self::MethodStrategy
                | Self::BatchMethod
                | Self::BranchSelection(_)
                | Self::RepositoryMethod(_)
        )
    }

    /// Whether this stage is advanced by a directory listing.
    #[must_use]
    pub const fn wants_fetch(self) -> bool {
        matches!(self, Self::RepositoryListing | Self::BranchListing(_))
    }
}

/// Drives a [`SelectionSession`] through the [`Stage`]s.
#[derive(Debug, Clone)]
pub struct Selector {
    stage: Stage,
    session: SelectionSession,
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector {
    /// Start at the account prompt.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stage: Stage::AccountEntry,
            session: SelectionSession::default(),
        }
    }

    /// Start with a known account, skipping the account prompt.
    #[must_use]
    pub fn with_account(account: Account) -> Self {
        Self {
            stage: Stage::RepositoryListing,
            session: SelectionSession::for_account(account),
        }
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Current session state.
    #[must_use]
    pub const fn session(&self) -> &SelectionSession {
        &self.session
    }

    /// Account being browsed, if any.
    #[must_use]
    pub const fn account(&self) -> Option<&Account> {
        self.session.account.as_ref()
    }

    /// Number of repositories picked for the current batch.
    #[must_use]
    pub const fn picked_count(&self) -> usize {
        self.session.picked.len()
    }

    /// The picked repository being configured at `slot`.
    #[must_use]
    pub fn repository_at(&self, slot: usize) -> Option<&RepositoryRef> {
        self.session.picked_repository(slot)
    }

    /// Jobs accumulated so far in this pass.
    #[must_use]
    pub const fn pending_jobs(&self) -> &JobBatch {
        &self.session.jobs
    }

    /// Advance an input stage with one line of user input.
    ///
    /// Calling this in a stage that does not take input leaves the machine
    /// unchanged.
    pub fn submit(&mut self, input: &str) -> Vec<Notice> {
        match self.stage {
            Stage::AccountEntry => {
                self.enter_account(input);
                Vec::new()
            }
            Stage::RepositorySelection => self.select_repositories(input),
            Stage::MethodStrategy => self.choose_strategy(input),
            Stage::BatchMethod => self.choose_batch_method(input),
            Stage::BranchSelection(slot) => self.select_branches(slot, input),
            Stage::RepositoryMethod(slot) => self.choose_repository_method(slot, input),
            Stage::RepositoryListing
            | Stage::BranchListing(_)
            | Stage::JobListReady
            | Stage::Dispatched => Vec::new(),
        }
    }

    /// Advance a listing stage by querying `directory`.
    ///
    /// Calling this in a stage that does not list anything leaves the machine
    /// unchanged.
    pub fn fetch<D: Directory + ?Sized>(&mut self, directory: &D) -> Vec<Notice> {
        match self.stage {
            Stage::RepositoryListing => self.list_repositories(directory),
            Stage::BranchListing(slot) => self.list_branches(directory, slot),
            _ => Vec::new(),
        }
    }

    /// Hand off the frozen batch.
    ///
    /// Returns `None` unless the stage is [`Stage::JobListReady`]. On success
    /// the machine moves to [`Stage::Dispatched`].
    pub fn take_jobs(&mut self) -> Option<Vec<Job>> {
        if self.stage != Stage::JobListReady {
            return None;
        }
        let jobs = std::mem::take(&mut self.session.jobs).into_jobs();
        self.session.discard_batch();
        self.stage = Stage::Dispatched;
        Some(jobs)
    }

    /// Re-enter the flow after a batch, as chosen in the summary menu.
    ///
    /// [`Continuation::SameAccount`] lists the same account again without
    /// prompting; [`Continuation::SwitchAccount`] returns to the account
    /// prompt. [`Continuation::Exit`] leaves the machine untouched.
    pub fn resume(&mut self, continuation: Continuation) {
        match continuation {
            Continuation::SameAccount => {
                let account = self.session.account.clone();
                self.session = SelectionSession::default();
                self.session.account = account;
                self.stage = if self.session.account.is_some() {
                    Stage::RepositoryListing
                } else {
                    Stage::AccountEntry
                };
            }
            Continuation::SwitchAccount => {
                self.session = SelectionSession::default();
                self.stage = Stage::AccountEntry;
            }
            Continuation::Exit => {}
        }
    }

    fn enter_account(&mut self, input: &str) {
        if let Some(account) = Account::parse(input) {
            debug!(account = %account, "Account entered");
            self.session = SelectionSession::for_account(account);
            self.stage = Stage::RepositoryListing;
        }
    }

    fn list_repositories<D: Directory + ?Sized>(&mut self, directory: &D) -> Vec<Notice> {
        let Some(account) = self.session.account.clone() else {
            self.stage = Stage::AccountEntry;
            return Vec::new();
        };

        match directory.list_repositories(account.as_str()) {
            Ok(repositories) if repositories.is_empty() => {
                self.session.clear_account();
                self.stage = Stage::AccountEntry;
                vec![Notice::NoRepositories(account.to_string())]
            }
            Ok(repositories) => {
                info!(account = %account, count = repositories.len(), "Listed repositories");
                self.session.repositories = repositories;
                self.session.picked.clear();
                self.session.discard_batch();
                self.stage = Stage::RepositorySelection;
                Vec::new()
            }
            Err(error) => {
                info!(account = %account, error = %error, "Repository listing failed");
                self.session.clear_account();
                self.stage = Stage::AccountEntry;
                vec![Notice::ListingFailed(error)]
            }
        }
    }

    fn select_repositories(&mut self, input: &str) -> Vec<Notice> {
        let total = self.session.repositories.len();
        let (picked, mut notices) = match parse_menu(input, total) {
            MenuChoice::Back => {
                self.session.clear_account();
                self.stage = Stage::AccountEntry;
                return Vec::new();
            }
            MenuChoice::All => ((0..total).collect::<Vec<_>>(), Vec::new()),
            MenuChoice::Indices(selection) => {
                let notices = selection.errors().into_iter().map(Notice::from).collect();
                (selection.indices, notices)
            }
        };

        if picked.is_empty() {
            notices.push(Notice::NothingSelected);
            return notices;
        }

        self.session.discard_batch();
        self.session.picked = picked;
        self.stage = Stage::MethodStrategy;
        notices
    }

    fn choose_strategy(&mut self, input: &str) -> Vec<Notice> {
        match MethodStrategy::parse(input) {
            Some(strategy) => {
                self.session.strategy = Some(strategy);
                self.stage = match strategy {
                    MethodStrategy::SameForAll => Stage::BatchMethod,
                    MethodStrategy::PerRepository => Stage::BranchListing(0),
                };
                Vec::new()
            }
            None => vec![Notice::Invalid(MenuError::UnexpectedToken {
                expected: "1 or 2",
            })],
        }
    }

    fn choose_batch_method(&mut self, input: &str) -> Vec<Notice> {
        match DownloadMethod::parse(input) {
            Some(method) => {
                self.session.batch_method = Some(method);
                self.stage = Stage::BranchListing(0);
                Vec::new()
            }
            None => vec![method_error()],
        }
    }

    fn list_branches<D: Directory + ?Sized>(&mut self, directory: &D, slot: usize) -> Vec<Notice> {
        let (Some(account), Some(repo)) = (
            self.session.account.clone(),
            self.session.picked_repository(slot).map(|r| r.name.clone()),
        ) else {
            return self.finish_batch();
        };

        match directory.list_branches(account.as_str(), &repo) {
            Ok(branches) if branches.is_empty() => {
                let mut notices = vec![Notice::BranchesUnavailable { repo, error: None }];
                notices.extend(self.next_repository(slot));
                notices
            }
            Ok(branches) => {
                debug!(repo = %repo, count = branches.len(), "Listed branches");
                self.session.branches = branches;
                self.stage = Stage::BranchSelection(slot);
                Vec::new()
            }
            Err(error) => {
                info!(repo = %repo, error = %error, "Branch listing failed; skipping repository");
                let mut notices = vec![Notice::BranchesUnavailable {
                    repo,
                    error: Some(error),
                }];
                notices.extend(self.next_repository(slot));
                notices
            }
        }
    }

    fn select_branches(&mut self, slot: usize, input: &str) -> Vec<Notice> {
        let Some(repo) = self.session.picked_repository(slot).map(|r| r.name.clone()) else {
            return self.finish_batch();
        };

        let (chosen, mut notices): (Vec<String>, Vec<Notice>) =
            match parse_menu(input, self.session.branches.len()) {
                MenuChoice::Back => {
                    info!(repo = %repo, discarded = self.session.jobs.len(), "Batch aborted");
                    self.session.discard_batch();
                    self.stage = Stage::RepositorySelection;
                    return vec![Notice::BatchAborted];
                }
                MenuChoice::All => (
                    self.session.branches.iter().map(|b| b.name.clone()).collect(),
                    Vec::new(),
                ),
                MenuChoice::Indices(selection) => (
                    selection
                        .indices
                        .iter()
                        .filter_map(|i| self.session.branches.get(*i))
                        .map(|b| b.name.clone())
                        .collect(),
                    selection.errors().into_iter().map(Notice::from).collect(),
                ),
            };
        self.session.branches.clear();

        if chosen.is_empty() {
            notices.push(Notice::NoBranchesSelected(repo));
            notices.extend(self.next_repository(slot));
            return notices;
        }

        match (self.session.strategy, self.session.batch_method) {
            (Some(MethodStrategy::SameForAll), Some(method)) => {
                self.session.enqueue(&repo, &chosen, method);
                notices.extend(self.next_repository(slot));
            }
            _ => {
                self.session.pending_branches = chosen;
                self.stage = Stage::RepositoryMethod(slot);
            }
        }
        notices
    }

    fn choose_repository_method(&mut self, slot: usize, input: &str) -> Vec<Notice> {
        let Some(method) = DownloadMethod::parse(input) else {
            return vec![method_error()];
        };
        let Some(repo) = self.session.picked_repository(slot).map(|r| r.name.clone()) else {
            return self.finish_batch();
        };
        let branches = std::mem::take(&mut self.session.pending_branches);
        self.session.enqueue(&repo, &branches, method);
        self.next_repository(slot)
    }

    fn next_repository(&mut self, slot: usize) -> Vec<Notice> {
        if slot + 1 < self.session.picked.len() {
            self.stage = Stage::BranchListing(slot + 1);
            Vec::new()
        } else {
            self.finish_batch()
        }
    }

    fn finish_batch(&mut self) -> Vec<Notice> {
        if self.session.jobs.is_empty() {
            self.session.discard_batch();
            self.stage = Stage::RepositorySelection;
            return vec![Notice::NoJobs];
        }
        info!(jobs = self.session.jobs.len(), "Batch ready");
        self.stage = Stage::JobListReady;
        Vec::new()
    }
}

fn method_error() -> Notice {
    Notice::Invalid(MenuError::UnexpectedToken {
        expected: "'g' or 'z'",
    })
}
