//! State carried through one pass of the selection flow.

use crate::github::{BranchRef, RepositoryRef};
use crate::job::{Account, DownloadMethod, Job, JobBatch};
use tracing::debug;

/// How download methods are assigned within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodStrategy {
    /// One method, asked once, for every job.
    SameForAll,
    /// One method per repository, asked after its branches are picked.
    PerRepository,
}

impl MethodStrategy {
    /// Parse the strategy menu (`1` same for all, `2` per repository).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::SameForAll),
            "2" => Some(Self::PerRepository),
            _ => None,
        }
    }
}

/// Transient selection state; dropped when the user switches account or exits.
#[derive(Debug, Clone, Default)]
pub struct SelectionSession {
    /// Account being browsed; `None` forces the account prompt.
    pub account: Option<Account>,
    /// Repositories listed for the account.
    pub repositories: Vec<RepositoryRef>,
    /// Indices into `repositories`, in the order they were picked.
    pub picked: Vec<usize>,
    /// Branches listed for the repository currently being configured.
    pub branches: Vec<BranchRef>,
    /// Branches chosen for the current repository, awaiting a method.
    pub pending_branches: Vec<String>,
    /// Method assignment for the batch.
    pub strategy: Option<MethodStrategy>,
    /// Method shared by every job when the strategy is [`MethodStrategy::SameForAll`].
    pub batch_method: Option<DownloadMethod>,
    /// Jobs accumulated so far in this pass.
    pub jobs: JobBatch,
}

impl SelectionSession {
    /// Start a session for an already-known account.
    #[must_use]
    pub fn for_account(account: Account) -> Self {
        Self {
            account: Some(account),
            ..Self::default()
        }
    }

    /// Forget the account and everything listed for it.
    pub fn clear_account(&mut self) {
        self.account = None;
        self.repositories.clear();
        self.discard_batch();
        self.picked.clear();
    }

    /// Throw away the in-progress batch, keeping the repository listing.
    pub fn discard_batch(&mut self) {
        self.branches.clear();
        self.pending_branches.clear();
        self.strategy = None;
        self.batch_method = None;
        self.jobs.clear();
    }

    /// The picked repository at position `slot` of the pick order.
    #[must_use]
    pub fn picked_repository(&self, slot: usize) -> Option<&RepositoryRef> {
        self.picked
            .get(slot)
            .and_then(|index| self.repositories.get(*index))
    }

    /// Queue one job per branch of `repo`, all with `method`.
    ///
    /// Branches whose identity is already queued are skipped.
    pub fn enqueue(&mut self, repo: &str, branches: &[String], method: DownloadMethod) {
        let Some(account) = self.account.clone() else {
            return;
        };
        for branch in branches {
            let job = Job {
                account: account.clone(),
                repo: repo.to_string(),
                branch: branch.clone(),
                method,
            };
            if !self.jobs.push(job) {
                debug!(repo, branch = %branch, "Ignoring duplicate job");
            }
        }
    }
}
