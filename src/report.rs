//! End-of-batch summary and the "what next?" menu.

use crate::job::{JobId, JobResult};
use std::fmt;

/// Result lines sorted by `(repo, branch)` with success/failure counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    entries: Vec<JobResult>,
}

impl Summary {
    /// Build a summary from results in any order.
    #[must_use]
    pub fn new(mut results: Vec<JobResult>) -> Self {
        results.sort_by(|a, b| a.id.cmp(&b.id));
        Self { entries: results }
    }

    /// Results in `(repo, branch)` order.
    #[must_use]
    pub fn entries(&self) -> &[JobResult] {
        &self.entries
    }

    /// Number of jobs reported.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.entries.len()
    }

    /// Number of jobs that completed.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|r| r.success).count()
    }

    /// Number of jobs that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// Identities of the failed jobs, in report order.
    #[must_use]
    pub fn failures(&self) -> Vec<&JobId> {
        self.entries
            .iter()
            .filter(|r| !r.success)
            .map(|r| &r.id)
            .collect()
    }

    /// One `[OK]`/`[FAIL]` line per job.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|r| {
                let mark = if r.success { "[OK]" } else { "[FAIL]" };
                format!("{mark} {}", r.id)
            })
            .collect()
    }

    /// The closing tally line.
    #[must_use]
    pub fn tally(&self) -> String {
        format!("{} succeeded, {} failed", self.succeeded(), self.failed())
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        write!(f, "{}", self.tally())
    }
}

/// What to do after a batch has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Pick more repositories from the same account.
    SameAccount,
    /// Go back to the account prompt.
    SwitchAccount,
    /// Quit.
    Exit,
}

impl Continuation {
    /// Parse the menu answer (`1`, `2` or `3`); anything else is rejected.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::SameAccount),
            "2" => Some(Self::SwitchAccount),
            "3" => Some(Self::Exit),
            _ => None,
        }
    }
}
