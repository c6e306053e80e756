//! Download jobs and their identities.
//!
//! A [`Job`] is identified by its `(repository, branch)` pair. A [`JobBatch`]
//! refuses a second job with an identity it already holds, so a frozen batch
//! never asks two workers to write the same destination path.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Owner (user or organisation) whose repositories are browsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account(String);

impl Account {
    /// Parse an account identifier from user input.
    ///
    /// Returns `None` for empty or whitespace-only input.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The identifier as entered (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a branch is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMethod {
    /// Stream the branch's ZIP archive.
    Archive,
    /// Shallow, single-branch `git clone`.
    Clone,
}

impl DownloadMethod {
    /// Parse a method token (`g`/`git` or `z`/`zip`, case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "g" | "git" => Some(Self::Clone),
            "z" | "zip" => Some(Self::Archive),
            _ => None,
        }
    }

    /// Short label used in logs and on screen.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Archive => "zip",
            Self::Clone => "git clone",
        }
    }
}

/// Identity of a job within a batch.
///
/// Ordering is by repository name, then branch name, which is the order the
/// summary is printed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId {
    /// Repository name.
    pub repo: String,
    /// Branch name.
    pub branch: String,
}

impl JobId {
    /// Build an identity from borrowed names.
    #[must_use]
    pub fn new(repo: &str, branch: &str) -> Self {
        Self {
            repo: repo.to_string(),
            branch: branch.to_string(),
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.repo, self.branch)
    }
}

/// A single branch download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Owner of the repository.
    pub account: Account,
    /// Repository name.
    pub repo: String,
    /// Branch name.
    pub branch: String,
    /// How the branch is fetched.
    pub method: DownloadMethod,
}

impl Job {
    /// The `(repo, branch)` identity of this job.
    #[must_use]
    pub fn id(&self) -> JobId {
        JobId::new(&self.repo, &self.branch)
    }

    /// File or directory name (without extension) this job writes to.
    ///
    /// `%`, `/` and `\` are percent-escaped, so distinct branches such as
    /// `feature/x` and `feature-x` never share a destination.
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!("{}-{}", escape_path_part(&self.repo), escape_path_part(&self.branch))
    }
}

fn escape_path_part(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            '\\' => escaped.push_str("%5C"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    /// Identity of the job this result belongs to.
    pub id: JobId,
    /// Whether the download completed.
    pub success: bool,
}

/// Ordered list of jobs with unique identities.
#[derive(Debug, Clone, Default)]
pub struct JobBatch {
    jobs: Vec<Job>,
    seen: HashSet<JobId>,
}

impl JobBatch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job, keeping submission order.
    ///
    /// Returns `false` and leaves the batch unchanged if a job with the same
    /// identity is already present.
    pub fn push(&mut self, job: Job) -> bool {
        if !self.seen.insert(job.id()) {
            return false;
        }
        self.jobs.push(job);
        true
    }

    /// Whether a job with this identity is already queued.
    #[must_use]
    pub fn contains(&self, id: &JobId) -> bool {
        self.seen.contains(id)
    }

    /// Number of queued jobs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no jobs are queued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs in submission order.
    #[must_use]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Drop every queued job.
    pub fn clear(&mut self) {
        self.jobs.clear();
        self.seen.clear();
    }

    /// Consume the batch, yielding the jobs in submission order.
    #[must_use]
    pub fn into_jobs(self) -> Vec<Job> {
        self.jobs
    }
}
