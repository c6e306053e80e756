//! Common test utilities shared across integration tests

use anyhow::{Result, bail};
use depository::app::{App, Outcome};
use depository::config::Credentials;
use depository::console::Console;
use depository::executor::{Executor, Fetcher};
use depository::github::{BranchRef, Directory, DirectoryError, RepositoryRef};
use depository::job::{DownloadMethod, Job};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Directory answering from fixed tables and recording every request.
#[derive(Default)]
pub struct ScriptedDirectory {
    repositories: HashMap<String, Result<Vec<RepositoryRef>, DirectoryError>>,
    branches: HashMap<String, Result<Vec<BranchRef>, DirectoryError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedDirectory {
    /// Account `account` owns `names`.
    #[must_use]
    pub fn with_repos(mut self, account: &str, names: &[&str]) -> Self {
        self.repositories.insert(
            account.to_string(),
            Ok(names.iter().map(|n| RepositoryRef::named(n)).collect()),
        );
        self
    }

    /// Listing `account` fails with `error`.
    #[must_use]
    pub fn with_repo_error(mut self, account: &str, error: DirectoryError) -> Self {
        self.repositories.insert(account.to_string(), Err(error));
        self
    }

    /// Repository `repo` has branches `names`.
    #[must_use]
    pub fn with_branches(mut self, repo: &str, names: &[&str]) -> Self {
        self.branches.insert(
            repo.to_string(),
            Ok(names.iter().map(|n| BranchRef::named(n)).collect()),
        );
        self
    }

    /// Listing the branches of `repo` fails with `error`.
    #[must_use]
    pub fn with_branch_error(mut self, repo: &str, error: DirectoryError) -> Self {
        self.branches.insert(repo.to_string(), Err(error));
        self
    }

    /// Requests received so far, as `repos:{account}` / `branches:{account}/{repo}`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl Directory for ScriptedDirectory {
    fn list_repositories(&self, account: &str) -> Result<Vec<RepositoryRef>, DirectoryError> {
        self.calls.lock().push(format!("repos:{account}"));
        self.repositories
            .get(account)
            .cloned()
            .unwrap_or_else(|| Err(DirectoryError::NotFound(format!("User '{account}'"))))
    }

    fn list_branches(&self, account: &str, repo: &str) -> Result<Vec<BranchRef>, DirectoryError> {
        self.calls.lock().push(format!("branches:{account}/{repo}"));
        self.branches.get(repo).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Fetcher that records jobs and fails the `(repo, branch)` pairs it is told to.
#[derive(Default)]
pub struct RecordingFetcher {
    failing: HashSet<(String, String)>,
    jobs: Mutex<Vec<Job>>,
}

impl RecordingFetcher {
    /// Fail every job for `repo`/`branch`.
    #[must_use]
    pub fn failing(mut self, repo: &str, branch: &str) -> Self {
        self.failing.insert((repo.to_string(), branch.to_string()));
        self
    }

    /// Jobs fetched, sorted by identity.
    pub fn fetched(&self) -> Vec<(String, String, DownloadMethod)> {
        let mut jobs: Vec<_> = self
            .jobs
            .lock()
            .iter()
            .map(|j| (j.repo.clone(), j.branch.clone(), j.method))
            .collect();
        jobs.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        jobs
    }
}

impl Fetcher for RecordingFetcher {
    fn fetch(&self, job: &Job) -> Result<()> {
        self.jobs.lock().push(job.clone());
        if self
            .failing
            .contains(&(job.repo.clone(), job.branch.clone()))
        {
            bail!("HTTP 404");
        }
        Ok(())
    }
}

/// Run one interactive session against `script` and return the outcome and transcript.
pub fn run_session<D, F>(
    directory: &D,
    fetcher: &F,
    workers: usize,
    script: &str,
) -> Result<(Outcome, String)>
where
    D: Directory,
    F: Fetcher,
{
    let mut app = App::new(directory, fetcher, Executor::new(workers), Credentials::none());
    let mut console = Console::new(script.as_bytes(), Vec::new());
    let outcome = app.run(&mut console)?;
    Ok((outcome, String::from_utf8_lossy(&console.into_output()).into_owned()))
}

/// Build a script from one answer per line.
pub fn script(lines: &[&str]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
