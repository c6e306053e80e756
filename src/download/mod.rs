//! Download primitives for a single job.
//!
//! [`Downloader`] turns a [`Job`] into either a streamed branch archive
//! (`{output}/{repo}-{branch}.zip`) or a shallow clone (`{output}/{repo}-{branch}/`).

mod archive;
mod clone;

pub use clone::git_version;

use crate::config::Config;
use crate::executor::Fetcher;
use crate::job::{DownloadMethod, Job};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use ureq::Agent;
use urlencoding::encode;

/// Fetches jobs into an output directory.
pub struct Downloader {
    agent: Agent,
    web_url: String,
    output_dir: PathBuf,
    job_timeout: Duration,
    user_agent: String,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("web_url", &self.web_url)
            .field("output_dir", &self.output_dir)
            .field("job_timeout", &self.job_timeout)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    /// Create a downloader rooted at `output_dir`.
    ///
    /// `job_timeout` bounds each archive transfer and each clone.
    #[must_use]
    pub fn new(web_url: &str, output_dir: &Path, job_timeout: Duration) -> Self {
        let agent = ureq::config::Config::builder()
            .timeout_global(Some(job_timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            web_url: web_url.trim_end_matches('/').to_string(),
            output_dir: output_dir.to_path_buf(),
            job_timeout,
            user_agent: format!("depository/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Create a downloader from the application configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.web_url, &config.output_dir, config.job_timeout())
    }

    /// Directory every job writes into.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })
    }

    /// Archive URL for a job's branch.
    ///
    /// Each `/`-separated component of the branch is encoded on its own, so
    /// `feature/login` stays a nested ref path.
    #[must_use]
    pub fn archive_url(&self, job: &Job) -> String {
        let branch: Vec<_> = job.branch.split('/').map(encode).collect();
        format!(
            "{}/{}/{}/archive/refs/heads/{}.zip",
            self.web_url,
            encode(job.account.as_str()),
            encode(&job.repo),
            branch.join("/")
        )
    }

    /// Clone URL for a job's repository.
    #[must_use]
    pub fn clone_url(&self, job: &Job) -> String {
        format!(
            "{}/{}/{}.git",
            self.web_url,
            encode(job.account.as_str()),
            encode(&job.repo)
        )
    }

    /// Where a job's output lands.
    #[must_use]
    pub fn destination(&self, job: &Job) -> PathBuf {
        let stem = job.file_stem();
        match job.method {
            DownloadMethod::Archive => self.output_dir.join(format!("{stem}.zip")),
            DownloadMethod::Clone => self.output_dir.join(stem),
        }
    }
}

impl Fetcher for Downloader {
    fn fetch(&self, job: &Job) -> Result<()> {
        self.prepare()?;
        let dest = self.destination(job);
        match job.method {
            DownloadMethod::Archive => {
                archive::download(&self.agent, &self.user_agent, &self.archive_url(job), &dest)?;
            }
            DownloadMethod::Clone => {
                clone::clone_branch(&self.clone_url(job), &job.branch, &dest, self.job_timeout)?;
            }
        }
        Ok(())
    }
}
