//! Shallow single-branch clones through the `git` CLI.

use anyhow::{Context, Result, anyhow, bail};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Build a `git` command that never waits on a credential prompt.
fn git_command() -> Command {
    let mut cmd = Command::new("git");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

/// Version string reported by the `git` executable.
///
/// # Errors
///
/// Returns an error if `git` is not on `PATH` or exits unsuccessfully.
pub fn git_version() -> Result<String> {
    let output = git_command()
        .arg("--version")
        .output()
        .context("git executable not found on PATH")?;
    if !output.status.success() {
        bail!("git --version exited with {}", output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Clone `branch` of `url` into `dest`, replacing anything already there.
///
/// The child process is killed if it runs longer than `timeout`; a killed or
/// failed clone leaves no directory behind.
pub(super) fn clone_branch(url: &str, branch: &str, dest: &Path, timeout: Duration) -> Result<()> {
    if dest.exists() {
        debug!(dest = %dest.display(), "Removing previous clone");
        fs::remove_dir_all(dest)
            .with_context(|| format!("Failed to remove existing {}", dest.display()))?;
    }

    let mut child = git_command()
        .args(["clone", "--depth", "1", "--single-branch", "--branch", branch, url])
        .arg(dest)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to start git clone")?;

    // Drain stderr on its own thread so a chatty clone cannot block on a full pipe.
    let stderr = child.stderr.take();
    let reader = std::thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_string(&mut text);
        }
        text
    });

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().context("Failed to poll git clone")? {
            break status;
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            let _ = reader.join();
            let _ = fs::remove_dir_all(dest);
            bail!("git clone of {url} ({branch}) timed out after {}s", timeout.as_secs());
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let stderr = reader.join().unwrap_or_default();
    if !status.success() {
        let _ = fs::remove_dir_all(dest);
        return Err(anyhow!("{}", stderr.trim()))
            .with_context(|| format!("git clone of {url} ({branch}) exited with {status}"));
    }

    match head_commit(dest) {
        Ok(commit) => debug!(dest = %dest.display(), commit, "Clone complete"),
        Err(e) => warn!(dest = %dest.display(), error = %e, "Cloned, but HEAD could not be read"),
    }
    Ok(())
}

/// Short id of the commit checked out in `repo_path`.
fn head_commit(repo_path: &Path) -> Result<String> {
    let repo = git2::Repository::open(repo_path)
        .with_context(|| format!("Failed to open {}", repo_path.display()))?;
    let commit = repo.head()?.peel_to_commit()?;
    let id = commit.id().to_string();
    Ok(id.chars().take(12).collect())
}
