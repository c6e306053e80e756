//! Interactive driver.
//!
//! [`App`] runs the account loop: it feeds console input into the
//! [`Selector`], answers listing stages from a [`Directory`], hands frozen
//! batches to the [`Executor`], prints the [`Summary`] and asks what to do next.

use crate::config::{Config, Credentials};
use crate::console::{self, Console};
use crate::executor::{Executor, Fetcher};
use crate::github::Directory;
use crate::report::{Continuation, Summary};
use crate::selection::{Notice, Selector, Stage};
use crate::settings::Settings;
use crate::update::{self, CURRENT_VERSION, HttpReleaseFeed, ReleaseFeed, UpdateChoice};
use anyhow::Result;
use chrono::Utc;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How the interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The user chose to exit, or input ended.
    Exited,
    /// The user accepted the update prompt and the release page was opened.
    OpenedReleasePage,
}

/// Checks the release feed and runs the update prompt.
pub struct Notifier {
    feed: Box<dyn ReleaseFeed>,
    page_url: String,
    interval: Duration,
    settings: Settings,
    settings_path: PathBuf,
    opener: fn(&str) -> Result<()>,
    checked: bool,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("page_url", &self.page_url)
            .field("interval", &self.interval)
            .field("settings", &self.settings)
            .field("settings_path", &self.settings_path)
            .finish_non_exhaustive()
    }
}

impl Notifier {
    /// Notifier reading `feed`, with settings persisted at `settings_path`.
    #[must_use]
    pub fn new(feed: Box<dyn ReleaseFeed>, settings_path: PathBuf) -> Self {
        let defaults = Config::default();
        let interval = defaults.update_check_interval();
        Self {
            feed,
            page_url: defaults.release_page_url,
            interval,
            settings: Settings::load_from(&settings_path),
            settings_path,
            opener: update::open_in_browser,
            checked: false,
        }
    }

    /// Notifier for the configured release feed and the default settings file.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let feed = HttpReleaseFeed::new(&config.release_url, config.request_timeout());
        Self::new(Box::new(feed), Settings::path())
            .with_page_url(&config.release_page_url)
            .with_interval(config.update_check_interval())
    }

    /// Page opened when the feed does not name one.
    #[must_use]
    pub fn with_page_url(mut self, url: &str) -> Self {
        self.page_url = url.to_string();
        self
    }

    /// Minimum spacing between checks after the first.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Replace the browser opener.
    #[must_use]
    pub const fn with_opener(mut self, opener: fn(&str) -> Result<()>) -> Self {
        self.opener = opener;
        self
    }

    /// Current persisted settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    fn due(&self) -> bool {
        !self.checked || self.settings.due_for_check(Utc::now(), self.interval)
    }

    fn save(&self) {
        if let Err(e) = self.settings.save_to(&self.settings_path) {
            warn!(path = %self.settings_path.display(), error = %e, "Failed to save settings");
        }
    }

    /// Check the feed if due and prompt about a newer release.
    fn run<R: BufRead, W: Write>(&mut self, console: &mut Console<R, W>) -> Result<Option<Outcome>> {
        if !self.due() {
            return Ok(None);
        }
        self.checked = true;
        self.settings.record_check(Utc::now());

        let release = match self.feed.newer_release() {
            Ok(Some(release)) => release,
            Ok(None) => {
                debug!("No newer release");
                self.save();
                return Ok(None);
            }
            Err(e) => {
                debug!(error = %e, "Update check failed");
                self.save();
                return Ok(None);
            }
        };
        if !self.settings.should_remind(&release.tag) {
            debug!(tag = %release.tag, "Update reminder suppressed");
            self.save();
            return Ok(None);
        }

        info!(tag = %release.tag, "Newer release available");
        console.update_notice(&release, CURRENT_VERSION)?;
        loop {
            let Some(line) = console.read_line("\n  Choice: ")? else {
                self.save();
                return Ok(Some(Outcome::Exited));
            };
            match UpdateChoice::parse(&line) {
                Some(UpdateChoice::OpenBrowser) => {
                    let url = release.page_url.as_deref().unwrap_or(&self.page_url);
                    console.line("  Opening browser...")?;
                    if let Err(e) = (self.opener)(url) {
                        warn!(url, error = %e, "Failed to open browser");
                        console.line(format!("  Could not open a browser: {e}"))?;
                    }
                    self.save();
                    return Ok(Some(Outcome::OpenedReleasePage));
                }
                Some(choice) => {
                    choice.apply(&mut self.settings, &release);
                    match choice {
                        UpdateChoice::IgnoreVersion => {
                            console.line(format!("  Version {} will be ignored.", release.tag))?;
                        }
                        UpdateChoice::NeverRemind => console.line("  Update reminders disabled.")?,
                        UpdateChoice::OpenBrowser | UpdateChoice::RemindLater => {}
                    }
                    self.save();
                    return Ok(None);
                }
                None => console.line("  Please enter y, n, i, or x.")?,
            }
        }
    }
}

/// The interactive account loop.
pub struct App<'a, D: ?Sized, F: ?Sized> {
    directory: &'a D,
    fetcher: &'a F,
    executor: Executor,
    credentials: Credentials,
    notifier: Option<Notifier>,
    selector: Selector,
}

impl<D: ?Sized, F: ?Sized> std::fmt::Debug for App<'_, D, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("executor", &self.executor)
            .field("credentials", &self.credentials)
            .field("notifier", &self.notifier)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl<'a, D, F> App<'a, D, F>
where
    D: Directory + ?Sized,
    F: Fetcher + ?Sized,
{
    /// Create the driver. No update checks are made unless a notifier is set.
    pub fn new(
        directory: &'a D,
        fetcher: &'a F,
        executor: Executor,
        credentials: Credentials,
    ) -> Self {
        Self {
            directory,
            fetcher,
            executor,
            credentials,
            notifier: None,
            selector: Selector::new(),
        }
    }

    /// Check for new releases at the top of each account loop.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The update notifier, if one is configured.
    #[must_use]
    pub const fn notifier(&self) -> Option<&Notifier> {
        self.notifier.as_ref()
    }

    /// Run until the user exits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error only if the console cannot be read or written;
    /// listing and download failures are reported to the user instead.
    pub fn run<R: BufRead, W: Write + Send>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> Result<Outcome> {
        let mut redraw = true;
        let mut resumed = false;
        loop {
            let stage = self.selector.stage();

            // Both the account prompt and a same-account continuation start a new round.
            let loop_top = (stage == Stage::AccountEntry && redraw)
                || (stage == Stage::RepositoryListing && resumed);
            resumed = false;
            if loop_top
                && let Some(notifier) = self.notifier.as_mut()
                && let Some(outcome) = notifier.run(console)?
            {
                return Ok(outcome);
            }

            match stage {
                Stage::RepositoryListing | Stage::BranchListing(_) => {
                    console.fetching(&self.selector)?;
                    let notices = self.selector.fetch(self.directory);
                    if !console.notices(&notices)? {
                        return Ok(Outcome::Exited);
                    }
                    redraw = true;
                }
                Stage::JobListReady | Stage::Dispatched => {
                    let continuation = self.dispatch(console)?;
                    if continuation == Continuation::Exit {
                        console.line("\n  Thanks for using Depository! Goodbye.\n")?;
                        return Ok(Outcome::Exited);
                    }
                    self.selector.resume(continuation);
                    resumed = true;
                    redraw = true;
                }
                Stage::AccountEntry
                | Stage::RepositorySelection
                | Stage::MethodStrategy
                | Stage::BatchMethod
                | Stage::BranchSelection(_)
                | Stage::RepositoryMethod(_) => {
                    let prompt = if redraw {
                        console.render_stage(&self.selector, &self.credentials)?
                    } else {
                        console::prompt_for(stage)
                    };
                    let Some(line) = console.read_line(prompt)? else {
                        return Ok(Outcome::Exited);
                    };
                    let notices = self.selector.submit(&line);
                    if !console.notices(&notices)? {
                        return Ok(Outcome::Exited);
                    }
                    redraw =
                        self.selector.stage() != stage || notices.iter().any(Notice::needs_pause);
                }
            }
        }
    }

    /// Run the frozen batch, print the summary and read the continuation.
    fn dispatch<R: BufRead, W: Write + Send>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> Result<Continuation> {
        if let Some(jobs) = self.selector.take_jobs() {
            console.dispatch_header(jobs.len(), self.executor.workers().min(jobs.len()))?;
            let results = {
                let progress = console.progress();
                self.executor.run(&jobs, self.fetcher, &progress)
            };
            let summary = Summary::new(results);
            info!(
                succeeded = summary.succeeded(),
                failed = summary.failed(),
                "Batch reported"
            );
            console.summary(&summary)?;
        }

        console.continuation_menu()?;
        loop {
            let Some(line) = console.read_line("  Choice: ")? else {
                return Ok(Continuation::Exit);
            };
            if let Some(continuation) = Continuation::parse(&line) {
                return Ok(continuation);
            }
            console.line("  Please enter 1, 2, or 3.")?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{BranchRef, DirectoryError, RepositoryRef};
    use crate::job::Job;
    use crate::update::ReleaseInfo;
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct OneRepo;

    impl Directory for OneRepo {
        fn list_repositories(&self, _account: &str) -> Result<Vec<RepositoryRef>, DirectoryError> {
            Ok(vec![RepositoryRef::named("alpha")])
        }

        fn list_branches(&self, _account: &str, _repo: &str) -> Result<Vec<BranchRef>, DirectoryError> {
            Ok(vec![BranchRef::named("main"), BranchRef::named("dev")])
        }
    }

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl Fetcher for CountingFetcher {
        fn fetch(&self, job: &Job) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if job.branch == "dev" {
                bail!("HTTP 404");
            }
            Ok(())
        }
    }

    struct FixedFeed(Option<ReleaseInfo>);

    impl ReleaseFeed for FixedFeed {
        fn newer_release(&self) -> Result<Option<ReleaseInfo>> {
            Ok(self.0.clone())
        }
    }

    fn release() -> ReleaseInfo {
        ReleaseInfo {
            tag: "v9.0.0".to_string(),
            changelog: "Everything is faster.".to_string(),
            page_url: None,
        }
    }

    fn no_browser(_url: &str) -> Result<()> {
        Ok(())
    }

    fn run_script(
        app: &mut App<'_, OneRepo, CountingFetcher>,
        script: &str,
    ) -> Result<(Outcome, String)> {
        let mut console = Console::new(script.as_bytes(), Vec::new());
        let outcome = app.run(&mut console)?;
        Ok((outcome, String::from_utf8_lossy(&console.into_output()).into_owned()))
    }

    #[test]
    fn test_full_batch_then_exit() -> Result<()> {
        let fetcher = CountingFetcher::default();
        let mut app = App::new(&OneRepo, &fetcher, Executor::new(2), Credentials::none());

        let (outcome, text) = run_script(&mut app, "octo\n1\n1\nz\nall\n3\n")?;

        assert_eq!(outcome, Outcome::Exited);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(text.contains("Repositories for 'octo'  (1 total)"));
        assert!(text.contains("[OK] alpha [main]"));
        assert!(text.contains("[FAIL] alpha [dev]"));
        assert!(text.contains("1 succeeded, 1 failed."));
        assert!(text.contains("Goodbye"));
        Ok(())
    }

    #[test]
    fn test_invalid_continuation_reprompts() -> Result<()> {
        let fetcher = CountingFetcher::default();
        let mut app = App::new(&OneRepo, &fetcher, Executor::new(1), Credentials::none());

        let (outcome, text) = run_script(&mut app, "octo\n1\n1\ng\n1\n9\n3\n")?;

        assert_eq!(outcome, Outcome::Exited);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(text.contains("Please enter 1, 2, or 3."));
        Ok(())
    }

    #[test]
    fn test_end_of_input_exits_cleanly() -> Result<()> {
        let fetcher = CountingFetcher::default();
        let mut app = App::new(&OneRepo, &fetcher, Executor::new(1), Credentials::none());

        let (outcome, _) = run_script(&mut app, "octo\n")?;

        assert_eq!(outcome, Outcome::Exited);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn test_update_prompt_ignore_is_persisted() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let settings_path = temp.path().join("settings.json");
        let fetcher = CountingFetcher::default();
        let notifier = Notifier::new(Box::new(FixedFeed(Some(release()))), settings_path.clone())
            .with_opener(no_browser);
        let mut app = App::new(&OneRepo, &fetcher, Executor::new(1), Credentials::none())
            .with_notifier(notifier);

        let (outcome, text) = run_script(&mut app, "maybe\ni\n")?;

        assert_eq!(outcome, Outcome::Exited);
        assert!(text.contains("New version available: v9.0.0"));
        assert!(text.contains("Please enter y, n, i, or x."));
        assert!(text.contains("Version v9.0.0 will be ignored."));
        let saved = Settings::load_from(&settings_path);
        assert_eq!(saved.ignored_version.as_deref(), Some("v9.0.0"));
        assert!(saved.last_update_check.is_some());
        Ok(())
    }

    #[test]
    fn test_update_prompt_accept_ends_session() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let fetcher = CountingFetcher::default();
        let notifier =
            Notifier::new(Box::new(FixedFeed(Some(release()))), temp.path().join("s.json"))
                .with_opener(no_browser);
        let mut app = App::new(&OneRepo, &fetcher, Executor::new(1), Credentials::none())
            .with_notifier(notifier);

        let (outcome, text) = run_script(&mut app, "y\n")?;

        assert_eq!(outcome, Outcome::OpenedReleasePage);
        assert!(text.contains("Opening browser..."));
        Ok(())
    }

    #[test]
    fn test_never_remind_suppresses_prompt() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let settings_path = temp.path().join("settings.json");
        let mut settings = Settings::default();
        settings.never_remind();
        settings.save_to(&settings_path)?;

        let fetcher = CountingFetcher::default();
        let notifier = Notifier::new(Box::new(FixedFeed(Some(release()))), settings_path)
            .with_opener(no_browser);
        let mut app = App::new(&OneRepo, &fetcher, Executor::new(1), Credentials::none())
            .with_notifier(notifier);

        let (outcome, text) = run_script(&mut app, "")?;

        assert_eq!(outcome, Outcome::Exited);
        assert!(!text.contains("New version available"));
        Ok(())
    }

    #[test]
    fn test_check_not_repeated_within_interval() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let fetcher = CountingFetcher::default();
        let notifier =
            Notifier::new(Box::new(FixedFeed(Some(release()))), temp.path().join("s.json"))
                .with_opener(no_browser)
                .with_interval(Duration::from_secs(3600));
        let mut app = App::new(&OneRepo, &fetcher, Executor::new(1), Credentials::none())
            .with_notifier(notifier);

        // Remind later, run a batch, switch account, then exit at the account prompt.
        let (_, text) = run_script(&mut app, "n\nocto\n1\n1\nz\n1\n2\n")?;

        assert_eq!(text.matches("New version available").count(), 1);
        Ok(())
    }

    #[test]
    fn test_notifier_starts_from_config_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let defaults = Config::default();
        let notifier = Notifier::new(Box::new(FixedFeed(None)), temp.path().join("s.json"));

        assert_eq!(notifier.page_url, defaults.release_page_url);
        assert_eq!(notifier.interval, defaults.update_check_interval());
        assert!(!notifier.checked);
        Ok(())
    }

    #[test]
    fn test_same_account_continuation_rechecks() -> Result<(), Box<dyn std::error::Error>> {
        let temp = TempDir::new()?;
        let fetcher = CountingFetcher::default();
        let notifier =
            Notifier::new(Box::new(FixedFeed(Some(release()))), temp.path().join("s.json"))
                .with_opener(no_browser)
                .with_interval(Duration::ZERO);
        let mut app = App::new(&OneRepo, &fetcher, Executor::new(1), Credentials::none())
            .with_notifier(notifier);

        // Remind later, run a batch, continue with the same account, remind later again.
        let (outcome, text) = run_script(&mut app, "n\nocto\n1\n1\nz\n1\n1\nn\n")?;

        assert_eq!(outcome, Outcome::Exited);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(text.matches("New version available").count(), 2);
        assert_eq!(text.matches("Repositories for 'octo'").count(), 2);
        Ok(())
    }
}
