//! Plain-text terminal rendering and line input.
//!
//! [`Console`] is generic over its reader and writer so the whole interactive
//! flow can be driven from a script in tests.

use crate::config::{Credentials, TOKEN_ENV_VAR};
use crate::executor::Observer;
use crate::job::Job;
use crate::report::Summary;
use crate::selection::{Notice, Selector, Stage};
use crate::update::ReleaseInfo;
use parking_lot::Mutex;
use ratatui::crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::fmt::Display;
use std::io::{self, BufRead, Write};

const BANNER: &str = r"
  ____                       _ _
 |  _ \  ___ _ __   ___  ___(_) |_ ___  _ __ _   _
 | | | |/ _ \ '_ \ / _ \/ __| | __/ _ \| '__| | | |
 | |_| |  __/ |_) | (_) \__ \ | || (_) | |  | |_| |
 |____/ \___| .__/ \___/|___/_|\__\___/|_|   \__, |
            |_|                              |___/

          Your GitHub repository downloader!
";

const SECTION_WIDTH: usize = 56;

/// Prompt shown for menu selections.
const MENU_PROMPT: &str = "  > ";
const METHOD_PROMPT: &str = "  Download via git clone or zip? (g/z): ";
const ACCOUNT_PROMPT: &str = "  GitHub username: ";
const STRATEGY_PROMPT: &str = "  Choice (1/2): ";

/// Prompt repeated on its own after a rejected closed-choice token.
#[must_use]
pub const fn prompt_for(stage: Stage) -> &'static str {
    match stage {
        Stage::AccountEntry => ACCOUNT_PROMPT,
        Stage::MethodStrategy => STRATEGY_PROMPT,
        Stage::BatchMethod | Stage::RepositoryMethod(_) => METHOD_PROMPT,
        _ => MENU_PROMPT,
    }
}

/// Line-oriented terminal front end.
pub struct Console<R, W> {
    input: R,
    output: W,
    clear: bool,
}

impl<R, W> std::fmt::Debug for Console<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("clear", &self.clear)
            .finish_non_exhaustive()
    }
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    /// Console on the process's stdin/stdout, clearing between screens.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout()).with_clearing(true)
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    /// Wrap a reader and writer. Screens are not cleared.
    pub const fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            clear: false,
        }
    }

    /// Enable or disable clearing the terminal before each screen.
    #[must_use]
    pub const fn with_clearing(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    /// Give back the writer.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Write one line.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn line(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Print a divider with a centred title.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn section(&mut self, title: &str) -> io::Result<()> {
        if title.is_empty() {
            return writeln!(self.output, "\n  {}\n", "─".repeat(SECTION_WIDTH));
        }
        let pad = SECTION_WIDTH.saturating_sub(title.chars().count() + 2);
        let left = pad / 2;
        let right = pad - left;
        writeln!(
            self.output,
            "\n  {} {title} {}\n",
            "─".repeat(left),
            "─".repeat(right)
        )
    }

    /// Print `prompt` and read one line, without its line ending.
    ///
    /// Returns `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Wait for Enter. Returns `false` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub fn pause(&mut self) -> io::Result<bool> {
        Ok(self.read_line("  Press Enter to continue...")?.is_some())
    }

    /// Clear the terminal (when enabled) and print the banner.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn start_screen(&mut self) -> io::Result<()> {
        if self.clear {
            execute!(self.output, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        writeln!(self.output, "{BANNER}")
    }

    /// Tell the user whether API requests are authenticated.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn token_status(&mut self, credentials: &Credentials) -> io::Result<()> {
        if credentials.is_active() {
            writeln!(self.output, "  [TOKEN]  GitHub token active, 5,000 req/hour limit.\n")
        } else {
            writeln!(self.output, "  [!]  No {TOKEN_ENV_VAR} set, limit is 60 req/hour.")?;
            writeln!(
                self.output,
                "       Set {TOKEN_ENV_VAR} to raise it to 5,000/hour.\n"
            )
        }
    }

    /// Print notices from a transition, pausing if any of them asks for it.
    ///
    /// Returns `Ok(false)` if input ended during the pause.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing fails.
    pub fn notices(&mut self, notices: &[Notice]) -> io::Result<bool> {
        for notice in notices {
            writeln!(self.output, "  {notice}")?;
        }
        if notices.iter().any(Notice::needs_pause) {
            return self.pause();
        }
        Ok(true)
    }

    /// Say what is being listed before a directory request.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn fetching(&mut self, selector: &Selector) -> io::Result<()> {
        match selector.stage() {
            Stage::RepositoryListing => {
                let account = selector.account().map(ToString::to_string).unwrap_or_default();
                writeln!(self.output, "\n  Fetching repositories for '{account}'...")
            }
            Stage::BranchListing(slot) => {
                self.repository_header(selector, slot)?;
                writeln!(self.output, "  Fetching branches...")
            }
            _ => Ok(()),
        }
    }

    /// Draw the screen for an input stage and return the prompt to read with.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn render_stage(
        &mut self,
        selector: &Selector,
        credentials: &Credentials,
    ) -> io::Result<&'static str> {
        match selector.stage() {
            Stage::AccountEntry => {
                self.start_screen()?;
                self.token_status(credentials)?;
                writeln!(self.output, "  Mode: Multiple Repository Download\n")?;
                Ok(ACCOUNT_PROMPT)
            }
            Stage::RepositorySelection => {
                self.start_screen()?;
                self.repository_list(selector)?;
                writeln!(self.output, "  Enter repo numbers separated by commas, 'all', or 'back':")?;
                Ok(MENU_PROMPT)
            }
            Stage::MethodStrategy => {
                writeln!(self.output, "\n  Download method:")?;
                writeln!(self.output, "  1.  Same method for all repositories")?;
                writeln!(self.output, "  2.  Choose per repository")?;
                Ok(STRATEGY_PROMPT)
            }
            Stage::BatchMethod => Ok(METHOD_PROMPT),
            Stage::RepositoryMethod(_) => {
                writeln!(self.output)?;
                Ok(METHOD_PROMPT)
            }
            Stage::BranchSelection(slot) => {
                self.branch_list(selector, slot)?;
                writeln!(
                    self.output,
                    "\n  Enter branch numbers separated by commas, 'all', or 'back':"
                )?;
                Ok(MENU_PROMPT)
            }
            Stage::RepositoryListing
            | Stage::BranchListing(_)
            | Stage::JobListReady
            | Stage::Dispatched => Ok(MENU_PROMPT),
        }
    }

    fn repository_list(&mut self, selector: &Selector) -> io::Result<()> {
        let session = selector.session();
        let account = selector.account().map(ToString::to_string).unwrap_or_default();
        writeln!(self.output, "  User: {account}\n")?;
        writeln!(
            self.output,
            "  Repositories for '{account}'  ({} total)\n",
            session.repositories.len()
        )?;
        for (index, repo) in session.repositories.iter().enumerate() {
            writeln!(self.output, "  {:<4} {}", index + 1, repo.name)?;
        }
        writeln!(self.output, "\n  Type 'back' to return to the main menu.\n")
    }

    fn repository_header(&mut self, selector: &Selector, slot: usize) -> io::Result<()> {
        let name = selector
            .repository_at(slot)
            .map(|r| r.name.clone())
            .unwrap_or_default();
        self.section(&format!(
            "Repo {} of {}: {name}",
            slot + 1,
            selector.picked_count()
        ))
    }

    fn branch_list(&mut self, selector: &Selector, slot: usize) -> io::Result<()> {
        let Some(repo) = selector.repository_at(slot) else {
            return Ok(());
        };
        if let Some(description) = repo.summary() {
            writeln!(self.output, "  {description}\n")?;
        }
        writeln!(self.output, "  Branches for '{}':", repo.name)?;
        for (index, branch) in selector.session().branches.iter().enumerate() {
            writeln!(self.output, "    {}. {}", index + 1, branch.name)?;
        }
        Ok(())
    }

    /// Announce a batch about to start.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn dispatch_header(&mut self, jobs: usize, workers: usize) -> io::Result<()> {
        self.section("Downloading")?;
        writeln!(
            self.output,
            "  {jobs} download(s) queued, up to {workers} running at once\n"
        )
    }

    /// Print the end-of-batch report.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn summary(&mut self, summary: &Summary) -> io::Result<()> {
        self.section("Download Summary")?;
        for line in summary.lines() {
            writeln!(self.output, "  {line}")?;
        }
        writeln!(self.output, "\n  {}.", summary.tally())
    }

    /// Print the "what next?" menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn continuation_menu(&mut self) -> io::Result<()> {
        self.section("What next?")?;
        writeln!(self.output, "  1.  Download more repos from the same user")?;
        writeln!(self.output, "  2.  Return to main menu  (different user)")?;
        writeln!(self.output, "  3.  Exit\n")
    }

    /// Announce a newer release and list the answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn update_notice(&mut self, release: &ReleaseInfo, current: &str) -> io::Result<()> {
        writeln!(
            self.output,
            "\n  [!]  New version available: {}  (you have {current})\n",
            release.tag
        )?;
        let changelog = if release.changelog.is_empty() {
            "No changelog provided."
        } else {
            release.changelog.as_str()
        };
        writeln!(self.output, "  Changelog:\n  {changelog}\n")?;
        writeln!(self.output, "  [y]  Open release page in browser")?;
        writeln!(self.output, "  [n]  Remind me later")?;
        writeln!(self.output, "  [i]  Ignore this version")?;
        writeln!(self.output, "  [x]  Never remind me again")
    }
}

impl<R, W: Write + Send> Console<R, W> {
    /// Borrow the writer as a thread-safe progress observer.
    pub fn progress(&mut self) -> Progress<'_, W> {
        Progress {
            out: Mutex::new(&mut self.output),
        }
    }
}

/// Prints per-job progress lines from worker threads.
pub struct Progress<'a, W> {
    out: Mutex<&'a mut W>,
}

impl<W> std::fmt::Debug for Progress<'_, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

impl<W: Write + Send> Observer for Progress<'_, W> {
    fn started(&self, job: &Job) {
        let mut out = self.out.lock();
        let _ = writeln!(
            out,
            "  Downloading {} [{}] via {}...",
            job.repo,
            job.branch,
            job.method.label()
        );
        let _ = out.flush();
    }

    fn finished(&self, job: &Job, error: Option<&anyhow::Error>) {
        if let Some(error) = error {
            let mut out = self.out.lock();
            let _ = writeln!(out, "  [x]  {} [{}]: {error:#}", job.repo, job.branch);
            let _ = out.flush();
        }
    }
}
