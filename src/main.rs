//! Depository - interactive GitHub repository downloader

use anyhow::Result;
use clap::{CommandFactory, Parser};
use depository::app::{App, Notifier, Outcome};
use depository::config::{Config, Credentials};
use depository::console::Console;
use depository::download::{self, Downloader};
use depository::executor::Executor;
use depository::github::GithubClient;
use depository::paths;
use std::path::PathBuf;

/// Browse a GitHub account and download branches as ZIP archives or shallow clones
#[derive(Parser, Debug)]
#[command(name = "depository")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory downloads are written into
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Maximum number of downloads running at once
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not check for new releases
    #[arg(long)]
    no_update_check: bool,
}

impl Cli {
    /// Load the config file and apply command-line overrides.
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(dir) = &self.output_dir {
            config.output_dir.clone_from(dir);
        }
        if let Some(workers) = self.workers {
            config.max_workers = workers;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let log_path = paths::log_path();

    // Clear the log file on startup
    if let Err(e) = std::fs::write(&log_path, "") {
        eprintln!("Warning: Failed to clear log file: {e}");
    }

    // Set DEBUG=0-3 to control verbosity (0=off, 1=warn, 2=info, 3=debug)
    let debug_level = std::env::var("DEBUG")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(0);

    if debug_level > 0 {
        let level = match debug_level {
            1 => tracing::Level::WARN,
            2 => tracing::Level::INFO,
            _ => tracing::Level::DEBUG,
        };

        let dir = log_path.parent().map_or_else(std::env::temp_dir, PathBuf::from);
        let file_appender = tracing_appender::rolling::never(dir, "depository.log");
        tracing_subscriber::fmt()
            .with_writer(file_appender)
            .with_max_level(level)
            .with_ansi(false)
            .init();
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Let --help and --version exit normally
            if e.kind() == clap::error::ErrorKind::DisplayHelp
                || e.kind() == clap::error::ErrorKind::DisplayVersion
            {
                e.exit();
            }
            // For actual errors, show error + help
            eprintln!("error: {}\n", e.kind());
            Cli::command().print_help()?;
            std::process::exit(1);
        }
    };

    match download::git_version() {
        Ok(version) => tracing::info!(%version, "Found git"),
        Err(e) => {
            eprintln!("Error: {e:#}");
            eprintln!("Depository needs git installed and on your PATH.");
            std::process::exit(1);
        }
    }

    let config = cli.load_config()?;
    let credentials = Credentials::from_env();
    tracing::info!(
        output_dir = %config.output_dir.display(),
        workers = config.workers(),
        token = credentials.is_active(),
        "Starting"
    );

    let client = GithubClient::from_config(&config, &credentials);
    let downloader = Downloader::from_config(&config);
    let mut app = App::new(
        &client,
        &downloader,
        Executor::new(config.workers()),
        credentials,
    );
    if !cli.no_update_check {
        app = app.with_notifier(Notifier::from_config(&config));
    }

    let mut console = Console::stdio();
    match app.run(&mut console)? {
        Outcome::Exited => tracing::info!("Exited"),
        Outcome::OpenedReleasePage => tracing::info!("Exited to release page"),
    }
    Ok(())
}
