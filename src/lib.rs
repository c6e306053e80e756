//! Depository - interactive GitHub repository downloader
//!
//! Depository lists an account's repositories, lets you pick repositories and
//! branches, and fetches every chosen branch as a ZIP archive or a shallow
//! clone, several at a time.

pub mod app;
pub mod config;
pub mod console;
pub mod download;
pub mod executor;
pub mod github;
pub mod job;
pub mod paths;
pub mod report;
pub mod selection;
pub mod settings;
pub mod update;

pub use app::{App, Outcome};
pub use config::{Config, Credentials};
pub use executor::Executor;
pub use job::{Job, JobId, JobResult};
