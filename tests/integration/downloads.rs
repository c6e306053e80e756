//! End-to-end sessions against a mock GitHub server.

use crate::common::{run_session, script};
use depository::config::Credentials;
use depository::download::Downloader;
use depository::github::GithubClient;
use mockito::Matcher;
use pretty_assertions::assert_eq;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_archives_land_in_output_dir() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let repos = server
        .mock("GET", "/users/octo/repos")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"name":"alpha","description":"The first one"}]"#)
        .create();
    let branches = server
        .mock("GET", "/repos/octo/alpha/branches")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"name":"main"},{"name":"feature/login"}]"#)
        .create();
    let main_zip = server
        .mock("GET", "/octo/alpha/archive/refs/heads/main.zip")
        .with_status(200)
        .with_body("main-archive")
        .create();
    let feature_zip = server
        .mock("GET", "/octo/alpha/archive/refs/heads/feature/login.zip")
        .with_status(200)
        .with_body("feature-archive")
        .create();

    let temp = TempDir::new()?;
    let client = GithubClient::new(&server.url(), &Credentials::none(), Duration::from_secs(5));
    let downloader = Downloader::new(&server.url(), temp.path(), Duration::from_secs(5));

    let (_, text) = run_session(
        &client,
        &downloader,
        2,
        &script(&["octo", "1", "1", "z", "all", "3"]),
    )?;

    repos.assert();
    branches.assert();
    main_zip.assert();
    feature_zip.assert();
    assert!(text.contains("The first one"));
    assert!(text.contains("2 succeeded, 0 failed."));
    assert_eq!(fs::read_to_string(temp.path().join("alpha-main.zip"))?, "main-archive");
    assert_eq!(
        fs::read_to_string(temp.path().join("alpha-feature%2Flogin.zip"))?,
        "feature-archive"
    );
    Ok(())
}

#[test]
fn test_unknown_account_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let missing = server
        .mock("GET", "/users/nobody/repos")
        .match_query(Matcher::Any)
        .with_status(404)
        .create();

    let temp = TempDir::new()?;
    let client = GithubClient::new(&server.url(), &Credentials::none(), Duration::from_secs(5));
    let downloader = Downloader::new(&server.url(), temp.path(), Duration::from_secs(5));

    let (_, text) = run_session(&client, &downloader, 1, &script(&["nobody", ""]))?;

    missing.assert();
    assert!(text.contains("User 'nobody'"));
    assert!(fs::read_dir(temp.path())?.next().is_none());
    Ok(())
}

#[test]
fn test_rate_limit_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();
    let limited = server
        .mock("GET", "/users/octo/repos")
        .match_query(Matcher::Any)
        .with_status(403)
        .create();

    let temp = TempDir::new()?;
    let client = GithubClient::new(&server.url(), &Credentials::none(), Duration::from_secs(5));
    let downloader = Downloader::new(&server.url(), temp.path(), Duration::from_secs(5));

    let (_, text) = run_session(&client, &downloader, 1, &script(&["octo", ""]))?;

    limited.assert();
    assert!(text.contains("GITHUB_TOKEN_DEPOSITORY"));
    Ok(())
}
