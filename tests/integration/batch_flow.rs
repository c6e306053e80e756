//! Whole-session tests: selection, execution and report driven by a script.

use crate::common::{RecordingFetcher, ScriptedDirectory, run_session, script};
use depository::Outcome;
use depository::github::DirectoryError;
use depository::job::DownloadMethod;
use pretty_assertions::assert_eq;

fn two_repos() -> ScriptedDirectory {
    ScriptedDirectory::default()
        .with_repos("octo", &["alpha", "beta"])
        .with_branches("alpha", &["main", "dev"])
        .with_branches("beta", &["main"])
}

fn owned(repo: &str, branch: &str, method: DownloadMethod) -> (String, String, DownloadMethod) {
    (repo.to_string(), branch.to_string(), method)
}

#[test]
fn test_per_repository_methods_and_mixed_results() -> anyhow::Result<()> {
    let directory = two_repos();
    let fetcher = RecordingFetcher::default().failing("beta", "main");

    let (outcome, text) = run_session(
        &directory,
        &fetcher,
        2,
        &script(&["octo", "1,2", "2", "1,2", "g", "all", "z", "3"]),
    )?;

    assert_eq!(outcome, Outcome::Exited);
    assert_eq!(
        fetcher.fetched(),
        vec![
            owned("alpha", "dev", DownloadMethod::Clone),
            owned("alpha", "main", DownloadMethod::Clone),
            owned("beta", "main", DownloadMethod::Archive),
        ]
    );
    assert!(text.contains("Repo 1 of 2: alpha"));
    assert!(text.contains("Repo 2 of 2: beta"));
    assert!(text.contains("[x]  beta [main]: HTTP 404"));
    assert!(text.contains("[OK] alpha [dev]"));
    assert!(text.contains("[FAIL] beta [main]"));
    assert!(text.contains("2 succeeded, 1 failed."));
    Ok(())
}

#[test]
fn test_back_during_branch_selection_discards_batch() -> anyhow::Result<()> {
    let directory = two_repos();
    let fetcher = RecordingFetcher::default();

    let (outcome, text) = run_session(
        &directory,
        &fetcher,
        2,
        &script(&["octo", "1,2", "1", "z", "1", "back", "", "back"]),
    )?;

    assert_eq!(outcome, Outcome::Exited);
    assert!(fetcher.fetched().is_empty());
    assert!(text.contains("Batch discarded"));
    assert_eq!(text.matches("Repositories for 'octo'").count(), 2);
    Ok(())
}

#[test]
fn test_same_account_continuation_skips_account_prompt() -> anyhow::Result<()> {
    let directory = two_repos();
    let fetcher = RecordingFetcher::default();

    let (_, text) = run_session(
        &directory,
        &fetcher,
        1,
        &script(&["octo", "1", "1", "z", "all", "1", "1", "1", "z", "1", "3"]),
    )?;

    assert_eq!(text.matches("GitHub username:").count(), 1);

    assert_eq!(
        directory.calls(),
        vec![
            "repos:octo".to_string(),
            "branches:octo/alpha".to_string(),
            "repos:octo".to_string(),
            "branches:octo/alpha".to_string(),
        ]
    );
    assert_eq!(fetcher.fetched().len(), 3);
    Ok(())
}

#[test]
fn test_switch_account_prompts_again() -> anyhow::Result<()> {
    let directory = two_repos().with_repos("hub", &["gamma"]).with_branches("gamma", &["trunk"]);
    let fetcher = RecordingFetcher::default();

    let (_, text) = run_session(
        &directory,
        &fetcher,
        1,
        &script(&["octo", "1", "1", "g", "1", "2", "hub", "1", "1", "z", "1", "3"]),
    )?;

    assert_eq!(text.matches("GitHub username:").count(), 2);
    assert_eq!(
        fetcher.fetched(),
        vec![
            owned("alpha", "main", DownloadMethod::Clone),
            owned("gamma", "trunk", DownloadMethod::Archive),
        ]
    );
    Ok(())
}

#[test]
fn test_listing_failure_returns_to_account_prompt() -> anyhow::Result<()> {
    let directory = two_repos().with_repo_error("ghost", DirectoryError::RateLimited);
    let fetcher = RecordingFetcher::default();

    let (_, text) = run_session(
        &directory,
        &fetcher,
        1,
        &script(&["ghost", "", "octo", "2", "1", "z", "1", "3"]),
    )?;

    assert!(text.contains("API rate limit reached"));
    assert_eq!(fetcher.fetched(), vec![owned("beta", "main", DownloadMethod::Archive)]);
    Ok(())
}

#[test]
fn test_unreachable_repository_is_skipped() -> anyhow::Result<()> {
    let directory = two_repos().with_branch_error(
        "beta",
        DirectoryError::Transient("Network error: connection reset".to_string()),
    );
    let fetcher = RecordingFetcher::default();

    let (_, text) = run_session(
        &directory,
        &fetcher,
        2,
        &script(&["octo", "1,2", "1", "g", "all", "", "3"]),
    )?;

    assert!(text.contains("Could not fetch branches for 'beta'. Skipping."));
    assert_eq!(
        fetcher.fetched(),
        vec![
            owned("alpha", "dev", DownloadMethod::Clone),
            owned("alpha", "main", DownloadMethod::Clone),
        ]
    );
    Ok(())
}

#[test]
fn test_nothing_queued_returns_to_repository_selection() -> anyhow::Result<()> {
    let directory = ScriptedDirectory::default().with_repos("octo", &["empty"]);
    let fetcher = RecordingFetcher::default();

    let (outcome, text) =
        run_session(&directory, &fetcher, 1, &script(&["octo", "1", "1", "z", "", "back"]))?;

    assert_eq!(outcome, Outcome::Exited);
    assert!(text.contains("No branches found for 'empty'. Skipping."));
    assert!(text.contains("No valid download jobs queued."));
    assert!(fetcher.fetched().is_empty());
    assert!(!text.contains("Download Summary"));
    Ok(())
}

#[test]
fn test_invalid_tokens_are_reported_and_skipped() -> anyhow::Result<()> {
    let directory = two_repos();
    let fetcher = RecordingFetcher::default();

    let (_, text) = run_session(
        &directory,
        &fetcher,
        1,
        &script(&["octo", "2,x,9", "", "3", "1", "zip", "1", "3"]),
    )?;

    assert!(text.contains("Skipping invalid entry: 'x'"));
    assert!(text.contains("Skipping invalid entry: '9'"));
    assert!(text.contains("Please enter 1 or 2."));
    assert_eq!(fetcher.fetched(), vec![owned("beta", "main", DownloadMethod::Archive)]);
    Ok(())
}

#[test]
fn test_duplicate_picks_list_branches_once() -> anyhow::Result<()> {
    let directory = two_repos();
    let fetcher = RecordingFetcher::default();

    run_session(&directory, &fetcher, 4, &script(&["octo", "1,1", "1", "z", "1,1", "3"]))?;

    assert_eq!(
        directory.calls(),
        vec!["repos:octo".to_string(), "branches:octo/alpha".to_string()]
    );
    assert_eq!(fetcher.fetched(), vec![owned("alpha", "main", DownloadMethod::Archive)]);
    Ok(())
}
