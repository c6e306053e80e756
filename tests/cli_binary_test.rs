//! Binary integration tests for CLI commands
//!
//! These tests run the actual depository binary to exercise the CLI code paths.

#![expect(clippy::unwrap_used, reason = "integration test assertions")]

use std::process::Command;

fn depository_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_depository"))
}

#[test]
fn test_cli_help() {
    let output = depository_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--output-dir"));
    assert!(stdout.contains("--workers"));
}

#[test]
fn test_cli_version() {
    let output = depository_bin().arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_invalid_argument_shows_help() {
    let output = depository_bin().arg("--invalid-flag").output().unwrap();

    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
}

#[test]
fn test_cli_rejects_bad_worker_count() {
    let output = depository_bin().args(["--workers", "many"]).output().unwrap();
    assert!(!output.status.success());
}
