//! Command-line surface tests
//!
//! None of these reach git or the network: each command fails or exits
//! before a repository is opened.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn webroot() -> Command {
    let mut cmd = Command::cargo_bin("webroot").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    webroot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pull"))
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("\n  commit").not());
}

#[test]
fn test_update_points_at_pull() {
    webroot()
        .arg("update")
        .assert()
        .failure()
        .stderr(predicate::str::contains("webroot pull"));
}

#[test]
fn test_commit_points_at_push() {
    webroot()
        .arg("commit")
        .assert()
        .failure()
        .stderr(predicate::str::contains("webroot push"));
}

#[test]
fn test_unknown_command_fails() {
    webroot().arg("frobnicate").assert().failure();
}

#[test]
fn test_push_unknown_repo_lists_valid_names() {
    let dir = TempDir::new().unwrap();
    webroot()
        .current_dir(dir.path())
        .args(["push", "bogusname"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'bogusname' is not a recognized repository"))
        .stderr(predicate::str::contains("localsite"));
}

#[test]
fn test_pull_unknown_repo_fails() {
    let dir = TempDir::new().unwrap();
    webroot()
        .current_dir(dir.path())
        .args(["pull", "bogusname"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a recognized repository"));
}

#[test]
fn test_outside_webroot_fails() {
    let dir = TempDir::new().unwrap();
    webroot()
        .current_dir(dir.path())
        .env("GIT_CEILING_DIRECTORIES", dir.path().parent().unwrap())
        .arg("fix")
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not the webroot repository root"));
}
