use std::path::Path;
use std::process;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn moai_checkpoint() -> Command {
    Command::cargo_bin("moai-checkpoint").unwrap()
}

/// Stop git discovery from escaping the temp dir into an enclosing repo.
fn isolated(cmd: &mut Command, dir: &Path) {
    cmd.env("GIT_CEILING_DIRECTORIES", dir.parent().unwrap_or(dir));
}

fn git(dir: &Path, args: &[&str]) {
    let status = process::Command::new("git")
        .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

fn repo_with_commit() -> TempDir {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "-q"]);
    std::fs::write(dir.path().join("README.md"), "hello\n").unwrap();
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-q", "-m", "initial"]);
    dir
}

#[test]
fn help_lists_commands() {
    moai_checkpoint()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("cleanup"));
}

#[test]
fn create_requires_operation() {
    moai_checkpoint()
        .arg("create")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required arguments were not provided"));
}

#[test]
fn create_rejects_malformed_rename() {
    moai_checkpoint()
        .args(["create", "-o", "refactor", "--renamed", "only-one-side"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected OLD:NEW"));
}

#[test]
fn list_outside_repository_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = moai_checkpoint();
    isolated(&mut cmd, dir.path());
    cmd.args(["list", "--project-root"])
        .arg(dir.path())
        .assert()
        .code(10)
        .stderr(predicate::str::contains("not a git repository"));
}

#[test]
fn schema_prints_config_schema() {
    moai_checkpoint()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_checkpoints"));
}

#[test]
fn unknown_hook_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    moai_checkpoint()
        .args(["hooks", "run", "nope", "--project-root"])
        .arg(dir.path())
        .write_stdin("{}")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown hook"));
}

#[test]
fn hook_continues_outside_repository() {
    let dir = TempDir::new().unwrap();
    let input = r#"{"hook_event_name":"PreToolUse","tool_name":"Bash","tool_input":{"command":"rm -rf src"}}"#;
    let mut cmd = moai_checkpoint();
    isolated(&mut cmd, dir.path());
    cmd.args(["hooks", "run", "checkpoint", "--project-root"])
        .arg(dir.path())
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""continue":true"#))
        .stdout(predicate::str::contains("Checkpoint skipped"));
}

#[test]
fn hook_checkpoints_destructive_command() {
    let repo = repo_with_commit();
    let input = r#"{"hook_event_name":"PreToolUse","tool_name":"Bash","tool_input":{"command":"git reset --hard HEAD~1"}}"#;
    moai_checkpoint()
        .args(["hooks", "run", "checkpoint", "--project-root"])
        .arg(repo.path())
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Checkpoint created: before-reset-"));
}

#[test]
fn create_skips_safe_change() {
    let repo = repo_with_commit();
    moai_checkpoint()
        .args(["create", "-o", "delete", "--deleted", "a.txt", "--format", "json"])
        .arg("--project-root")
        .arg(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""checkpoint_id": null"#));
}

#[test]
fn create_list_and_log_round() {
    let repo = repo_with_commit();

    let mut create = moai_checkpoint();
    create.args(["create", "-o", "config", "--modified", "CLAUDE.md", "--format", "text"]);
    create.arg("--project-root").arg(repo.path());
    create
        .assert()
        .success()
        .stdout(predicate::str::starts_with("checkpoint\tbefore-config-"));

    moai_checkpoint()
        .args(["list", "--format", "json", "--project-root"])
        .arg(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""operation": "config""#));

    moai_checkpoint()
        .args(["log", "--format", "text", "--project-root"])
        .arg(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("config\tbefore-config-"));
}

#[test]
fn restore_unknown_checkpoint_fails() {
    let repo = repo_with_commit();
    moai_checkpoint()
        .args(["restore", "before-delete-20200101-000000", "--project-root"])
        .arg(repo.path())
        .assert()
        .code(12)
        .stderr(predicate::str::contains("checkpoint not found"));

    // No safety checkpoint is left behind for a failed restore.
    moai_checkpoint()
        .args(["list", "--format", "text", "--project-root"])
        .arg(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn init_writes_config_once() {
    let dir = TempDir::new().unwrap();
    moai_checkpoint()
        .args(["init", "--max-checkpoints", "5", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let written = std::fs::read_to_string(dir.path().join(".moai/checkpoint.toml")).unwrap();
    assert!(written.contains("max_checkpoints = 5"));

    moai_checkpoint()
        .args(["init", "--project-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}
