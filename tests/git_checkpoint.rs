use std::fs;
use std::path::Path;
use std::process;

use chrono::{Duration, NaiveDate};
use moai_checkpoint::checkpoint::{
    BranchManager, ChangeSet, CheckpointManager, RESTORE_OPERATION, SteppingClock,
};
use moai_checkpoint::error::CheckpointError;
use moai_checkpoint::repo::{GitCli, RepositoryPort};
use tempfile::TempDir;

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

fn commit_file(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
    git(dir, &["add", name]);
    git(dir, &["commit", "-q", "-m", name]);
}

fn repo_with_commit() -> TempDir {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "-q"]);
    commit_file(dir.path(), "app.txt", "v1\n");
    dir
}

fn manager(dir: &Path) -> CheckpointManager<GitCli> {
    let repo = GitCli::open(dir).unwrap();
    CheckpointManager::new(BranchManager::new(repo), dir)
}

fn capped_manager(dir: &Path, max: usize) -> CheckpointManager<GitCli> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 10)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap();
    let repo = GitCli::open(dir).unwrap();
    let branches =
        BranchManager::with_clock(repo, Box::new(SteppingClock::new(start, Duration::seconds(1))))
            .max_checkpoints(max);
    CheckpointManager::new(branches, dir)
}

fn ten_files() -> ChangeSet {
    ChangeSet::deleted((0..10).map(|i| format!("src/file{i}.rs")))
}

#[test]
fn risky_deletion_creates_logged_local_branch() {
    let dir = repo_with_commit();
    let manager = manager(dir.path());

    let id = manager
        .create_checkpoint_if_risky("delete", &ten_files())
        .unwrap()
        .unwrap();

    assert!(id.starts_with("before-delete-"));
    assert!(manager.branches().branch_exists(&id).unwrap());
    assert!(!manager.branches().has_remote_tracking(&id).unwrap());
    assert_eq!(manager.list_checkpoints().unwrap(), vec![id.clone()]);

    let log = fs::read_to_string(dir.path().join(".moai/checkpoints.log")).unwrap();
    assert!(log.contains(&format!("checkpoint_id: {id}")));
    assert!(log.contains("operation: delete"));
    assert!(log.contains("is_safety: False"));
}

#[test]
fn safe_change_leaves_repository_untouched() {
    let dir = repo_with_commit();
    let manager = manager(dir.path());

    let nine = ChangeSet::deleted((0..9).map(|i| format!("file{i}.rs")));
    assert_eq!(manager.create_checkpoint_if_risky("delete", &nine).unwrap(), None);
    assert!(manager.list_checkpoints().unwrap().is_empty());
    assert!(!dir.path().join(".moai/checkpoints.log").exists());
}

#[test]
fn restore_reverts_and_keeps_safety_checkpoint() {
    let dir = repo_with_commit();
    let manager = manager(dir.path());

    let id = manager.create_checkpoint("refactor").unwrap();
    commit_file(dir.path(), "app.txt", "v2\n");

    let safety = manager.restore_checkpoint(&id).unwrap();

    assert_eq!(fs::read_to_string(dir.path().join("app.txt")).unwrap(), "v1\n");
    assert!(safety.starts_with("before-restore-"));

    let checkpoints = manager.list_checkpoints().unwrap();
    assert!(checkpoints.contains(&id));
    assert!(checkpoints.contains(&safety));

    let history = manager.history().unwrap();
    assert_eq!(history.len(), 2);
    assert!(!history[0].is_safety);
    assert_eq!(history[1].checkpoint_id, safety);
    assert_eq!(history[1].operation, RESTORE_OPERATION);
    assert!(history[1].is_safety);

    // The safety checkpoint holds the pre-restore state.
    manager
        .branches()
        .repository()
        .checkout(&safety)
        .unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("app.txt")).unwrap(), "v2\n");
}

#[test]
fn restore_of_missing_checkpoint_creates_nothing() {
    let dir = repo_with_commit();
    let manager = manager(dir.path());

    let err = manager
        .restore_checkpoint("before-delete-20200101-000000")
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CheckpointError>(),
        Some(CheckpointError::RestoreTargetNotFound(_))
    ));
    assert!(manager.list_checkpoints().unwrap().is_empty());
}

#[test]
fn oldest_checkpoints_are_evicted() {
    let dir = repo_with_commit();
    let manager = capped_manager(dir.path(), 3);

    let ids: Vec<String> = (0..5)
        .map(|_| manager.create_checkpoint("delete").unwrap())
        .collect();

    let mut remaining = manager.list_checkpoints().unwrap();
    remaining.sort();
    assert_eq!(remaining, ids[2..].to_vec());
    assert_eq!(ids[0], "before-delete-20250110-143000");
}

#[test]
fn same_second_collision_is_reported() {
    let dir = repo_with_commit();
    let start = NaiveDate::from_ymd_opt(2025, 1, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let repo = GitCli::open(dir.path()).unwrap();
    let branches = BranchManager::with_clock(repo, Box::new(SteppingClock::new(start, Duration::zero())));
    let manager = CheckpointManager::new(branches, dir.path());

    manager.create_checkpoint("delete").unwrap();
    let err = manager.create_checkpoint("delete").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CheckpointError>(),
        Some(CheckpointError::BranchExists(_))
    ));
    assert_eq!(manager.list_checkpoints().unwrap().len(), 1);
}

#[test]
fn empty_repository_has_no_head() {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "-q"]);
    let manager = manager(dir.path());

    let err = manager.create_checkpoint("delete").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CheckpointError>(),
        Some(CheckpointError::NoHead)
    ));
}

#[test]
fn open_from_subdirectory_finds_top_level() {
    let dir = repo_with_commit();
    let nested = dir.path().join("src/deep");
    fs::create_dir_all(&nested).unwrap();

    let repo = GitCli::open(&nested).unwrap();
    assert_eq!(
        repo.root().canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

#[test]
fn restore_oldest_checkpoint_with_full_pool() {
    let dir = repo_with_commit();
    let manager = capped_manager(dir.path(), 2);

    let oldest = manager.create_checkpoint("delete").unwrap();
    commit_file(dir.path(), "app.txt", "v2\n");
    let newer = manager.create_checkpoint("delete").unwrap();

    let safety = manager.restore_checkpoint(&oldest).unwrap();

    assert_eq!(fs::read_to_string(dir.path().join("app.txt")).unwrap(), "v1\n");
    assert_eq!(
        manager.branches().repository().current_branch().unwrap(),
        Some(oldest.clone())
    );
    let mut checkpoints = manager.list_checkpoints().unwrap();
    checkpoints.sort();
    assert_eq!(checkpoints, vec![oldest, safety]);
    assert!(!manager.branches().branch_exists(&newer).unwrap());
}

#[test]
fn checkpoints_on_restored_branch_stay_bounded() {
    let dir = repo_with_commit();
    let manager = capped_manager(dir.path(), 2);

    let restored = manager.create_checkpoint("delete").unwrap();
    manager.restore_checkpoint(&restored).unwrap();

    for _ in 0..3 {
        manager.create_checkpoint("edit").unwrap();
        assert_eq!(manager.list_checkpoints().unwrap().len(), 2);
    }
    assert!(manager.branches().branch_exists(&restored).unwrap());
}

#[test]
fn detached_head_has_no_current_branch() {
    let dir = repo_with_commit();
    git(dir.path(), &["checkout", "-q", "--detach"]);

    let repo = GitCli::open(dir.path()).unwrap();
    assert_eq!(repo.current_branch().unwrap(), None);
}
