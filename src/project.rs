use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::checkpoint::{BranchManager, CheckpointLog, CheckpointManager};
use crate::config::Config;
use crate::repo::GitCli;

/// Canonical project root: the given path, or the current directory.
pub fn resolve_project_root(project_root: Option<&Path>) -> anyhow::Result<PathBuf> {
    let path = match project_root {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().context("could not determine current directory")?,
    };
    path.canonicalize()
        .with_context(|| format!("resolving project root: {}", path.display()))
}

/// Build a checkpoint manager for the git repository at `root`.
pub fn open_manager(root: &Path, config: &Config) -> anyhow::Result<CheckpointManager<GitCli>> {
    let repo = GitCli::open_with_timeout(root, config.git_timeout())?;
    let branches = BranchManager::new(repo).max_checkpoints(config.checkpoint.max_checkpoints);
    Ok(CheckpointManager::with_log(
        branches,
        CheckpointLog::new(config.log_path(root)),
    ))
}
