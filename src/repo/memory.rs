use std::cell::RefCell;
use std::collections::BTreeMap;

use super::{BranchInfo, RepositoryPort};
use crate::error::CheckpointError;

type Tree = BTreeMap<String, String>;

/// In-memory repository for exercising checkpoint logic without git.
///
/// Models just enough of git: a list of commits (each a full file
/// snapshot), branches pointing at commits, a checked-out HEAD branch, and
/// optional upstream tracking.
#[derive(Debug)]
pub struct MemoryRepository {
    state: RefCell<State>,
}

#[derive(Debug)]
struct State {
    commits: Vec<Tree>,
    branches: Vec<Branch>,
    head: String,
    worktree: Tree,
}

#[derive(Debug, Clone)]
struct Branch {
    name: String,
    tip: usize,
    upstream: Option<String>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// A repository with one empty commit on `main`.
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                commits: vec![Tree::new()],
                branches: vec![Branch {
                    name: "main".to_string(),
                    tip: 0,
                    upstream: None,
                }],
                head: "main".to_string(),
                worktree: Tree::new(),
            }),
        }
    }

    /// Write `content` to `path` and commit it on the current branch.
    pub fn commit_file(&self, path: &str, content: &str) {
        let mut state = self.state.borrow_mut();
        state.worktree.insert(path.to_string(), content.to_string());
        let snapshot = state.worktree.clone();
        state.commits.push(snapshot);
        let tip = state.commits.len() - 1;
        let head = state.head.clone();
        if let Some(branch) = state.branches.iter_mut().find(|b| b.name == head) {
            branch.tip = tip;
        }
    }

    /// Content of `path` in the working tree.
    pub fn file(&self, path: &str) -> Option<String> {
        self.state.borrow().worktree.get(path).cloned()
    }

    /// Name of the checked-out branch.
    pub fn head(&self) -> String {
        self.state.borrow().head.clone()
    }

    /// Commit index a branch points at.
    pub fn tip(&self, name: &str) -> Option<usize> {
        self.state
            .borrow()
            .branches
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.tip)
    }

    /// Configure `upstream` as the tracking branch of `name`.
    pub fn set_upstream(&self, name: &str, upstream: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(branch) = state.branches.iter_mut().find(|b| b.name == name) {
            branch.upstream = Some(upstream.to_string());
        }
    }
}

impl RepositoryPort for MemoryRepository {
    fn create_branch(&self, name: &str) -> anyhow::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.branches.iter().any(|b| b.name == name) {
            anyhow::bail!("a branch named '{name}' already exists");
        }
        let head = state.head.clone();
        let Some(tip) = state.branches.iter().find(|b| b.name == head).map(|b| b.tip) else {
            return Err(CheckpointError::NoHead.into());
        };
        state.branches.push(Branch {
            name: name.to_string(),
            tip,
            upstream: None,
        });
        Ok(())
    }

    fn delete_branch(&self, name: &str, _force: bool) -> anyhow::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.head == name {
            anyhow::bail!("cannot delete branch '{name}' checked out");
        }
        let before = state.branches.len();
        state.branches.retain(|b| b.name != name);
        if state.branches.len() == before {
            anyhow::bail!("branch '{name}' not found");
        }
        Ok(())
    }

    fn list_branches(&self) -> anyhow::Result<Vec<BranchInfo>> {
        Ok(self
            .state
            .borrow()
            .branches
            .iter()
            .map(|b| BranchInfo {
                name: b.name.clone(),
                upstream: b.upstream.clone(),
            })
            .collect())
    }

    fn checkout(&self, name: &str) -> anyhow::Result<()> {
        let mut state = self.state.borrow_mut();
        let Some(tip) = state.branches.iter().find(|b| b.name == name).map(|b| b.tip) else {
            return Err(CheckpointError::RestoreTargetNotFound(name.to_string()).into());
        };
        let snapshot = state.commits[tip].clone();
        state.worktree = snapshot;
        state.head = name.to_string();
        Ok(())
    }

    fn current_branch(&self) -> anyhow::Result<Option<String>> {
        Ok(Some(self.state.borrow().head.clone()))
    }
}
