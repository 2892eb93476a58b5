//! Repository access for the checkpoint subsystem.
//!
//! The git repository is the single source of truth for which checkpoints
//! exist. Everything above this module talks to it through
//! [`RepositoryPort`], so the checkpoint logic can run against the real
//! `git` binary ([`GitCli`]) or an in-memory fake ([`MemoryRepository`]).

mod git;
mod memory;

pub use git::GitCli;
pub use memory::MemoryRepository;

/// A local branch as reported by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: String,
    /// Upstream ref (e.g. `origin/main`) when tracking is configured.
    pub upstream: Option<String>,
}

/// The git operations the checkpoint subsystem needs.
///
/// Individual ref updates are atomic at the git level; nothing here makes
/// compound sequences (create-then-evict, checkpoint-then-checkout) atomic.
pub trait RepositoryPort {
    /// Create a branch named `name` at the current HEAD without switching to it.
    fn create_branch(&self, name: &str) -> anyhow::Result<()>;

    /// Delete a local branch. `force` deletes even with unmerged commits.
    fn delete_branch(&self, name: &str, force: bool) -> anyhow::Result<()>;

    /// All local branches, in the order the repository reports them.
    fn list_branches(&self) -> anyhow::Result<Vec<BranchInfo>>;

    /// Switch the working tree to `name`.
    fn checkout(&self, name: &str) -> anyhow::Result<()>;

    /// The checked-out branch, or `None` on a detached HEAD.
    fn current_branch(&self) -> anyhow::Result<Option<String>>;

    fn branch_exists(&self, name: &str) -> anyhow::Result<bool> {
        Ok(self.list_branches()?.iter().any(|b| b.name == name))
    }

    /// True when `name` exists and has an upstream configured.
    fn has_remote_tracking(&self, name: &str) -> anyhow::Result<bool> {
        Ok(self
            .list_branches()?
            .iter()
            .any(|b| b.name == name && b.upstream.is_some()))
    }
}

impl<R: RepositoryPort + ?Sized> RepositoryPort for &R {
    fn create_branch(&self, name: &str) -> anyhow::Result<()> {
        (**self).create_branch(name)
    }

    fn delete_branch(&self, name: &str, force: bool) -> anyhow::Result<()> {
        (**self).delete_branch(name, force)
    }

    fn list_branches(&self) -> anyhow::Result<Vec<BranchInfo>> {
        (**self).list_branches()
    }

    fn checkout(&self, name: &str) -> anyhow::Result<()> {
        (**self).checkout(name)
    }

    fn current_branch(&self) -> anyhow::Result<Option<String>> {
        (**self).current_branch()
    }

    fn branch_exists(&self, name: &str) -> anyhow::Result<bool> {
        (**self).branch_exists(name)
    }

    fn has_remote_tracking(&self, name: &str) -> anyhow::Result<bool> {
        (**self).has_remote_tracking(name)
    }
}
