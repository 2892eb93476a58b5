use std::sync::OnceLock;

use chrono::{NaiveDateTime, Timelike};
use regex::Regex;

use super::clock::{Clock, SystemClock};
use crate::error::CheckpointError;
use crate::repo::RepositoryPort;

/// Prefix shared by every checkpoint branch.
pub const CHECKPOINT_PREFIX: &str = "before-";
/// Default cap on the number of checkpoint branches kept.
pub const DEFAULT_MAX_CHECKPOINTS: usize = 10;
/// Timestamp embedded in branch names; zero-padded so names sort chronologically.
pub const BRANCH_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// A checkpoint branch name broken into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointBranch {
    pub name: String,
    pub operation: String,
    pub created_at: NaiveDateTime,
}

impl CheckpointBranch {
    /// Build the branch for `operation` created at `at`.
    pub fn new(operation: &str, at: NaiveDateTime) -> Self {
        let name = format!(
            "{CHECKPOINT_PREFIX}{operation}-{}",
            at.format(BRANCH_TIMESTAMP_FORMAT)
        );
        Self {
            name,
            operation: operation.to_string(),
            // Names carry second resolution only.
            created_at: at.with_nanosecond(0).unwrap_or(at),
        }
    }

    /// Parse `before-{operation}-{YYYYMMDD}-{HHMMSS}`.
    ///
    /// The operation may itself contain dashes; the timestamp is always the
    /// last two segments.
    pub fn parse(name: &str) -> Option<Self> {
        let caps = branch_name_re().captures(name)?;
        let stamp = format!("{}-{}", &caps[2], &caps[3]);
        let created_at = NaiveDateTime::parse_from_str(&stamp, BRANCH_TIMESTAMP_FORMAT).ok()?;
        Some(Self {
            name: name.to_string(),
            operation: caps[1].to_string(),
            created_at,
        })
    }

    /// True when `name` follows the checkpoint naming format.
    pub fn is_checkpoint_name(name: &str) -> bool {
        Self::parse(name).is_some()
    }
}

fn branch_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^before-(.+)-(\d{8})-(\d{6})$").expect("valid checkpoint name regex")
    })
}

/// Operation labels become part of a ref name, so keep them to a safe alphabet.
fn validate_operation(operation: &str) -> Result<(), CheckpointError> {
    let valid = !operation.is_empty()
        && operation.len() <= 64
        && operation
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        && !operation.starts_with(['-', '.'])
        && !operation.ends_with(['.', '-'])
        && !operation.contains("..")
        && !operation.ends_with(".lock");
    if valid {
        Ok(())
    } else {
        Err(CheckpointError::InvalidOperation(operation.to_string()))
    }
}

/// Owns the bounded pool of `before-*` branches in one repository.
///
/// Behaves as a fixed-capacity FIFO keyed by branch name:
/// [`create_checkpoint_branch`](Self::create_checkpoint_branch) is the only
/// enqueue, eviction the only dequeue. The repository is queried live on
/// every call; nothing is cached.
pub struct BranchManager<R> {
    repo: R,
    max_checkpoints: usize,
    clock: Box<dyn Clock>,
}

impl<R: RepositoryPort> BranchManager<R> {
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, Box::new(SystemClock))
    }

    pub fn with_clock(repo: R, clock: Box<dyn Clock>) -> Self {
        Self {
            repo,
            max_checkpoints: DEFAULT_MAX_CHECKPOINTS,
            clock,
        }
    }

    /// Change the population cap enforced after each creation.
    pub fn max_checkpoints(mut self, max: usize) -> Self {
        self.max_checkpoints = max;
        self
    }

    pub fn max_count(&self) -> usize {
        self.max_checkpoints
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Create `before-{operation}-{timestamp}` at HEAD, then evict down to
    /// the cap. Returns the new branch name.
    ///
    /// A name collision (same label within the same second) is an error,
    /// never a silent overwrite.
    pub fn create_checkpoint_branch(&self, operation: &str) -> anyhow::Result<String> {
        self.create_checkpoint_branch_keeping(operation, &[])
    }

    /// Like [`Self::create_checkpoint_branch`], but eviction never deletes
    /// a branch named in `keep`.
    pub fn create_checkpoint_branch_keeping(
        &self,
        operation: &str,
        keep: &[&str],
    ) -> anyhow::Result<String> {
        validate_operation(operation)?;
        let branch = CheckpointBranch::new(operation, self.clock.now());

        if self.repo.branch_exists(&branch.name)? {
            return Err(CheckpointError::BranchExists(branch.name).into());
        }
        self.repo.create_branch(&branch.name)?;
        tracing::info!(branch = %branch.name, operation, "created checkpoint branch");

        self.cleanup_old_checkpoints_except(self.max_checkpoints, keep)?;
        Ok(branch.name)
    }

    pub fn branch_exists(&self, name: &str) -> anyhow::Result<bool> {
        self.repo.branch_exists(name)
    }

    pub fn has_remote_tracking(&self, name: &str) -> anyhow::Result<bool> {
        self.repo.has_remote_tracking(name)
    }

    /// Every branch starting with [`CHECKPOINT_PREFIX`], in repository order.
    pub fn list_checkpoint_branches(&self) -> anyhow::Result<Vec<String>> {
        Ok(self
            .repo
            .list_branches()?
            .into_iter()
            .filter(|b| b.name.starts_with(CHECKPOINT_PREFIX))
            .map(|b| b.name)
            .collect())
    }

    /// Force-delete the oldest checkpoint branches until at most `max_count`
    /// remain. Returns the deleted names, oldest first.
    ///
    /// The checked-out branch is never deleted.
    pub fn cleanup_old_checkpoints(&self, max_count: usize) -> anyhow::Result<Vec<String>> {
        self.cleanup_old_checkpoints_except(max_count, &[])
    }

    /// [`Self::cleanup_old_checkpoints`], also sparing every branch in `keep`.
    ///
    /// Spared branches still count toward `max_count`, so the population
    /// only exceeds it when more branches are spared than allowed.
    pub fn cleanup_old_checkpoints_except(
        &self,
        max_count: usize,
        keep: &[&str],
    ) -> anyhow::Result<Vec<String>> {
        let mut names = self.list_checkpoint_branches()?;
        if names.len() <= max_count {
            return Ok(Vec::new());
        }

        let excess = names.len() - max_count;
        let current = self.repo.current_branch()?;
        names.retain(|name| {
            let name = name.as_str();
            !keep.contains(&name) && current.as_deref() != Some(name)
        });
        sort_oldest_first(&mut names);
        let evicted: Vec<String> = names.into_iter().take(excess).collect();
        for name in &evicted {
            self.repo.delete_branch(name, true)?;
            tracing::info!(branch = %name, "evicted checkpoint branch");
        }
        Ok(evicted)
    }
}

/// Order checkpoint names oldest first: by embedded timestamp, then by name.
/// Names that do not parse sort before everything else.
pub fn sort_oldest_first(names: &mut [String]) {
    names.sort_by_cached_key(|name| {
        let created = CheckpointBranch::parse(name).map(|b| b.created_at);
        (created, name.clone())
    });
}
