use std::path::{Path, PathBuf};

use super::branch::BranchManager;
use super::detector::EventDetector;
use super::log::{CheckpointLog, CheckpointLogEntry};
use crate::error::CheckpointError;
use crate::repo::RepositoryPort;

/// Operation label of the safety checkpoint taken before every restore.
pub const RESTORE_OPERATION: &str = "restore";

/// The shape of an impending change, as reported by the caller.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub deleted: Vec<PathBuf>,
    pub renamed: Vec<(PathBuf, PathBuf)>,
    pub modified: Vec<PathBuf>,
}

impl ChangeSet {
    pub fn deleted<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            deleted: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn renamed<P: Into<PathBuf>>(pairs: impl IntoIterator<Item = (P, P)>) -> Self {
        Self {
            renamed: pairs.into_iter().map(|(a, b)| (a.into(), b.into())).collect(),
            ..Self::default()
        }
    }

    pub fn modified<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self {
            modified: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Decides whether an operation warrants a checkpoint, creates and logs it,
/// and restores with a safety net.
pub struct CheckpointManager<R> {
    branches: BranchManager<R>,
    detector: EventDetector,
    log: CheckpointLog,
}

impl<R: RepositoryPort> CheckpointManager<R> {
    /// Manager logging to the default location under `project_root`.
    pub fn new(branches: BranchManager<R>, project_root: &Path) -> Self {
        Self::with_log(branches, CheckpointLog::for_project(project_root))
    }

    pub fn with_log(branches: BranchManager<R>, log: CheckpointLog) -> Self {
        Self {
            branches,
            detector: EventDetector::new(),
            log,
        }
    }

    pub fn branches(&self) -> &BranchManager<R> {
        &self.branches
    }

    pub fn log(&self) -> &CheckpointLog {
        &self.log
    }

    /// True when the change crosses a size threshold or touches a critical file.
    pub fn is_risky(&self, changes: &ChangeSet) -> bool {
        (!changes.deleted.is_empty() && self.detector.is_risky_deletion(&changes.deleted))
            || (!changes.renamed.is_empty()
                && self.detector.is_risky_refactoring(&changes.renamed))
            || changes
                .modified
                .iter()
                .any(|p| self.detector.is_critical_file(p))
    }

    /// Checkpoint before `operation` if `changes` is risky.
    ///
    /// Safe changes return `Ok(None)` without creating a branch or writing
    /// the log.
    pub fn create_checkpoint_if_risky(
        &self,
        operation: &str,
        changes: &ChangeSet,
    ) -> anyhow::Result<Option<String>> {
        if !self.is_risky(changes) {
            tracing::debug!(operation, "change is not risky, skipping checkpoint");
            return Ok(None);
        }
        self.create_checkpoint(operation).map(Some)
    }

    /// Checkpoint unconditionally and log it.
    pub fn create_checkpoint(&self, operation: &str) -> anyhow::Result<String> {
        let checkpoint_id = self.branches.create_checkpoint_branch(operation)?;
        self.log_checkpoint(&checkpoint_id, operation, false);
        Ok(checkpoint_id)
    }

    /// Switch to `checkpoint_id`, first saving the current HEAD as a
    /// `restore` safety checkpoint so the restore can itself be undone.
    ///
    /// Returns the safety checkpoint's name.
    pub fn restore_checkpoint(&self, checkpoint_id: &str) -> anyhow::Result<String> {
        if !self.branches.branch_exists(checkpoint_id)? {
            return Err(CheckpointError::RestoreTargetNotFound(checkpoint_id.to_string()).into());
        }

        let safety_id = self
            .branches
            .create_checkpoint_branch_keeping(RESTORE_OPERATION, &[checkpoint_id])?;
        self.log_checkpoint(&safety_id, RESTORE_OPERATION, true);

        self.branches.repository().checkout(checkpoint_id)?;
        tracing::info!(checkpoint = checkpoint_id, safety = %safety_id, "restored checkpoint");
        Ok(safety_id)
    }

    pub fn list_checkpoints(&self) -> anyhow::Result<Vec<String>> {
        self.branches.list_checkpoint_branches()
    }

    /// Parsed audit log, oldest first.
    pub fn history(&self) -> anyhow::Result<Vec<CheckpointLogEntry>> {
        self.log.read_entries()
    }

    /// Best effort: the branch is the safety net, the log only an audit trail.
    fn log_checkpoint(&self, checkpoint_id: &str, operation: &str, is_safety: bool) {
        let entry = CheckpointLogEntry::new(
            checkpoint_id,
            operation,
            self.branches.clock().now(),
            is_safety,
        );
        if let Err(e) = self.log.append(&entry) {
            tracing::warn!(
                checkpoint = checkpoint_id,
                log = %self.log.path().display(),
                "failed to write checkpoint log: {e:#}"
            );
        }
    }
}
