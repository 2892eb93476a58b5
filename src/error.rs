use std::path::PathBuf;
use std::process::ExitCode;

/// Errors that cause moai-checkpoint to exit with a specific code.
#[derive(Debug, thiserror::Error)]
pub enum ExitError {
    #[error("config error: {0}")]
    Config(String),

    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} failed (exit {code}): {message}")]
    ToolFailed {
        tool: String,
        code: i32,
        message: String,
    },

    #[error("{tool} timed out after {timeout_secs}s")]
    Timeout { tool: String, timeout_secs: u64 },

    #[error("audit failed")]
    AuditFailed,

    #[error("{0}")]
    Other(String),
}

impl ExitError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ExitError::Config(_) => ExitCode::from(2),
            ExitError::ToolNotFound { .. } => ExitCode::from(3),
            ExitError::ToolFailed { .. } => ExitCode::from(4),
            ExitError::Timeout { .. } => ExitCode::from(5),
            ExitError::AuditFailed => ExitCode::from(6),
            ExitError::Other(_) => ExitCode::from(1),
        }
    }
}

/// Failures of the checkpoint subsystem itself.
///
/// These are raised loudly: a caller that believes a checkpoint exists when
/// it does not is worse off than one that sees the error.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("repository has no commits yet; create an initial commit first")]
    NoHead,

    #[error("checkpoint branch already exists: {0}")]
    BranchExists(String),

    #[error("checkpoint not found: {0}")]
    RestoreTargetNotFound(String),

    #[error("invalid operation label {0:?}: use letters, digits, '_', '.' or '-'")]
    InvalidOperation(String),
}

impl CheckpointError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CheckpointError::NotARepository(_) | CheckpointError::NoHead => ExitCode::from(10),
            CheckpointError::BranchExists(_) => ExitCode::from(11),
            CheckpointError::RestoreTargetNotFound(_) => ExitCode::from(12),
            CheckpointError::InvalidOperation(_) => ExitCode::from(13),
        }
    }
}
