//! Event-driven checkpoints: classify an impending change, snapshot HEAD
//! onto a bounded pool of local `before-*` branches, and restore with a
//! safety net.

mod branch;
mod clock;
mod detector;
mod log;
mod manager;

pub use branch::{
    BRANCH_TIMESTAMP_FORMAT, BranchManager, CHECKPOINT_PREFIX, CheckpointBranch,
    DEFAULT_MAX_CHECKPOINTS, sort_oldest_first,
};
pub use clock::{Clock, SteppingClock, SystemClock};
pub use detector::{
    CRITICAL_CONFIG_PATH, CRITICAL_DIRS, CRITICAL_FILES, EventDetector, RISKY_DELETION_THRESHOLD,
    RISKY_RENAME_THRESHOLD,
};
pub use log::{CheckpointLog, CheckpointLogEntry, DEFAULT_LOG_FILE, parse_entries};
pub use manager::{ChangeSet, CheckpointManager, RESTORE_OPERATION};
