//! Append-only checkpoint audit log.
//!
//! One block per checkpoint, fields in fixed order:
//!
//! ```text
//! ---
//! checkpoint_id: before-delete-20250110-143025
//! operation: delete
//! timestamp: 2025-01-10T14:30:25.123456
//! is_safety: False
//! ---
//! ```
//!
//! Entries are never rewritten. File order is creation order, which is the
//! only ordering signal history tooling gets. Appends from concurrent
//! processes are not synchronized.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Log location relative to the project root.
pub const DEFAULT_LOG_FILE: &str = ".moai/checkpoints.log";
/// Microsecond precision, no offset.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

const DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointLogEntry {
    pub checkpoint_id: String,
    pub operation: String,
    pub timestamp: String,
    pub is_safety: bool,
}

impl CheckpointLogEntry {
    pub fn new(checkpoint_id: &str, operation: &str, at: NaiveDateTime, is_safety: bool) -> Self {
        Self {
            checkpoint_id: checkpoint_id.to_string(),
            operation: operation.to_string(),
            timestamp: at.format(LOG_TIMESTAMP_FORMAT).to_string(),
            is_safety,
        }
    }

    fn to_block(&self) -> String {
        format!(
            "{DELIMITER}\ncheckpoint_id: {}\noperation: {}\ntimestamp: {}\nis_safety: {}\n{DELIMITER}\n",
            self.checkpoint_id,
            self.operation,
            self.timestamp,
            if self.is_safety { "True" } else { "False" },
        )
    }
}

#[derive(Debug, Clone)]
pub struct CheckpointLog {
    path: PathBuf,
}

impl CheckpointLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log under `project_root` at [`DEFAULT_LOG_FILE`].
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(DEFAULT_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one block, creating the parent directory if needed.
    pub fn append(&self, entry: &CheckpointLogEntry) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.write_all(entry.to_block().as_bytes())
            .with_context(|| format!("appending to {}", self.path.display()))?;
        Ok(())
    }

    /// All complete entries in file order. A missing log reads as empty.
    pub fn read_entries(&self) -> anyhow::Result<Vec<CheckpointLogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        Ok(parse_entries(&content))
    }
}

/// Parse repeated `---` delimited blocks. Unknown keys are ignored and
/// blocks missing a required field are skipped.
pub fn parse_entries(content: &str) -> Vec<CheckpointLogEntry> {
    let mut entries = Vec::new();
    let mut current: Option<PartialEntry> = None;

    for line in content.lines().map(str::trim_end) {
        if line == DELIMITER {
            match current.take() {
                Some(partial) if !partial.is_empty() => {
                    entries.extend(partial.finish());
                }
                _ => current = Some(PartialEntry::default()),
            }
            continue;
        }
        let Some(partial) = current.as_mut() else {
            continue;
        };
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "checkpoint_id" => partial.checkpoint_id = Some(value),
            "operation" => partial.operation = Some(value),
            "timestamp" => partial.timestamp = Some(value),
            "is_safety" => partial.is_safety = Some(value.eq_ignore_ascii_case("true")),
            _ => {}
        }
    }

    entries
}

#[derive(Debug, Default)]
struct PartialEntry {
    checkpoint_id: Option<String>,
    operation: Option<String>,
    timestamp: Option<String>,
    is_safety: Option<bool>,
}

impl PartialEntry {
    fn is_empty(&self) -> bool {
        self.checkpoint_id.is_none()
            && self.operation.is_none()
            && self.timestamp.is_none()
            && self.is_safety.is_none()
    }

    fn finish(self) -> Option<CheckpointLogEntry> {
        Some(CheckpointLogEntry {
            checkpoint_id: self.checkpoint_id?,
            operation: self.operation?,
            timestamp: self.timestamp?,
            is_safety: self.is_safety?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-01-10 14:30:25.123456", "%Y-%m-%d %H:%M:%S%.f")
            .unwrap()
    }

    #[test]
    fn block_format_is_fixed() {
        let entry = CheckpointLogEntry::new("before-delete-20250110-143025", "delete", at(), false);
        assert_eq!(
            entry.to_block(),
            "---\n\
             checkpoint_id: before-delete-20250110-143025\n\
             operation: delete\n\
             timestamp: 2025-01-10T14:30:25.123456\n\
             is_safety: False\n\
             ---\n"
        );
    }

    #[test]
    fn append_creates_parent_and_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = CheckpointLog::for_project(dir.path());
        let first = CheckpointLogEntry::new("before-delete-20250110-143025", "delete", at(), false);
        let second = CheckpointLogEntry::new("before-restore-20250110-143030", "restore", at(), true);
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        assert!(dir.path().join(".moai").is_dir());
        assert_eq!(log.read_entries().unwrap(), vec![first, second]);
    }

    #[test]
    fn missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = CheckpointLog::for_project(dir.path());
        assert!(log.read_entries().unwrap().is_empty());
    }

    #[test]
    fn parse_skips_truncated_and_unknown() {
        let content = "---\n\
                       checkpoint_id: a\n\
                       operation: delete\n\
                       extra: ignored\n\
                       timestamp: t\n\
                       is_safety: True\n\
                       ---\n\
                       ---\n\
                       checkpoint_id: b\n\
                       operation: delete\n\
                       ---\n\
                       ---\n\
                       checkpoint_id: c\n";
        let entries = parse_entries(content);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].checkpoint_id, "a");
        assert!(entries[0].is_safety);
    }

    #[test]
    fn timestamp_values_keep_their_colons() {
        let content = "---\ncheckpoint_id: a\noperation: x\ntimestamp: 2025-01-10T14:30:25.000001\nis_safety: False\n---\n";
        let entries = parse_entries(content);
        assert_eq!(entries[0].timestamp, "2025-01-10T14:30:25.000001");
        assert!(!entries[0].is_safety);
    }
}
