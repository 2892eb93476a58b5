use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Value, json};

use crate::checkpoint::{ChangeSet, EventDetector};
use crate::config::Config;
use crate::project::open_manager;

/// The subset of the PreToolUse payload the checkpoint hook reads.
#[derive(Debug, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub hook_event_name: Option<String>,
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: Value,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// What the hook intends to do for a tool call.
#[derive(Debug, Clone)]
pub enum PlannedCheckpoint {
    /// Checkpoint only if the change set is risky.
    IfRisky { operation: String, changes: ChangeSet },
    /// The command is destructive on its own.
    Always { operation: String },
}

/// Map a tool call onto a checkpoint plan. `None` when the tool cannot
/// change the working tree in a way worth checkpointing.
pub fn plan_checkpoint(input: &HookInput, detector: &EventDetector) -> Option<PlannedCheckpoint> {
    match input.tool_name.as_str() {
        "Edit" | "MultiEdit" | "Write" | "NotebookEdit" => {
            let path = input.tool_input["file_path"]
                .as_str()
                .or_else(|| input.tool_input["notebook_path"].as_str())?;
            let operation = if input.tool_name == "Write" { "write" } else { "edit" };
            Some(PlannedCheckpoint::IfRisky {
                operation: operation.to_string(),
                changes: ChangeSet::modified([path]),
            })
        }
        "Bash" => {
            let command = input.tool_input["command"].as_str()?;
            detector
                .risky_command(command)
                .map(|label| PlannedCheckpoint::Always {
                    operation: label.to_string(),
                })
        }
        _ => None,
    }
}

/// Run the checkpoint hook: snapshot HEAD before risky tool calls.
///
/// Never blocks the tool call. Failures are logged and surfaced to the user
/// as a system message, and the hook still answers `continue: true`.
/// Returns the JSON to print, if any.
pub fn run_checkpoint(project_root: &Path, hook_input: Option<&str>) -> Option<Value> {
    let Some(raw) = hook_input else {
        tracing::debug!("checkpoint hook called without input");
        return None;
    };
    let input: HookInput = match serde_json::from_str(raw) {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!("ignoring malformed hook input: {e}");
            return None;
        }
    };
    if input
        .hook_event_name
        .as_deref()
        .is_some_and(|event| event != "PreToolUse")
    {
        return None;
    }

    let plan = plan_checkpoint(&input, &EventDetector::new())?;

    match execute_plan(project_root, &plan) {
        Ok(Some(checkpoint_id)) => Some(json!({
            "continue": true,
            "systemMessage": format!("Checkpoint created: {checkpoint_id}"),
        })),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(tool = %input.tool_name, "checkpoint skipped: {e:#}");
            Some(json!({
                "continue": true,
                "systemMessage": format!("Checkpoint skipped: {e:#}"),
            }))
        }
    }
}

fn execute_plan(project_root: &Path, plan: &PlannedCheckpoint) -> anyhow::Result<Option<String>> {
    let config = Config::load_for_project(project_root)?;
    if !config.checkpoint.enabled {
        return Ok(None);
    }
    let manager = open_manager(project_root, &config)?;
    match plan {
        PlannedCheckpoint::IfRisky { operation, changes } => {
            manager.create_checkpoint_if_risky(operation, changes)
        }
        PlannedCheckpoint::Always { operation } => manager.create_checkpoint(operation).map(Some),
    }
}
