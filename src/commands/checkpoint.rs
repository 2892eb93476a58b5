use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use super::OutputFormat;
use crate::checkpoint::ChangeSet;
use crate::config::Config;
use crate::project::{open_manager, resolve_project_root};

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Operation label (e.g. delete, refactor)
    #[arg(short, long)]
    pub operation: String,
    /// File about to be deleted (repeatable)
    #[arg(long = "deleted", value_name = "PATH")]
    pub deleted: Vec<PathBuf>,
    /// File about to be renamed, as OLD:NEW (repeatable)
    #[arg(long = "renamed", value_name = "OLD:NEW", value_parser = parse_rename)]
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// File about to be modified (repeatable)
    #[arg(long = "modified", value_name = "PATH")]
    pub modified: Vec<PathBuf>,
    /// Checkpoint even if the change is not risky
    #[arg(long)]
    pub force: bool,
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

fn parse_rename(value: &str) -> Result<(PathBuf, PathBuf), String> {
    match value.split_once(':') {
        Some((old, new)) if !old.is_empty() && !new.is_empty() => {
            Ok((PathBuf::from(old), PathBuf::from(new)))
        }
        _ => Err(format!("expected OLD:NEW, got {value:?}")),
    }
}

impl CreateArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let root = resolve_project_root(self.project_root.as_deref())?;
        let config = Config::load_for_project(&root)?;
        let manager = open_manager(&root, &config)?;

        let checkpoint_id = if self.force {
            Some(manager.create_checkpoint(&self.operation)?)
        } else {
            let changes = ChangeSet {
                deleted: self.deleted.clone(),
                renamed: self.renamed.clone(),
                modified: self.modified.clone(),
            };
            manager.create_checkpoint_if_risky(&self.operation, &changes)?
        };

        match OutputFormat::resolve(self.format) {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "checkpoint_id": checkpoint_id }))?
                );
            }
            OutputFormat::Text => {
                println!("checkpoint\t{}", checkpoint_id.as_deref().unwrap_or("none"));
            }
            OutputFormat::Pretty => match checkpoint_id {
                Some(id) => println!("Checkpoint created: {id}"),
                None => println!("No checkpoint needed: change is not risky"),
            },
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Checkpoint branch to restore (e.g. before-delete-20250110-143025)
    pub checkpoint_id: String,
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl RestoreArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let root = resolve_project_root(self.project_root.as_deref())?;
        let config = Config::load_for_project(&root)?;
        let manager = open_manager(&root, &config)?;

        let safety_id = manager.restore_checkpoint(&self.checkpoint_id)?;

        match OutputFormat::resolve(self.format) {
            OutputFormat::Json => {
                let out = json!({ "restored": self.checkpoint_id, "safety_checkpoint": safety_id });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            OutputFormat::Text => {
                println!("restored\t{}", self.checkpoint_id);
                println!("safety\t{safety_id}");
            }
            OutputFormat::Pretty => {
                println!("Restored {}", self.checkpoint_id);
                println!("Previous state saved as {safety_id}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct CleanupArgs {
    /// Keep at most this many checkpoints (defaults to checkpoint.max_checkpoints)
    #[arg(long)]
    pub max: Option<usize>,
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl CleanupArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let root = resolve_project_root(self.project_root.as_deref())?;
        let config = Config::load_for_project(&root)?;
        let manager = open_manager(&root, &config)?;

        let max = self.max.unwrap_or(config.checkpoint.max_checkpoints);
        let evicted = manager.branches().cleanup_old_checkpoints(max)?;

        match OutputFormat::resolve(self.format) {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&json!({ "evicted": evicted }))?);
            }
            OutputFormat::Text => {
                for name in &evicted {
                    println!("evicted\t{name}");
                }
            }
            OutputFormat::Pretty => {
                if evicted.is_empty() {
                    println!("Nothing to clean up (limit {max})");
                } else {
                    println!("Removed {} checkpoint(s):", evicted.len());
                    for name in &evicted {
                        println!("  - {name}");
                    }
                }
            }
        }
        Ok(())
    }
}
