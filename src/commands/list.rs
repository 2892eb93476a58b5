use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use super::OutputFormat;
use crate::checkpoint::{CheckpointBranch, CheckpointLog, sort_oldest_first};
use crate::config::Config;
use crate::project::{open_manager, resolve_project_root};

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Serialize)]
pub struct CheckpointSummary {
    pub id: String,
    pub operation: Option<String>,
    pub created_at: Option<String>,
}

impl From<String> for CheckpointSummary {
    fn from(id: String) -> Self {
        let parsed = CheckpointBranch::parse(&id);
        Self {
            operation: parsed.as_ref().map(|b| b.operation.clone()),
            created_at: parsed.map(|b| b.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListReport {
    pub max_checkpoints: usize,
    pub checkpoints: Vec<CheckpointSummary>,
}

impl ListArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let root = resolve_project_root(self.project_root.as_deref())?;
        let config = Config::load_for_project(&root)?;
        let manager = open_manager(&root, &config)?;

        let mut names = manager.list_checkpoints()?;
        sort_oldest_first(&mut names);
        names.reverse();

        let report = ListReport {
            max_checkpoints: manager.branches().max_count(),
            checkpoints: names.into_iter().map(CheckpointSummary::from).collect(),
        };

        match OutputFormat::resolve(self.format) {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Text => {
                for c in &report.checkpoints {
                    println!(
                        "{}\t{}\t{}",
                        c.id,
                        c.operation.as_deref().unwrap_or("-"),
                        c.created_at.as_deref().unwrap_or("-")
                    );
                }
            }
            OutputFormat::Pretty => {
                println!(
                    "Checkpoints ({}/{}), newest first:",
                    report.checkpoints.len(),
                    report.max_checkpoints
                );
                for c in &report.checkpoints {
                    println!(
                        "  {}  {:<10} {}",
                        c.created_at.as_deref().unwrap_or("????-??-?? ??:??:??"),
                        c.operation.as_deref().unwrap_or("?"),
                        c.id
                    );
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Only show safety checkpoints taken before restores
    #[arg(long)]
    pub safety_only: bool,
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl LogArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let root = resolve_project_root(self.project_root.as_deref())?;
        let config = Config::load_for_project(&root)?;
        let log = CheckpointLog::new(config.log_path(&root));

        let entries: Vec<_> = log
            .read_entries()?
            .into_iter()
            .filter(|e| !self.safety_only || e.is_safety)
            .collect();

        match OutputFormat::resolve(self.format) {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
            OutputFormat::Text => {
                for e in &entries {
                    println!(
                        "{}\t{}\t{}\t{}",
                        e.timestamp,
                        e.operation,
                        e.checkpoint_id,
                        if e.is_safety { "safety" } else { "-" }
                    );
                }
            }
            OutputFormat::Pretty => {
                if entries.is_empty() {
                    println!("No checkpoints logged in {}", log.path().display());
                }
                for e in &entries {
                    let marker = if e.is_safety { " (safety)" } else { "" };
                    println!("{}  {}{marker}", e.timestamp, e.checkpoint_id);
                }
            }
        }
        Ok(())
    }
}
