use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::{Value, json};

use super::OutputFormat;
use crate::config::Config;
use crate::error::ExitError;
use crate::hooks::{HookEntry, HookRegistry};
use crate::project::resolve_project_root;

/// Marker identifying settings entries this tool manages.
const MANAGED_COMMAND: &str = "moai-checkpoint hooks run";

#[derive(Debug, Subcommand)]
pub enum HooksCommand {
    /// Install/update Claude Code hooks in .claude/settings.json
    Install {
        /// Project root directory
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
    /// Audit hook registrations and report issues
    Audit {
        /// Project root directory
        #[arg(long)]
        project_root: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
    /// Run a hook directly (for Claude Code hooks)
    Run {
        /// Hook name (checkpoint)
        hook_name: String,
        /// Project root directory
        #[arg(long)]
        project_root: Option<PathBuf>,
    },
}

impl HooksCommand {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            HooksCommand::Install { project_root } => install_hooks(project_root.as_deref()),
            HooksCommand::Audit {
                project_root,
                format,
            } => audit_hooks(project_root.as_deref(), *format),
            HooksCommand::Run {
                hook_name,
                project_root,
            } => run_hook(hook_name, project_root.as_deref()),
        }
    }
}

fn install_hooks(project_root: Option<&Path>) -> Result<()> {
    let root = resolve_project_root(project_root)?;
    let config = Config::load_for_project(&root)?;

    let eligible = HookRegistry::eligible(&config);
    if eligible.is_empty() {
        println!("No hooks eligible (checkpoints disabled in config)");
        return Ok(());
    }

    let settings_path = root.join(".claude").join("settings.json");
    let existing = if settings_path.exists() {
        let content = fs::read_to_string(&settings_path)
            .with_context(|| format!("reading {}", settings_path.display()))?;
        serde_json::from_str::<Value>(&content)
            .with_context(|| format!("parsing {}", settings_path.display()))?
    } else {
        json!({})
    };

    let settings = merge_settings(existing, &root, &eligible);

    if let Some(parent) = settings_path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&settings_path, serde_json::to_string_pretty(&settings)?)
        .with_context(|| format!("writing {}", settings_path.display()))?;

    println!("Generated {}", settings_path.display());
    println!("Hooks installed successfully");
    Ok(())
}

/// Merge our hook entries into `settings`, replacing previously managed
/// entries and keeping everything else.
fn merge_settings(mut settings: Value, project_root: &Path, eligible: &[HookEntry]) -> Value {
    let mut hooks_config: HashMap<&str, Vec<Value>> = HashMap::new();
    for hook_entry in eligible {
        for event in hook_entry.events {
            let hook_command = format!(
                "{MANAGED_COMMAND} {} --project-root {}",
                hook_entry.name,
                project_root.display()
            );
            hooks_config.entry(event.as_str()).or_default().push(json!({
                "matcher": hook_entry.matcher,
                "hooks": [
                    {
                        "type": "command",
                        "command": hook_command
                    }
                ]
            }));
        }
    }

    let mut merged_hooks = settings
        .get("hooks")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    for (event, new_entries) in hooks_config {
        let mut combined: Vec<Value> = merged_hooks
            .get(event)
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter(|entry| !is_managed_entry(entry))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        combined.extend(new_entries);
        merged_hooks.insert(event.to_string(), Value::Array(combined));
    }

    if !settings.is_object() {
        settings = json!({});
    }
    settings["hooks"] = Value::Object(merged_hooks);
    settings
}

fn is_managed_entry(entry: &Value) -> bool {
    entry["hooks"].as_array().is_some_and(|hooks| {
        hooks.iter().any(|h| {
            h["command"]
                .as_str()
                .is_some_and(|cmd| cmd.contains(MANAGED_COMMAND))
        })
    })
}

fn is_registered(settings: &Value, hook_entry: &HookEntry) -> bool {
    let needle = format!("run {}", hook_entry.name);
    hook_entry.events.iter().any(|event| {
        settings["hooks"][event.as_str()]
            .as_array()
            .is_some_and(|entries| {
                entries.iter().any(|entry| {
                    entry["hooks"].as_array().is_some_and(|hooks| {
                        hooks.iter().any(|h| {
                            h["command"].as_str().is_some_and(|cmd| {
                                cmd.contains(MANAGED_COMMAND) && cmd.contains(&needle)
                            })
                        })
                    })
                })
            })
    })
}

fn audit_hooks(project_root: Option<&Path>, format: OutputFormat) -> Result<()> {
    let root = resolve_project_root(project_root)?;
    let config = Config::load_for_project(&root)?;

    let mut issues = Vec::new();

    let settings_path = root.join(".claude").join("settings.json");
    if settings_path.exists() {
        let content = fs::read_to_string(&settings_path)
            .with_context(|| format!("reading {}", settings_path.display()))?;
        let settings: Value = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", settings_path.display()))?;

        for hook_entry in &HookRegistry::eligible(&config) {
            if !is_registered(&settings, hook_entry) {
                issues.push(format!(
                    "Hook '{}' not registered in settings.json",
                    hook_entry.name
                ));
            }
        }
    } else {
        issues.push("Missing .claude/settings.json".to_string());
    }

    match format {
        OutputFormat::Json => {
            let result = json!({
                "issues": issues,
                "status": if issues.is_empty() { "ok" } else { "issues_found" }
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Pretty | OutputFormat::Text => {
            if issues.is_empty() {
                println!("✓ All hooks configured correctly");
            } else {
                eprintln!("Hook audit found {} issue(s):", issues.len());
                for issue in &issues {
                    eprintln!("  - {issue}");
                }
                return Err(ExitError::AuditFailed.into());
            }
        }
    }

    Ok(())
}

fn run_hook(hook_name: &str, project_root: Option<&Path>) -> Result<()> {
    // Read stdin with a size limit (64KB)
    let stdin_input = {
        use std::io::Read;
        let mut buf = String::new();
        let mut handle = std::io::stdin().take(64 * 1024);
        handle.read_to_string(&mut buf).ok();
        if buf.is_empty() { None } else { Some(buf) }
    };

    let root = match project_root {
        Some(p) => p.to_path_buf(),
        None => stdin_input
            .as_deref()
            .and_then(|raw| serde_json::from_str::<crate::hooks::HookInput>(raw).ok())
            .and_then(|input| input.cwd)
            .map_or_else(std::env::current_dir, Ok)
            .context("could not determine project root")?,
    };

    let output = match hook_name {
        "checkpoint" => crate::hooks::run_checkpoint(&root, stdin_input.as_deref()),
        _ => return Err(ExitError::Config(format!("unknown hook: {hook_name}")).into()),
    };

    if let Some(output) = output {
        println!("{}", serde_json::to_string(&output)?);
    }
    Ok(())
}
