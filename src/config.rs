use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::checkpoint::{DEFAULT_LOG_FILE, DEFAULT_MAX_CHECKPOINTS};
use crate::error::ExitError;

/// Config file locations relative to the project root.
pub const CONFIG_TOML: &str = ".moai/checkpoint.toml";
pub const CONFIG_JSON: &str = ".moai/checkpoint.json";

/// Find the config file path, preferring TOML over JSON.
/// Returns None if neither exists.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    let toml_path = dir.join(CONFIG_TOML);
    if toml_path.exists() {
        return Some(toml_path);
    }
    let json_path = dir.join(CONFIG_JSON);
    if json_path.exists() {
        return Some(json_path);
    }
    None
}

/// Top-level `.moai/checkpoint.toml` config.
///
/// Every field has a default, so a missing file behaves like an empty one.
/// Fields accept camelCase aliases when loaded from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    #[serde(default)]
    pub git: GitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CheckpointConfig {
    /// Turn automatic checkpoints from hooks on or off.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Checkpoint branches kept before the oldest are evicted.
    #[serde(default = "default_max_checkpoints", alias = "maxCheckpoints")]
    pub max_checkpoints: usize,
    /// Audit log path, relative to the project root.
    #[serde(default = "default_log_file", alias = "logFile")]
    pub log_file: String,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_checkpoints: default_max_checkpoints(),
            log_file: default_log_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GitConfig {
    /// Wall-clock limit per git invocation, in seconds. 0 disables the limit.
    #[serde(default = "default_git_timeout", alias = "timeoutSecs")]
    pub timeout_secs: u64,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_git_timeout(),
        }
    }
}

fn default_true() -> bool { true }
fn default_max_checkpoints() -> usize { DEFAULT_MAX_CHECKPOINTS }
fn default_log_file() -> String { DEFAULT_LOG_FILE.into() }
fn default_git_timeout() -> u64 { 5 }

impl Config {
    /// Load config from a file (TOML or JSON, auto-detected by extension).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "json" => Self::parse_json(&contents)?,
            _ => Self::parse_toml(&contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load the project's config, or defaults when it has none.
    pub fn load_for_project(root: &Path) -> anyhow::Result<Self> {
        match find_config(root) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string.
    pub fn parse_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| ExitError::Config(format!("invalid {CONFIG_TOML}: {e}")).into())
    }

    /// Parse config from a JSON string.
    pub fn parse_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ExitError::Config(format!("invalid {CONFIG_JSON}: {e}")).into())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.checkpoint.max_checkpoints == 0 {
            return Err(ExitError::Config(
                "checkpoint.max_checkpoints must be at least 1".to_string(),
            )
            .into());
        }
        if self.checkpoint.log_file.trim().is_empty() {
            return Err(ExitError::Config("checkpoint.log_file must not be empty".to_string()).into());
        }
        Ok(())
    }

    /// Serialize config to a TOML string with section comments.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        let raw = toml::to_string_pretty(self).context("serializing config to TOML")?;

        let mut doc: toml_edit::DocumentMut = raw
            .parse()
            .context("parsing generated TOML for comment injection")?;

        doc.decor_mut()
            .set_prefix("# moai-checkpoint configuration\n\n");

        fn set_table_comment(doc: &mut toml_edit::DocumentMut, key: &str, comment: &str) {
            if let Some(tbl) = doc.get_mut(key).and_then(|item| item.as_table_mut()) {
                tbl.decor_mut().set_prefix(comment);
            }
        }

        set_table_comment(
            &mut doc,
            "checkpoint",
            "# Checkpoint branches (before-<operation>-<timestamp>)\n",
        );
        set_table_comment(&mut doc, "git", "\n# git invocation limits\n");

        Ok(doc.to_string())
    }

    /// Absolute log path for a project.
    pub fn log_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.checkpoint.log_file)
    }

    pub fn git_timeout(&self) -> Option<Duration> {
        (self.git.timeout_secs > 0).then(|| Duration::from_secs(self.git.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_toml_config() {
        let toml_str = r#"
[checkpoint]
enabled = false
max_checkpoints = 25
log_file = "logs/checkpoints.log"

[git]
timeout_secs = 30
"#;
        let config = Config::parse_toml(toml_str).unwrap();
        assert!(!config.checkpoint.enabled);
        assert_eq!(config.checkpoint.max_checkpoints, 25);
        assert_eq!(config.checkpoint.log_file, "logs/checkpoints.log");
        assert_eq!(config.git_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert!(config.checkpoint.enabled);
        assert_eq!(config.checkpoint.max_checkpoints, 10);
        assert_eq!(config.checkpoint.log_file, ".moai/checkpoints.log");
        assert_eq!(config.git_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn parse_json_with_camel_case() {
        let json = r#"{"checkpoint": {"maxCheckpoints": 3, "logFile": "a.log"}, "git": {"timeoutSecs": 0}}"#;
        let config = Config::parse_json(json).unwrap();
        assert_eq!(config.checkpoint.max_checkpoints, 3);
        assert_eq!(config.checkpoint.log_file, "a.log");
        assert_eq!(config.git_timeout(), None);
    }

    #[test]
    fn parse_malformed_toml() {
        let err = Config::parse_toml("not valid toml [[[").unwrap_err();
        assert!(err.to_string().contains("invalid .moai/checkpoint.toml"));
        assert!(matches!(err.downcast_ref::<ExitError>(), Some(ExitError::Config(_))));
    }

    #[test]
    fn zero_max_checkpoints_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".moai")).unwrap();
        std::fs::write(
            dir.path().join(CONFIG_TOML),
            "[checkpoint]\nmax_checkpoints = 0\n",
        )
        .unwrap();
        let err = Config::load_for_project(dir.path()).unwrap_err();
        assert!(err.to_string().contains("max_checkpoints"));
    }

    #[test]
    fn missing_config_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_for_project(dir.path()).unwrap();
        assert_eq!(config.checkpoint.max_checkpoints, 10);
        assert_eq!(
            config.log_path(dir.path()),
            dir.path().join(".moai/checkpoints.log")
        );
    }

    #[test]
    fn find_config_prefers_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".moai")).unwrap();
        std::fs::write(dir.path().join(CONFIG_TOML), "").unwrap();
        std::fs::write(dir.path().join(CONFIG_JSON), "{}").unwrap();
        let found = find_config(dir.path()).unwrap();
        assert!(found.to_string_lossy().ends_with("checkpoint.toml"));
    }

    #[test]
    fn roundtrip_toml_with_comments() {
        let mut config = Config::default();
        config.checkpoint.max_checkpoints = 4;
        let output = config.to_toml().unwrap();
        assert!(output.contains("# moai-checkpoint configuration"));
        assert!(output.contains("# git invocation limits"));
        let parsed = Config::parse_toml(&output).unwrap();
        assert_eq!(parsed.checkpoint.max_checkpoints, 4);
    }
}
