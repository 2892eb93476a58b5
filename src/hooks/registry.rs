use crate::config::Config;

/// Claude Code hook event type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    PreToolUse,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "PreToolUse",
        }
    }
}

/// Hook registry entry
#[derive(Debug, Clone)]
pub struct HookEntry {
    pub name: &'static str,
    pub events: &'static [HookEvent],
    /// Tool-name matcher written into `.claude/settings.json`.
    pub matcher: &'static str,
}

impl HookEntry {
    /// Check if this hook is eligible under the project config
    pub fn is_eligible(&self, config: &Config) -> bool {
        match self.name {
            "checkpoint" => config.checkpoint.enabled,
            _ => false,
        }
    }
}

pub struct HookRegistry;

impl HookRegistry {
    /// Get all registered hooks
    pub fn all() -> Vec<HookEntry> {
        vec![HookEntry {
            name: "checkpoint",
            events: &[HookEvent::PreToolUse],
            matcher: "Edit|Write|MultiEdit|NotebookEdit|Bash",
        }]
    }

    /// Get eligible hooks for a given config
    pub fn eligible(config: &Config) -> Vec<HookEntry> {
        Self::all()
            .into_iter()
            .filter(|entry| entry.is_eligible(config))
            .collect()
    }
}
