use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Deleting this many files at once counts as risky.
pub const RISKY_DELETION_THRESHOLD: usize = 10;
/// Renaming this many files at once counts as risky.
pub const RISKY_RENAME_THRESHOLD: usize = 10;

/// File names whose modification is always risky, wherever they live.
/// A bare `config.json` matches in any directory, not only under `.moai`.
pub const CRITICAL_FILES: &[&str] = &["CLAUDE.md", "config.json"];
/// Project config path; matched as a substring with `/` or `\` separators.
pub const CRITICAL_CONFIG_PATH: &str = ".moai/config/config.json";
/// Directories whose contents are always risky to modify.
pub const CRITICAL_DIRS: &[&str] = &[".moai/memory"];

/// Stateless classification of an impending change as risky or safe.
///
/// Matching is deliberately permissive: a false positive costs one extra
/// checkpoint branch, a false negative costs the user's work.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDetector;

impl EventDetector {
    pub const fn new() -> Self {
        Self
    }

    /// True when `deleted` holds at least [`RISKY_DELETION_THRESHOLD`] entries.
    /// Duplicates count separately.
    pub fn is_risky_deletion<T>(&self, deleted: &[T]) -> bool {
        deleted.len() >= RISKY_DELETION_THRESHOLD
    }

    /// True when `renamed` holds at least [`RISKY_RENAME_THRESHOLD`] pairs.
    pub fn is_risky_refactoring<T>(&self, renamed: &[(T, T)]) -> bool {
        renamed.len() >= RISKY_RENAME_THRESHOLD
    }

    /// True for critical file names, the project config path, and anything
    /// under a critical directory.
    pub fn is_critical_file(&self, path: &Path) -> bool {
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| CRITICAL_FILES.contains(&name))
        {
            return true;
        }

        let normalized = path.to_string_lossy().replace('\\', "/");
        if normalized.contains(CRITICAL_CONFIG_PATH) {
            return true;
        }

        let bounded = format!("/{}/", normalized.trim_end_matches('/'));
        CRITICAL_DIRS
            .iter()
            .any(|dir| bounded.contains(&format!("/{dir}/")))
    }

    /// Classify a shell command line as destructive, returning the operation
    /// label to checkpoint under.
    pub fn risky_command(&self, command: &str) -> Option<&'static str> {
        risky_command_patterns()
            .iter()
            .find(|(re, _)| re.is_match(command))
            .map(|(_, label)| *label)
    }
}

fn risky_command_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"\brm\s+(-[a-zA-Z]*r[a-zA-Z]*f|-[a-zA-Z]*f[a-zA-Z]*r|-r\s+-f|-f\s+-r)\b", "delete"),
            (r"\bgit\s+reset\s+(.*\s)?--hard\b", "reset"),
            (r"\bgit\s+rebase\b", "rebase"),
            (r"\bgit\s+merge\b", "merge"),
            (r"\bgit\s+(checkout\s+(.*\s)?--\s|restore\b)", "discard"),
            (r"\bgit\s+clean\s+(.*\s)?-[a-zA-Z]*f", "clean"),
        ]
        .into_iter()
        .map(|(pattern, label)| (Regex::new(pattern).expect("valid risky-command regex"), label))
        .collect()
    })
}
