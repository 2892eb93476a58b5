use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::{self, Config};
use crate::project::resolve_project_root;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
    /// Checkpoint branches to keep
    #[arg(long)]
    pub max_checkpoints: Option<usize>,
    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn execute(&self) -> Result<()> {
        let root = resolve_project_root(self.project_root.as_deref())?;

        if let Some(existing) = config::find_config(&root)
            && !self.force
        {
            println!("Config already exists at {}", existing.display());
            return Ok(());
        }

        let mut config = Config::default();
        if let Some(max) = self.max_checkpoints {
            anyhow::ensure!(max > 0, "--max-checkpoints must be at least 1");
            config.checkpoint.max_checkpoints = max;
        }

        let path = root.join(config::CONFIG_TOML);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&path, config.to_toml()?)
            .with_context(|| format!("writing {}", path.display()))?;

        println!("Wrote {}", path.display());
        Ok(())
    }
}
