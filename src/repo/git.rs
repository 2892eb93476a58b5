use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use super::{BranchInfo, RepositoryPort};
use crate::error::CheckpointError;
use crate::subprocess::{RunOutput, Tool};

/// [`RepositoryPort`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
    timeout: Option<Duration>,
}

impl GitCli {
    /// Open the repository containing `path`.
    ///
    /// Fails with [`CheckpointError::NotARepository`] when `path` is not
    /// inside a git work tree.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open the repository, bounding every git invocation by `timeout`.
    pub fn open_with_timeout(path: &Path, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let output = Tool::new("git")
            .args(&["rev-parse", "--show-toplevel"])
            .current_dir(path)
            .maybe_timeout(timeout)
            .run()?;
        if !output.success() {
            return Err(CheckpointError::NotARepository(path.to_path_buf()).into());
        }
        let root = PathBuf::from(output.stdout.trim());
        Ok(Self { root, timeout })
    }

    /// Top level of the work tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn git(&self, args: &[&str]) -> Tool {
        Tool::new("git")
            .args(args)
            .current_dir(&self.root)
            .maybe_timeout(self.timeout)
    }

    fn run_ok(&self, args: &[&str]) -> anyhow::Result<RunOutput> {
        self.git(args)
            .run_ok()
            .with_context(|| format!("git {}", args.join(" ")))
    }
}

impl RepositoryPort for GitCli {
    fn create_branch(&self, name: &str) -> anyhow::Result<()> {
        if !self.git(&["rev-parse", "--verify", "--quiet", "HEAD"]).run()?.success() {
            return Err(CheckpointError::NoHead.into());
        }
        self.run_ok(&["branch", "--no-track", name, "HEAD"])?;
        Ok(())
    }

    fn delete_branch(&self, name: &str, force: bool) -> anyhow::Result<()> {
        let flag = if force { "-D" } else { "-d" };
        self.run_ok(&["branch", flag, name])?;
        Ok(())
    }

    fn list_branches(&self) -> anyhow::Result<Vec<BranchInfo>> {
        let output = self.run_ok(&[
            "for-each-ref",
            "--format=%(refname)%09%(upstream)",
            "refs/heads/",
        ])?;
        Ok(parse_for_each_ref(&output.stdout))
    }

    fn checkout(&self, name: &str) -> anyhow::Result<()> {
        let full = format!("refs/heads/{name}");
        if !self
            .git(&["show-ref", "--verify", "--quiet", &full])
            .run()?
            .success()
        {
            return Err(CheckpointError::RestoreTargetNotFound(name.to_string()).into());
        }
        self.run_ok(&["checkout", name, "--"])?;
        Ok(())
    }

    fn current_branch(&self) -> anyhow::Result<Option<String>> {
        let output = self.git(&["symbolic-ref", "--short", "-q", "HEAD"]).run()?;
        let name = output.stdout.trim();
        Ok((output.success() && !name.is_empty()).then(|| name.to_string()))
    }

    fn branch_exists(&self, name: &str) -> anyhow::Result<bool> {
        let full = format!("refs/heads/{name}");
        Ok(self
            .git(&["show-ref", "--verify", "--quiet", &full])
            .run()?
            .success())
    }
}

/// Parse `for-each-ref --format=%(refname)%09%(upstream)` output.
fn parse_for_each_ref(stdout: &str) -> Vec<BranchInfo> {
    stdout
        .lines()
        .filter_map(|line| {
            let (refname, upstream) = line.split_once('\t').unwrap_or((line, ""));
            let name = refname.strip_prefix("refs/heads/")?;
            let upstream = upstream.trim();
            let upstream = upstream
                .strip_prefix("refs/remotes/")
                .or_else(|| upstream.strip_prefix("refs/heads/"))
                .unwrap_or(upstream);
            Some(BranchInfo {
                name: name.to_string(),
                upstream: (!upstream.is_empty()).then(|| upstream.to_string()),
            })
        })
        .collect()
}
