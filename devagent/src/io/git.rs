//! Version-control collaborator.
//!
//! [`VersionControl`] is the narrow surface the executors need. [`Git`]
//! implements it with bounded `git` subprocess calls; tests substitute fakes.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::io::process::{CommandOutput, ProcessLimits, run_bounded};

/// Version-control operations used by the executors.
pub trait VersionControl {
    /// Unified diff of the working tree, or of `range` when given.
    fn diff(&self, range: Option<&str>) -> Result<String>;
    /// Diff of the index against `HEAD`: exactly what the next commit records.
    fn staged_diff(&self) -> Result<String>;
    /// `git log <range> --pretty=format:<format>`.
    fn log(&self, range: &str, format: &str) -> Result<String>;
    fn current_branch(&self) -> Result<String>;
    fn remote_url(&self) -> Result<String>;
    fn stage_all(&self) -> Result<()>;
    /// Commit staged changes. Returns `false` when nothing was staged.
    fn commit(&self, message: &str) -> Result<bool>;
    fn push(&self) -> Result<()>;
    fn head_short_sha(&self) -> Result<String>;
    /// Tracked paths in `git ls-files` order.
    fn list_tracked_files(&self) -> Result<Vec<String>>;
    /// Contents of a tracked file, or `None` when it is unreadable or not UTF-8.
    fn read_file(&self, path: &str) -> Result<Option<String>>;
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    limits: ProcessLimits,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>, limits: ProcessLimits) -> Self {
        Self {
            workdir: workdir.into(),
            limits,
        }
    }

    fn has_staged_changes(&self) -> Result<bool> {
        let out = self.run_capture(&["diff", "--cached", "--name-only"])?;
        Ok(!out.trim().is_empty())
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(output.stdout_lossy())
    }

    fn run_checked(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = self.run(args)?;
        if output.timed_out {
            return Err(anyhow!(
                "git {} timed out after {:?}",
                args.join(" "),
                self.limits.timeout
            ));
        }
        if !output.status.success() {
            return Err(anyhow!(
                "git {} failed ({}): {}",
                args.join(" "),
                exit_label(&output),
                output.stderr_lossy().trim()
            ));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        debug!(args = ?args, "running git");
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.workdir);
        run_bounded(cmd, self.limits).with_context(|| format!("spawn git {}", args.join(" ")))
    }
}

impl VersionControl for Git {
    fn diff(&self, range: Option<&str>) -> Result<String> {
        match range {
            Some(range) => self.run_capture(&["diff", range]),
            None => self.run_capture(&["diff"]),
        }
    }

    fn staged_diff(&self) -> Result<String> {
        self.run_capture(&["diff", "--cached"])
    }

    fn log(&self, range: &str, format: &str) -> Result<String> {
        let pretty = format!("--pretty=format:{format}");
        self.run_capture(&["log", range, &pretty])
    }

    /// Return the current branch name (errors on detached HEAD).
    #[instrument(skip_all)]
    fn current_branch(&self) -> Result<String> {
        let out = self.run_capture(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        let name = out.trim().to_string();
        if name == "HEAD" {
            warn!("detached HEAD detected");
            return Err(anyhow!("detached HEAD (no branch to push or open a PR from)"));
        }
        debug!(branch = %name, "current branch");
        Ok(name)
    }

    fn remote_url(&self) -> Result<String> {
        let out = self
            .run_capture(&["config", "--get", "remote.origin.url"])
            .context("read remote.origin.url")?;
        Ok(out.trim().to_string())
    }

    fn stage_all(&self) -> Result<()> {
        self.run_checked(&["add", "-A"])?;
        Ok(())
    }

    #[instrument(skip_all)]
    fn commit(&self, message: &str) -> Result<bool> {
        if !self.has_staged_changes()? {
            debug!("no staged changes, skipping commit");
            return Ok(false);
        }
        debug!("committing staged changes");
        self.run_checked(&["commit", "-m", message])?;
        Ok(true)
    }

    #[instrument(skip_all)]
    fn push(&self) -> Result<()> {
        debug!("pushing current branch");
        self.run_checked(&["push"])?;
        Ok(())
    }

    fn head_short_sha(&self) -> Result<String> {
        let out = self.run_capture(&["rev-parse", "--short", "HEAD"])?;
        Ok(out.trim().to_string())
    }

    fn list_tracked_files(&self) -> Result<Vec<String>> {
        let output = self.run_checked(&["ls-files", "-z"])?;
        if output.stdout_truncated > 0 {
            return Err(anyhow!(
                "git ls-files output exceeded {} bytes",
                self.limits.output_limit_bytes
            ));
        }
        Ok(parse_nul_separated(&output.stdout))
    }

    fn read_file(&self, path: &str) -> Result<Option<String>> {
        let full = self.workdir.join(path);
        match fs::read(&full) {
            Ok(bytes) => Ok(String::from_utf8(bytes).ok()),
            Err(err) => {
                debug!(path, err = %err, "skipping unreadable tracked file");
                Ok(None)
            }
        }
    }
}

fn exit_label(output: &CommandOutput) -> String {
    match output.status.code() {
        Some(code) => format!("exit {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn parse_nul_separated(stdout: &[u8]) -> Vec<String> {
    stdout
        .split(|byte| *byte == 0)
        .filter(|entry| !entry.is_empty())
        .map(|entry| String::from_utf8_lossy(entry).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nul_separated_paths_in_order() {
        let paths = parse_nul_separated(b"b.rs\0src/a b.rs\0dir/c.txt\0");
        assert_eq!(paths, vec!["b.rs", "src/a b.rs", "dir/c.txt"]);
    }

    #[test]
    fn parses_empty_listing() {
        assert!(parse_nul_separated(b"").is_empty());
    }
}
