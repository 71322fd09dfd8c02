//! `git` command-line implementation of [`VersionControl`]

use crate::error::{Error, Result};
use crate::types::{CommandOutput, MergeOutcome};
use crate::vcs::{PushRequest, VersionControl, parse_gitlink, parse_unix_timestamp};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Runs the system `git` binary
///
/// Using the system binary picks up SSH keys, credential helpers and any
/// authentication configured in `~/.gitconfig`.
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    /// Create a new git runner
    pub const fn new() -> Self {
        Self
    }

    async fn git(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput> {
        debug!("git {} (in {})", args.join(" "), dir.display());

        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(|e| Error::Git {
                command: args.join(" "),
                message: e.to_string(),
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    async fn git_checked(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let output = self.git(dir, args).await?;
        if output.success {
            Ok(output.stdout)
        } else {
            // `commit` reports "nothing to commit" on stdout
            Err(Error::Git {
                command: args.join(" "),
                message: output.combined().trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn is_repository(&self, dir: &Path) -> bool {
        // Submodules carry a `.git` file rather than a directory
        dir.join(".git").exists()
    }

    async fn toplevel(&self, dir: &Path) -> Result<PathBuf> {
        self.git_checked(dir, &["rev-parse", "--show-toplevel"])
            .await
            .map(PathBuf::from)
    }

    async fn current_branch(&self, dir: &Path) -> Result<Option<String>> {
        let output = self.git(dir, &["symbolic-ref", "--short", "-q", "HEAD"]).await?;
        Ok((output.success && !output.stdout.is_empty()).then_some(output.stdout))
    }

    async fn head_commit(&self, dir: &Path) -> Result<String> {
        self.git_checked(dir, &["rev-parse", "HEAD"]).await
    }

    async fn rev_parse(&self, dir: &Path, rev: &str) -> Result<Option<String>> {
        let spec = format!("{rev}^{{commit}}");
        let output = self
            .git(dir, &["rev-parse", "--verify", "--quiet", &spec])
            .await?;
        Ok((output.success && !output.stdout.is_empty()).then_some(output.stdout))
    }

    async fn commit_timestamp(&self, dir: &Path, rev: &str) -> Result<Option<DateTime<Utc>>> {
        let output = self.git(dir, &["show", "-s", "--format=%at", rev]).await?;
        if !output.success {
            return Ok(None);
        }
        Ok(parse_unix_timestamp(&output.stdout))
    }

    async fn submodule_commit(&self, parent: &Path, path: &str) -> Result<Option<String>> {
        let stdout = self
            .git_checked(parent, &["ls-files", "--stage", "--", path])
            .await?;
        Ok(stdout.lines().find_map(parse_gitlink))
    }

    async fn checkout(&self, dir: &Path, rev: &str) -> Result<()> {
        self.git_checked(dir, &["checkout", "-q", rev]).await.map(|_| ())
    }

    async fn branch_exists(&self, dir: &Path, branch: &str) -> Result<bool> {
        let reference = format!("refs/heads/{branch}");
        let output = self
            .git(dir, &["show-ref", "--verify", "--quiet", &reference])
            .await?;
        Ok(output.success)
    }

    async fn is_ancestor(&self, dir: &Path, ancestor: &str, descendant: &str) -> Result<bool> {
        let output = self
            .git(dir, &["merge-base", "--is-ancestor", ancestor, descendant])
            .await?;
        Ok(output.success)
    }

    async fn merge(&self, dir: &Path, rev: &str) -> Result<MergeOutcome> {
        if self.rev_parse(dir, rev).await?.is_none() {
            return Ok(MergeOutcome::MissingRevision);
        }

        let output = self.git(dir, &["merge", "--no-edit", rev]).await?;
        if output.success {
            let text = output.stdout.to_lowercase();
            if text.contains("already up to date") || text.contains("already up-to-date") {
                return Ok(MergeOutcome::UpToDate);
            }
            return Ok(MergeOutcome::Merged);
        }

        // Leave the tree clean so the next run starts from a known state
        let _ = self.git(dir, &["merge", "--abort"]).await;
        Ok(MergeOutcome::Conflict(output.combined().trim().to_string()))
    }

    async fn fetch(&self, dir: &Path, remote: &str) -> Result<CommandOutput> {
        self.git(dir, &["fetch", "--quiet", remote]).await
    }

    async fn remote_url(&self, dir: &Path, remote: &str) -> Result<Option<String>> {
        let output = self.git(dir, &["remote", "get-url", remote]).await?;
        Ok((output.success && !output.stdout.is_empty()).then_some(output.stdout))
    }

    async fn set_remote_url(&self, dir: &Path, remote: &str, url: &str) -> Result<()> {
        if self.remote_url(dir, remote).await?.is_some() {
            self.git_checked(dir, &["remote", "set-url", remote, url])
                .await
                .map(|_| ())
        } else {
            self.git_checked(dir, &["remote", "add", remote, url])
                .await
                .map(|_| ())
        }
    }

    async fn has_changes(&self, dir: &Path) -> Result<bool> {
        let stdout = self
            .git_checked(dir, &["status", "--porcelain", "--ignore-submodules=dirty"])
            .await?;
        Ok(!stdout.is_empty())
    }

    async fn has_staged_changes(&self, dir: &Path) -> Result<bool> {
        let output = self.git(dir, &["diff", "--cached", "--quiet"]).await?;
        Ok(!output.success)
    }

    async fn stage_all(&self, dir: &Path, exclude: &[&str]) -> Result<()> {
        let excluded: Vec<String> = exclude
            .iter()
            .map(|path| format!(":(exclude){path}"))
            .collect();
        let mut args = vec!["add", "-A", "--", "."];
        args.extend(excluded.iter().map(String::as_str));
        self.git_checked(dir, &args).await.map(|_| ())
    }

    async fn stage_paths(&self, dir: &Path, paths: &[&str]) -> Result<()> {
        let mut args = vec!["add", "--"];
        args.extend_from_slice(paths);
        self.git_checked(dir, &args).await.map(|_| ())
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<String> {
        self.git_checked(dir, &["commit", "-q", "-m", message]).await?;
        self.head_commit(dir).await
    }

    async fn push(&self, dir: &Path, request: &PushRequest) -> Result<CommandOutput> {
        let mut args = vec!["push"];
        if request.force_with_lease {
            args.push("--force-with-lease");
        }
        if request.set_upstream {
            args.push("--set-upstream");
        }
        args.push(&request.remote);
        if let Some(refspec) = &request.refspec {
            args.push(refspec);
        }
        self.git(dir, &args).await
    }

    async fn commits_ahead(&self, dir: &Path, base: &str) -> Result<Option<usize>> {
        if self.rev_parse(dir, base).await?.is_none() {
            return Ok(None);
        }
        let range = format!("{base}..HEAD");
        let stdout = self
            .git_checked(dir, &["rev-list", "--count", &range])
            .await?;
        stdout
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| Error::Parse(format!("rev-list count '{stdout}': {e}")))
    }

    async fn submodule_update_remote(
        &self,
        parent: &Path,
        paths: &[&str],
    ) -> Result<CommandOutput> {
        let mut args = vec!["submodule", "update", "--remote", "--recursive"];
        if !paths.is_empty() {
            args.push("--");
            args.extend_from_slice(paths);
        }
        self.git(parent, &args).await
    }

    async fn set_submodule_url(&self, parent: &Path, name: &str, url: &str) -> Result<()> {
        let key = format!("submodule.{name}.url");
        self.git_checked(parent, &["config", "-f", ".gitmodules", &key, url])
            .await
            .map(|_| ())
    }
}
