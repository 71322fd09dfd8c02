//! Version-control interface
//!
//! The orchestration engine treats git as a black box behind
//! [`VersionControl`]. Every method names the repository directory
//! explicitly, so no operation depends on the process working directory.

mod git;

pub use git::GitCli;

use crate::error::Result;
use crate::types::{CommandOutput, MergeOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// A single `git push` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    /// Remote to push to
    pub remote: String,
    /// Refspec, or `None` for the configured default
    pub refspec: Option<String>,
    /// Pass `--force-with-lease`
    pub force_with_lease: bool,
    /// Pass `--set-upstream`
    pub set_upstream: bool,
}

impl PushRequest {
    /// Plain push of the current branch to `remote`
    pub fn plain(remote: &str) -> Self {
        Self {
            remote: remote.to_string(),
            refspec: None,
            force_with_lease: false,
            set_upstream: false,
        }
    }

    /// Push `refspec` to `remote`
    pub fn refspec(remote: &str, refspec: impl Into<String>) -> Self {
        Self {
            refspec: Some(refspec.into()),
            ..Self::plain(remote)
        }
    }

    /// Same push with `--force-with-lease`
    #[must_use]
    pub const fn with_lease(mut self) -> Self {
        self.force_with_lease = true;
        self
    }

    /// Same push with `--set-upstream`
    #[must_use]
    pub const fn tracking(mut self) -> Self {
        self.set_upstream = true;
        self
    }
}

/// Operations the engine needs from the version-control engine
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Whether `dir` holds a checkout (a `.git` directory or gitfile)
    async fn is_repository(&self, dir: &Path) -> bool;

    /// Top-level directory of the checkout containing `dir`
    async fn toplevel(&self, dir: &Path) -> Result<PathBuf>;

    /// Current branch name, or `None` when HEAD is detached
    async fn current_branch(&self, dir: &Path) -> Result<Option<String>>;

    /// Hash of HEAD
    async fn head_commit(&self, dir: &Path) -> Result<String>;

    /// Resolve a revision to a hash, `None` if it does not exist locally
    async fn rev_parse(&self, dir: &Path, rev: &str) -> Result<Option<String>>;

    /// Author timestamp of `rev`, `None` if the object is not reachable
    async fn commit_timestamp(&self, dir: &Path, rev: &str) -> Result<Option<DateTime<Utc>>>;

    /// Commit the parent's index records for the submodule at `path`
    async fn submodule_commit(&self, parent: &Path, path: &str) -> Result<Option<String>>;

    /// Check out a branch or commit
    async fn checkout(&self, dir: &Path, rev: &str) -> Result<()>;

    /// Whether a local branch exists
    async fn branch_exists(&self, dir: &Path, branch: &str) -> Result<bool>;

    /// Whether `ancestor` is reachable from `descendant`
    async fn is_ancestor(&self, dir: &Path, ancestor: &str, descendant: &str) -> Result<bool>;

    /// Merge `rev` into the current branch; conflicts are aborted
    async fn merge(&self, dir: &Path, rev: &str) -> Result<MergeOutcome>;

    /// Fetch from a remote
    async fn fetch(&self, dir: &Path, remote: &str) -> Result<CommandOutput>;

    /// URL of a remote, `None` if the remote is not configured
    async fn remote_url(&self, dir: &Path, remote: &str) -> Result<Option<String>>;

    /// Point a remote at `url`, adding the remote if missing
    async fn set_remote_url(&self, dir: &Path, remote: &str, url: &str) -> Result<()>;

    /// Whether the working tree or index differs from HEAD
    ///
    /// Uncommitted edits inside a submodule do not count; a submodule
    /// whose checked-out commit moved does.
    async fn has_changes(&self, dir: &Path) -> Result<bool>;

    /// Whether the index differs from HEAD
    async fn has_staged_changes(&self, dir: &Path) -> Result<bool>;

    /// Stage every change outside the `exclude` paths
    async fn stage_all(&self, dir: &Path, exclude: &[&str]) -> Result<()>;

    /// Stage specific paths
    async fn stage_paths(&self, dir: &Path, paths: &[&str]) -> Result<()>;

    /// Commit the index, returning the new commit hash
    async fn commit(&self, dir: &Path, message: &str) -> Result<String>;

    /// Run a push; rejection is reported in the output, not as `Err`
    async fn push(&self, dir: &Path, request: &PushRequest) -> Result<CommandOutput>;

    /// Commits in HEAD that `base` lacks, `None` when `base` does not exist
    async fn commits_ahead(&self, dir: &Path, base: &str) -> Result<Option<usize>>;

    /// Unconditionally move submodules to their remote-tracking tips
    ///
    /// An empty `paths` moves every submodule of `parent`.
    async fn submodule_update_remote(&self, parent: &Path, paths: &[&str])
    -> Result<CommandOutput>;

    /// Rewrite a submodule URL in `.gitmodules`
    async fn set_submodule_url(&self, parent: &Path, name: &str, url: &str) -> Result<()>;
}

/// Parse one `git ls-files --stage` line for a gitlink entry
pub(crate) fn parse_gitlink(line: &str) -> Option<String> {
    // <mode> <hash> <stage>\t<path>
    let (meta, _path) = line.split_once('\t')?;
    let mut fields = meta.split_whitespace();
    let mode = fields.next()?;
    let hash = fields.next()?;
    (mode == "160000").then(|| hash.to_string())
}

/// Parse a unix-seconds timestamp as printed by `--format=%at`
pub(crate) fn parse_unix_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let secs = text.trim().parse::<i64>().ok()?;
    DateTime::from_timestamp(secs, 0)
}
