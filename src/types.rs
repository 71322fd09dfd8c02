//! Core types for webroot-git

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Category of a repository in the webroot layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepoKind {
    /// The superproject that embeds the submodules
    Primary,
    /// A submodule pinned by the primary repository
    Submodule,
    /// A standalone repository colocated under the primary root
    Extra,
}

impl fmt::Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Submodule => write!(f, "submodule"),
            Self::Extra => write!(f, "extra"),
        }
    }
}

/// A statically configured repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    /// Repository name (also its directory name under the primary root)
    pub name: String,
    /// Category, fixed for the lifetime of a run
    pub kind: RepoKind,
    /// Position within its category list (0 for the primary)
    pub index: usize,
    /// Account that owns the canonical copy of this repository
    pub canonical_owner: String,
}

/// Result of classifying a repository name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The name belongs to the configured set
    Known(RepoSpec),
    /// The name is not configured
    Unrecognized {
        /// Every name that would have been accepted
        valid: Vec<String>,
    },
}

/// A repository resolved against the filesystem and its remotes
///
/// Built fresh on every use; never cached between invocations.
#[derive(Debug, Clone)]
pub struct Repository {
    /// Static configuration for this repository
    pub spec: RepoSpec,
    /// Working tree location
    pub path: PathBuf,
    /// `origin` remote URL, if configured
    pub origin_url: Option<String>,
    /// `upstream` remote URL, if configured
    pub upstream_url: Option<String>,
}

impl Repository {
    /// Repository name
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Repository category
    pub const fn kind(&self) -> RepoKind {
        self.spec.kind
    }
}

/// A commit and its author timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRef {
    /// Full commit hash
    pub hash: String,
    /// Author timestamp
    pub authored_at: DateTime<Utc>,
}

impl CommitRef {
    /// Short hash for display
    pub fn short(&self) -> &str {
        &self.hash[..8.min(self.hash.len())]
    }
}

/// Owner/name coordinates parsed from a remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInfo {
    /// Hostname (e.g. "github.com")
    pub host: String,
    /// Account segment of the URL
    pub owner: String,
    /// Repository segment of the URL, without `.git`
    pub repo: String,
}

/// A git remote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitRemote {
    /// Remote name (e.g., "origin")
    pub name: String,
    /// Remote URL
    pub url: String,
}

/// Captured result of an external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited successfully
    pub success: bool,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl CommandOutput {
    /// A successful result with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given stderr
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// stdout and stderr joined, for signature matching
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Result of merging a revision into the current branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Nothing to merge
    UpToDate,
    /// Merge (or fast-forward) completed
    Merged,
    /// The revision does not exist locally
    MissingRevision,
    /// Merge stopped on conflicts and was aborted
    Conflict(String),
}

/// How a commit/push sequence ended for one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// No working-tree changes; nothing committed or pushed
    Clean,
    /// Pushed straight to origin
    PushedDirectly,
    /// Pushed with `--force-with-lease` after the plain strategies failed
    PushedAfterForce,
    /// Pushed to the user's fork (or a feature branch on origin)
    PushedToFork {
        /// Branch that received the commit
        branch: String,
    },
    /// Pushed and a pull request was opened or found
    PullRequestCreated(PullRequest),
    /// Nothing was published
    Failed(String),
}

impl PushOutcome {
    /// Whether the commit reached a remote
    pub const fn is_published(&self) -> bool {
        !matches!(self, Self::Clean | Self::Failed(_))
    }
}

impl fmt::Display for PushOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "no changes"),
            Self::PushedDirectly => write!(f, "pushed"),
            Self::PushedAfterForce => write!(f, "pushed (force-with-lease)"),
            Self::PushedToFork { branch } => write!(f, "pushed to fork ({branch})"),
            Self::PullRequestCreated(pr) => write!(f, "pull request #{}", pr.number),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// GitHub Pages state on a fork
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PagesStatus {
    /// Pages is serving the fork
    Enabled,
    /// Pages is off
    NotEnabled,
    /// An enable request was sent
    EnableAttempted,
}

impl fmt::Display for PagesStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::NotEnabled => write!(f, "not enabled"),
            Self::EnableAttempted => write!(f, "enable requested"),
        }
    }
}

/// A pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head reference (`owner:branch`)
    pub head_ref: String,
    /// PR title
    pub title: String,
}

/// Parameters for opening a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRequest {
    /// Account owning the repository that receives the PR
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Head in `account:branch` form
    pub head: String,
    /// Base branch on the receiving repository
    pub base: String,
    /// PR title
    pub title: String,
    /// PR body (markdown)
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_outcome_published() {
        assert!(!PushOutcome::Clean.is_published());
        assert!(!PushOutcome::Failed("x".into()).is_published());
        assert!(PushOutcome::PushedDirectly.is_published());
        assert!(
            PushOutcome::PushedToFork {
                branch: "main".into()
            }
            .is_published()
        );
    }

    #[test]
    fn test_commit_short_hash() {
        let commit = CommitRef {
            hash: "0123456789abcdef".into(),
            authored_at: Utc::now(),
        };
        assert_eq!(commit.short(), "01234567");
    }
}
