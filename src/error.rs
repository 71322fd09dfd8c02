//! Error types for webroot-git
//!
//! Failures are local to the repository or step that raised them. The
//! orchestrators report them through the progress callback and move on to
//! the next repository; only [`Error::is_fatal_to_run`] errors abort a run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the orchestration engine
#[derive(Debug, Error)]
pub enum Error {
    /// The hosting-platform CLI has no authenticated session
    #[error("hosting platform is not authenticated: {0}")]
    AuthUnavailable(String),

    /// An operation needs an authenticated identity and none is available
    #[error("authentication required to {0}. Run `gh auth login` and retry")]
    AuthRequired(String),

    /// A push was rejected for lack of write access
    #[error("permission denied pushing {repo}: {message}")]
    PermissionDenied {
        /// Repository name
        repo: String,
        /// Rejection text from git
        message: String,
    },

    /// The platform could not produce a fork
    #[error("failed to fork {owner}/{repo}: {message}")]
    ForkFailed {
        /// Account that owns the canonical repository
        owner: String,
        /// Repository name
        repo: String,
        /// Failure detail
        message: String,
    },

    /// The platform refused to open a pull request
    #[error("failed to create pull request for {repo}: {message}")]
    PrCreationFailed {
        /// Repository name
        repo: String,
        /// Failure detail
        message: String,
    },

    /// A merge could not complete without conflicts
    #[error("merge conflict in {repo} merging {rev}: {message}")]
    MergeConflict {
        /// Repository name
        repo: String,
        /// Revision being merged
        rev: String,
        /// Output from git
        message: String,
    },

    /// The token lacks the `workflow` scope needed to push workflow files
    #[error(
        "push of {repo} touches .github/workflows but the token lacks the `workflow` scope. \
         Run `gh auth refresh -h github.com -s workflow` and retry"
    )]
    MissingWorkflowScope {
        /// Repository name
        repo: String,
    },

    /// A repository name is neither the primary, a submodule nor an extra repo
    #[error("'{name}' is not a recognized repository. Valid names: {}", valid.join(", "))]
    RepoNotRecognized {
        /// The name that was given
        name: String,
        /// Every name that would have been accepted
        valid: Vec<String>,
    },

    /// Commits were still unpushed after the bounded retry loop
    #[error("{repo} still has {remaining} unpushed commit(s) after {attempts} attempts")]
    UnpushedAfterRetries {
        /// Repository name
        repo: String,
        /// Number of attempts made
        attempts: u32,
        /// Commits that remain ahead of the remote
        remaining: usize,
    },

    /// The command was not started from the primary repository
    #[error("{0} is not the {1} repository root")]
    NotPrimaryRepository(PathBuf, String),

    /// Rewriting a remote URL failed
    #[error("failed to point {remote} of {repo} at {url}: {message}")]
    RemoteRewriteFailed {
        /// Repository name
        repo: String,
        /// Remote name
        remote: String,
        /// Target URL
        url: String,
        /// Output from git
        message: String,
    },

    /// A git invocation failed
    #[error("git {command} failed: {message}")]
    Git {
        /// The git subcommand line
        command: String,
        /// stderr from git
        message: String,
    },

    /// Generic hosting platform failure
    #[error("platform error: {0}")]
    Platform(String),

    /// The operator aborted the commit from an interactive prompt
    #[error("aborted: {0}")]
    Aborted(String),

    /// Parse error (URLs, git output)
    #[error("parse error: {0}")]
    Parse(String),

    /// GitHub API error with context
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Octocrab error
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error must stop the whole run instead of one repository
    pub const fn is_fatal_to_run(&self) -> bool {
        matches!(self, Self::NotPrimaryRepository(..) | Self::Aborted(_))
    }
}

/// Result alias for webroot-git operations
pub type Result<T> = std::result::Result<T, Error>;
