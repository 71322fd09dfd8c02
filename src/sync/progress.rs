//! Progress callback trait for interface-agnostic updates
//!
//! This trait allows different interfaces (CLI, tests) to receive progress
//! updates while repositories are pulled and pushed.

use crate::error::Error;
use crate::types::{PushOutcome, PullRequest};
use async_trait::async_trait;
use std::fmt;

/// Orchestration phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Merging origin and upstream into each repository
    Pulling,
    /// Reconciling submodule commits with the parent's references
    ReconcilingSubmodules,
    /// Re-attaching detached HEADs
    ReconcilingHeads,
    /// Aligning remotes with the authenticated account
    CheckingRemotes,
    /// Committing and pushing local changes
    Pushing,
    /// Recording new submodule commits in the primary repository
    UpdatingReferences,
    /// Re-checking every repository for unpushed commits
    FinalSweep,
    /// Run complete
    Complete,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pulling => write!(f, "Pulling"),
            Self::ReconcilingSubmodules => write!(f, "Reconciling submodules"),
            Self::ReconcilingHeads => write!(f, "Fixing detached HEADs"),
            Self::CheckingRemotes => write!(f, "Checking remotes"),
            Self::Pushing => write!(f, "Pushing"),
            Self::UpdatingReferences => write!(f, "Updating submodule references"),
            Self::FinalSweep => write!(f, "Verifying everything is pushed"),
            Self::Complete => write!(f, "Done"),
        }
    }
}

/// Push operation status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    /// Commit/push started
    Started,
    /// No local changes
    Clean,
    /// Commit reached a remote
    Published(PushOutcome),
    /// Push failed with error message
    Failed(String),
}

impl fmt::Display for PushStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Clean => write!(f, "no changes"),
            Self::Published(outcome) => write!(f, "{outcome}"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Progress callback trait
///
/// Implement this trait to receive progress updates during a run.
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called when entering a new phase
    async fn on_phase(&self, phase: Phase);

    /// Called when work on a repository begins
    async fn on_repo(&self, repo: &str);

    /// Called as a repository's commit/push progresses
    async fn on_push(&self, repo: &str, status: PushStatus);

    /// Called when a PR is created or an open one is found
    async fn on_pr_created(&self, repo: &str, pr: &PullRequest);

    /// Called for non-fatal conditions that need attention
    async fn on_warning(&self, message: &str);

    /// Called when an error occurs (non-fatal to the run)
    async fn on_error(&self, error: &Error);

    /// Called with a general status message
    async fn on_message(&self, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_phase(&self, _phase: Phase) {}
    async fn on_repo(&self, _repo: &str) {}
    async fn on_push(&self, _repo: &str, _status: PushStatus) {}
    async fn on_pr_created(&self, _repo: &str, _pr: &PullRequest) {}
    async fn on_warning(&self, _message: &str) {}
    async fn on_error(&self, _error: &Error) {}
    async fn on_message(&self, _message: &str) {}
}
