//! Detached-HEAD recovery

use crate::error::{Error, Result};
use crate::sync::SyncContext;
use crate::types::{MergeOutcome, Repository};
use tracing::{debug, info};

/// What happened to a repository's HEAD
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadOutcome {
    /// Already on a branch
    OnBranch(String),
    /// Switched to `branch`; `merged` tells whether the detached commit
    /// needed a merge to become reachable
    Reattached {
        /// Branch now checked out
        branch: String,
        /// Detached commit that was recovered
        commit: String,
        /// Whether a merge was performed
        merged: bool,
    },
    /// Neither the preferred nor the fallback branch exists
    NoBranch,
}

/// Put a detached repository back on its primary branch
///
/// The detached commit is merged into the branch unless it is already an
/// ancestor of the branch tip. A conflicting merge is aborted and reported
/// as `Error::MergeConflict`; the repository is left on the branch.
pub async fn reconcile_detached_head(ctx: &SyncContext<'_>, repo: &Repository) -> Result<HeadOutcome> {
    if let Some(branch) = ctx.vcs.current_branch(&repo.path).await? {
        debug!("{} is on {branch}", repo.name());
        return Ok(HeadOutcome::OnBranch(branch));
    }

    let commit = ctx.vcs.head_commit(&repo.path).await?;

    let mut branch = None;
    for candidate in ctx.config.branch_candidates() {
        if ctx.vcs.branch_exists(&repo.path, candidate).await? {
            branch = Some(candidate.to_string());
            break;
        }
    }
    let Some(branch) = branch else {
        return Ok(HeadOutcome::NoBranch);
    };

    info!(
        "{}: detached at {}, switching to {branch}",
        repo.name(),
        &commit[..8.min(commit.len())]
    );
    ctx.vcs.checkout(&repo.path, &branch).await?;

    if ctx.vcs.is_ancestor(&repo.path, &commit, &branch).await? {
        return Ok(HeadOutcome::Reattached {
            branch,
            commit,
            merged: false,
        });
    }

    match ctx.vcs.merge(&repo.path, &commit).await? {
        MergeOutcome::Conflict(message) => Err(Error::MergeConflict {
            repo: repo.name().to_string(),
            rev: commit,
            message,
        }),
        MergeOutcome::Merged => Ok(HeadOutcome::Reattached {
            branch,
            commit,
            merged: true,
        }),
        MergeOutcome::UpToDate | MergeOutcome::MissingRevision => Ok(HeadOutcome::Reattached {
            branch,
            commit,
            merged: false,
        }),
    }
}
