//! Commit/push engine
//!
//! `clean -> staged -> committed -> {pushed | fork | pull request | failed}`
//!
//! Push fallbacks are modelled as ordered [`PushStrategy`] lists evaluated
//! by a single dispatcher, [`run_strategies`], which returns a tagged
//! [`PushAttempt`]. Owners walk the plain strategies and finish with one
//! force-with-lease. Non-owners try a direct push, then fork and open a pull
//! request on permission errors, or push a feature branch on anything else.

use crate::error::{Error, Result};
use crate::platform::remote_account;
use crate::sync::pages::{PrTarget, PullRequestDecision, open_pull_request};
use crate::sync::remotes::{check_user_change, is_owner, parent_account, setup_fork};
use crate::sync::{PushStatus, SyncContext, ensure_pushed, reconcile_detached_head};
use crate::types::{PushOutcome, RepoKind, Repository};
use crate::vcs::PushRequest;
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, info, warn};

/// One way of invoking `git push`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStrategy {
    /// `git push <remote> HEAD:refs/heads/<branch>`
    ExplicitRef,
    /// `git push <remote> <branch>`
    SameName,
    /// `git push <remote>`
    Plain,
    /// `git push --set-upstream <remote> <branch>`
    SetUpstream,
    /// `git push --force-with-lease <remote> <branch>`
    ForceWithLease,
}

impl PushStrategy {
    /// The push invocation for this strategy
    pub fn request(self, remote: &str, branch: &str) -> PushRequest {
        match self {
            Self::ExplicitRef => PushRequest::refspec(remote, format!("HEAD:refs/heads/{branch}")),
            Self::SameName => PushRequest::refspec(remote, branch),
            Self::Plain => PushRequest::plain(remote),
            Self::SetUpstream => PushRequest::refspec(remote, branch).tracking(),
            Self::ForceWithLease => PushRequest::refspec(remote, branch).with_lease(),
        }
    }
}

/// Strategies an owner walks before resorting to force
pub const OWNER_STRATEGIES: [PushStrategy; 3] = [
    PushStrategy::ExplicitRef,
    PushStrategy::SameName,
    PushStrategy::Plain,
];

/// Strategies used against a freshly configured fork
pub const FORK_STRATEGIES: [PushStrategy; 2] =
    [PushStrategy::SetUpstream, PushStrategy::ForceWithLease];

/// Why a push was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushRejection {
    /// The account cannot write to the remote
    PermissionDenied(String),
    /// The token lacks the `workflow` scope
    MissingWorkflowScope(String),
    /// Anything else (non-fast-forward, network, hooks)
    Other(String),
}

impl PushRejection {
    /// Output that caused the rejection
    pub fn message(&self) -> &str {
        match self {
            Self::PermissionDenied(m) | Self::MissingWorkflowScope(m) | Self::Other(m) => m,
        }
    }
}

/// Result of running a strategy list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushAttempt {
    /// A strategy succeeded
    Pushed(PushStrategy),
    /// Every strategy failed; carries the last rejection
    Rejected(PushRejection),
}

/// Classify push output by its known failure signatures
pub fn classify_push_failure(output: &str) -> PushRejection {
    let text = output.trim().to_string();
    let lower = text.to_lowercase();

    if lower.contains("workflow")
        && (lower.contains("scope") || lower.contains("refusing to allow"))
    {
        return PushRejection::MissingWorkflowScope(text);
    }

    let denied = lower.contains("permission denied")
        || (lower.contains("permission to") && lower.contains("denied"))
        || lower.contains("error: 403")
        || lower.contains("returned error: 403")
        || lower.contains("write access to repository not granted")
        || lower.contains("repository not found");
    if denied {
        PushRejection::PermissionDenied(text)
    } else {
        PushRejection::Other(text)
    }
}

/// Try `strategies` in order against `remote`/`branch`
///
/// Stops at the first success, or at a workflow-scope rejection since no
/// other strategy can get past it.
pub async fn run_strategies(
    ctx: &SyncContext<'_>,
    dir: &Path,
    remote: &str,
    branch: &str,
    strategies: &[PushStrategy],
) -> Result<PushAttempt> {
    let mut last = PushRejection::Other("no push strategy attempted".to_string());

    for strategy in strategies {
        let output = ctx.vcs.push(dir, &strategy.request(remote, branch)).await?;
        if output.success {
            debug!("{strategy:?} push to {remote}/{branch} succeeded");
            return Ok(PushAttempt::Pushed(*strategy));
        }

        let rejection = classify_push_failure(&output.combined());
        debug!("{strategy:?} push rejected: {}", rejection.message());
        if matches!(rejection, PushRejection::MissingWorkflowScope(_)) {
            return Ok(PushAttempt::Rejected(rejection));
        }
        last = rejection;
    }

    Ok(PushAttempt::Rejected(last))
}

/// Unique name for a fallback feature branch
pub fn feature_branch_name(repo: &str, now: DateTime<Utc>) -> String {
    format!("{repo}-update-{}", now.format("%Y%m%d-%H%M%S"))
}

/// Commit local changes in `repo` and publish them
///
/// Does nothing and returns [`PushOutcome::Clean`] when the working tree has
/// no changes. In the primary repository, submodule and extra checkouts are
/// never staged here, so a moved submodule alone leaves it clean. A successful fork push of a submodule is followed by a commit
/// in the primary repository recording the new submodule commit and URL.
pub async fn commit_and_push(ctx: &SyncContext<'_>, repo: &Repository) -> Result<PushOutcome> {
    if let Err(e) = reconcile_detached_head(ctx, repo).await {
        ctx.progress.on_error(&e).await;
    }

    if !ctx.vcs.has_changes(&repo.path).await? {
        ctx.progress.on_push(repo.name(), PushStatus::Clean).await;
        return Ok(PushOutcome::Clean);
    }

    ctx.progress.on_push(repo.name(), PushStatus::Started).await;
    check_user_change(ctx, repo).await?;

    // Gitlinks are staged only by the submodule reconciler
    let nested = nested_checkouts(ctx, repo);
    let excluded: Vec<&str> = nested.iter().map(String::as_str).collect();
    ctx.vcs.stage_all(&repo.path, &excluded).await?;
    if !ctx.vcs.has_staged_changes(&repo.path).await? {
        debug!("{}: only nested checkouts changed", repo.name());
        ctx.progress.on_push(repo.name(), PushStatus::Clean).await;
        return Ok(PushOutcome::Clean);
    }

    let commit = ctx
        .vcs
        .commit(&repo.path, &ctx.config.commit_message(repo.name()))
        .await?;
    info!("{}: committed {}", repo.name(), &commit[..8.min(commit.len())]);

    let branch = ctx.target_branch(repo).await?;
    let outcome = match publish(ctx, repo, &branch).await {
        Ok(outcome) => outcome,
        Err(e) => {
            ctx.progress
                .on_push(repo.name(), PushStatus::Failed(e.to_string()))
                .await;
            return Err(e);
        }
    };

    // Feature-branch pushes leave `branch` itself unpublished
    let head_suffix = format!(":{branch}");
    let (on_target, via_fork) = match &outcome {
        PushOutcome::PushedToFork { branch: pushed } => (pushed == &branch, pushed == &branch),
        PushOutcome::PullRequestCreated(pr) => {
            let same = pr.head_ref == branch || pr.head_ref.ends_with(&head_suffix);
            (same, same)
        }
        other => (other.is_published(), false),
    };

    if via_fork && repo.kind() == RepoKind::Submodule {
        if let Err(e) = propagate_reference(ctx, repo).await {
            if e.is_fatal_to_run() {
                return Err(e);
            }
            ctx.progress.on_error(&e).await;
        }
    }

    if on_target {
        if let Err(e) = ensure_pushed(ctx, repo, &branch).await {
            warn!("{e}");
            ctx.progress.on_warning(&e.to_string()).await;
        }
    }

    let status = match &outcome {
        PushOutcome::Failed(msg) => PushStatus::Failed(msg.clone()),
        other => PushStatus::Published(other.clone()),
    };
    ctx.progress.on_push(repo.name(), status).await;
    Ok(outcome)
}

/// Submodule and extra checkouts living inside the primary working tree
fn nested_checkouts(ctx: &SyncContext<'_>, repo: &Repository) -> Vec<String> {
    if repo.kind() != RepoKind::Primary {
        return Vec::new();
    }
    ctx.config
        .submodules
        .iter()
        .chain(&ctx.config.extras)
        .cloned()
        .collect()
}

/// Publish the commit at HEAD of `repo` to `branch`
pub(crate) async fn publish(
    ctx: &SyncContext<'_>,
    repo: &Repository,
    branch: &str,
) -> Result<PushOutcome> {
    if is_owner(ctx, repo).await? {
        publish_as_owner(ctx, repo, branch).await
    } else {
        publish_as_contributor(ctx, repo, branch).await
    }
}

async fn publish_as_owner(
    ctx: &SyncContext<'_>,
    repo: &Repository,
    branch: &str,
) -> Result<PushOutcome> {
    match run_strategies(ctx, &repo.path, "origin", branch, &OWNER_STRATEGIES).await? {
        PushAttempt::Pushed(_) => return Ok(PushOutcome::PushedDirectly),
        PushAttempt::Rejected(PushRejection::MissingWorkflowScope(_)) => {
            return Err(Error::MissingWorkflowScope {
                repo: repo.name().to_string(),
            });
        }
        PushAttempt::Rejected(rejection) => {
            debug!("plain pushes failed: {}", rejection.message());
        }
    }

    warn!("{}: plain pushes failed, trying --force-with-lease", repo.name());
    match run_strategies(
        ctx,
        &repo.path,
        "origin",
        branch,
        &[PushStrategy::ForceWithLease],
    )
    .await?
    {
        PushAttempt::Pushed(_) => Ok(PushOutcome::PushedAfterForce),
        PushAttempt::Rejected(PushRejection::MissingWorkflowScope(_)) => {
            Err(Error::MissingWorkflowScope {
                repo: repo.name().to_string(),
            })
        }
        PushAttempt::Rejected(rejection) => Ok(PushOutcome::Failed(rejection.message().to_string())),
    }
}

async fn publish_as_contributor(
    ctx: &SyncContext<'_>,
    repo: &Repository,
    branch: &str,
) -> Result<PushOutcome> {
    // Access may have been granted since the remote was last checked
    match run_strategies(ctx, &repo.path, "origin", branch, &[PushStrategy::SameName]).await? {
        PushAttempt::Pushed(_) => Ok(PushOutcome::PushedDirectly),
        PushAttempt::Rejected(PushRejection::MissingWorkflowScope(_)) => {
            Err(Error::MissingWorkflowScope {
                repo: repo.name().to_string(),
            })
        }
        PushAttempt::Rejected(PushRejection::PermissionDenied(message)) => {
            info!("{}: permission denied, switching to fork: {message}", repo.name());
            publish_via_fork(ctx, repo, branch).await
        }
        PushAttempt::Rejected(PushRejection::Other(message)) => {
            info!("{}: push failed, using a feature branch: {message}", repo.name());
            publish_feature_branch(ctx, repo, branch).await
        }
    }
}

async fn publish_via_fork(
    ctx: &SyncContext<'_>,
    repo: &Repository,
    branch: &str,
) -> Result<PushOutcome> {
    let parent = parent_account(ctx, repo).await?;
    let fork_url = setup_fork(ctx, repo, &parent).await?;
    ctx.progress
        .on_message(&format!("{}: pushing to fork {fork_url}", repo.name()))
        .await;

    match run_strategies(ctx, &repo.path, "origin", branch, &FORK_STRATEGIES).await? {
        PushAttempt::Pushed(_) => {}
        PushAttempt::Rejected(PushRejection::MissingWorkflowScope(_)) => {
            return Err(Error::MissingWorkflowScope {
                repo: repo.name().to_string(),
            });
        }
        PushAttempt::Rejected(rejection) => {
            return Ok(PushOutcome::Failed(rejection.message().to_string()));
        }
    }

    let pushed = PushOutcome::PushedToFork {
        branch: branch.to_string(),
    };
    if ctx.options.no_pr {
        return Ok(pushed);
    }

    let head_owner = match remote_account(&fork_url) {
        Some(account) => account,
        None => ctx.platform.current_user().await?,
    };
    let target = PrTarget {
        parent,
        head_owner,
        head_branch: branch.to_string(),
        base: branch.to_string(),
    };
    request_review(ctx, repo, &target, pushed).await
}

async fn publish_feature_branch(
    ctx: &SyncContext<'_>,
    repo: &Repository,
    branch: &str,
) -> Result<PushOutcome> {
    let feature = feature_branch_name(repo.name(), Utc::now());
    let request = PushRequest::refspec("origin", format!("HEAD:refs/heads/{feature}"));
    let output = ctx.vcs.push(&repo.path, &request).await?;
    if !output.success {
        return Ok(PushOutcome::Failed(output.combined().trim().to_string()));
    }
    ctx.progress
        .on_message(&format!("{}: pushed feature branch {feature}", repo.name()))
        .await;

    let pushed = PushOutcome::PushedToFork {
        branch: feature.clone(),
    };
    if ctx.options.no_pr {
        return Ok(pushed);
    }

    let origin = ctx.vcs.remote_url(&repo.path, "origin").await?;
    let head_owner = match origin.as_deref().and_then(remote_account) {
        Some(account) => account,
        None => ctx.platform.current_user().await?,
    };
    let target = PrTarget {
        parent: parent_account(ctx, repo).await?,
        head_owner,
        head_branch: feature,
        base: branch.to_string(),
    };
    request_review(ctx, repo, &target, pushed).await
}

/// Open a PR for a published branch, keeping `pushed` if none is opened
async fn request_review(
    ctx: &SyncContext<'_>,
    repo: &Repository,
    target: &PrTarget,
    pushed: PushOutcome,
) -> Result<PushOutcome> {
    match open_pull_request(ctx, repo, target).await {
        Ok(PullRequestDecision::Created(pr)) => {
            ctx.progress.on_pr_created(repo.name(), &pr).await;
            Ok(PushOutcome::PullRequestCreated(pr))
        }
        Ok(PullRequestDecision::Skipped) => Ok(pushed),
        Err(e) if e.is_fatal_to_run() => Err(e),
        Err(e) => {
            ctx.progress.on_error(&e).await;
            Ok(pushed)
        }
    }
}

/// Record a submodule's new commit and fork URL in the primary repository
/// and publish that change
async fn propagate_reference(ctx: &SyncContext<'_>, submodule: &Repository) -> Result<()> {
    let primary = ctx.primary().await?;
    let name = submodule.name();

    if let Some(url) = ctx.vcs.remote_url(&submodule.path, "origin").await? {
        ctx.vcs.set_submodule_url(&primary.path, name, &url).await?;
    }
    ctx.vcs
        .stage_paths(&primary.path, &[name, ".gitmodules"])
        .await?;

    if !ctx.vcs.has_staged_changes(&primary.path).await? {
        debug!("{} reference already current", name);
        return Ok(());
    }

    ctx.vcs
        .commit(&primary.path, &format!("Update {name} submodule reference"))
        .await?;

    let branch = ctx.target_branch(&primary).await?;
    let outcome = publish(ctx, &primary, &branch).await?;
    let status = match &outcome {
        PushOutcome::Failed(msg) => PushStatus::Failed(msg.clone()),
        other => PushStatus::Published(other.clone()),
    };
    ctx.progress.on_push(primary.name(), status).await;
    Ok(())
}
