//! Pull orchestration
//!
//! Each repository merges its own `origin` and then the canonical
//! `upstream`, trying the preferred branch before the fallback. Merge
//! conflicts are aborted and reported; the run moves on.

use crate::error::{Error, Result};
use crate::repo::{self, require_known};
use crate::sync::{
    HeadOutcome, Phase, SyncContext, SyncReport, ensure_upstream, fix_heads,
    reconcile_detached_head, reconcile_submodules, update_submodule_from_remote,
};
use crate::types::{MergeOutcome, RepoKind, Repository};
use tracing::debug;

/// Fetch `remote` and merge its preferred (or fallback) branch
async fn merge_remote(ctx: &SyncContext<'_>, repo: &Repository, remote: &str) -> Result<MergeOutcome> {
    let fetched = ctx.vcs.fetch(&repo.path, remote).await?;
    if !fetched.success {
        return Err(Error::Git {
            command: format!("fetch {remote}"),
            message: fetched.combined().trim().to_string(),
        });
    }

    for branch in ctx.config.branch_candidates() {
        let rev = format!("{remote}/{branch}");
        match ctx.vcs.merge(&repo.path, &rev).await? {
            MergeOutcome::MissingRevision => continue,
            MergeOutcome::Conflict(message) => {
                return Err(Error::MergeConflict {
                    repo: repo.name().to_string(),
                    rev,
                    message,
                });
            }
            outcome => {
                debug!("{}: merged {rev}: {outcome:?}", repo.name());
                return Ok(outcome);
            }
        }
    }
    Ok(MergeOutcome::MissingRevision)
}

/// Merge origin, then upstream, into one repository
async fn pull_one(ctx: &SyncContext<'_>, repo: &Repository, report: &mut SyncReport) {
    ctx.progress.on_repo(repo.name()).await;

    match merge_remote(ctx, repo, "origin").await {
        Ok(MergeOutcome::Merged) => {
            ctx.progress
                .on_message(&format!("{}: merged origin", repo.name()))
                .await;
        }
        Ok(_) => {}
        Err(e) => report.error(ctx.progress, &e).await,
    }

    match ensure_upstream(ctx, repo).await {
        Ok(Some(_)) => match merge_remote(ctx, repo, "upstream").await {
            Ok(MergeOutcome::Merged) => {
                ctx.progress
                    .on_message(&format!("{}: merged upstream", repo.name()))
                    .await;
            }
            Ok(_) => {}
            Err(e) => report.error(ctx.progress, &e).await,
        },
        Ok(None) => {}
        Err(e) => report.error(ctx.progress, &e).await,
    }
}

/// Pull every repository, then reconcile submodules and detached HEADs
pub async fn pull_all(ctx: &SyncContext<'_>) -> SyncReport {
    let mut report = SyncReport::default();
    ctx.progress.on_phase(Phase::Pulling).await;

    for spec in repo::all_specs(ctx.config) {
        match ctx.resolve(&spec).await {
            Ok(Some(repo)) => pull_one(ctx, &repo, &mut report).await,
            Ok(None) => debug!("{} is not checked out, skipping", spec.name),
            Err(e) => report.error(ctx.progress, &e).await,
        }
    }

    reconcile_submodules(ctx, &mut report).await;
    report.merge(fix_heads(ctx).await);
    report
}

/// Pull one named repository
///
/// Fails with `Error::RepoNotRecognized` before anything is touched when
/// `name` is not in the configured set.
pub async fn pull_repo(ctx: &SyncContext<'_>, name: &str) -> Result<SyncReport> {
    let spec = require_known(ctx.config, name)?;
    let mut report = SyncReport::default();
    ctx.progress.on_phase(Phase::Pulling).await;

    let Some(repo) = ctx.resolve(&spec).await? else {
        report
            .warn(ctx.progress, format!("{name} is not checked out"))
            .await;
        return Ok(report);
    };

    pull_one(ctx, &repo, &mut report).await;

    if spec.kind == RepoKind::Submodule {
        match update_submodule_from_remote(ctx, &repo).await {
            Ok(action) => debug!("{name}: {action:?}"),
            Err(e) => report.error(ctx.progress, &e).await,
        }
    }

    match reconcile_detached_head(ctx, &repo).await {
        Ok(HeadOutcome::NoBranch) => {
            report
                .warn(ctx.progress, format!("{name}: detached with no main or master branch"))
                .await;
        }
        Ok(_) => {}
        Err(e) => report.error(ctx.progress, &e).await,
    }

    Ok(report)
}
