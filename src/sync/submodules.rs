//! Safe submodule updates
//!
//! A parent repository must never pull a submodule backward in time. For
//! each submodule the commit the parent's index references is compared with
//! the submodule's checked-out commit by author timestamp:
//!
//! | referenced vs current | action                                        |
//! |-----------------------|-----------------------------------------------|
//! | newer                 | check out the referenced commit               |
//! | older                 | stage the submodule path in the parent        |
//! | equal                 | nothing                                       |
//! | unknown               | skip with a warning, leave the checkout alone |

use crate::error::{Error, Result};
use crate::repo::{self, repo_path};
use crate::sync::{Phase, SyncContext, SyncReport};
use crate::types::{CommitRef, MergeOutcome, RepoSpec, Repository};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// What reconciliation did to one submodule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmoduleAction {
    /// Moved forward to a newer commit
    Advanced {
        /// Commit before
        from: String,
        /// Commit after
        to: String,
    },
    /// The parent's reference was staged to the submodule's newer commit
    Staged {
        /// Commit the parent now references
        commit: String,
    },
    /// Already consistent
    Unchanged,
    /// Left untouched
    Skipped(String),
    /// Moved to the remote tip without any timestamp check
    RemoteUpdated,
}

async fn commit_ref(ctx: &SyncContext<'_>, repo: &Repository, rev: &str) -> Result<Option<CommitRef>> {
    let Some(hash) = ctx.vcs.rev_parse(&repo.path, rev).await? else {
        return Ok(None);
    };
    Ok(ctx
        .vcs
        .commit_timestamp(&repo.path, &hash)
        .await?
        .map(|authored_at| CommitRef { hash, authored_at }))
}

/// Reconcile one submodule against the commit its parent references
pub async fn reconcile_submodule(ctx: &SyncContext<'_>, spec: &RepoSpec) -> Result<SubmoduleAction> {
    let Some(repo) = ctx.resolve(spec).await? else {
        return Ok(SubmoduleAction::Skipped("not checked out".to_string()));
    };

    let head = ctx.vcs.head_commit(&repo.path).await?;
    let Some(referenced) = ctx.vcs.submodule_commit(&ctx.root, &spec.name).await? else {
        return Ok(SubmoduleAction::Skipped(
            "parent has no reference for this path".to_string(),
        ));
    };
    if referenced == head {
        return Ok(SubmoduleAction::Unchanged);
    }

    let current = commit_ref(ctx, &repo, &head).await?;
    let wanted = commit_ref(ctx, &repo, &referenced).await?;
    let (Some(current), Some(wanted)) = (current, wanted) else {
        let reason = format!(
            "cannot date {} or {}; leaving {} untouched",
            &head[..8.min(head.len())],
            &referenced[..8.min(referenced.len())],
            spec.name
        );
        warn!("{reason}");
        return Ok(SubmoduleAction::Skipped(reason));
    };

    match wanted.authored_at.cmp(&current.authored_at) {
        Ordering::Greater => {
            info!(
                "{}: parent references newer {}, checking out",
                spec.name,
                wanted.short()
            );
            ctx.vcs.checkout(&repo.path, &wanted.hash).await?;
            Ok(SubmoduleAction::Advanced {
                from: current.hash,
                to: wanted.hash,
            })
        }
        Ordering::Less => {
            info!(
                "{}: parent references older {}, keeping {} and staging it",
                spec.name,
                wanted.short(),
                current.short()
            );
            ctx.vcs.stage_paths(&ctx.root, &[spec.name.as_str()]).await?;
            Ok(SubmoduleAction::Staged {
                commit: current.hash,
            })
        }
        Ordering::Equal => Ok(SubmoduleAction::Unchanged),
    }
}

async fn update_to_remote_tips(ctx: &SyncContext<'_>, paths: &[&str]) -> Result<()> {
    let output = ctx.vcs.submodule_update_remote(&ctx.root, paths).await?;
    if output.success {
        return Ok(());
    }
    Err(Error::Git {
        command: format!("submodule update --remote -- {}", paths.join(" ")),
        message: output.combined().trim().to_string(),
    })
}

/// Reconcile every submodule, or move all of them to their remote tips
/// when unsafe mode is on
pub async fn reconcile_submodules(
    ctx: &SyncContext<'_>,
    report: &mut SyncReport,
) -> Vec<(String, SubmoduleAction)> {
    ctx.progress.on_phase(Phase::ReconcilingSubmodules).await;
    let specs = repo::submodule_specs(ctx.config);

    if ctx.options.unsafe_submodules {
        report
            .warn(
                ctx.progress,
                "Unsafe submodule mode: updating to remote tips, older commits may be restored"
                    .to_string(),
            )
            .await;
        let mut present = Vec::new();
        for spec in specs {
            if ctx.vcs.is_repository(&repo_path(&ctx.root, &spec)).await {
                present.push(spec.name);
            }
        }
        if present.is_empty() {
            return Vec::new();
        }
        let paths: Vec<&str> = present.iter().map(String::as_str).collect();
        return match update_to_remote_tips(ctx, &paths).await {
            Ok(()) => present
                .iter()
                .map(|name| (name.clone(), SubmoduleAction::RemoteUpdated))
                .collect(),
            Err(e) => {
                report.error(ctx.progress, &e).await;
                Vec::new()
            }
        };
    }

    let mut actions = Vec::new();
    for spec in specs {
        if !ctx.vcs.is_repository(&repo_path(&ctx.root, &spec)).await {
            continue;
        }
        match reconcile_submodule(ctx, &spec).await {
            Ok(action) => {
                debug!("{}: {action:?}", spec.name);
                if let SubmoduleAction::Skipped(reason) = &action {
                    report
                        .warn(ctx.progress, format!("{}: {reason}", spec.name))
                        .await;
                }
                actions.push((spec.name, action));
            }
            Err(e) => report.error(ctx.progress, &e).await,
        }
    }
    actions
}

/// Reconcile one submodule against its own remote-tracking branch
///
/// Used when a single submodule is named. The remote tip is merged only
/// when it is newer than HEAD; when HEAD is newer the parent's reference
/// is staged instead.
pub async fn update_submodule_from_remote(
    ctx: &SyncContext<'_>,
    repo: &Repository,
) -> Result<SubmoduleAction> {
    if ctx.options.unsafe_submodules {
        warn!("unsafe submodule mode for {}", repo.name());
        update_to_remote_tips(ctx, &[repo.name()]).await?;
        return Ok(SubmoduleAction::RemoteUpdated);
    }

    let branch = ctx.target_branch(repo).await?;
    let remote_ref = format!("origin/{branch}");

    let head = ctx.vcs.head_commit(&repo.path).await?;
    let current = commit_ref(ctx, repo, &head).await?;
    let remote = commit_ref(ctx, repo, &remote_ref).await?;
    let (Some(current), Some(remote)) = (current, remote) else {
        return Ok(SubmoduleAction::Skipped(format!(
            "cannot date HEAD or {remote_ref}"
        )));
    };

    if remote.hash == current.hash {
        return Ok(SubmoduleAction::Unchanged);
    }

    match remote.authored_at.cmp(&current.authored_at) {
        Ordering::Greater => match ctx.vcs.merge(&repo.path, &remote_ref).await? {
            MergeOutcome::Conflict(message) => Err(Error::MergeConflict {
                repo: repo.name().to_string(),
                rev: remote_ref,
                message,
            }),
            MergeOutcome::MissingRevision | MergeOutcome::UpToDate => Ok(SubmoduleAction::Unchanged),
            MergeOutcome::Merged => Ok(SubmoduleAction::Advanced {
                from: current.hash,
                to: ctx.vcs.head_commit(&repo.path).await?,
            }),
        },
        Ordering::Less => {
            let referenced = ctx.vcs.submodule_commit(&ctx.root, repo.name()).await?;
            if referenced.as_deref() == Some(current.hash.as_str()) {
                return Ok(SubmoduleAction::Unchanged);
            }
            ctx.vcs.stage_paths(&ctx.root, &[repo.name()]).await?;
            Ok(SubmoduleAction::Staged {
                commit: current.hash,
            })
        }
        Ordering::Equal => Ok(SubmoduleAction::Unchanged),
    }
}
