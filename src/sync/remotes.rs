//! Identity, ownership and remote alignment
//!
//! Keeps `origin` pointed at the authenticated account and `upstream` at
//! the canonical project namespace, creating forks when the user lacks
//! write access.

use crate::error::{Error, Result};
use crate::identity::{is_project_account, owns_account};
use crate::platform::remote_account;
use crate::sync::SyncContext;
use crate::types::Repository;
use tracing::{debug, info, warn};

/// Whether the authenticated user controls `repo`'s origin
///
/// Recomputed on every call from the live `origin` remote.
pub async fn is_owner(ctx: &SyncContext<'_>, repo: &Repository) -> Result<bool> {
    let origin = ctx.vcs.remote_url(&repo.path, "origin").await?;
    let Some(account) = origin.as_deref().and_then(remote_account) else {
        debug!("{} has no parseable origin", repo.name());
        return Ok(false);
    };

    let user = match ctx.platform.current_user().await {
        Ok(user) => Some(user),
        Err(e) => {
            debug!("identity lookup failed, using offline ownership rules: {e}");
            None
        }
    };

    Ok(owns_account(ctx.config, &account, user.as_deref()))
}

/// Account owning the canonical copy of `repo`
///
/// Read from the `upstream` remote when present, otherwise from the
/// configured casing rule.
pub async fn parent_account(ctx: &SyncContext<'_>, repo: &Repository) -> Result<String> {
    if let Some(account) = ctx
        .vcs
        .remote_url(&repo.path, "upstream")
        .await?
        .as_deref()
        .and_then(remote_account)
    {
        return Ok(account);
    }
    Ok(ctx.config.canonical_owner(repo.name()).to_string())
}

/// Detect an account change and realign `origin` with the current user
///
/// No-op when the user already owns the repository. When the login differs
/// from the one recorded by the previous run, git credentials are refreshed
/// before anything is pushed. An `origin` pointing at another user's fork is
/// rewritten to the current user's; one pointing at the project namespace is
/// left for the fork fallback to handle.
pub async fn check_user_change(ctx: &SyncContext<'_>, repo: &Repository) -> Result<()> {
    if is_owner(ctx, repo).await? {
        debug!("{} is owned by the current user", repo.name());
        return Ok(());
    }

    let user = ctx
        .platform
        .current_user()
        .await
        .map_err(|_| Error::AuthRequired(format!("push {}", repo.name())))?;

    let cache = ctx.identity_cache();
    if let Some(last) = cache.last_user() {
        if !last.eq_ignore_ascii_case(&user) {
            info!("account changed from {last} to {user}");
            ctx.progress
                .on_message(&format!(
                    "Account changed from {last} to {user}, refreshing credentials"
                ))
                .await;
            if let Err(e) = ctx.platform.refresh_credentials().await {
                warn!("credential refresh failed: {e}");
                ctx.progress
                    .on_warning(&format!("Credential refresh failed: {e}"))
                    .await;
            }
        }
    }
    if let Err(e) = cache.record(&user) {
        warn!("could not record login in {}: {e}", cache.path().display());
    }

    let origin = ctx.vcs.remote_url(&repo.path, "origin").await?;
    let expected = ctx.config.repo_url(&user, repo.name());
    let drifted = origin
        .as_deref()
        .and_then(remote_account)
        .is_some_and(|account| !is_project_account(ctx.config, &account));

    if drifted && origin.as_deref() != Some(expected.as_str()) {
        rewrite_remote(ctx, repo, "origin", &expected).await?;
        ctx.progress
            .on_message(&format!("{}: origin now {expected}", repo.name()))
            .await;
    }

    Ok(())
}

/// Fork `parent/repo` for the current user and point `origin` at the fork
///
/// No-op when the user already owns the repository. Returns the URL
/// `origin` points at afterwards.
pub async fn setup_fork(ctx: &SyncContext<'_>, repo: &Repository, parent: &str) -> Result<String> {
    if is_owner(ctx, repo).await? {
        let origin = ctx.vcs.remote_url(&repo.path, "origin").await?;
        return Ok(origin.unwrap_or_default());
    }

    ctx.platform
        .current_user()
        .await
        .map_err(|_| Error::AuthRequired(format!("fork {parent}/{}", repo.name())))?;

    let fork_url = ctx
        .platform
        .fork(parent, repo.name())
        .await
        .map_err(|e| match e {
            Error::ForkFailed { .. } => e,
            other => Error::ForkFailed {
                owner: parent.to_string(),
                repo: repo.name().to_string(),
                message: other.to_string(),
            },
        })?;
    info!("fork of {parent}/{} at {fork_url}", repo.name());

    let upstream = ctx.config.repo_url(parent, repo.name());
    if ctx.vcs.remote_url(&repo.path, "upstream").await?.is_none() {
        rewrite_remote(ctx, repo, "upstream", &upstream).await?;
    }
    rewrite_remote(ctx, repo, "origin", &fork_url).await?;

    Ok(fork_url)
}

/// Make sure `upstream` exists, returning its URL
///
/// Repositories whose origin lives under an excluded partner namespace get
/// no upstream and yield `None`.
pub async fn ensure_upstream(ctx: &SyncContext<'_>, repo: &Repository) -> Result<Option<String>> {
    let origin = ctx.vcs.remote_url(&repo.path, "origin").await?;
    let excluded = origin
        .as_deref()
        .and_then(remote_account)
        .is_some_and(|account| {
            ctx.config
                .excluded_namespaces
                .iter()
                .any(|ns| account.eq_ignore_ascii_case(ns))
        });
    if excluded {
        debug!("{} belongs to a partner namespace, skipping upstream", repo.name());
        return Ok(None);
    }

    if let Some(url) = ctx.vcs.remote_url(&repo.path, "upstream").await? {
        return Ok(Some(url));
    }

    let url = ctx
        .config
        .repo_url(ctx.config.canonical_owner(repo.name()), repo.name());
    rewrite_remote(ctx, repo, "upstream", &url).await?;
    Ok(Some(url))
}

async fn rewrite_remote(
    ctx: &SyncContext<'_>,
    repo: &Repository,
    remote: &str,
    url: &str,
) -> Result<()> {
    ctx.vcs
        .set_remote_url(&repo.path, remote, url)
        .await
        .map_err(|e| Error::RemoteRewriteFailed {
            repo: repo.name().to_string(),
            remote: remote.to_string(),
            url: url.to_string(),
            message: e.to_string(),
        })
}
