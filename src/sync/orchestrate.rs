//! Push orchestration, sweeps and maintenance commands

use crate::error::{Error, Result};
use crate::platform::remote_account;
use crate::repo::{self, require_known};
use crate::sync::pages::{PrTarget, PullRequestDecision, open_pull_request};
use crate::sync::{
    HeadOutcome, Phase, SyncContext, SyncReport, check_user_change, commit_and_push,
    ensure_pushed, parent_account, pull_all, pull_repo, reconcile_detached_head,
    reconcile_submodule, reconcile_submodules,
};
use crate::types::{PushOutcome, RepoKind, RepoSpec, Repository};
use tracing::{debug, info};

/// Which repositories a push covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushScope {
    /// Primary, submodules and extras
    All,
    /// Submodules only, plus their references in the primary repository
    Submodules,
    /// One named repository
    Repo(String),
}

impl PushScope {
    /// Parse positional push arguments
    ///
    /// Returns the scope and whether pull requests are suppressed, which
    /// `nopr` or the two words `no pr` anywhere in the arguments request.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> (Self, bool) {
        let tokens: Vec<String> = args
            .iter()
            .map(|a| a.as_ref().trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();

        let mut no_pr = false;
        let mut rest = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if tokens[i] == "nopr" || tokens[i] == "no-pr" {
                no_pr = true;
            } else if tokens[i] == "no" && tokens.get(i + 1).is_some_and(|t| t == "pr") {
                no_pr = true;
                i += 1;
            } else {
                rest.push(tokens[i].clone());
            }
            i += 1;
        }

        let scope = match rest.first().map(String::as_str) {
            None | Some("all") => Self::All,
            Some("submodules") => Self::Submodules,
            Some(name) => Self::Repo(name.to_string()),
        };
        (scope, no_pr)
    }
}

/// Commit and push one repository, recording the outcome
///
/// Only run-fatal errors are returned.
async fn push_and_record(
    ctx: &SyncContext<'_>,
    repo: &Repository,
    report: &mut SyncReport,
) -> Result<()> {
    ctx.progress.on_repo(repo.name()).await;
    match commit_and_push(ctx, repo).await {
        Ok(outcome) => {
            if let PushOutcome::PullRequestCreated(pr) = &outcome {
                report.created_prs.push(pr.clone());
            }
            report.outcomes.push((repo.name().to_string(), outcome));
            Ok(())
        }
        Err(e) if e.is_fatal_to_run() => Err(e),
        Err(e) => {
            report.error(ctx.progress, &e).await;
            report
                .outcomes
                .push((repo.name().to_string(), PushOutcome::Failed(e.to_string())));
            Ok(())
        }
    }
}

async fn push_spec(ctx: &SyncContext<'_>, spec: &RepoSpec, report: &mut SyncReport) -> Result<()> {
    match ctx.resolve(spec).await {
        Ok(Some(repo)) => push_and_record(ctx, &repo, report).await,
        Ok(None) => {
            debug!("{} is not checked out, skipping", spec.name);
            Ok(())
        }
        Err(e) => {
            report.error(ctx.progress, &e).await;
            Ok(())
        }
    }
}

/// Open a PR for the primary repository when its fork is ahead of upstream
async fn offer_primary_pr(
    ctx: &SyncContext<'_>,
    primary: &Repository,
    report: &mut SyncReport,
) -> Result<()> {
    if ctx.options.no_pr
        || matches!(
            report.outcome(primary.name()),
            Some(PushOutcome::PullRequestCreated(_))
        )
    {
        return Ok(());
    }
    if ctx.vcs.remote_url(&primary.path, "upstream").await?.is_none() {
        return Ok(());
    }

    let parent = parent_account(ctx, primary).await?;
    let origin = ctx.vcs.remote_url(&primary.path, "origin").await?;
    let Some(head_owner) = origin.as_deref().and_then(remote_account) else {
        return Ok(());
    };
    if head_owner.eq_ignore_ascii_case(&parent) {
        return Ok(());
    }

    let branch = ctx.target_branch(primary).await?;
    let ahead = ctx
        .vcs
        .commits_ahead(&primary.path, &format!("upstream/{branch}"))
        .await?
        .unwrap_or(0);
    if ahead == 0 {
        return Ok(());
    }
    info!("{}: {ahead} commit(s) not yet in {parent}", primary.name());

    let target = PrTarget {
        parent,
        head_owner,
        head_branch: branch.clone(),
        base: branch,
    };
    match open_pull_request(ctx, primary, &target).await {
        Ok(PullRequestDecision::Created(pr)) => {
            ctx.progress.on_pr_created(primary.name(), &pr).await;
            report.created_prs.push(pr);
        }
        Ok(PullRequestDecision::Skipped) => {}
        Err(e) if e.is_fatal_to_run() => return Err(e),
        Err(e) => report.error(ctx.progress, &e).await,
    }
    Ok(())
}

/// Bring submodule references in the primary repository up to date and
/// publish them
async fn update_references(
    ctx: &SyncContext<'_>,
    primary: &Repository,
    report: &mut SyncReport,
) -> Result<()> {
    ctx.progress.on_phase(Phase::UpdatingReferences).await;
    reconcile_submodules(ctx, report).await;
    push_and_record(ctx, primary, report).await
}

/// Pull (unless skipped), then push everything
pub async fn push_all(ctx: &SyncContext<'_>) -> Result<SyncReport> {
    let primary = ctx.primary().await?;
    let mut report = SyncReport::default();
    if !ctx.options.skip_pull {
        report.merge(pull_all(ctx).await);
    }

    ctx.progress.on_phase(Phase::Pushing).await;
    push_and_record(ctx, &primary, &mut report).await?;
    offer_primary_pr(ctx, &primary, &mut report).await?;

    for spec in repo::submodule_specs(ctx.config) {
        push_spec(ctx, &spec, &mut report).await?;
    }
    update_references(ctx, &primary, &mut report).await?;

    for spec in repo::extra_specs(ctx.config) {
        push_spec(ctx, &spec, &mut report).await?;
    }

    report.merge(final_sweep(ctx, &repo::all_specs(ctx.config)).await);
    ctx.progress.on_phase(Phase::Complete).await;
    Ok(report)
}

/// Pull (unless skipped), then push every submodule and the primary
/// repository's references to them
pub async fn push_submodules(ctx: &SyncContext<'_>) -> Result<SyncReport> {
    let primary = ctx.primary().await?;
    let mut report = SyncReport::default();
    if !ctx.options.skip_pull {
        report.merge(pull_all(ctx).await);
    }

    ctx.progress.on_phase(Phase::Pushing).await;
    let specs = repo::submodule_specs(ctx.config);
    for spec in &specs {
        push_spec(ctx, spec, &mut report).await?;
    }
    update_references(ctx, &primary, &mut report).await?;

    let mut swept = vec![repo::primary_spec(ctx.config)];
    swept.extend(specs);
    report.merge(final_sweep(ctx, &swept).await);
    ctx.progress.on_phase(Phase::Complete).await;
    Ok(report)
}

/// Pull (unless skipped), then push one named repository
///
/// A submodule's new commit is recorded in the primary repository
/// afterwards, subject to the same anti-regression rule as a full run.
pub async fn push_repo(ctx: &SyncContext<'_>, name: &str) -> Result<SyncReport> {
    let spec = require_known(ctx.config, name)?;
    let primary = ctx.primary().await?;
    let mut report = SyncReport::default();
    if !ctx.options.skip_pull {
        report.merge(pull_repo(ctx, name).await?);
    }

    ctx.progress.on_phase(Phase::Pushing).await;
    let Some(repo) = ctx.resolve(&spec).await? else {
        report
            .warn(ctx.progress, format!("{name} is not checked out"))
            .await;
        return Ok(report);
    };

    push_and_record(ctx, &repo, &mut report).await?;
    let mut swept = vec![spec.clone()];

    match spec.kind {
        RepoKind::Primary => offer_primary_pr(ctx, &primary, &mut report).await?,
        RepoKind::Submodule => {
            ctx.progress.on_phase(Phase::UpdatingReferences).await;
            match reconcile_submodule(ctx, &spec).await {
                Ok(action) => debug!("{name}: {action:?}"),
                Err(e) => report.error(ctx.progress, &e).await,
            }
            push_and_record(ctx, &primary, &mut report).await?;
            swept.push(repo::primary_spec(ctx.config));
        }
        RepoKind::Extra => {}
    }

    report.merge(final_sweep(ctx, &swept).await);
    ctx.progress.on_phase(Phase::Complete).await;
    Ok(report)
}

/// Retry pushing any repository in `specs` that is ahead of `origin`
pub async fn final_sweep(ctx: &SyncContext<'_>, specs: &[RepoSpec]) -> SyncReport {
    let mut report = SyncReport::default();
    ctx.progress.on_phase(Phase::FinalSweep).await;

    for spec in specs {
        let repo = match ctx.resolve(spec).await {
            Ok(Some(repo)) => repo,
            Ok(None) => continue,
            Err(e) => {
                report.error(ctx.progress, &e).await;
                continue;
            }
        };
        if repo.origin_url.is_none() {
            continue;
        }

        let branch = match ctx.vcs.current_branch(&repo.path).await {
            Ok(Some(branch)) => branch,
            Ok(None) => {
                debug!("{} is detached, not sweeping", repo.name());
                continue;
            }
            Err(e) => {
                report.error(ctx.progress, &e).await;
                continue;
            }
        };

        let ahead = ctx
            .vcs
            .commits_ahead(&repo.path, &format!("origin/{branch}"))
            .await;
        if matches!(ahead, Ok(Some(0))) {
            continue;
        }

        ctx.progress
            .on_message(&format!("{}: unpushed commits found, retrying", repo.name()))
            .await;
        match ensure_pushed(ctx, &repo, &branch).await {
            Ok(()) => {}
            Err(e @ Error::UnpushedAfterRetries { .. }) => {
                report.warn(ctx.progress, e.to_string()).await;
            }
            Err(e) => report.error(ctx.progress, &e).await,
        }
    }
    report
}

/// Re-attach every detached repository to its primary branch
pub async fn fix_heads(ctx: &SyncContext<'_>) -> SyncReport {
    let mut report = SyncReport::default();
    ctx.progress.on_phase(Phase::ReconcilingHeads).await;

    for spec in repo::all_specs(ctx.config) {
        let repo = match ctx.resolve(&spec).await {
            Ok(Some(repo)) => repo,
            Ok(None) => continue,
            Err(e) => {
                report.error(ctx.progress, &e).await;
                continue;
            }
        };
        match reconcile_detached_head(ctx, &repo).await {
            Ok(HeadOutcome::OnBranch(_)) => {}
            Ok(HeadOutcome::Reattached { branch, merged, .. }) => {
                let how = if merged { "merged into" } else { "switched to" };
                ctx.progress
                    .on_message(&format!("{}: detached HEAD {how} {branch}", spec.name))
                    .await;
            }
            Ok(HeadOutcome::NoBranch) => {
                report
                    .warn(
                        ctx.progress,
                        format!("{}: detached with no main or master branch", spec.name),
                    )
                    .await;
            }
            Err(e) => report.error(ctx.progress, &e).await,
        }
    }
    report
}

/// Align every repository's remotes with the authenticated account
pub async fn update_remotes(ctx: &SyncContext<'_>) -> SyncReport {
    let mut report = SyncReport::default();
    ctx.progress.on_phase(Phase::CheckingRemotes).await;

    for spec in repo::all_specs(ctx.config) {
        match ctx.resolve(&spec).await {
            Ok(Some(repo)) => {
                ctx.progress.on_repo(repo.name()).await;
                if let Err(e) = check_user_change(ctx, &repo).await {
                    report.error(ctx.progress, &e).await;
                }
            }
            Ok(None) => {}
            Err(e) => report.error(ctx.progress, &e).await,
        }
    }
    report
}

/// Force a credential refresh, then align remotes
pub async fn refresh_auth(ctx: &SyncContext<'_>) -> Result<SyncReport> {
    let user = ctx.platform.current_user().await?;
    ctx.platform.refresh_credentials().await?;

    let cache = ctx.identity_cache();
    if let Err(e) = cache.record(&user) {
        debug!("could not record login: {e}");
    }
    ctx.progress
        .on_message(&format!("Git credentials refreshed for {user}"))
        .await;

    Ok(update_remotes(ctx).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_to_all() {
        let empty: [&str; 0] = [];
        assert_eq!(PushScope::parse(&empty), (PushScope::All, false));
        assert_eq!(PushScope::parse(&["all"]), (PushScope::All, false));
    }

    #[test]
    fn test_parse_scope_and_nopr() {
        assert_eq!(
            PushScope::parse(&["submodules", "nopr"]),
            (PushScope::Submodules, true)
        );
        assert_eq!(
            PushScope::parse(&["localsite", "no", "pr"]),
            (PushScope::Repo("localsite".to_string()), true)
        );
        assert_eq!(PushScope::parse(&["nopr"]), (PushScope::All, true));
    }

    #[test]
    fn test_parse_keeps_unknown_names() {
        assert_eq!(
            PushScope::parse(&["bogusname"]),
            (PushScope::Repo("bogusname".to_string()), false)
        );
    }
}
