//! Pull request creation with Pages enrichment
//!
//! Pull requests from the primary repository are reviewed through a preview
//! of the fork served by GitHub Pages. Before opening one, Pages is checked
//! on the fork and enabled if needed. When the platform gives no clear
//! answer the operator decides how to continue through [`PagesPrompt`].

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sync::SyncContext;
use crate::types::{PagesStatus, PullRequest, PullRequestRequest, RepoKind, Repository};
use tracing::{debug, info, warn};

/// Operator decision when Pages could not be confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagesChoice {
    /// Open the pull request anyway
    ProceedWithPr,
    /// Keep the pushed commit but open no pull request
    SkipPr,
    /// Stop the run
    AbortCommit,
}

/// Decision callback consulted when Pages state is unclear
pub trait PagesPrompt: Send + Sync {
    /// Choose how to continue for `owner/repo` given the last known `status`
    fn choose(&self, repo: &str, owner: &str, status: PagesStatus) -> PagesChoice;
}

/// Prompt that always answers the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedChoice(pub PagesChoice);

impl PagesPrompt for FixedChoice {
    fn choose(&self, _repo: &str, _owner: &str, _status: PagesStatus) -> PagesChoice {
        self.0
    }
}

/// What happened when a pull request was requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestDecision {
    /// Opened, or an open one from the same head already existed
    Created(PullRequest),
    /// The operator chose not to open one
    Skipped,
}

/// Where a pull request goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrTarget {
    /// Account owning the receiving repository
    pub parent: String,
    /// Account owning the head branch
    pub head_owner: String,
    /// Branch carrying the changes
    pub head_branch: String,
    /// Branch to merge into
    pub base: String,
}

/// Make sure Pages serves `owner/repo`, asking the operator when unsure
pub async fn prepare_pages(
    ctx: &SyncContext<'_>,
    repo: &str,
    owner: &str,
) -> (PagesStatus, PagesChoice) {
    let status = match ctx.platform.pages_status(owner, repo).await {
        Ok(status) => status,
        Err(e) => {
            warn!("could not read Pages status for {owner}/{repo}: {e}");
            return (
                PagesStatus::NotEnabled,
                ctx.pages_prompt.choose(repo, owner, PagesStatus::NotEnabled),
            );
        }
    };

    if status != PagesStatus::NotEnabled {
        return (status, PagesChoice::ProceedWithPr);
    }

    info!("enabling Pages on {owner}/{repo}");
    match ctx
        .platform
        .enable_pages(owner, repo, &ctx.config.primary_branch)
        .await
    {
        Ok(PagesStatus::NotEnabled) => (
            PagesStatus::NotEnabled,
            ctx.pages_prompt.choose(repo, owner, PagesStatus::NotEnabled),
        ),
        Ok(status) => (status, PagesChoice::ProceedWithPr),
        Err(e) => {
            warn!("enabling Pages on {owner}/{repo} failed: {e}");
            ctx.progress
                .on_warning(&format!("Could not enable Pages on {owner}/{repo}: {e}"))
                .await;
            (
                PagesStatus::EnableAttempted,
                ctx.pages_prompt
                    .choose(repo, owner, PagesStatus::EnableAttempted),
            )
        }
    }
}

/// Markdown body for a pull request from `owner`'s fork
pub fn format_pr_body(
    config: &Config,
    repo: &str,
    owner: &str,
    branch: &str,
    pages: Option<PagesStatus>,
) -> String {
    let fork = format!("https://{}/{owner}/{repo}", config.host);
    let mut body = format!("Changes from [{owner}/{repo}]({fork}/tree/{branch}).\n");

    if let Some(status) = pages {
        let preview = format!("https://{}.github.io/{repo}/", owner.to_lowercase());
        body.push_str(&format!("\n**Preview:** {preview}\n"));
        body.push_str(&format!("**Fork:** {fork}\n"));
        body.push_str(&format!("**GitHub Pages:** {status}\n"));
        if status != PagesStatus::Enabled {
            body.push_str(&format!(
                "\nThe preview appears once Pages is serving `{branch}` at {fork}/settings/pages\n"
            ));
        }
    }
    body
}

/// Open (or find) a pull request for `target`
///
/// For the primary repository, Pages is prepared on the head owner's fork
/// first; an `AbortCommit` answer fails with `Error::Aborted`.
pub async fn open_pull_request(
    ctx: &SyncContext<'_>,
    repo: &Repository,
    target: &PrTarget,
) -> Result<PullRequestDecision> {
    let name = repo.name();

    let pages = if repo.kind() == RepoKind::Primary {
        let (status, choice) = prepare_pages(ctx, name, &target.head_owner).await;
        match choice {
            PagesChoice::ProceedWithPr => Some(status),
            PagesChoice::SkipPr => {
                ctx.progress
                    .on_message(&format!("{name}: skipping pull request"))
                    .await;
                return Ok(PullRequestDecision::Skipped);
            }
            PagesChoice::AbortCommit => {
                return Err(Error::Aborted(format!(
                    "pull request for {name} cancelled by operator"
                )));
            }
        }
    } else {
        None
    };

    let head = format!("{}:{}", target.head_owner, target.head_branch);
    match ctx.platform.find_open_pr(&target.parent, name, &head).await {
        Ok(Some(pr)) => {
            debug!("reusing open PR #{} for {head}", pr.number);
            return Ok(PullRequestDecision::Created(pr));
        }
        Ok(None) => {}
        Err(e) => debug!("open PR lookup failed: {e}"),
    }

    let request = PullRequestRequest {
        owner: target.parent.clone(),
        repo: name.to_string(),
        head,
        base: target.base.clone(),
        title: format!("Update {name} from {}", target.head_owner),
        body: format_pr_body(
            ctx.config,
            name,
            &target.head_owner,
            &target.head_branch,
            pages,
        ),
    };

    ctx.platform
        .create_pr(&request)
        .await
        .map(PullRequestDecision::Created)
        .map_err(|e| match e {
            Error::PrCreationFailed { .. } => e,
            other => Error::PrCreationFailed {
                repo: name.to_string(),
                message: other.to_string(),
            },
        })
}
