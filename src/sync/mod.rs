//! Orchestration engine
//!
//! Drives pull, push, fork and PR workflows across the primary repository,
//! its submodules and the extra repositories:
//! 1. Pull - merge origin and upstream, reconcile submodules and HEADs
//! 2. Push - commit local changes, publish them with fallbacks, propagate
//!    submodule references into the primary repository
//! 3. Final sweep - retry anything still ahead of its remote
//!
//! Repositories are processed one at a time in configured order. Failures
//! stay local to the repository that raised them.

mod heads;
mod orchestrate;
mod pages;
mod progress;
mod pull;
mod push;
mod remotes;
mod submodules;
mod verify;

pub use heads::{HeadOutcome, reconcile_detached_head};
pub use orchestrate::{
    PushScope, final_sweep, fix_heads, push_all, push_repo, push_submodules, refresh_auth,
    update_remotes,
};
pub use pages::{
    FixedChoice, PagesChoice, PagesPrompt, PrTarget, PullRequestDecision, format_pr_body,
    open_pull_request, prepare_pages,
};
pub use progress::{NoopProgress, Phase, ProgressCallback, PushStatus};
pub use pull::{pull_all, pull_repo};
pub use push::{
    FORK_STRATEGIES, OWNER_STRATEGIES, PushAttempt, PushRejection, PushStrategy,
    classify_push_failure, commit_and_push, feature_branch_name, run_strategies,
};
pub use remotes::{
    check_user_change, ensure_upstream, is_owner, parent_account, setup_fork,
};
pub use submodules::{
    SubmoduleAction, reconcile_submodule, reconcile_submodules, update_submodule_from_remote,
};
pub use verify::ensure_pushed;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::identity::IdentityCache;
use crate::platform::HostingPlatform;
use crate::repo;
use crate::types::{PullRequest, PushOutcome, RepoSpec, Repository};
use crate::vcs::VersionControl;
use std::path::PathBuf;

/// Per-run switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Move submodules to their remote tips without the timestamp check
    pub unsafe_submodules: bool,
    /// Never open pull requests
    pub no_pr: bool,
    /// Skip the pull that normally precedes a push
    pub skip_pull: bool,
}

/// Everything the engine needs for one run
pub struct SyncContext<'a> {
    /// Primary repository root
    pub root: PathBuf,
    /// Static configuration
    pub config: &'a Config,
    /// Version-control engine
    pub vcs: &'a dyn VersionControl,
    /// Hosting platform
    pub platform: &'a dyn HostingPlatform,
    /// Progress reporting
    pub progress: &'a dyn ProgressCallback,
    /// Decision callback for the Pages prompt
    pub pages_prompt: &'a dyn PagesPrompt,
    /// Per-run switches
    pub options: SyncOptions,
}

impl SyncContext<'_> {
    /// Cache of the last authenticated login
    pub fn identity_cache(&self) -> IdentityCache {
        IdentityCache::new(&self.config.identity_cache)
    }

    /// Resolve a spec, `None` when its directory is not a checkout
    pub async fn resolve(&self, spec: &RepoSpec) -> Result<Option<Repository>> {
        repo::resolve(self.vcs, &self.root, spec).await
    }

    /// The primary repository
    pub async fn primary(&self) -> Result<Repository> {
        let spec = repo::primary_spec(self.config);
        self.resolve(&spec)
            .await?
            .ok_or_else(|| Error::NotPrimaryRepository(self.root.clone(), spec.name.clone()))
    }

    /// Branch to publish: the checked-out branch, else the preferred one
    pub async fn target_branch(&self, repo: &Repository) -> Result<String> {
        Ok(self
            .vcs
            .current_branch(&repo.path)
            .await?
            .unwrap_or_else(|| self.config.primary_branch.clone()))
    }
}

/// Summary of a run
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Push outcome per repository, in processing order
    pub outcomes: Vec<(String, PushOutcome)>,
    /// Pull requests opened or found
    pub created_prs: Vec<PullRequest>,
    /// Errors encountered (non-fatal)
    pub errors: Vec<String>,
    /// Warnings (unpushed commits, skipped repositories)
    pub warnings: Vec<String>,
}

impl SyncReport {
    /// Whether the run finished without errors
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Outcome recorded for `repo`, latest first
    pub fn outcome(&self, repo: &str) -> Option<&PushOutcome> {
        self.outcomes
            .iter()
            .rev()
            .find(|(name, _)| name == repo)
            .map(|(_, outcome)| outcome)
    }

    /// Record an error and forward it to the progress callback
    pub(crate) async fn error(&mut self, progress: &dyn ProgressCallback, err: &Error) {
        progress.on_error(err).await;
        self.errors.push(err.to_string());
    }

    /// Record a warning and forward it to the progress callback
    pub(crate) async fn warn(&mut self, progress: &dyn ProgressCallback, message: String) {
        progress.on_warning(&message).await;
        self.warnings.push(message);
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: Self) {
        self.outcomes.extend(other.outcomes);
        self.created_prs.extend(other.created_prs);
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}
