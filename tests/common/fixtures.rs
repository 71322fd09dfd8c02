//! Test workspace factories
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use super::{CallLog, MockPlatform, MockVcs, RepoState};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use webroot_git::config::Config;
use webroot_git::error::Error;
use webroot_git::sync::{
    FixedChoice, PagesChoice, Phase, ProgressCallback, PushStatus, SyncContext, SyncOptions,
};
use webroot_git::types::PullRequest;

/// Root of the simulated webroot checkout
pub const ROOT: &str = "/work/webroot";

/// Canonical clone URL in the configured casing
pub fn canonical_url(repo: &str) -> String {
    let config = Config::default();
    config.repo_url(config.canonical_owner(repo), repo)
}

/// Clone URL under `user`
pub fn user_url(user: &str, repo: &str) -> String {
    format!("https://github.com/{user}/{repo}.git")
}

/// Make a pull request
pub fn make_pr(number: u64, head: &str, base: &str) -> PullRequest {
    PullRequest {
        number,
        html_url: format!("https://github.com/modelearth/webroot/pull/{number}"),
        base_ref: base.to_string(),
        head_ref: head.to_string(),
        title: format!("PR from {head}"),
    }
}

/// Progress callback that records everything it is told
#[derive(Default)]
pub struct RecordingProgress {
    pub phases: Mutex<Vec<Phase>>,
    pub pushes: Mutex<Vec<(String, PushStatus)>>,
    pub prs: Mutex<Vec<(String, u64)>>,
    pub warnings: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
    pub messages: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.phases.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressCallback for RecordingProgress {
    async fn on_phase(&self, phase: Phase) {
        self.phases.lock().unwrap().push(phase);
    }
    async fn on_repo(&self, _repo: &str) {}
    async fn on_push(&self, repo: &str, status: PushStatus) {
        self.pushes.lock().unwrap().push((repo.to_string(), status));
    }
    async fn on_pr_created(&self, repo: &str, pr: &PullRequest) {
        self.prs.lock().unwrap().push((repo.to_string(), pr.number));
    }
    async fn on_warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
    async fn on_error(&self, error: &Error) {
        self.errors.lock().unwrap().push(error.to_string());
    }
    async fn on_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Simulated webroot with mock git and platform
///
/// Only repositories added with [`TestWorkspace::add`] exist; the rest of
/// the configured set is treated as not checked out.
pub struct TestWorkspace {
    pub config: Config,
    pub log: CallLog,
    pub vcs: MockVcs,
    pub platform: MockPlatform,
    pub progress: RecordingProgress,
    pub prompt: FixedChoice,
    pub root: PathBuf,
    _cache_dir: TempDir,
}

impl TestWorkspace {
    /// Workspace with the primary checkout on `main`, authenticated as `user`
    pub fn new(user: Option<&str>) -> Self {
        let cache_dir = TempDir::new().unwrap();
        let config = Config {
            retry_delay: Duration::ZERO,
            identity_cache: cache_dir.path().join("last-user"),
            ..Config::default()
        };
        let log = CallLog::default();
        let vcs = MockVcs::new(log.clone());
        let platform = MockPlatform::new(log.clone(), user);
        let root = PathBuf::from(ROOT);

        vcs.add_repo(
            &root,
            RepoState::on_main("root-head", &canonical_url("webroot")),
        );

        Self {
            config,
            log,
            vcs,
            platform,
            progress: RecordingProgress::default(),
            prompt: FixedChoice(PagesChoice::ProceedWithPr),
            root,
            _cache_dir: cache_dir,
        }
    }

    /// Path of a submodule or extra repository
    pub fn path(&self, repo: &str) -> PathBuf {
        if repo == self.config.primary {
            self.root.clone()
        } else {
            self.root.join(repo)
        }
    }

    /// Add a checkout of `repo` on `main`
    pub fn add(&self, repo: &str, head: &str, origin: &str) -> PathBuf {
        let path = self.path(repo);
        self.vcs.add_repo(&path, RepoState::on_main(head, origin));
        path
    }

    /// Add a submodule checkout and its gitlink in the primary repository
    pub fn add_submodule(&self, repo: &str, head: &str, referenced: &str) -> PathBuf {
        let path = self.add(repo, head, &canonical_url(repo));
        let mut root = self.vcs.state(&self.root);
        root.gitlinks.insert(repo.to_string(), referenced.to_string());
        self.vcs.add_repo(&self.root, root);
        path
    }

    /// Mark a checkout as having uncommitted edits
    pub fn edit(&self, path: &Path) {
        let mut state = self.vcs.state(path);
        state.dirty = true;
        self.vcs.add_repo(path, state);
    }

    pub fn ctx(&self, options: SyncOptions) -> SyncContext<'_> {
        SyncContext {
            root: self.root.clone(),
            config: &self.config,
            vcs: &self.vcs,
            platform: &self.platform,
            progress: &self.progress,
            pages_prompt: &self.prompt,
            options,
        }
    }

    pub fn default_ctx(&self) -> SyncContext<'_> {
        self.ctx(SyncOptions::default())
    }
}
