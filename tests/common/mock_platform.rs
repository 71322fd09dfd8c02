//! Mock hosting platform for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use super::CallLog;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use webroot_git::error::{Error, Result};
use webroot_git::platform::HostingPlatform;
use webroot_git::types::{PagesStatus, PullRequest, PullRequestRequest};

/// Simple mock hosting platform
///
/// Features:
/// - Auto-incrementing PR numbers
/// - Call tracking, also written to the shared [`CallLog`]
/// - Configurable identity, Pages state and open PRs
/// - Error injection for failure path testing
pub struct MockPlatform {
    log: CallLog,
    user: Mutex<Option<String>>,
    next_pr_number: AtomicU64,
    open_prs: Mutex<HashMap<String, PullRequest>>,
    pages: Mutex<HashMap<String, PagesStatus>>,
    enable_pages_result: Mutex<PagesStatus>,
    // Call tracking
    fork_calls: Mutex<Vec<String>>,
    create_pr_calls: Mutex<Vec<PullRequestRequest>>,
    enable_pages_calls: Mutex<Vec<String>>,
    refresh_calls: AtomicU64,
    // Error injection
    error_on_fork: Mutex<Option<String>>,
    error_on_create_pr: Mutex<Option<String>>,
    error_on_pages: Mutex<Option<String>>,
}

impl MockPlatform {
    /// Mock authenticated as `user`, or unauthenticated for `None`
    pub fn new(log: CallLog, user: Option<&str>) -> Self {
        Self {
            log,
            user: Mutex::new(user.map(ToString::to_string)),
            next_pr_number: AtomicU64::new(1),
            open_prs: Mutex::new(HashMap::new()),
            pages: Mutex::new(HashMap::new()),
            enable_pages_result: Mutex::new(PagesStatus::EnableAttempted),
            fork_calls: Mutex::new(Vec::new()),
            create_pr_calls: Mutex::new(Vec::new()),
            enable_pages_calls: Mutex::new(Vec::new()),
            refresh_calls: AtomicU64::new(0),
            error_on_fork: Mutex::new(None),
            error_on_create_pr: Mutex::new(None),
            error_on_pages: Mutex::new(None),
        }
    }

    // === Setup ===

    pub fn set_user(&self, user: Option<&str>) {
        *self.user.lock().unwrap() = user.map(ToString::to_string);
    }

    /// Register an open PR for `head` (`account:branch`)
    pub fn set_open_pr(&self, head: &str, pr: PullRequest) {
        self.open_prs.lock().unwrap().insert(head.to_string(), pr);
    }

    pub fn set_pages(&self, owner: &str, repo: &str, status: PagesStatus) {
        self.pages
            .lock()
            .unwrap()
            .insert(format!("{owner}/{repo}"), status);
    }

    /// What `enable_pages` reports back
    pub fn set_enable_pages_result(&self, status: PagesStatus) {
        *self.enable_pages_result.lock().unwrap() = status;
    }

    // === Error injection ===

    pub fn fail_fork(&self, msg: &str) {
        *self.error_on_fork.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    pub fn fail_pages(&self, msg: &str) {
        *self.error_on_pages.lock().unwrap() = Some(msg.to_string());
    }

    // === Call verification ===

    pub fn fork_calls(&self) -> Vec<String> {
        self.fork_calls.lock().unwrap().clone()
    }

    pub fn create_pr_calls(&self) -> Vec<PullRequestRequest> {
        self.create_pr_calls.lock().unwrap().clone()
    }

    pub fn enable_pages_calls(&self) -> Vec<String> {
        self.enable_pages_calls.lock().unwrap().clone()
    }

    pub fn refresh_count(&self) -> u64 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn login(&self) -> Result<String> {
        self.user
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::AuthUnavailable("not logged in".to_string()))
    }
}

#[async_trait]
impl HostingPlatform for MockPlatform {
    async fn current_user(&self) -> Result<String> {
        self.login()
    }

    async fn refresh_credentials(&self) -> Result<()> {
        self.log.record("platform refresh-credentials");
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fork(&self, owner: &str, repo: &str) -> Result<String> {
        self.log.record(format!("platform fork {owner}/{repo}"));
        self.fork_calls
            .lock()
            .unwrap()
            .push(format!("{owner}/{repo}"));

        if let Some(msg) = self.error_on_fork.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        let user = self.login()?;
        Ok(format!("https://github.com/{user}/{repo}.git"))
    }

    async fn find_open_pr(
        &self,
        owner: &str,
        repo: &str,
        head: &str,
    ) -> Result<Option<PullRequest>> {
        self.log
            .record(format!("platform find-pr {owner}/{repo} {head}"));
        Ok(self.open_prs.lock().unwrap().get(head).cloned())
    }

    async fn create_pr(&self, request: &PullRequestRequest) -> Result<PullRequest> {
        self.log.record(format!(
            "platform create-pr {}/{} {}",
            request.owner, request.repo, request.head
        ));
        self.create_pr_calls.lock().unwrap().push(request.clone());

        if let Some(msg) = self.error_on_create_pr.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequest {
            number,
            html_url: format!(
                "https://github.com/{}/{}/pull/{number}",
                request.owner, request.repo
            ),
            base_ref: request.base.clone(),
            head_ref: request.head.clone(),
            title: request.title.clone(),
        })
    }

    async fn pages_status(&self, owner: &str, repo: &str) -> Result<PagesStatus> {
        if let Some(msg) = self.error_on_pages.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&format!("{owner}/{repo}"))
            .copied()
            .unwrap_or(PagesStatus::NotEnabled))
    }

    async fn enable_pages(&self, owner: &str, repo: &str, branch: &str) -> Result<PagesStatus> {
        self.log
            .record(format!("platform enable-pages {owner}/{repo} {branch}"));
        self.enable_pages_calls
            .lock()
            .unwrap()
            .push(format!("{owner}/{repo}"));
        Ok(*self.enable_pages_result.lock().unwrap())
    }
}
