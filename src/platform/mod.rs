//! Hosting platform services
//!
//! Identity, forks, pull requests and Pages, behind one trait so the
//! orchestration engine never talks to the platform directly.

mod detection;
mod github;

pub use detection::{parse_remote_url, remote_account};
pub use github::GitHubPlatform;

use crate::error::Result;
use crate::types::{PagesStatus, PullRequest, PullRequestRequest};
use async_trait::async_trait;

/// Hosting platform operations
#[async_trait]
pub trait HostingPlatform: Send + Sync {
    /// Login of the authenticated user
    ///
    /// Fails with `Error::AuthUnavailable` when there is no session.
    async fn current_user(&self) -> Result<String>;

    /// Drop cached git credentials for the host and re-sync the git
    /// credential helper with the platform CLI identity
    async fn refresh_credentials(&self) -> Result<()>;

    /// Fork `owner/repo` into the user's account, returning the fork's clone URL
    ///
    /// Succeeds if the fork already exists.
    async fn fork(&self, owner: &str, repo: &str) -> Result<String>;

    /// Find an open PR on `owner/repo` from `head` (`account:branch`)
    async fn find_open_pr(&self, owner: &str, repo: &str, head: &str)
    -> Result<Option<PullRequest>>;

    /// Open a pull request
    async fn create_pr(&self, request: &PullRequestRequest) -> Result<PullRequest>;

    /// Pages state of `owner/repo`
    async fn pages_status(&self, owner: &str, repo: &str) -> Result<PagesStatus>;

    /// Ask the platform to serve `branch` of `owner/repo` with Pages
    async fn enable_pages(&self, owner: &str, repo: &str, branch: &str) -> Result<PagesStatus>;
}
