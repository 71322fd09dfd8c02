//! GitHub platform service implementation

use crate::auth::{clear_git_credentials, get_github_auth, setup_git_credential_helper};
use crate::error::{Error, Result};
use crate::platform::HostingPlatform;
use crate::types::{PagesStatus, PullRequest, PullRequestRequest};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::debug;

/// GitHub service using octocrab
///
/// The client is built on first use, so commands that only merge never
/// require an authenticated session.
pub struct GitHubPlatform {
    host: String,
    client: OnceCell<Octocrab>,
}

impl GitHubPlatform {
    /// Create a service for `host` ("github.com" or an Enterprise hostname)
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&Octocrab> {
        self.client
            .get_or_try_init(|| async {
                let auth = get_github_auth(&self.host).await?;
                debug!("GitHub token from {:?}", auth.source);

                let mut builder = Octocrab::builder().personal_token(auth.token);
                if self.host != "github.com" {
                    let base_url = format!("https://{}/api/v3", self.host);
                    builder = builder
                        .base_uri(&base_url)
                        .map_err(|e| Error::GitHubApi(e.to_string()))?;
                }
                builder.build().map_err(|e| Error::GitHubApi(e.to_string()))
            })
            .await
    }
}

fn to_pull_request(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.label.clone().unwrap_or_else(|| pr.head.ref_field.clone()),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
    }
}

fn status_code(err: &octocrab::Error) -> Option<u16> {
    match err {
        octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
        _ => None,
    }
}

#[async_trait]
impl HostingPlatform for GitHubPlatform {
    async fn current_user(&self) -> Result<String> {
        let client = self.client().await?;
        let user = client
            .current()
            .user()
            .await
            .map_err(|e| Error::AuthUnavailable(format!("invalid token: {e}")))?;
        Ok(user.login)
    }

    async fn refresh_credentials(&self) -> Result<()> {
        clear_git_credentials(&self.host).await?;
        setup_git_credential_helper(&self.host).await
    }

    async fn fork(&self, owner: &str, repo: &str) -> Result<String> {
        let client = self.client().await?;
        let fork = client
            .repos(owner, repo)
            .create_fork()
            .send()
            .await
            .map_err(|e| Error::ForkFailed {
                owner: owner.to_string(),
                repo: repo.to_string(),
                message: e.to_string(),
            })?;

        fork.clone_url
            .as_ref()
            .map(ToString::to_string)
            .or_else(|| fork.html_url.as_ref().map(|u| format!("{u}.git")))
            .ok_or_else(|| Error::ForkFailed {
                owner: owner.to_string(),
                repo: repo.to_string(),
                message: "platform returned no fork URL".to_string(),
            })
    }

    async fn find_open_pr(
        &self,
        owner: &str,
        repo: &str,
        head: &str,
    ) -> Result<Option<PullRequest>> {
        let client = self.client().await?;
        let prs = client
            .pulls(owner, repo)
            .list()
            .head(head.to_string())
            .state(octocrab::params::State::Open)
            .send()
            .await?;

        Ok(prs.items.first().map(to_pull_request))
    }

    async fn create_pr(&self, request: &PullRequestRequest) -> Result<PullRequest> {
        let client = self.client().await?;
        let pr = client
            .pulls(&request.owner, &request.repo)
            .create(&request.title, &request.head, &request.base)
            .body(&request.body)
            .send()
            .await
            .map_err(|e| Error::PrCreationFailed {
                repo: request.repo.clone(),
                message: e.to_string(),
            })?;

        Ok(to_pull_request(&pr))
    }

    async fn pages_status(&self, owner: &str, repo: &str) -> Result<PagesStatus> {
        let client = self.client().await?;
        let route = format!("/repos/{owner}/{repo}/pages");
        let response: octocrab::Result<serde_json::Value> = client.get(route, None::<&()>).await;

        match response {
            Ok(_) => Ok(PagesStatus::Enabled),
            Err(e) if status_code(&e) == Some(404) => Ok(PagesStatus::NotEnabled),
            Err(e) => Err(e.into()),
        }
    }

    async fn enable_pages(&self, owner: &str, repo: &str, branch: &str) -> Result<PagesStatus> {
        let client = self.client().await?;
        let route = format!("/repos/{owner}/{repo}/pages");
        let body = json!({ "source": { "branch": branch, "path": "/" } });
        let response: octocrab::Result<serde_json::Value> = client.post(route, Some(&body)).await;

        match response {
            Ok(_) => Ok(PagesStatus::EnableAttempted),
            // 409: a Pages site already exists
            Err(e) if status_code(&e) == Some(409) => Ok(PagesStatus::Enabled),
            Err(e) => Err(e.into()),
        }
    }
}
