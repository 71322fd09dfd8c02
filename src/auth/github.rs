//! GitHub authentication

use crate::auth::AuthSource;
use crate::error::{Error, Result};
use std::env;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// GitHub authentication configuration
#[derive(Debug, Clone)]
pub struct GitHubAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token was obtained from
    pub source: AuthSource,
}

/// Get GitHub authentication
///
/// Priority:
/// 1. gh CLI (`gh auth token`)
/// 2. `GITHUB_TOKEN` environment variable
/// 3. `GH_TOKEN` environment variable
pub async fn get_github_auth(host: &str) -> Result<GitHubAuthConfig> {
    if let Some(token) = get_gh_cli_token(host).await {
        return Ok(GitHubAuthConfig {
            token,
            source: AuthSource::Cli,
        });
    }

    for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
        if let Ok(token) = env::var(var) {
            if !token.trim().is_empty() {
                return Ok(GitHubAuthConfig {
                    token: token.trim().to_string(),
                    source: AuthSource::EnvVar,
                });
            }
        }
    }

    Err(Error::AuthUnavailable(
        "no GitHub authentication found. Run `gh auth login` or set GITHUB_TOKEN".to_string(),
    ))
}

async fn get_gh_cli_token(host: &str) -> Option<String> {
    // Check gh is available
    Command::new("gh").arg("--version").output().await.ok()?;

    // Check authenticated
    let status = Command::new("gh")
        .args(["auth", "status", "--hostname", host])
        .output()
        .await
        .ok()?;

    if !status.status.success() {
        debug!("gh auth status reports no session for {host}");
        return None;
    }

    let output = Command::new("gh")
        .args(["auth", "token", "--hostname", host])
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() { None } else { Some(token) }
}

/// Erase stored git credentials for `host`
///
/// `git credential reject` forwards the erase to every configured helper,
/// which covers the cache helper and OS keychains alike.
pub async fn clear_git_credentials(host: &str) -> Result<()> {
    let mut child = Command::new("git")
        .args(["credential", "reject"])
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(format!("protocol=https\nhost={host}\n\n").as_bytes())
            .await?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        warn!(
            "git credential reject for {host} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

/// Configure git to use the gh CLI as credential helper
pub async fn setup_git_credential_helper(host: &str) -> Result<()> {
    let output = Command::new("gh")
        .args(["auth", "setup-git", "--hostname", host])
        .output()
        .await?;

    if output.status.success() {
        Ok(())
    } else {
        Err(Error::AuthUnavailable(format!(
            "gh auth setup-git failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}
