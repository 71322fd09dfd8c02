//! Post-commit push verification

use crate::error::{Error, Result};
use crate::sync::{PushStrategy, SyncContext};
use crate::types::Repository;
use tracing::{debug, warn};

/// Escalating strategies, one per attempt; the last repeats
const ESCALATION: [PushStrategy; 3] = [
    PushStrategy::SameName,
    PushStrategy::SetUpstream,
    PushStrategy::ForceWithLease,
];

/// Commits on HEAD that `origin/<branch>` does not have
///
/// A missing remote-tracking branch counts as one unpushed commit so the
/// branch gets created.
async fn unpushed(ctx: &SyncContext<'_>, repo: &Repository, branch: &str) -> Result<usize> {
    Ok(ctx
        .vcs
        .commits_ahead(&repo.path, &format!("origin/{branch}"))
        .await?
        .unwrap_or(1))
}

/// Push until `origin/<branch>` contains HEAD, for a bounded number of attempts
///
/// Fails with `Error::UnpushedAfterRetries` when commits remain, which
/// callers report as a warning rather than a failure.
pub async fn ensure_pushed(ctx: &SyncContext<'_>, repo: &Repository, branch: &str) -> Result<()> {
    let attempts = ctx.config.push_retries.max(1);

    for attempt in 0..attempts {
        let ahead = unpushed(ctx, repo, branch).await?;
        if ahead == 0 {
            return Ok(());
        }

        let strategy = ESCALATION[(attempt as usize).min(ESCALATION.len() - 1)];
        debug!(
            "{}: {ahead} unpushed, attempt {} with {strategy:?}",
            repo.name(),
            attempt + 1
        );
        let output = ctx
            .vcs
            .push(&repo.path, &strategy.request("origin", branch))
            .await?;
        if !output.success {
            warn!("{}: push attempt {} failed", repo.name(), attempt + 1);
            if attempt + 1 < attempts {
                tokio::time::sleep(ctx.config.retry_delay).await;
            }
        }
    }

    let remaining = unpushed(ctx, repo, branch).await?;
    if remaining == 0 {
        Ok(())
    } else {
        Err(Error::UnpushedAfterRetries {
            repo: repo.name().to_string(),
            attempts,
            remaining,
        })
    }
}
