//! Pull and push commands

use crate::cli::session::{Session, print_summary};
use std::path::Path;
use webroot_git::config::Config;
use webroot_git::error::Result;
use webroot_git::repo::require_known;
use webroot_git::sync::{
    PushScope, SyncOptions, pull_all, pull_repo, push_all, push_repo, push_submodules,
};

/// Run the pull command, for one repository or all of them
pub async fn run_pull(
    path: &Path,
    repo: Option<&str>,
    options: SyncOptions,
    verbose: bool,
) -> Result<()> {
    let repo = repo.filter(|name| *name != "all");
    if let Some(name) = repo {
        require_known(&Config::from_env(), name)?;
    }

    let session = Session::open(path, verbose).await?;
    let ctx = session.context(options);

    let report = match repo {
        Some(name) => pull_repo(&ctx, name).await?,
        None => pull_all(&ctx).await,
    };

    print_summary("Pull", &report);
    Ok(())
}

/// Run the push command
///
/// `args` are the positional words after `push`: an optional scope
/// (`all`, `submodules` or a repository name) and an optional `nopr`.
pub async fn run_push(
    path: &Path,
    args: &[String],
    mut options: SyncOptions,
    verbose: bool,
) -> Result<()> {
    let (scope, no_pr) = PushScope::parse(args);
    options.no_pr |= no_pr;
    // Unknown names fail before anything is touched
    if let PushScope::Repo(name) = &scope {
        require_known(&Config::from_env(), name)?;
    }

    let session = Session::open(path, verbose).await?;
    let ctx = session.context(options);

    let report = match scope {
        PushScope::All => push_all(&ctx).await?,
        PushScope::Submodules => push_submodules(&ctx).await?,
        PushScope::Repo(name) => push_repo(&ctx, &name).await?,
    };

    print_summary("Push", &report);
    Ok(())
}
