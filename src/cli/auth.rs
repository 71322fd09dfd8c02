//! Maintenance commands - detached HEADs, remotes and credentials

use crate::cli::session::{Session, print_summary};
use std::path::Path;
use webroot_git::error::Result;
use webroot_git::sync::{SyncOptions, fix_heads, refresh_auth, update_remotes};

/// Re-attach every detached repository
pub async fn run_fix_heads(path: &Path, options: SyncOptions, verbose: bool) -> Result<()> {
    let session = Session::open(path, verbose).await?;
    let report = fix_heads(&session.context(options)).await;
    print_summary("Fix", &report);
    Ok(())
}

/// Point every `origin` at the current account
pub async fn run_update_remotes(path: &Path, options: SyncOptions, verbose: bool) -> Result<()> {
    let session = Session::open(path, verbose).await?;
    let report = update_remotes(&session.context(options)).await;
    print_summary("Remote update", &report);
    Ok(())
}

/// Refresh git credentials, then update remotes
pub async fn run_refresh_auth(path: &Path, options: SyncOptions, verbose: bool) -> Result<()> {
    let session = Session::open(path, verbose).await?;
    let report = refresh_auth(&session.context(options)).await?;
    print_summary("Credential refresh", &report);
    Ok(())
}
