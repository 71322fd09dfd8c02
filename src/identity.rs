//! Identity state and ownership rules
//!
//! The last authenticated login is the only state that survives between
//! runs. It lives in a plain-text file so a later run can tell that the
//! account changed and refresh git credentials before pushing.

use crate::config::Config;
use crate::error::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Plain-text file holding the last-known authenticated login
#[derive(Debug, Clone)]
pub struct IdentityCache {
    path: PathBuf,
}

impl IdentityCache {
    /// Cache stored at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last recorded login, `None` if never recorded or unreadable
    pub fn last_user(&self) -> Option<String> {
        let text = fs::read_to_string(&self.path).ok()?;
        let user = text.trim();
        (!user.is_empty()).then(|| user.to_string())
    }

    /// Record `user` as the last-known login
    pub fn record(&self, user: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, format!("{user}\n"))?;
        Ok(())
    }

    /// Forget the recorded login
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Whether the account segment of an origin URL is writable by `user`
///
/// `user` is `None` when the platform identity could not be resolved. Rules:
/// - the account equals the authenticated login
/// - no login is available and the account is outside the canonical
///   namespace (assumed to be the user's own fork)
/// - the account is the capitalized canonical namespace and the config
///   opts into treating it as accessible
pub fn owns_account(config: &Config, account: &str, user: Option<&str>) -> bool {
    match user {
        Some(login) if account.eq_ignore_ascii_case(login) => return true,
        None if !account.eq_ignore_ascii_case(&config.canonical_namespace) => return true,
        _ => {}
    }
    config.assume_capitalized_namespace_access && account == config.capitalized_namespace
}

/// Whether the account is the canonical namespace or an excluded partner
pub fn is_project_account(config: &Config, account: &str) -> bool {
    account.eq_ignore_ascii_case(&config.canonical_namespace)
        || config
            .excluded_namespaces
            .iter()
            .any(|ns| account.eq_ignore_ascii_case(ns))
}
