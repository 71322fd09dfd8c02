//! Repository classification and resolution
//!
//! The configured names form a closed set: one primary repository, an
//! ordered list of submodules and an ordered list of extra repositories.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::platform::parse_remote_url;
use crate::types::{Classification, RepoKind, RepoSpec, Repository};
use crate::vcs::VersionControl;
use std::path::{Path, PathBuf};

/// Classify a repository name against the configured set
pub fn classify(config: &Config, name: &str) -> Classification {
    if name == config.primary {
        return Classification::Known(spec(config, name, RepoKind::Primary, 0));
    }
    if let Some(index) = config.submodules.iter().position(|s| s == name) {
        return Classification::Known(spec(config, name, RepoKind::Submodule, index));
    }
    if let Some(index) = config.extras.iter().position(|s| s == name) {
        return Classification::Known(spec(config, name, RepoKind::Extra, index));
    }
    Classification::Unrecognized {
        valid: valid_names(config),
    }
}

/// Classify, turning an unrecognized name into `Error::RepoNotRecognized`
pub fn require_known(config: &Config, name: &str) -> Result<RepoSpec> {
    match classify(config, name) {
        Classification::Known(spec) => Ok(spec),
        Classification::Unrecognized { valid } => Err(Error::RepoNotRecognized {
            name: name.to_string(),
            valid,
        }),
    }
}

/// Every accepted name: primary, then submodules, then extras
pub fn valid_names(config: &Config) -> Vec<String> {
    std::iter::once(config.primary.clone())
        .chain(config.submodules.iter().cloned())
        .chain(config.extras.iter().cloned())
        .collect()
}

/// The primary repository
pub fn primary_spec(config: &Config) -> RepoSpec {
    spec(config, &config.primary, RepoKind::Primary, 0)
}

/// Submodules in configured order
pub fn submodule_specs(config: &Config) -> Vec<RepoSpec> {
    config
        .submodules
        .iter()
        .enumerate()
        .map(|(i, name)| spec(config, name, RepoKind::Submodule, i))
        .collect()
}

/// Extra repositories in configured order
pub fn extra_specs(config: &Config) -> Vec<RepoSpec> {
    config
        .extras
        .iter()
        .enumerate()
        .map(|(i, name)| spec(config, name, RepoKind::Extra, i))
        .collect()
}

/// Every repository in processing order
pub fn all_specs(config: &Config) -> Vec<RepoSpec> {
    let mut specs = vec![primary_spec(config)];
    specs.extend(submodule_specs(config));
    specs.extend(extra_specs(config));
    specs
}

/// Working tree location of a repository under the primary root
pub fn repo_path(root: &Path, spec: &RepoSpec) -> PathBuf {
    match spec.kind {
        RepoKind::Primary => root.to_path_buf(),
        RepoKind::Submodule | RepoKind::Extra => root.join(&spec.name),
    }
}

/// Resolve a spec against the filesystem and read its remotes
///
/// Returns `None` when the directory is not a checkout.
pub async fn resolve(
    vcs: &dyn VersionControl,
    root: &Path,
    spec: &RepoSpec,
) -> Result<Option<Repository>> {
    let path = repo_path(root, spec);
    if !vcs.is_repository(&path).await {
        return Ok(None);
    }

    let origin_url = vcs.remote_url(&path, "origin").await?;
    let upstream_url = vcs.remote_url(&path, "upstream").await?;

    Ok(Some(Repository {
        spec: spec.clone(),
        path,
        origin_url,
        upstream_url,
    }))
}

/// Find the primary repository root containing `start`
///
/// The checkout qualifies when its directory is named after the primary
/// repository or its `origin` points at a repository of that name.
pub async fn locate_primary_root(
    vcs: &dyn VersionControl,
    config: &Config,
    start: &Path,
) -> Result<PathBuf> {
    let not_primary = || Error::NotPrimaryRepository(start.to_path_buf(), config.primary.clone());

    let top = vcs.toplevel(start).await.map_err(|_| not_primary())?;
    if top.file_name().and_then(|n| n.to_str()) == Some(config.primary.as_str()) {
        return Ok(top);
    }

    let origin_repo = vcs
        .remote_url(&top, "origin")
        .await?
        .and_then(|url| parse_remote_url(&url).ok())
        .map(|info| info.repo);
    if origin_repo.as_deref() == Some(config.primary.as_str()) {
        return Ok(top);
    }

    Err(not_primary())
}

fn spec(config: &Config, name: &str, kind: RepoKind, index: usize) -> RepoSpec {
    RepoSpec {
        name: name.to_string(),
        kind,
        index,
        canonical_owner: config.canonical_owner(name).to_string(),
    }
}
