//! Static configuration of the webroot layout
//!
//! Defaults describe the built-in webroot superproject. A few environment
//! variables override them:
//!
//! - `GH_HOST` - hosting platform hostname (default `github.com`)
//! - `WEBROOT_IDENTITY_CACHE` - file holding the last authenticated login
//! - `WEBROOT_PUSH_RETRIES` - attempts in the post-commit push check
//! - `WEBROOT_ASSUME_NAMESPACE_ACCESS` - `0` disables the rule that treats the
//!   capitalized canonical namespace as always writable

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// File name of the last-known-user cache inside the temp directory
pub const IDENTITY_CACHE_TOKEN: &str = "webroot-git-last-gh-user";

/// Default number of attempts in the post-commit push check
pub const DEFAULT_PUSH_RETRIES: u32 = 3;

/// Default delay between push check attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Orchestration configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Hosting platform hostname
    pub host: String,
    /// Name of the primary repository
    pub primary: String,
    /// Submodule names, in processing order
    pub submodules: Vec<String>,
    /// Extra (non-submodule) repository names, in processing order
    pub extras: Vec<String>,
    /// Canonical project namespace
    pub canonical_namespace: String,
    /// Capitalized spelling of the canonical namespace
    pub capitalized_namespace: String,
    /// Repositories whose canonical owner is spelled with the capitalized form
    pub capitalized_repos: Vec<String>,
    /// Partner namespaces whose repositories never get an upstream remote
    pub excluded_namespaces: Vec<String>,
    /// Preferred branch name
    pub primary_branch: String,
    /// Branch tried when the preferred one does not exist
    pub fallback_branch: String,
    /// Treat an origin under the capitalized namespace as user-writable
    pub assume_capitalized_namespace_access: bool,
    /// Attempts in the post-commit push check
    pub push_retries: u32,
    /// Delay between push check attempts
    pub retry_delay: Duration,
    /// Where the last authenticated login is stored
    pub identity_cache: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "github.com".to_string(),
            primary: "webroot".to_string(),
            submodules: to_strings(&[
                "cloud",
                "comparison",
                "feed",
                "home",
                "localsite",
                "products",
                "projects",
                "realitystream",
                "swiper",
                "team",
            ]),
            extras: to_strings(&["community", "nisar", "data-pipeline"]),
            canonical_namespace: "modelearth".to_string(),
            capitalized_namespace: "ModelEarth".to_string(),
            capitalized_repos: to_strings(&["webroot", "localsite", "home"]),
            excluded_namespaces: to_strings(&["partnertools"]),
            primary_branch: "main".to_string(),
            fallback_branch: "master".to_string(),
            assume_capitalized_namespace_access: true,
            push_retries: DEFAULT_PUSH_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            identity_cache: env::temp_dir().join(IDENTITY_CACHE_TOKEN),
        }
    }
}

impl Config {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("GH_HOST") {
            if !host.trim().is_empty() {
                config.host = host.trim().to_string();
            }
        }

        if let Ok(path) = env::var("WEBROOT_IDENTITY_CACHE") {
            if !path.trim().is_empty() {
                config.identity_cache = PathBuf::from(path);
            }
        }

        if let Some(retries) = env::var("WEBROOT_PUSH_RETRIES")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            config.push_retries = retries.max(1);
        }

        if let Ok(flag) = env::var("WEBROOT_ASSUME_NAMESPACE_ACCESS") {
            config.assume_capitalized_namespace_access =
                !matches!(flag.trim(), "0" | "false" | "no" | "off");
        }

        config
    }

    /// Canonical owner spelling for a repository
    ///
    /// The platform treats account names case-sensitively in some places and
    /// the canonical namespace is spelled inconsistently across repositories.
    pub fn canonical_owner(&self, repo: &str) -> &str {
        if self.capitalized_repos.iter().any(|r| r == repo) {
            &self.capitalized_namespace
        } else {
            &self.canonical_namespace
        }
    }

    /// HTTPS clone URL for `owner/repo` on the configured host
    pub fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!("https://{}/{owner}/{repo}.git", self.host)
    }

    /// Branch names to try, preferred first
    pub fn branch_candidates(&self) -> [&str; 2] {
        [self.primary_branch.as_str(), self.fallback_branch.as_str()]
    }

    /// Commit message for local changes in `repo`
    pub fn commit_message(&self, repo: &str) -> String {
        format!("Update {repo} from {} sync", self.primary)
    }
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_canonical_owner_casing() {
        let config = Config::default();
        assert_eq!(config.canonical_owner("localsite"), "ModelEarth");
        assert_eq!(config.canonical_owner("webroot"), "ModelEarth");
        assert_eq!(config.canonical_owner("team"), "modelearth");
    }

    #[test]
    fn test_repo_url() {
        let config = Config::default();
        assert_eq!(
            config.repo_url("alice", "team"),
            "https://github.com/alice/team.git"
        );
    }

    #[test]
    #[serial]
    #[allow(unsafe_code)]
    fn test_env_overrides() {
        // SAFETY: serialized with other env-mutating tests
        unsafe {
            env::set_var("GH_HOST", "github.example.com");
            env::set_var("WEBROOT_PUSH_RETRIES", "5");
            env::set_var("WEBROOT_ASSUME_NAMESPACE_ACCESS", "0");
        }

        let config = Config::from_env();

        unsafe {
            env::remove_var("GH_HOST");
            env::remove_var("WEBROOT_PUSH_RETRIES");
            env::remove_var("WEBROOT_ASSUME_NAMESPACE_ACCESS");
        }

        assert_eq!(config.host, "github.example.com");
        assert_eq!(config.push_retries, 5);
        assert!(!config.assume_capitalized_namespace_access);
    }
}
