//! Owner/repository detection from remote URLs

use crate::error::{Error, Result};
use crate::types::RemoteInfo;
use regex::Regex;
use std::sync::OnceLock;

fn ssh_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:ssh://)?git@([^:/]+)[:/](.+?)(?:\.git)?/?$")
            .expect("hardcoded ssh remote pattern is valid")
    })
}

/// Parse `host`, `owner` and `repo` out of a remote URL
///
/// Accepts SSH (`git@host:owner/repo.git`, `ssh://git@host/owner/repo.git`)
/// and HTTPS (`https://[user@]host/owner/repo[.git]`) forms.
pub fn parse_remote_url(url: &str) -> Result<RemoteInfo> {
    let url = url.trim();

    let (host, path) = if let Some(caps) = ssh_pattern().captures(url) {
        (caps[1].to_string(), caps[2].to_string())
    } else {
        let parsed =
            url::Url::parse(url).map_err(|e| Error::Parse(format!("cannot parse remote URL {url}: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::Parse(format!("remote URL has no host: {url}")))?
            .to_string();
        let path = parsed.path().trim_matches('/').to_string();
        let path = path.strip_suffix(".git").unwrap_or(&path).to_string();
        (host, path)
    };

    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    let [owner @ .., repo] = parts.as_slice() else {
        return Err(Error::Parse(format!("invalid repo path: {path}")));
    };
    if owner.is_empty() {
        return Err(Error::Parse(format!("invalid repo path: {path}")));
    }

    Ok(RemoteInfo {
        host,
        owner: owner.join("/"),
        repo: (*repo).to_string(),
    })
}

/// Account segment of a remote URL, if it parses
pub fn remote_account(url: &str) -> Option<String> {
    parse_remote_url(url).ok().map(|info| info.owner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https() {
        let info = parse_remote_url("https://github.com/alice/localsite.git").unwrap();
        assert_eq!(info.host, "github.com");
        assert_eq!(info.owner, "alice");
        assert_eq!(info.repo, "localsite");
    }

    #[test]
    fn test_parse_https_without_suffix() {
        let info = parse_remote_url("https://github.com/ModelEarth/webroot").unwrap();
        assert_eq!(info.owner, "ModelEarth");
        assert_eq!(info.repo, "webroot");
    }

    #[test]
    fn test_parse_https_with_credentials() {
        let info = parse_remote_url("https://bob@github.com/bob/team.git").unwrap();
        assert_eq!(info.owner, "bob");
        assert_eq!(info.repo, "team");
    }

    #[test]
    fn test_parse_ssh() {
        let info = parse_remote_url("git@github.com:modelearth/feed.git").unwrap();
        assert_eq!(info.host, "github.com");
        assert_eq!(info.owner, "modelearth");
        assert_eq!(info.repo, "feed");
    }

    #[test]
    fn test_parse_ssh_url_form() {
        let info = parse_remote_url("ssh://git@github.com/partnertools/nisar.git").unwrap();
        assert_eq!(info.owner, "partnertools");
        assert_eq!(info.repo, "nisar");
    }

    #[test]
    fn test_parse_rejects_bare_repo_path() {
        assert!(parse_remote_url("https://github.com/webroot").is_err());
        assert!(parse_remote_url("not a url").is_err());
    }
}
