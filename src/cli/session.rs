//! Wiring shared by every command

use crate::cli::progress::CliProgress;
use crate::cli::prompt::DialoguerPrompt;
use crate::cli::style::{Stylize, check};
use anstream::{eprintln, println};
use std::path::{Path, PathBuf};
use webroot_git::config::Config;
use webroot_git::error::Result;
use webroot_git::platform::GitHubPlatform;
use webroot_git::repo::locate_primary_root;
use webroot_git::sync::{SyncContext, SyncOptions, SyncReport};
use webroot_git::vcs::GitCli;

/// Real git, GitHub and terminal, rooted at the primary repository
pub struct Session {
    config: Config,
    vcs: GitCli,
    platform: GitHubPlatform,
    progress: CliProgress,
    prompt: DialoguerPrompt,
    root: PathBuf,
}

impl Session {
    /// Locate the primary repository containing `path`
    ///
    /// Fails with `Error::NotPrimaryRepository` anywhere else.
    pub async fn open(path: &Path, verbose: bool) -> Result<Self> {
        let config = Config::from_env();
        let vcs = GitCli::new();
        let root = locate_primary_root(&vcs, &config, path).await?;
        let platform = GitHubPlatform::new(config.host.clone());
        let progress = if verbose {
            CliProgress::verbose()
        } else {
            CliProgress::compact()
        };

        Ok(Self {
            config,
            vcs,
            platform,
            progress,
            prompt: DialoguerPrompt,
            root,
        })
    }

    /// Engine context for one run
    pub fn context(&self, options: SyncOptions) -> SyncContext<'_> {
        SyncContext {
            root: self.root.clone(),
            config: &self.config,
            vcs: &self.vcs,
            platform: &self.platform,
            progress: &self.progress,
            pages_prompt: &self.prompt,
            options,
        }
    }
}

/// Print the end-of-run summary
pub fn print_summary(verb: &str, report: &SyncReport) {
    let published = report
        .outcomes
        .iter()
        .filter(|(_, outcome)| outcome.is_published())
        .count();

    println!();
    if report.success() {
        println!("{} {verb} complete", check());
    } else {
        eprintln!(
            "{} finished with {} error(s)",
            verb.error(),
            report.errors.len()
        );
    }
    if published > 0 {
        println!("  {} repositor{} published", published.accent(), plural(published));
    }
    for pr in &report.created_prs {
        println!("  PR #{} {}", pr.number.accent(), pr.html_url.muted());
    }
    if !report.warnings.is_empty() {
        println!(
            "  {} warning(s), re-run the same command to retry",
            report.warnings.len().warn().for_stdout()
        );
    }
}

const fn plural(n: usize) -> &'static str {
    if n == 1 { "y" } else { "ies" }
}
