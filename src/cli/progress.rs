//! Shared CLI progress callback with styled output and spinners

use crate::cli::style::{Stream, Stylize, check, cross, hyperlink_url, spinner_style};
use anstream::{eprintln, println};
use async_trait::async_trait;
use indicatif::ProgressBar;
use std::sync::Mutex;
use std::time::Duration;
use webroot_git::error::Error;
use webroot_git::sync::{Phase, ProgressCallback, PushStatus};
use webroot_git::types::{PullRequest, PushOutcome};

/// CLI progress callback that prints to stdout with styled output
///
/// A spinner runs while a repository is being committed and pushed. In
/// verbose mode every phase header and message is printed; otherwise
/// phases stay quiet and messages are dimmed.
pub struct CliProgress {
    /// Show every phase and detailed messages
    pub verbose: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    /// Progress that prints phases and messages
    pub const fn verbose() -> Self {
        Self {
            verbose: true,
            spinner: Mutex::new(None),
        }
    }

    /// Progress with terse output
    pub const fn compact() -> Self {
        Self {
            verbose: false,
            spinner: Mutex::new(None),
        }
    }

    fn start_spinner(&self, message: String) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(old) = slot.replace(bar) {
                old.finish_and_clear();
            }
        }
    }

    fn stop_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(bar) = slot.take() {
                bar.finish_and_clear();
            }
        }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_phase(&self, phase: Phase) {
        self.stop_spinner();
        if self.verbose {
            println!("{}...", phase.to_string().emphasis());
        } else if matches!(phase, Phase::Pushing | Phase::FinalSweep) {
            println!("{}...", phase.to_string().muted());
        }
    }

    async fn on_repo(&self, repo: &str) {
        if self.verbose {
            println!("  {}", repo.accent());
        }
    }

    async fn on_push(&self, repo: &str, status: PushStatus) {
        match &status {
            PushStatus::Started => {
                self.start_spinner(format!("Pushing {}...", repo.accent()));
            }
            PushStatus::Clean => {
                self.stop_spinner();
                if self.verbose {
                    println!(
                        "  {} {} {}",
                        "-".muted(),
                        repo.accent(),
                        status.to_string().muted()
                    );
                }
            }
            PushStatus::Published(outcome) => {
                self.stop_spinner();
                let detail = match outcome {
                    PushOutcome::PullRequestCreated(_) => String::new(),
                    other => format!(" ({other})"),
                };
                println!("  {} {}{}", check(), repo.emphasis(), detail.muted());
            }
            PushStatus::Failed(msg) => {
                self.stop_spinner();
                eprintln!(
                    "  {} Failed to push {}: {}",
                    cross(),
                    repo.accent().for_stderr(),
                    msg.error()
                );
            }
        }
    }

    async fn on_pr_created(&self, repo: &str, pr: &PullRequest) {
        self.stop_spinner();
        let pr_num = format!("#{}", pr.number);
        println!(
            "  {} Pull request {} for {}",
            check(),
            pr_num.accent(),
            repo.emphasis()
        );
        println!("    {}", hyperlink_url(Stream::Stdout, &pr.html_url));
    }

    async fn on_warning(&self, message: &str) {
        self.stop_spinner();
        eprintln!("  {}: {}", "warning".warn(), message);
    }

    async fn on_error(&self, err: &Error) {
        self.stop_spinner();
        eprintln!("  {}: {}", "error".error(), err);
    }

    async fn on_message(&self, message: &str) {
        if self.verbose {
            println!("  {message}");
        } else {
            println!("  {}", message.muted());
        }
    }
}
