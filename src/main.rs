//! webroot - keep a webroot and its submodules in sync
//!
//! CLI binary for pulling, pushing, forking and opening pull requests
//! across the webroot repository set.

use anstream::{eprintln, println};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use webroot_git::error::Error;
use webroot_git::sync::SyncOptions;

mod cli;

use cli::style::Stylize;

#[derive(Parser)]
#[command(name = "webroot")]
#[command(about = "Pull, push, fork and PR across webroot and its submodules")]
#[command(version)]
struct Cli {
    /// Path inside the webroot checkout (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Move submodules to their remote tips without the anti-regression check
    #[arg(long, global = true)]
    unsafe_submodules: bool,

    /// Skip the pull that normally runs before a push
    #[arg(long, global = true)]
    no_pull: bool,

    /// Print phases and debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge origin and upstream into every repository (or one)
    #[command(alias = "pull-all")]
    Pull {
        /// Repository name, or `all`
        repo: Option<String>,
    },

    /// Commit and push local changes, forking and opening PRs as needed
    #[command(alias = "push-all")]
    Push {
        /// `all`, `submodules` or a repository name, optionally followed by `nopr`
        #[arg(num_args = 0..)]
        args: Vec<String>,
    },

    /// Re-attach detached HEADs to main (or master)
    #[command(alias = "fix-heads")]
    Fix,

    /// Point every origin at the authenticated account
    #[command(alias = "update-remotes")]
    Remotes,

    /// Refresh git credentials from the gh CLI, then update remotes
    #[command(alias = "refresh-auth")]
    Auth,

    #[command(hide = true)]
    Update,

    #[command(hide = true)]
    Commit,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            return Ok(if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    init_tracing(cli.verbose);
    let path = cli.path.unwrap_or_else(|| PathBuf::from("."));
    let options = SyncOptions {
        unsafe_submodules: cli.unsafe_submodules,
        no_pr: false,
        skip_pull: cli.no_pull,
    };

    let result = match cli.command {
        Commands::Pull { repo } => {
            cli::run_pull(&path, repo.as_deref(), options, cli.verbose).await
        }
        Commands::Push { args } => cli::run_push(&path, &args, options, cli.verbose).await,
        Commands::Fix => cli::run_fix_heads(&path, options, cli.verbose).await,
        Commands::Remotes => cli::run_update_remotes(&path, options, cli.verbose).await,
        Commands::Auth => cli::run_refresh_auth(&path, options, cli.verbose).await,
        Commands::Update | Commands::Commit => {
            eprintln!(
                "{}: use `webroot pull` to update or `webroot push` to commit and push",
                "error".error()
            );
            return Ok(ExitCode::FAILURE);
        }
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(Error::Aborted(reason)) => {
            println!("Aborted: {reason}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}: {e}", "error".error());
            Ok(ExitCode::FAILURE)
        }
    }
}
