//! webroot-git - keep a multi-repository webroot in sync
//!
//! Pulls, commits and pushes a primary repository together with its
//! submodules and a set of sibling repositories. Submodules are never moved
//! back to older commits, detached HEADs are re-attached, and users without
//! write access are routed through a fork and a pull request.
//!
//! # Example
//!
//! ```no_run
//! use webroot_git::config::Config;
//! use webroot_git::platform::GitHubPlatform;
//! use webroot_git::repo::locate_primary_root;
//! use webroot_git::sync::{FixedChoice, NoopProgress, PagesChoice, SyncContext, SyncOptions, pull_all};
//! use webroot_git::vcs::GitCli;
//! use std::path::Path;
//!
//! # async fn example() -> webroot_git::error::Result<()> {
//! let config = Config::from_env();
//! let vcs = GitCli::new();
//! let platform = GitHubPlatform::new(config.host.clone());
//! let root = locate_primary_root(&vcs, &config, Path::new(".")).await?;
//!
//! let ctx = SyncContext {
//!     root,
//!     config: &config,
//!     vcs: &vcs,
//!     platform: &platform,
//!     progress: &NoopProgress,
//!     pages_prompt: &FixedChoice(PagesChoice::SkipPr),
//!     options: SyncOptions::default(),
//! };
//! let report = pull_all(&ctx).await;
//! println!("{} error(s)", report.errors.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod platform;
pub mod repo;
pub mod sync;
pub mod types;
pub mod vcs;

pub use error::{Error, Result};
