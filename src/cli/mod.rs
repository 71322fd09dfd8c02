//! CLI commands
//!
//! Command implementations for the `webroot` binary.

mod auth;
mod progress;
mod prompt;
mod session;
pub mod style;
mod sync;

pub use auth::{run_fix_heads, run_refresh_auth, run_update_remotes};
pub use sync::{run_pull, run_push};
