//! buildr - Embeddable incremental build engine
//!
//! Describe buildable units as targets, wire them into a dependency graph,
//! and build a root: every dependency is built first, and a target's action
//! only runs when a dependency changed after it.
//!
//! ```no_run
//! use buildr::target::{FileTarget, GlobTarget, Target, Wiring};
//!
//! let sources = GlobTarget::new("src/*.c").shared();
//! let app = FileTarget::file("app").depends([sources]).make(|deps| {
//!     println!("linking {} inputs", deps.len());
//!     Ok(())
//! });
//! app.build()?;
//! # Ok::<(), buildr::error::BuildError>(())
//! ```
//!
//! ## Features
//!
//! - File, glob and phony target kinds sharing one build algorithm
//! - Cycle detection and once-per-build evaluation of shared dependencies
//! - Shell command execution with timeouts and output capture
//! - Filesystem and source scaffolding helpers for build actions
//! - TOML build manifests and the `buildr` command-line tool
//! - XDG-compliant layered configuration

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod fsutil;
pub mod manifest;
pub mod scaffold;
pub mod target;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{BuildError, BuildResult, ErrorInfo};
pub use executor::{
    exec_command, exec_command_sync, exec_shell_command_sync, run_checked, ExecOptions,
    ExecResult, Shell,
};
pub use manifest::{Graph, Manifest};
pub use target::{FileTarget, GlobTarget, Outcome, PhonyTarget, Target, Wiring};
