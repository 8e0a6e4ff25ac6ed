//! CLI module for buildr
//!
//! Provides command-line interface with the following subcommands:
//! - `build` - Build targets from the manifest
//! - `list` - List manifest targets
//! - `config` - Show configuration
//! - `scaffold` - Merge generated routines into a template

pub mod commands;

pub use commands::{Cli, Commands};
