//! Shell command execution for build actions
//!
//! Provides command execution with:
//! - Timeout support
//! - Output capture and truncation
//! - Environment variable injection
//! - Working directory control
//!
//! A non-zero exit is reported as an error value, never by exiting the process.

pub mod shell;

pub use shell::*;
