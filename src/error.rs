//! Error types for buildr
//!
//! Every failure the engine and its helpers can produce is a [`BuildError`]
//! value. Nothing below `main` terminates the process.

use serde::Serialize;
use thiserror::Error;

/// Result type for build operations
pub type BuildResult<T> = Result<T, BuildError>;

/// Main error type for build operations
#[derive(Error, Debug)]
pub enum BuildError {
    /// Direct-build-by-name was given a name that is not a registered dependency
    #[error("Cannot find target `{name}`")]
    TargetNotFound { name: String, available: Vec<String> },

    /// A target's action reported failure
    #[error("Target `{target}` failed: {reason}")]
    ActionFailed { target: String, reason: String },

    /// The traversal re-entered a target that is still being built
    #[error("Dependency cycle: {}", chain.join(" -> "))]
    DependencyCycle { chain: Vec<String> },

    /// Command execution failed
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
        suggestion: Option<String>,
    },

    /// Failed to spawn the command
    #[error("Failed to spawn command: {command}")]
    SpawnFailed { command: String, error: String },

    /// Command timed out
    #[error("Command timed out after {timeout_secs}s: {command}")]
    Timeout { command: String, timeout_secs: u64 },

    /// Build manifest is malformed
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Scaffolding merge could not be performed
    #[error("Scaffold error: {0}")]
    Scaffold(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Shorthand for an action failure carrying the full error chain
    pub fn action_failed(target: &str, err: &anyhow::Error) -> Self {
        BuildError::ActionFailed {
            target: crate::target::short_name(target),
            reason: format!("{:#}", err),
        }
    }
}

/// Serializable error info for machine-readable CLI output
#[derive(Debug, Serialize, Clone)]
pub struct ErrorInfo {
    pub message: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<String>,
}

impl ErrorInfo {
    fn new(err: &BuildError, error_type: &str) -> Self {
        ErrorInfo {
            message: err.to_string(),
            error_type: error_type.to_string(),
            suggestion: None,
            exit_code: None,
            stderr: None,
            available: vec![],
        }
    }

    fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }
}

impl From<&BuildError> for ErrorInfo {
    fn from(err: &BuildError) -> Self {
        match err {
            BuildError::TargetNotFound { available, .. } => ErrorInfo {
                available: available.clone(),
                ..ErrorInfo::new(err, "target_not_found")
                    .with_suggestion(Some("Run 'buildr list' to see available targets".to_string()))
            },
            BuildError::ActionFailed { .. } => ErrorInfo::new(err, "action_failed"),
            BuildError::DependencyCycle { .. } => ErrorInfo::new(err, "dependency_cycle")
                .with_suggestion(Some(
                    "Remove one of the dependencies in the chain".to_string(),
                )),
            BuildError::CommandFailed {
                exit_code,
                stderr,
                suggestion,
                ..
            } => ErrorInfo {
                exit_code: *exit_code,
                stderr: Some(stderr.clone()),
                ..ErrorInfo::new(err, "command_failed").with_suggestion(suggestion.clone())
            },
            BuildError::SpawnFailed { error, .. } => ErrorInfo::new(err, "spawn_failed")
                .with_suggestion(Some(format!("Check if the command exists: {}", error))),
            BuildError::Timeout { .. } => ErrorInfo::new(err, "timeout").with_suggestion(Some(
                "Try increasing defaults.timeout or checking if the command hangs".to_string(),
            )),
            BuildError::Manifest(_) => ErrorInfo::new(err, "manifest_error")
                .with_suggestion(Some("Check the [targets] tables of your buildr.toml".to_string())),
            BuildError::Scaffold(_) => ErrorInfo::new(err, "scaffold_error"),
            BuildError::Config(_) => ErrorInfo::new(err, "config_error")
                .with_suggestion(Some("Check your buildr configuration file".to_string())),
            BuildError::Io(_) => ErrorInfo::new(err, "io_error"),
        }
    }
}

/// Suggest fixes for common command failure patterns
pub fn suggest_fix(command: &str, stderr: &str) -> Option<String> {
    if stderr.contains("Permission denied") {
        return Some(
            "Permission denied. Check file permissions or run with appropriate access.".to_string(),
        );
    }

    if stderr.contains("command not found") || stderr.contains("not found") {
        let program = command.split_whitespace().next().unwrap_or(command);
        return Some(format!(
            "'{}' not found. Check PATH and installed toolchains.",
            program
        ));
    }

    if stderr.contains("No such file") {
        return Some(
            "File not found. Check the paths in the target's command and its working directory."
                .to_string(),
        );
    }

    if stderr.contains("No space left on device") {
        return Some("Disk is full. Free some space and rebuild.".to_string());
    }

    None
}
