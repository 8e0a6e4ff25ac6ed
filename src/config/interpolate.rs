//! Configuration value interpolation
//!
//! Supports environment variable and shell command interpolation in config values:
//! - `$VAR` or `${VAR}` - Environment variable substitution
//! - `$(command)` - Shell command execution
//!
//! Target commands from a manifest get a narrower treatment, see
//! [`interpolate_command`].
//!
//! # Security Note
//!
//! Shell command execution runs with the current user's permissions.
//! Config files should have restricted permissions (600) to prevent
//! unauthorized command execution.

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Command;

static COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\(([^)]+)\)").expect("Invalid regex"));

static BRACKETED_VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid regex"));

static SIMPLE_VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex"));

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(target|files|deps)\}").expect("Invalid regex"));

/// Interpolate a string with environment variables and shell commands
///
/// # Interpolation Syntax
///
/// - `$VAR` - Simple environment variable
/// - `${VAR}` - Environment variable with explicit boundaries
/// - `$(command)` - Shell command execution
///
/// # Examples
///
/// ```
/// use buildr::config::interpolate::interpolate_string;
///
/// std::env::set_var("MY_VAR", "hello");
/// let result = interpolate_string("Value: $MY_VAR");
/// assert_eq!(result, "Value: hello");
/// std::env::remove_var("MY_VAR");
/// ```
pub fn interpolate_string(s: &str) -> String {
    // Commands first so their output is never read as variables
    let result = interpolate_commands(s);
    interpolate_env_vars(&result)
}

/// Values substituted into a target command
#[derive(Debug, Clone, Default)]
pub struct Placeholders {
    /// `{target}`: display name of the target
    pub target: String,
    /// `{files}`: backing files (or glob pattern), space-separated
    pub files: String,
    /// `{deps}`: display names of the direct dependencies, space-separated
    pub deps: String,
}

/// Prepare a manifest command for the shell
///
/// `{target}`, `{files}` and `{deps}` are replaced first. Then `${VAR}` is
/// replaced when `VAR` is set in the environment; unset references and the
/// `$VAR` form are left for the shell itself.
pub fn interpolate_command(template: &str, placeholders: &Placeholders) -> String {
    let expanded = PLACEHOLDER_RE.replace_all(template, |caps: &regex::Captures| {
        match &caps[1] {
            "target" => placeholders.target.clone(),
            "files" => placeholders.files.clone(),
            _ => placeholders.deps.clone(),
        }
    });

    BRACKETED_VAR_RE
        .replace_all(&expanded, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .to_string()
}

/// Interpolate shell commands: $(command)
fn interpolate_commands(s: &str) -> String {
    COMMAND_RE
        .replace_all(s, |caps: &regex::Captures| {
            let cmd = &caps[1];
            match execute_shell_command(cmd) {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!("Failed to execute config command '{}': {}", cmd, e);
                    // Keep the original visible
                    format!("$({})_ERROR", cmd)
                }
            }
        })
        .to_string()
}

/// Interpolate environment variables: $VAR or ${VAR}
fn interpolate_env_vars(s: &str) -> String {
    let result = BRACKETED_VAR_RE.replace_all(s, lookup_env).to_string();
    // Names starting with a digit never match
    SIMPLE_VAR_RE.replace_all(&result, lookup_env).to_string()
}

fn lookup_env(caps: &regex::Captures) -> String {
    let var = &caps[1];
    std::env::var(var).unwrap_or_else(|_| {
        tracing::debug!("Environment variable '{}' not set", var);
        String::new()
    })
}

/// Execute a shell command and return its stdout
fn execute_shell_command(cmd: &str) -> Result<String, std::io::Error> {
    let output = Command::new("sh").arg("-c").arg(cmd).output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(std::io::Error::other(format!("Command failed: {}", stderr)))
    }
}

/// Interpolate all string values in a Config
///
/// Covers the fields that commonly carry paths or dynamic values: the
/// manifest path, the shell and the `[env]` table.
pub fn interpolate_config(config: &mut super::model::Config) {
    config.defaults.manifest = interpolate_string(&config.defaults.manifest);
    config.defaults.shell = interpolate_string(&config.defaults.shell);

    for value in config.env.values_mut() {
        *value = interpolate_string(value);
    }
}
