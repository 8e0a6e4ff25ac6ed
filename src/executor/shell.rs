//! Command execution with timeout support
//!
//! Child processes are driven by tokio; the synchronous wrappers spin up a
//! current-thread runtime per call so the build engine stays fully blocking.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{suggest_fix, BuildError, BuildResult};

/// Maximum output size before truncation (in bytes)
pub const MAX_OUTPUT_SIZE: usize = 100_000;

/// Truncation marker for large outputs
const TRUNCATION_MARKER: &str = "\n... [output truncated] ...\n";

/// Options for command execution
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Working directory for the command
    pub working_dir: Option<PathBuf>,
    /// Environment variables to set
    pub env: HashMap<String, String>,
    /// Timeout duration (None = no timeout)
    pub timeout: Option<Duration>,
    /// Maximum captured bytes per stream
    pub max_output_size: usize,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            working_dir: None,
            env: HashMap::new(),
            timeout: None,
            max_output_size: MAX_OUTPUT_SIZE,
        }
    }
}

impl ExecOptions {
    /// Create options with a working directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set timeout in seconds; 0 disables the timeout
    pub fn with_timeout_secs(self, secs: u64) -> Self {
        if secs == 0 {
            return self;
        }
        self.with_timeout(Duration::from_secs(secs))
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_max_output(mut self, size: usize) -> Self {
        self.max_output_size = size;
        self
    }
}

/// Result of command execution
#[derive(Debug)]
pub struct ExecResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Standard output (may be truncated)
    pub stdout: String,
    pub stdout_truncated: bool,
    /// Standard error (may be truncated)
    pub stderr: String,
    pub stderr_truncated: bool,
    pub duration: Duration,
}

/// Execute a command asynchronously with timeout support
///
/// A non-zero exit is *not* an error here; see [`run_checked`].
///
/// # Errors
/// * `BuildError::SpawnFailed` - If the command couldn't be spawned
/// * `BuildError::Timeout` - If the command timed out (when timeout is set)
pub async fn exec_command(
    program: &str,
    args: &[&str],
    options: &ExecOptions,
) -> BuildResult<ExecResult> {
    let start = Instant::now();
    let command_str = format!("{} {}", program, args.join(" "));

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    if let Some(ref dir) = options.working_dir {
        cmd.current_dir(dir);
    }
    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    tracing::debug!("Executing: {}", command_str);

    let child = cmd.spawn().map_err(|e| BuildError::SpawnFailed {
        command: command_str.clone(),
        error: e.to_string(),
    })?;

    let output = match options.timeout {
        Some(limit) => timeout(limit, wait_for_output(child, options.max_output_size))
            .await
            .map_err(|_| BuildError::Timeout {
                command: command_str.clone(),
                timeout_secs: limit.as_secs(),
            })??,
        None => wait_for_output(child, options.max_output_size).await?,
    };

    Ok(ExecResult {
        success: output.exit_code == Some(0),
        exit_code: output.exit_code,
        stdout: output.stdout,
        stdout_truncated: output.stdout_truncated,
        stderr: output.stderr,
        stderr_truncated: output.stderr_truncated,
        duration: start.elapsed(),
    })
}

struct WaitResult {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    stdout_truncated: bool,
    stderr_truncated: bool,
}

/// Wait for a child process, reading both pipes concurrently
async fn wait_for_output(
    mut child: tokio::process::Child,
    max_output_size: usize,
) -> BuildResult<WaitResult> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_handle = tokio::spawn(async move {
        match stdout {
            Some(stdout) => read_and_truncate(stdout, max_output_size).await,
            None => (String::new(), false),
        }
    });
    let stderr_handle = tokio::spawn(async move {
        match stderr {
            Some(stderr) => read_and_truncate(stderr, max_output_size).await,
            None => (String::new(), false),
        }
    });

    let status = child.wait().await?;

    let (stdout, stdout_truncated) = stdout_handle
        .await
        .map_err(|e| std::io::Error::other(format!("stdout task failed: {}", e)))?;
    let (stderr, stderr_truncated) = stderr_handle
        .await
        .map_err(|e| std::io::Error::other(format!("stderr task failed: {}", e)))?;

    Ok(WaitResult {
        exit_code: status.code(),
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
    })
}

/// Read lines from `reader` until EOF or `max_size` bytes
async fn read_and_truncate<R: tokio::io::AsyncRead + Unpin>(
    reader: R,
    max_size: usize,
) -> (String, bool) {
    let mut buf_reader = BufReader::new(reader);
    let mut output = String::with_capacity(max_size.min(64 * 1024));
    let mut line = String::with_capacity(4096);

    loop {
        line.clear();
        match buf_reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if output.len() + line.len() > max_size {
                    let mut remaining = max_size.saturating_sub(output.len()).min(line.len());
                    while !line.is_char_boundary(remaining) {
                        remaining -= 1;
                    }
                    output.push_str(&line[..remaining]);
                    output.push_str(TRUNCATION_MARKER);
                    return (output, true);
                }
                output.push_str(&line);
            }
            Err(e) => {
                tracing::warn!("Error reading output: {}", e);
                break;
            }
        }
    }

    (output, false)
}

/// Blocking wrapper around [`exec_command`]
pub fn exec_command_sync(
    program: &str,
    args: &[&str],
    options: &ExecOptions,
) -> BuildResult<ExecResult> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| std::io::Error::other(format!("Failed to create runtime: {}", e)))?;

    rt.block_on(exec_command(program, args, options))
}

/// Run `command` through `shell -c`, blocking
pub fn exec_shell_command_sync(
    shell: &str,
    command: &str,
    options: &ExecOptions,
) -> BuildResult<ExecResult> {
    exec_command_sync(shell, &["-c", command], options)
}

/// Run a command and treat a non-zero exit as an error
///
/// # Errors
/// * `BuildError::CommandFailed` - If the command exits unsuccessfully
/// * `BuildError::SpawnFailed` / `BuildError::Timeout` - As for [`exec_command`]
pub fn run_checked(program: &str, args: &[&str], options: &ExecOptions) -> BuildResult<ExecResult> {
    let result = exec_command_sync(program, args, options)?;
    if result.success {
        return Ok(result);
    }
    let command = format!("{} {}", program, args.join(" "));
    Err(command_error(command.trim_end(), result.exit_code, &result.stderr))
}

/// Build a `CommandFailed` error with a suggested fix
pub fn command_error(command: &str, exit_code: Option<i32>, stderr: &str) -> BuildError {
    BuildError::CommandFailed {
        command: command.to_string(),
        exit_code,
        stderr: stderr.to_string(),
        suggestion: suggest_fix(command, stderr),
    }
}

/// A shell plus default options, used to run build commands
#[derive(Debug, Clone)]
pub struct Shell {
    program: String,
    options: ExecOptions,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl Shell {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            options: ExecOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn options(&self) -> &ExecOptions {
        &self.options
    }

    /// Run a command line, failing on non-zero exit
    ///
    /// # Errors
    /// * `BuildError::CommandFailed` - If the command exits unsuccessfully
    pub fn run(&self, command: &str) -> BuildResult<ExecResult> {
        let result = exec_shell_command_sync(&self.program, command, &self.options)?;
        if result.success {
            Ok(result)
        } else {
            Err(command_error(command, result.exit_code, &result.stderr))
        }
    }
}
