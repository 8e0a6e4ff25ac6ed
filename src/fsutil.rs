//! Filesystem helpers for build actions
//!
//! Each helper reports failure as a [`BuildError`] and leaves the decision to
//! stop the build to its caller.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{BuildError, BuildResult};

/// Whether `path` exists (a broken symlink does not)
pub fn exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// Create a single directory
///
/// # Errors
/// * `BuildError::Io` - If the directory already exists or its parent is missing
pub fn mkdir(path: impl AsRef<Path>) -> BuildResult<()> {
    let path = path.as_ref();
    std::fs::create_dir(path).map_err(|e| with_path(e, path))?;
    tracing::debug!("Created directory {}", path.display());
    Ok(())
}

/// Open `path` for writing, creating it if absent
///
/// Existing content is kept.
pub fn create_if_absent(path: impl AsRef<Path>) -> BuildResult<File> {
    let path = path.as_ref();
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| with_path(e, path))
}

/// Replace the content of `path` with whatever `fill` writes
///
/// The file is created or truncated first; the writer is flushed after `fill`
/// returns successfully.
pub fn fill_file<F>(path: impl AsRef<Path>, fill: F) -> BuildResult<()>
where
    F: FnOnce(&mut dyn Write) -> BuildResult<()>,
{
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| with_path(e, path))?;
    write_through(file, path, fill)
}

/// Append whatever `fill` writes to the end of `path`, creating it if absent
pub fn append_file<F>(path: impl AsRef<Path>, fill: F) -> BuildResult<()>
where
    F: FnOnce(&mut dyn Write) -> BuildResult<()>,
{
    let path = path.as_ref();
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| with_path(e, path))?;
    write_through(file, path, fill)
}

fn write_through<F>(file: File, path: &Path, fill: F) -> BuildResult<()>
where
    F: FnOnce(&mut dyn Write) -> BuildResult<()>,
{
    let mut writer = BufWriter::new(file);
    fill(&mut writer)?;
    writer.flush().map_err(|e| with_path(e, path))?;
    Ok(())
}

/// Run `f` with the process working directory set to `dir`
///
/// The previous directory is restored afterwards, also when `f` fails. The
/// working directory is process-global, so this must not race with other
/// threads.
pub fn in_dir<T, F>(dir: impl AsRef<Path>, f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    let dir = dir.as_ref();
    let previous = std::env::current_dir()?;
    std::env::set_current_dir(dir).map_err(|e| with_path(e, dir))?;
    tracing::debug!("Entered {}", dir.display());

    let result = f();

    std::env::set_current_dir(&previous).map_err(|e| with_path(e, &previous))?;
    result
}

fn with_path(err: std::io::Error, path: &Path) -> BuildError {
    BuildError::Io(std::io::Error::new(
        err.kind(),
        format!("{}: {}", path.display(), err),
    ))
}
