//! Modification-time inspection shared by the file-backed target kinds

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Modification time of a single path
pub fn mtime(path: &Path) -> std::io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

/// Newest modification time across `paths`
///
/// Empty input, or any path that cannot be inspected, yields `UNIX_EPOCH`.
/// A missing path is expected (not built yet) and only logged at debug level.
pub fn newest_mtime<I, P>(paths: I) -> SystemTime
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut newest = UNIX_EPOCH;
    for path in paths {
        let path = path.as_ref();
        match mtime(path) {
            Ok(t) if t > newest => newest = t,
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} does not exist yet", path.display());
                return UNIX_EPOCH;
            }
            Err(e) => {
                tracing::warn!("Cannot stat {}: {}", path.display(), e);
                return UNIX_EPOCH;
            }
        }
    }
    newest
}

/// Whether any of `paths` was modified strictly after `reference`
///
/// A path that cannot be inspected counts as modified.
pub fn any_newer<I, P>(paths: I, reference: SystemTime) -> bool
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    for path in paths {
        let path = path.as_ref();
        match mtime(path) {
            Ok(t) if t > reference => {
                tracing::debug!("{} is newer than the reference", path.display());
                return true;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Cannot stat {}: {}", path.display(), e);
                return true;
            }
        }
    }
    false
}
