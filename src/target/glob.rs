//! Targets backed by a glob pattern
//!
//! The pattern is expanded again on every check, so files appearing or
//! disappearing between builds are picked up.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use super::stamp;
use super::traits::{Rule, Target, Wiring};

/// A target backed by every file matching a glob mask
#[derive(Debug)]
pub struct GlobTarget {
    mask: String,
    rule: Rule,
}

impl GlobTarget {
    pub fn new(mask: impl Into<String>) -> Self {
        Self {
            mask: mask.into(),
            rule: Rule::new(),
        }
    }

    pub fn mask(&self) -> &str {
        &self.mask
    }

    /// Expand the mask against the filesystem right now
    ///
    /// # Errors
    /// Returns a description of the problem if the pattern is invalid or a
    /// matched entry cannot be read.
    pub fn matches(&self) -> Result<Vec<PathBuf>, String> {
        let entries = glob::glob(&self.mask)
            .map_err(|e| format!("invalid glob pattern `{}`: {}", self.mask, e))?;
        entries
            .map(|entry| entry.map_err(|e| e.to_string()))
            .collect()
    }
}

impl Target for GlobTarget {
    fn name(&self) -> String {
        self.mask.clone()
    }

    fn modified_time(&self) -> SystemTime {
        match self.matches() {
            Ok(files) => stamp::newest_mtime(&files),
            Err(e) => {
                tracing::warn!("{}", e);
                UNIX_EPOCH
            }
        }
    }

    fn stale_since(&self, reference: SystemTime) -> bool {
        match self.matches() {
            Ok(files) if files.is_empty() => {
                tracing::debug!("`{}` matches nothing, treating as modified", self.mask);
                true
            }
            Ok(files) => stamp::any_newer(&files, reference),
            Err(e) => {
                tracing::warn!("{}", e);
                true
            }
        }
    }

    fn rule(&self) -> &Rule {
        &self.rule
    }
}

impl Wiring for GlobTarget {
    fn rule_mut(&mut self) -> &mut Rule {
        &mut self.rule
    }
}
