//! Targets backed by an explicit list of files

use std::path::PathBuf;
use std::time::SystemTime;

use super::stamp;
use super::traits::{Rule, Target, Wiring};

/// A target backed by one or more file paths
///
/// The name is the space-joined list of paths, in construction order.
#[derive(Debug)]
pub struct FileTarget {
    files: Vec<PathBuf>,
    rule: Rule,
}

impl FileTarget {
    /// Create a target backed by a single file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::files([path])
    }

    /// Create a target backed by several files
    pub fn files<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: paths.into_iter().map(Into::into).collect(),
            rule: Rule::new(),
        }
    }

    /// Backing paths
    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }
}

impl Target for FileTarget {
    fn name(&self) -> String {
        self.files
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn modified_time(&self) -> SystemTime {
        stamp::newest_mtime(&self.files)
    }

    fn stale_since(&self, reference: SystemTime) -> bool {
        if self.files.is_empty() {
            return true;
        }
        stamp::any_newer(&self.files, reference)
    }

    fn rule(&self) -> &Rule {
        &self.rule
    }
}

impl Wiring for FileTarget {
    fn rule_mut(&mut self) -> &mut Rule {
        &mut self.rule
    }
}
