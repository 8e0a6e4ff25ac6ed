//! Manifest file model
//!
//! ```toml
//! default = "app"
//!
//! [targets.app]
//! files = ["a.out"]
//! depends = ["obj"]
//! command = "cc -o {files} {deps}"
//!
//! [targets.src]
//! glob = "src/*.c"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{BuildError, BuildResult};

/// A parsed build manifest
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Entry built when no target is requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Entries by key
    #[serde(default)]
    pub targets: BTreeMap<String, TargetSpec>,
}

/// One `[targets.<key>]` table
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
    /// Backing files
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    /// Backing glob pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,

    /// Keys of the entries this one depends on, in build order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<String>,

    /// Shell command run when the entry is stale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Which target kind an entry wires into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    File,
    Glob,
    Phony,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::File => write!(f, "file"),
            TargetKind::Glob => write!(f, "glob"),
            TargetKind::Phony => write!(f, "phony"),
        }
    }
}

impl TargetSpec {
    /// Kind of target this entry declares
    ///
    /// # Errors
    /// * `BuildError::Manifest` - If both `files` and `glob` are set
    pub fn kind(&self, key: &str) -> BuildResult<TargetKind> {
        match (self.files.is_empty(), &self.glob) {
            (false, Some(_)) => Err(BuildError::Manifest(format!(
                "target `{}` declares both `files` and `glob`",
                key
            ))),
            (false, None) => Ok(TargetKind::File),
            (true, Some(_)) => Ok(TargetKind::Glob),
            (true, None) => Ok(TargetKind::Phony),
        }
    }

    /// Backing resources as shown to users
    pub fn resources(&self) -> Vec<String> {
        match &self.glob {
            Some(pattern) => vec![pattern.clone()],
            None => self.files.clone(),
        }
    }
}

impl Manifest {
    /// Read and validate a manifest file
    pub fn load(path: impl AsRef<Path>) -> BuildResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BuildError::Manifest(format!("cannot read {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded manifest from {}", path.display());
        Self::parse(&content)
    }

    /// Parse and validate manifest text
    pub fn parse(content: &str) -> BuildResult<Self> {
        let manifest: Manifest =
            toml::from_str(content).map_err(|e| BuildError::Manifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check kinds and references
    ///
    /// Cycles are found later, while wiring.
    pub fn validate(&self) -> BuildResult<()> {
        for (key, spec) in &self.targets {
            spec.kind(key)?;

            if spec.files.iter().any(|f| f.trim().is_empty()) {
                return Err(BuildError::Manifest(format!(
                    "target `{}` lists an empty file path",
                    key
                )));
            }

            if let Some(dep) = spec.depends.iter().find(|d| !self.targets.contains_key(*d)) {
                return Err(BuildError::Manifest(format!(
                    "target `{}` depends on unknown target `{}`",
                    key, dep
                )));
            }
        }

        if let Some(default) = &self.default {
            if !self.targets.contains_key(default) {
                return Err(BuildError::Manifest(format!(
                    "default target `{}` is not defined",
                    default
                )));
            }
        }

        Ok(())
    }

    pub fn keys(&self) -> Vec<String> {
        self.targets.keys().cloned().collect()
    }
}
