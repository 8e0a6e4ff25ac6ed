//! Configuration model for buildr
//!
//! Defines the structure for XDG-compliant layered configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::executor::{ExecOptions, Shell, MAX_OUTPUT_SIZE};
use crate::scaffold::RoutineSyntax;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Settings applied to every build
    #[serde(default)]
    pub defaults: Defaults,

    /// Extra environment variables for every build command
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Scaffolding merge settings
    #[serde(default)]
    pub scaffold: ScaffoldConfig,
}

/// Settings applied to every build
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Manifest file looked up when `--file` is not given
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Shell used to run target commands
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Per-command timeout in seconds (0 = none)
    #[serde(default)]
    pub timeout: u64,

    /// Captured bytes per output stream
    #[serde(default = "default_max_output")]
    pub max_output: usize,
}

fn default_manifest() -> String {
    "buildr.toml".to_string()
}

fn default_shell() -> String {
    "sh".to_string()
}

fn default_max_output() -> usize {
    MAX_OUTPUT_SIZE
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            shell: default_shell(),
            timeout: 0,
            max_output: default_max_output(),
        }
    }
}

/// Scaffolding merge settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScaffoldConfig {
    /// Text that opens a routine, e.g. "fn " or "func "
    #[serde(default = "default_routine_keyword")]
    pub routine_keyword: String,
}

fn default_routine_keyword() -> String {
    "fn ".to_string()
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            routine_keyword: default_routine_keyword(),
        }
    }
}

impl Config {
    /// Execution options for target commands
    pub fn exec_options(&self) -> ExecOptions {
        let mut options = ExecOptions::default()
            .with_timeout_secs(self.defaults.timeout)
            .with_max_output(self.defaults.max_output);
        for (key, value) in &self.env {
            options = options.with_env(key, value);
        }
        options
    }

    /// Shell that runs target commands
    pub fn shell(&self) -> Shell {
        Shell::new(&self.defaults.shell).with_options(self.exec_options())
    }

    pub fn routine_syntax(&self) -> RoutineSyntax {
        RoutineSyntax::new(&self.scaffold.routine_keyword)
    }
}
