//! CLI command definitions using clap
//!
//! Defines all CLI subcommands and their arguments.

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;

/// Incremental build runner driven by a TOML manifest.
///
/// Rebuilds a target only when one of its dependencies changed after it.
#[derive(Parser, Debug)]
#[command(name = "buildr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (overrides default XDG paths)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Run inside this directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<String>,

    /// Manifest path (defaults to defaults.manifest from the config)
    #[arg(short, long, global = true)]
    pub file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build targets and whatever they depend on
    Build(BuildArgs),

    /// List the targets of the manifest
    List(ListArgs),

    /// Show resolved configuration
    Config(ConfigArgs),

    /// Append generated routines missing from a template file
    Scaffold(ScaffoldArgs),
}

/// Arguments for the `build` subcommand
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Manifest keys or target names (defaults to the manifest default)
    pub targets: Vec<String>,

    /// Extra environment variables for commands, in KEY=VALUE format
    #[arg(short, long = "env", value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Timeout per command in seconds (overrides defaults.timeout)
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

impl BuildArgs {
    /// Convert env pairs to a map, later pairs winning
    pub fn env_as_map(&self) -> BTreeMap<String, String> {
        self.env.iter().cloned().collect()
    }
}

/// Parse KEY=VALUE argument
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid argument '{}': expected KEY=VALUE format", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Arguments for the `list` subcommand
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON output
    Json,
    /// Plain text (one target per line)
    Plain,
}

/// Arguments for the `config` subcommand
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the `scaffold` subcommand
#[derive(Parser, Debug)]
pub struct ScaffoldArgs {
    /// File receiving the missing routines
    #[arg(short, long)]
    pub template: String,

    /// File holding the freshly generated routines
    #[arg(short, long)]
    pub generated: String,

    /// Keyword opening a routine (overrides scaffold.routine_keyword)
    #[arg(short, long)]
    pub keyword: Option<String>,
}
