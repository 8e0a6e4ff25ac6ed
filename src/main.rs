//! buildr CLI entry point
//!
//! Usage:
//!   buildr build [TARGET...]     Build targets (or the manifest default)
//!   buildr list                  List manifest targets
//!   buildr config                Show configuration
//!   buildr scaffold -t T -g G    Append missing generated routines to T

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use buildr::cli::{
    commands::{BuildArgs, ConfigArgs, ListArgs, OutputFormat, ScaffoldArgs},
    Cli, Commands,
};
use buildr::config::{find_config_files, load_config, Config};
use buildr::error::{BuildError, ErrorInfo};
use buildr::fsutil::in_dir;
use buildr::manifest::{Graph, Manifest, TargetKind};
use buildr::scaffold::{extend_blank_file, RoutineSyntax};
use buildr::target::{short_name, Outcome};

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            if let Some(info) = e.downcast_ref::<BuildError>().map(ErrorInfo::from) {
                if !info.available.is_empty() {
                    eprintln!("{}: {}", "available".cyan(), info.available.join(", "));
                }
                if let Some(suggestion) = info.suggestion {
                    eprintln!("{}: {}", "hint".yellow(), suggestion);
                }
            }
            ExitCode::FAILURE
        }
    }
}

/// Install the log subscriber; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

fn run(cli: Cli) -> Result<()> {
    // Resolve before a possible directory change
    let config_path = cli.config.as_deref().map(absolute).transpose()?;
    let config_path = config_path.as_deref().and_then(Path::to_str);

    match cli.directory.as_deref() {
        Some(dir) => in_dir(dir, || dispatch(cli.command, config_path, cli.file.as_deref()))
            .with_context(|| format!("in directory {}", dir)),
        None => dispatch(cli.command, config_path, cli.file.as_deref()),
    }
}

fn dispatch(command: Commands, config_path: Option<&str>, file: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;

    match command {
        Commands::Build(args) => build_targets(args, config, file),
        Commands::List(args) => list_targets(args, &config, file),
        Commands::Config(args) => show_config(args, &config),
        Commands::Scaffold(args) => scaffold(args, &config),
    }
}

/// Build the requested targets, or the manifest default
fn build_targets(args: BuildArgs, mut config: Config, file: Option<&str>) -> Result<()> {
    config.env.extend(args.env_as_map());
    if let Some(timeout) = args.timeout {
        config.defaults.timeout = timeout;
    }

    let path = manifest_path(file, &config);
    let manifest = Manifest::load(&path)?;
    let graph = Graph::wire(&manifest, &config.shell())?;

    if args.targets.is_empty() {
        let name = graph.default_target().unwrap_or(buildr::manifest::ROOT_NAME);
        report(name, graph.build_default()?);
        return Ok(());
    }

    for name in &args.targets {
        report(name, graph.build(name)?);
    }
    Ok(())
}

fn report(name: &str, outcome: Outcome) {
    match outcome {
        Outcome::Rebuilt => eprintln!("{}: {}", "built".green(), short_name(name)),
        Outcome::UpToDate => eprintln!("{}: {}", "up to date".cyan(), short_name(name)),
    }
}

/// One manifest entry as listed
#[derive(Debug, Serialize)]
struct TargetSummary {
    name: String,
    kind: TargetKind,
    resources: Vec<String>,
    depends: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<String>,
}

fn summarize(manifest: &Manifest) -> Result<Vec<TargetSummary>> {
    manifest
        .targets
        .iter()
        .map(|(key, spec)| -> Result<TargetSummary> {
            Ok(TargetSummary {
                name: key.clone(),
                kind: spec.kind(key)?,
                resources: spec.resources(),
                depends: spec.depends.clone(),
                command: spec.command.clone(),
            })
        })
        .collect()
}

/// List the targets of the manifest
fn list_targets(args: ListArgs, config: &Config, file: Option<&str>) -> Result<()> {
    let path = manifest_path(file, config);
    let manifest = Manifest::load(&path)?;
    let targets = summarize(&manifest)?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "manifest": path.display().to_string(),
                "default": manifest.default,
                "targets": targets
            }))?;
            println!("{}", json);
        }
        OutputFormat::Plain => {
            for target in &targets {
                println!("{}", target.name);
            }
        }
        OutputFormat::Table => {
            println!("{}: {}", "Manifest".cyan(), path.display());
            if let Some(default) = &manifest.default {
                println!("{}: {}", "Default".cyan(), default);
            }
            println!();
            if targets.is_empty() {
                println!("No targets found.");
            } else {
                println!("{}:", "Targets".cyan());
                for target in &targets {
                    let resources = if target.resources.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", target.resources.join(", "))
                    };
                    println!("  {} ({}){}", target.name.bold(), target.kind, resources);
                    if !target.depends.is_empty() {
                        println!("    {} {}", "depends:".dimmed(), target.depends.join(", "));
                    }
                }
            }
        }
    }

    Ok(())
}

/// Show the resolved configuration
fn show_config(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Plain => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        OutputFormat::Table => {
            println!("{}: {}", "Manifest".cyan(), config.defaults.manifest);
            println!("{}: {}", "Shell".cyan(), config.defaults.shell);
            if config.defaults.timeout > 0 {
                println!("{}: {}s", "Timeout".cyan(), config.defaults.timeout);
            } else {
                println!("{}: none", "Timeout".cyan());
            }
            println!("{}: {} bytes", "Max output".cyan(), config.defaults.max_output);
            println!(
                "{}: {:?}",
                "Routine keyword".cyan(),
                config.scaffold.routine_keyword
            );

            if !config.env.is_empty() {
                println!("{}:", "Environment".cyan());
                for (key, value) in &config.env {
                    println!("  {}={}", key, value);
                }
            }

            let files = find_config_files();
            println!("{}:", "Config files".cyan());
            if files.is_empty() {
                println!("  None (defaults)");
            }
            for path in files {
                println!("  - {}", path.display());
            }
        }
    }

    Ok(())
}

/// Append the generated routines missing from the template
fn scaffold(args: ScaffoldArgs, config: &Config) -> Result<()> {
    let syntax = args
        .keyword
        .as_deref()
        .map(RoutineSyntax::new)
        .unwrap_or_else(|| config.routine_syntax());

    let generated = std::fs::read_to_string(&args.generated)
        .with_context(|| format!("Failed to read {}", args.generated))?;

    let appended = extend_blank_file(&args.template, &syntax, |w| {
        w.write_all(generated.as_bytes())?;
        Ok(())
    })?;

    if appended == 0 {
        eprintln!("{}: {}", "up to date".cyan(), args.template);
    } else {
        eprintln!(
            "{}: {} routine(s) to {}",
            "appended".green(),
            appended,
            args.template
        );
    }
    Ok(())
}

/// Manifest location: `--file`, else `defaults.manifest`
fn manifest_path(file: Option<&str>, config: &Config) -> PathBuf {
    PathBuf::from(file.unwrap_or(&config.defaults.manifest))
}

fn absolute(path: &str) -> Result<PathBuf> {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()?.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "info");
        assert_eq!(default_directive(true), "debug");
    }

    #[test]
    fn test_manifest_path_prefers_flag() {
        let config = Config::default();
        assert_eq!(
            manifest_path(Some("ci.toml"), &config),
            PathBuf::from("ci.toml")
        );
        assert_eq!(manifest_path(None, &config), PathBuf::from("buildr.toml"));
    }

    #[test]
    fn test_absolute_keeps_absolute_paths() {
        assert_eq!(
            absolute("/etc/buildr/config.toml").unwrap(),
            PathBuf::from("/etc/buildr/config.toml")
        );
    }

    #[test]
    fn test_absolute_joins_relative_paths() {
        let resolved = absolute("local.toml").unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("local.toml"));
    }

    #[test]
    fn test_summarize() {
        let manifest = Manifest::parse(
            r#"
            [targets.app]
            files = ["a.out"]
            depends = ["src"]
            command = "cc -o a.out src/*.c"

            [targets.src]
            glob = "src/*.c"
            "#,
        )
        .unwrap();

        let targets = summarize(&manifest).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].name, "app");
        assert_eq!(targets[0].kind, TargetKind::File);
        assert_eq!(targets[0].depends, vec!["src"]);
        assert_eq!(targets[1].kind, TargetKind::Glob);
        assert_eq!(targets[1].resources, vec!["src/*.c"]);
        assert!(targets[1].command.is_none());
    }
}
