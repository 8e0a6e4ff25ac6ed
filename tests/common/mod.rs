//! Common test utilities for buildr tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use buildr::target::Target;
use filetime::{set_file_mtime, FileTime};
use tempfile::TempDir;

/// Creates a temporary directory holding `files` (relative path, content)
pub fn create_project(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, content).expect("Failed to write file");
    }
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Creates a temporary directory with a buildr.toml
pub fn create_manifest_project(manifest: &str) -> (TempDir, PathBuf) {
    create_project(&[("buildr.toml", manifest)])
}

/// Pin the modification time of `path` to `secs` after the epoch
pub fn set_mtime(path: impl AsRef<Path>, secs: i64) {
    set_file_mtime(path.as_ref(), FileTime::from_unix_time(secs, 0))
        .expect("Failed to set mtime");
}

/// Shared log of action invocations
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Action that records `label` and optionally writes `output`
pub fn record(
    journal: &Journal,
    label: &str,
    output: Option<PathBuf>,
) -> impl Fn(&[Arc<dyn Target>]) -> anyhow::Result<()> + Send + Sync + 'static {
    let journal = Arc::clone(journal);
    let label = label.to_string();
    move |_deps: &[Arc<dyn Target>]| {
        journal.lock().unwrap().push(label.clone());
        if let Some(path) = &output {
            std::fs::write(path, &label)?;
        }
        Ok(())
    }
}

/// Sample manifest: a.out <- b.o <- c.c, plus a phony `check`
pub const SAMPLE_MANIFEST: &str = r#"
default = "app"

[targets.app]
files = ["a.out"]
depends = ["obj"]
command = "cat {deps} > {files}"

[targets.obj]
files = ["b.o"]
depends = ["src"]
command = "cp c.c b.o"

[targets.src]
files = ["c.c"]

[targets.check]
depends = ["app"]
command = "test -s a.out && echo checked"
"#;
