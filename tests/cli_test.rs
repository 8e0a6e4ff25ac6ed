//! End-to-end tests of the buildr binary

mod common;

use assert_cmd::Command;
use common::{create_manifest_project, create_project, set_mtime, SAMPLE_MANIFEST};
use predicates::prelude::*;

fn buildr() -> Command {
    let mut cmd = Command::cargo_bin("buildr").unwrap();
    // Keep the user's configuration out of the tests
    cmd.env("XDG_CONFIG_HOME", "/nonexistent")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn sample_project() -> (tempfile::TempDir, std::path::PathBuf) {
    create_project(&[("buildr.toml", SAMPLE_MANIFEST), ("c.c", "int main;\n")])
}

#[test]
fn test_build_default_target() {
    let (_dir, path) = sample_project();

    buildr()
        .current_dir(&path)
        .arg("build")
        .assert()
        .success()
        .stderr(predicate::str::contains("Make target `a.out`"))
        .stderr(predicate::str::contains("built: app"));

    assert_eq!(
        std::fs::read_to_string(path.join("a.out")).unwrap(),
        "int main;\n"
    );
}

#[test]
fn test_second_build_is_up_to_date() {
    let (_dir, path) = sample_project();

    buildr().current_dir(&path).arg("build").assert().success();
    set_mtime(path.join("c.c"), 1_000);
    set_mtime(path.join("b.o"), 2_000);
    set_mtime(path.join("a.out"), 3_000);

    buildr()
        .current_dir(&path)
        .args(["build", "app"])
        .assert()
        .success()
        .stderr(predicate::str::contains("up to date: app"))
        .stderr(predicate::str::contains("Make target").not());
}

#[test]
fn test_build_with_directory_flag() {
    let (_dir, path) = sample_project();

    buildr()
        .arg("-C")
        .arg(&path)
        .args(["build", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("checked"));
}

#[test]
fn test_build_by_display_name() {
    let (_dir, path) = sample_project();

    buildr()
        .current_dir(&path)
        .args(["build", "b.o"])
        .assert()
        .success();

    assert!(path.join("b.o").exists());
    assert!(!path.join("a.out").exists());
}

#[test]
fn test_build_unknown_target() {
    let (_dir, path) = sample_project();

    buildr()
        .current_dir(&path)
        .args(["build", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot find target `nope`"))
        .stderr(predicate::str::contains("buildr list"));
}

#[test]
fn test_build_failing_command() {
    let (_dir, path) = create_manifest_project(
        r#"
        [targets.broken]
        command = "echo boom >&2; exit 2"
        "#,
    );

    buildr()
        .current_dir(&path)
        .args(["build", "broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("Target `broken` failed"));
}

#[test]
fn test_build_failing_command_shows_its_stderr() {
    let (_dir, path) = create_manifest_project(
        r#"
        [targets.broken]
        command = "printf 'undefined %s\\n' reference >&2; exit 1"
        "#,
    );

    buildr()
        .current_dir(&path)
        .args(["build", "broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("undefined reference"));
}

#[test]
fn test_build_rejects_shared_file_list() {
    let (_dir, path) = create_manifest_project(
        r#"
        [targets.fmt]
        files = ["main.rs"]
        command = "touch fmt.done"

        [targets.lint]
        files = ["main.rs"]
        command = "touch lint.done"
        "#,
    );

    buildr()
        .current_dir(&path)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("share the name `main.rs`"));
    assert!(!path.join("lint.done").exists());
}

#[test]
fn test_build_env_flag_reaches_commands() {
    let (_dir, path) = create_manifest_project(
        r#"
        [targets.greet]
        command = "echo hello $GREETING"
        "#,
    );

    buildr()
        .current_dir(&path)
        .args(["build", "greet", "-e", "GREETING=world"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello world"));
}

#[test]
fn test_build_rejects_manifest_cycle() {
    let (_dir, path) = create_manifest_project(
        r#"
        [targets.a]
        depends = ["b"]

        [targets.b]
        depends = ["a"]
        "#,
    );

    buildr()
        .current_dir(&path)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dependency cycle: a -> b -> a"));
}

#[test]
fn test_build_missing_manifest() {
    let (_dir, path) = create_project(&[]);

    buildr()
        .current_dir(&path)
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read buildr.toml"));
}

#[test]
fn test_build_with_file_flag() {
    let (_dir, path) = create_project(&[(
        "ci.toml",
        "[targets.ci]\ncommand = \"echo from-ci\"\n",
    )]);

    buildr()
        .current_dir(&path)
        .args(["-f", "ci.toml", "build", "ci"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-ci"));
}

#[test]
fn test_list_plain() {
    let (_dir, path) = sample_project();

    buildr()
        .current_dir(&path)
        .args(["list", "--format", "plain"])
        .assert()
        .success()
        .stdout("app\ncheck\nobj\nsrc\n");
}

#[test]
fn test_list_json() {
    let (_dir, path) = sample_project();

    let output = buildr()
        .current_dir(&path)
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["default"], "app");
    assert_eq!(json["targets"][0]["name"], "app");
    assert_eq!(json["targets"][0]["kind"], "file");
    assert_eq!(json["targets"][1]["kind"], "phony");
    assert_eq!(json["targets"][2]["depends"][0], "src");
}

#[test]
fn test_list_table() {
    let (_dir, path) = sample_project();

    buildr()
        .current_dir(&path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Default: app"))
        .stdout(predicate::str::contains("check (phony)"));
}

#[test]
fn test_config_json_uses_override_file() {
    let (_dir, path) = create_project(&[(
        "custom.toml",
        "[defaults]\nshell = \"bash\"\ntimeout = 45\n",
    )]);

    let output = buildr()
        .current_dir(&path)
        .args(["-c", "custom.toml", "config", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["defaults"]["shell"], "bash");
    assert_eq!(json["defaults"]["timeout"], 45);
    assert_eq!(json["scaffold"]["routine_keyword"], "fn ");
}

#[test]
fn test_scaffold_appends_missing_routines() {
    let (_dir, path) = create_project(&[
        ("api.rs", "fn existing() {\n}\n"),
        (
            "gen.rs",
            "fn existing() {\n    todo!()\n}\n\n/// New\nfn added() {\n}\n",
        ),
    ]);

    buildr()
        .current_dir(&path)
        .args(["scaffold", "--template", "api.rs", "--generated", "gen.rs"])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 routine(s)"));

    let merged = std::fs::read_to_string(path.join("api.rs")).unwrap();
    assert_eq!(merged, "fn existing() {\n}\n\n/// New\nfn added() {\n}\n");

    buildr()
        .current_dir(&path)
        .args(["scaffold", "-t", "api.rs", "-g", "gen.rs"])
        .assert()
        .success()
        .stderr(predicate::str::contains("up to date"));
}

#[test]
fn test_help_lists_subcommands() {
    buildr()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("scaffold"));
}
