//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// A command running in `dir` with user config and outputs isolated.
fn cmd_in(dir: &Path) -> Command {
    let mut cmd = cmd();
    cmd.env("XDG_CONFIG_HOME", dir.join(".xdg"))
        .env_remove("GITHUB_OUTPUT")
        .env_remove("RUST_LOG")
        .env_remove("FORCE_COLOR")
        .env_remove("CLICOLOR_FORCE")
        .args(["-C", dir.to_str().unwrap()]);
    cmd
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn start_help_lists_overrides() {
    cmd()
        .args(["start", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--package-type"))
        .stdout(predicate::str::contains("--bump-type"))
        .stdout(predicate::str::contains("--scm"));
}

// =============================================================================
// Start Command
// =============================================================================

#[test]
fn start_bumps_generic_version_file() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("VERSION"), "version := \"1.2.2\"\n").unwrap();

    cmd_in(tmp.path())
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("version bumped to"))
        .stdout(predicate::str::contains("1.2.3"));

    assert_eq!(
        fs::read_to_string(tmp.path().join("VERSION")).unwrap(),
        r#"version := "1.2.3""#
    );
}

#[test]
fn start_json_outputs_outcome() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("VERSION"), r#"version := "0.4.1""#).unwrap();

    let output = cmd_in(tmp.path())
        .args(["--json", "start", "--bump-type", "minor"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("start --json should output valid JSON");

    assert_eq!(json["package_type"], "generic");
    assert_eq!(json["previous"], "0.4.1");
    assert_eq!(json["next"], "0.5.0");
    assert_eq!(json["release_version"], "0.5.0");
}

#[test]
fn start_without_version_file_fails() {
    let tmp = TempDir::new().unwrap();

    cmd_in(tmp.path())
        .args(["start", "--package-type", "generic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid build package"));

    assert!(!tmp.path().join("VERSION").exists());
}

#[test]
fn start_rejects_unknown_package_type() {
    let tmp = TempDir::new().unwrap();

    cmd_in(tmp.path())
        .args(["start", "--package-type", "cobol"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported engine type: cobol"));
}

#[test]
fn start_rejects_unknown_bump_type() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("VERSION"), r#"version := "1.0.0""#).unwrap();

    cmd_in(tmp.path())
        .args(["start", "--bump-type", "weekly"])
        .assert()
        .failure();

    assert_eq!(
        fs::read_to_string(tmp.path().join("VERSION")).unwrap(),
        r#"version := "1.0.0""#
    );
}

#[test]
fn start_github_scm_writes_step_output() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("VERSION"), r#"version := "3.0.0""#).unwrap();
    let output_file = tmp.path().join("github_output");

    cmd_in(tmp.path())
        .env("GITHUB_OUTPUT", &output_file)
        .args(["start", "--scm", "github", "--bump-type", "major"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(output_file).unwrap(),
        "release_version=4.0.0\n"
    );
}

#[test]
fn start_rejects_unknown_scm() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("VERSION"), r#"version := "1.0.0""#).unwrap();

    cmd_in(tmp.path())
        .args(["start", "--scm", "svn"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported scm type: svn"));
}

#[test]
fn quiet_start_only_prints_result() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("VERSION"), r#"version := "1.0.0""#).unwrap();

    cmd_in(tmp.path())
        .args(["-q", "--color", "never", "start"])
        .assert()
        .success()
        .stdout("version bumped to 1.0.1\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn piped_start_output_has_no_escapes() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("VERSION"), r#"version := "2.3.4""#).unwrap();

    cmd_in(tmp.path())
        .arg("start")
        .assert()
        .success()
        .stdout("version bumped to 2.3.5\n");
}

// =============================================================================
// Doctor Command
// =============================================================================

#[test]
fn doctor_color_never_has_no_escapes() {
    let tmp = TempDir::new().unwrap();

    cmd_in(tmp.path())
        .args(["--color", "never", "doctor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\x1b").not());
}

#[test]
fn doctor_json_lists_engines() {
    let tmp = TempDir::new().unwrap();

    let output = cmd_in(tmp.path())
        .args(["doctor", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    let engines = json["engines"].as_array().unwrap();
    let names: Vec<_> = engines
        .iter()
        .map(|e| e["package_type"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["generic", "golang", "node", "python", "ruby", "chef"]);
    assert_eq!(engines[0]["selected"], true);
}

#[test]
fn doctor_text_shows_sections() {
    let tmp = TempDir::new().unwrap();

    cmd_in(tmp.path())
        .args(["--color", "never", "doctor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration"))
        .stdout(predicate::str::contains("Settings"))
        .stdout(predicate::str::contains("Engines"));
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn verbosity_flags_accepted() {
    let tmp = TempDir::new().unwrap();
    for flag in ["--quiet", "-q", "--verbose", "-v", "-vv"] {
        cmd_in(tmp.path()).args([flag, "doctor"]).assert().success();
    }
}

#[test]
fn color_choices_accepted() {
    let tmp = TempDir::new().unwrap();
    for choice in ["auto", "always", "never"] {
        cmd_in(tmp.path())
            .args(["--color", choice, "doctor"])
            .assert()
            .success();
    }
}

#[test]
fn log_dir_receives_json_lines() {
    let tmp = TempDir::new().unwrap();
    let log_dir = tmp.path().join("logs");
    fs::write(tmp.path().join("VERSION"), r#"version := "1.0.0""#).unwrap();

    cmd_in(tmp.path())
        .env("BUMPR_LOG_DIR", &log_dir)
        .arg("start")
        .assert()
        .success();

    let logged: String = fs::read_dir(&log_dir)
        .unwrap()
        .map(|entry| fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect();
    assert!(logged.contains("bump complete"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "doctor"])
        .assert()
        .failure();
}
