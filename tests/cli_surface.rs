//! CLI end-to-end tests
//!
//! Exercises the photostage binary surface. None of these need the
//! external tools installed.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the photostage binary
#[allow(deprecated)]
fn photostage_cmd() -> Command {
    Command::cargo_bin("photostage").unwrap()
}

fn png_fixture(dir: &std::path::Path) -> std::path::PathBuf {
    let mut data = Vec::new();
    data.extend_from_slice(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D]);
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&[0u8; 17]);
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    data.extend_from_slice(b"IDAT");
    data.extend_from_slice(&[0u8; 8]);
    let path = dir.join("fixture.png");
    fs::write(&path, data).unwrap();
    path
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = photostage_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = photostage_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("photostage"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = photostage_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("photostage"));
}

#[test]
fn test_cli_version_subcommand() {
    let mut cmd = photostage_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("photostage"));
}

#[test]
fn test_cli_run_help() {
    let mut cmd = photostage_cmd();
    cmd.args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scan a directory tree"));
}

#[test]
fn test_cli_detect_help() {
    let mut cmd = photostage_cmd();
    cmd.args(["detect", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Detect the real format"));
}

#[test]
fn test_cli_probe_help() {
    let mut cmd = photostage_cmd();
    cmd.args(["probe", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("container and streams"));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = photostage_cmd();
    cmd.arg("check-tools").assert().success().stdout(
        predicate::str::contains("ffmpeg")
            .or(predicate::str::contains("ffprobe"))
            .or(predicate::str::contains("tools")),
    );
}

#[test]
fn test_cli_run_nonexistent_root() {
    let mut cmd = photostage_cmd();
    cmd.args(["run", "/nonexistent/scan/tree"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found").or(predicate::str::contains("exist")));
}

#[test]
fn test_cli_detect_nonexistent_file() {
    let mut cmd = photostage_cmd();
    cmd.args(["detect", "/nonexistent/file.bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found").or(predicate::str::contains("exist")));
}

#[test]
fn test_cli_probe_nonexistent_file() {
    let mut cmd = photostage_cmd();
    cmd.args(["probe", "/nonexistent/clip.mov"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found").or(predicate::str::contains("exist")));
}

#[test]
fn test_cli_detect_identifies_a_png() {
    let temp = tempdir().unwrap();
    let fixture = png_fixture(temp.path());

    let mut cmd = photostage_cmd();
    cmd.args(["detect", fixture.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Consensus: PNG"))
        .stdout(predicate::str::contains("Kind: image"))
        .stdout(predicate::str::contains("Extension: .png"));
}

#[test]
fn test_cli_detect_json_output() {
    let temp = tempdir().unwrap();
    let fixture = png_fixture(temp.path());

    let mut cmd = photostage_cmd();
    let assert = cmd
        .args(["detect", "--json", fixture.to_str().unwrap()])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("stdout must be JSON");
    assert_eq!(parsed["consensus"]["extension"], ".png");
    assert_eq!(parsed["consensus"]["kind"], "image");
    assert!(parsed["votes"].as_array().unwrap().len() >= 2);
}

#[test]
fn test_cli_dry_run_reports_without_staging() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("photos");
    fs::create_dir(&root).unwrap();
    png_fixture(&root);

    let mut cmd = photostage_cmd();
    cmd.args(["run", "--dry-run", root.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scan"))
        .stdout(predicate::str::contains("Files scanned:"))
        .stdout(predicate::str::contains("Media detected:"));

    // Nothing staged beside the scan root.
    let dirs = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .count();
    assert_eq!(dirs, 1);
}

#[test]
fn test_cli_run_empty_tree() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("empty");
    fs::create_dir(&root).unwrap();

    let mut cmd = photostage_cmd();
    cmd.args(["run", root.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No files found to examine"));
}

#[test]
fn test_cli_validate_defaults() {
    let mut cmd = photostage_cmd();
    cmd.arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("defaults"))
        .stdout(predicate::str::contains("Timeouts"));
}

#[test]
fn test_cli_validate_good_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("photostage.json");
    fs::write(
        &config_file,
        r#"{
  "timeouts": { "detect_secs": 10, "probe_secs": 20, "convert_secs": 600 },
  "staging": { "dir_prefix": "staged-media", "archive_originals": false },
  "import": { "enabled": true, "manifest_name": "import_manifest.json" }
}"#,
    )
    .unwrap();

    let mut cmd = photostage_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("detect 10s"));
}

#[test]
fn test_cli_validate_rejects_bad_json() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("broken.json");
    fs::write(&config_file, "{ not json").unwrap();

    let mut cmd = photostage_cmd();
    cmd.args(["validate", config_file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parse").or(predicate::str::contains("error")));
}
