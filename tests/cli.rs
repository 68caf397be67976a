use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::path::PathBuf;

/// Helper to get a temporary config directory
fn temp_config_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Helper to get config file path in the temp dir
fn config_file_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join(".metrics-dashboard").join("config.json")
}

const BINARY_NAME: &str = "metrics-dashboard";

#[test]
/// Help command should list every subcommand.
fn cli_help_displays_usage() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(contains("show"))
        .stdout(contains("graph"))
        .stdout(contains("export-metric"))
        .stdout(contains("init-config"));
}

#[test]
/// init-config should write a config file under $HOME by default.
fn init_config_creates_config_file() {
    let tmp = temp_config_dir();
    let config_path = config_file_path(&tmp);
    assert!(!config_path.exists());

    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.args(["init-config", "--variant", "dora"])
        .env("HOME", tmp.path()) // simulate different $HOME
        .assert()
        .success()
        .stdout(contains("Config written"));

    let written = fs::read_to_string(&config_path).unwrap();
    assert!(written.contains("\"variant\": \"dora\""));
}

#[test]
/// init-config should refuse to overwrite without --force.
fn init_config_keeps_existing_file() {
    let tmp = temp_config_dir();
    let config_path = tmp.path().join("config.json");
    fs::write(&config_path, "{}").unwrap();

    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.arg("init-config")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(contains("already exists"));
    assert_eq!(fs::read_to_string(&config_path).unwrap(), "{}");

    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.arg("init-config")
        .arg("--config")
        .arg(&config_path)
        .arg("--force")
        .assert()
        .success();
    assert!(fs::read_to_string(&config_path).unwrap().contains("engineering-grid"));
}

#[test]
/// A director filter needs a VP.
fn show_rejects_director_without_vp() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.args(["show", "--director", "D1"])
        .assert()
        .failure()
        .stderr(contains("--vp"));
}

#[test]
fn unknown_environment_is_rejected() {
    let tmp = temp_config_dir();
    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.args(["show", "--env", "moon"])
        .env("HOME", tmp.path())
        .assert()
        .failure()
        .stderr(contains("Unknown environment"));
}

#[test]
/// An unreachable backend surfaces the grid error and a failing exit code.
fn show_reports_unreachable_backend() {
    let tmp = temp_config_dir();
    let config_path = tmp.path().join("config.json");
    fs::write(
        &config_path,
        r#"{"api_root": "http://127.0.0.1:9/api", "max_retries": 1, "request_timeout_secs": 2}"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin(BINARY_NAME).unwrap();
    cmd.arg("show")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(contains("grid fetch failed"));
}
