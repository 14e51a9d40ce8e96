use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn dte_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("dte"))
}

#[test]
fn test_help() {
    dte_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Browse, filter and bulk-export DTE tax documents",
        ));
}

#[test]
fn test_version() {
    dte_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dte"));
}

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dte-config");

    dte_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized dte config"));

    // Check files were created
    assert!(config_path.join("config.toml").exists());
    assert!(config_path.join("accounts.toml").exists());
}

#[test]
fn test_init_fails_if_exists() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dte-config");

    // First init should succeed
    dte_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    // Second init should fail
    dte_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    dte_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_status_shows_portal() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dte-config");

    dte_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    dte_cmd()
        .args(["-C", config_path.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("portal.example.com"))
        .stdout(predicate::str::contains("example-client"));
}

#[test]
fn test_list_without_init() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("nonexistent");

    dte_cmd()
        .args(["-C", config_path.to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_export_rejects_empty_selection() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dte-config");

    dte_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    // No selection flags at all: rejected before any network access
    dte_cmd()
        .args(["-C", config_path.to_str().unwrap(), "export"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No documents selected"));
}

#[test]
fn test_export_rejects_bad_date() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dte-config");

    dte_cmd()
        .args(["-C", config_path.to_str().unwrap(), "init"])
        .assert()
        .success();

    dte_cmd()
        .args([
            "-C",
            config_path.to_str().unwrap(),
            "export",
            "--all",
            "--from",
            "21-08-2025",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --from value"));
}

#[test]
fn test_list_with_unreachable_portal() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("dte-config");
    fs::create_dir_all(&config_path).unwrap();

    // Nothing listens on port 9; the fetch must surface a portal error
    fs::write(
        config_path.join("config.toml"),
        r#"[portal]
base_url = "http://127.0.0.1:9"

[export]
output_dir = "output"
"#,
    )
    .unwrap();
    fs::write(
        config_path.join("accounts.toml"),
        r#"[acme]
name = "Acme S.A. de C.V."
"#,
    )
    .unwrap();

    dte_cmd()
        .args(["-C", config_path.to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Portal request failed"));
}
