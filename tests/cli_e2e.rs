//! End-to-end CLI tests for the auth-href binary.

#![allow(deprecated)]

mod support;
use support::socket_guard::{socket_skip_return, start_mock_server_or_skip};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

/// Command with an isolated config home and no ambient token.
fn isolated_cmd(tempdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("auth-href").unwrap();
    cmd.env("XDG_CONFIG_HOME", tempdir.path().join("xdg-config"))
        .env_remove("AUTH_HREF_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("auth-href").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("authenticated"))
        .stdout(predicate::str::contains("--token"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("auth-href").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("auth-href"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("auth-href").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_invalid_text_mode_rejected() {
    let mut cmd = Command::cargo_bin("auth-href").unwrap();
    cmd.args(["--text-mode", "markdown", "https://example.com/a.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid text mode"));
}

#[test]
fn test_binary_missing_token_fails() {
    let tempdir = TempDir::new().unwrap();
    let mut cmd = isolated_cmd(&tempdir);
    cmd.arg("--output-dir")
        .arg(tempdir.path().join("out"))
        .arg("http://127.0.0.1:9/report.pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 1 downloads failed"));
}

#[test]
fn test_binary_bad_config_file_fails() {
    let tempdir = TempDir::new().unwrap();
    let config_path = tempdir.path().join("config.toml");
    std::fs::write(&config_path, "remove_delay_ms = -10\n").unwrap();

    let mut cmd = isolated_cmd(&tempdir);
    cmd.arg("--config")
        .arg(&config_path)
        .arg("https://example.com/a.pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[tokio::test]
async fn test_binary_downloads_with_token_flag() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/reports/q3.pdf"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-q3")
                .insert_header("Content-Type", "application/pdf"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    let out = tempdir.path().join("out");

    let mut cmd = isolated_cmd(&tempdir);
    cmd.arg("-q")
        .args(["-t", "abc"])
        .arg("--output-dir")
        .arg(&out)
        .arg(format!("{}/reports/q3.pdf?sig=xyz", mock_server.uri()))
        .assert()
        .success();

    assert_eq!(std::fs::read(out.join("q3.pdf")).unwrap(), b"%PDF-q3");
}

#[tokio::test]
async fn test_binary_reads_token_from_config_and_urls_from_stdin() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/a.txt"))
        .and(header("x-api-key", "from-config"))
        .respond_with(ResponseTemplate::new(200).set_body_string("alpha"))
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    let out = tempdir.path().join("out");
    let config_path = tempdir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "token = \"from-config\"\nheader_name = \"X-Api-Key\"\nheader_value_prefix = \"\"\n",
    )
    .unwrap();

    let mut cmd = isolated_cmd(&tempdir);
    cmd.arg("--config")
        .arg(&config_path)
        .arg("--output-dir")
        .arg(&out)
        .write_stdin(format!("# comment\n{}/a.txt\n\n", mock_server.uri()))
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(out.join("a.txt")).unwrap(), "alpha");
}

#[tokio::test]
async fn test_binary_partial_failure_exits_non_zero() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/ok.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.bin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let tempdir = TempDir::new().unwrap();
    let out = tempdir.path().join("out");

    let mut cmd = isolated_cmd(&tempdir);
    cmd.env("AUTH_HREF_TOKEN", "env-token")
        .arg("-q")
        .arg("--output-dir")
        .arg(&out)
        .arg(format!("{}/ok.bin", mock_server.uri()))
        .arg(format!("{}/gone.bin", mock_server.uri()));

    let assert = cmd.assert().failure();
    assert_eq!(assert.get_output().status.code(), Some(1));
    assert!(out.join("ok.bin").exists());
    assert!(!out.join("gone.bin").exists());
}
