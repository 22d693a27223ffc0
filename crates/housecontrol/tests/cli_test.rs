//! Integration tests for the `housecontrol` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without a server; command tests point `--server` at a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const NO_HOME: &str = "/tmp/housecontrol-cli-test-nonexistent";

/// Build a [`Command`] for the `housecontrol` binary with env isolation.
///
/// Clears all `HOUSECONTROL_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn housecontrol_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("housecontrol");
    cmd.env("HOME", NO_HOME)
        .env("XDG_CONFIG_HOME", NO_HOME)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("HOUSECONTROL_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run_against(server: &MockServer, args: &[&str]) -> std::process::Output {
    let mut full = vec!["--server".to_owned(), server.uri(), "--color".into(), "never".into()];
    full.extend(args.iter().map(|a| (*a).to_owned()));
    tokio::task::spawn_blocking(move || housecontrol_cmd().args(&full).output().unwrap())
        .await
        .unwrap()
}

async fn posted_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| r.url.path().to_owned())
        .collect()
}

async fn accepting_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = housecontrol_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    housecontrol_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("alarm")
            .and(predicate::str::contains("garage"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    housecontrol_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("housecontrol"));
}

#[test]
fn test_completions_bash() {
    housecontrol_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_config_path_points_at_toml() {
    housecontrol_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_status_without_server_is_usage_error() {
    let output = housecontrol_cmd().arg("status").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("No house server configured"), "{text}");
}

#[test]
fn test_server_from_environment() {
    let output = housecontrol_cmd()
        .env("HOUSECONTROL_SERVER_URL", "ftp://house.local")
        .arg("status")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("server_url"));
}

#[test]
fn test_watch_rejects_unknown_initial_state() {
    let output = housecontrol_cmd()
        .args(["--server", "http://127.0.0.1:9", "watch", "--initial-state", "asleep"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("initial-state"));
}

#[test]
fn test_unreachable_server_is_connection_error() {
    let output = housecontrol_cmd()
        .args(["--server", "http://127.0.0.1:9", "--timeout", "2", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

// ── Server commands ─────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_prints_snapshot_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "alarm": { "mode": "stay" },
            "garage_door": { "status": "closed" },
        })))
        .mount(&server)
        .await;

    let output = run_against(&server, &["--output", "json-compact", "status"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["alarm"]["mode"], "stay");
    assert_eq!(value["garage_door"]["status"], "closed");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_alarm_away_posts_command() {
    let server = accepting_server().await;

    let output = run_against(&server, &["alarm", "away"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("alarm_away accepted"));
    assert_eq!(posted_paths(&server).await, vec!["/alarm/away"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_panic_reassures_the_user() {
    let server = accepting_server().await;

    let output = run_against(&server, &["alarm", "panic"]).await;
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("Alarm Panic: Hang in there. Everything will be ok"));
    assert_eq!(posted_paths(&server).await, vec!["/alarm/panic"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_denied_request_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/garage_door/toggle"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let output = run_against(&server, &["garage", "toggle"]).await;
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("credentials"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_leave_shortcut_runs_in_order() {
    let server = accepting_server().await;

    let output = run_against(&server, &["shortcut", "leave"]).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        posted_paths(&server).await,
        vec!["/alarm/away", "/garage_door/toggle"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_shortcut_is_a_no_op() {
    let server = accepting_server().await;

    let output = run_against(&server, &["shortcut", "unknown.x"]).await;
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nothing to do"));
    assert!(server.received_requests().await.unwrap().is_empty());
}
