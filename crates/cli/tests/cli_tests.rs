//! CLI integration tests

use std::process::{Command, Output};
use tempfile::TempDir;

const WINDOW_DUMP: &str = r#"[
  {"fingerprintExpected":"pfp0v001aa","fingerprintComputed":"pfp0v001aa",
   "pods":[{"namespace":"default","name":"web-0"}],"nodeName":"worker-0",
   "lastWrite":"2024-03-01T12:00:00Z","seqNo":3},
  {"fingerprintExpected":"pfp0v001aa","fingerprintComputed":"pfp0v001bb",
   "pods":[{"namespace":"default","name":"web-0"},{"namespace":"batch","name":"job-1"}],
   "nodeName":"worker-0","lastWrite":"2024-03-01T12:00:10Z","seqNo":5}
]"#;

/// Run the binary with an isolated home directory and no endpoint from the environment
fn pfpctl(home: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pfpctl"))
        .args(args)
        .env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("PFP_STATUS_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    let output = pfpctl(&home, &["--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("fingerprint status"), "Should describe the tool");
    assert!(stdout.contains("status"), "Should show status command");
    assert!(stdout.contains("list"), "Should show list command");
    assert!(stdout.contains("node"), "Should show node command");
    assert!(stdout.contains("inspect"), "Should show inspect command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    let output = pfpctl(&home, &["--version"]);

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("pfpctl"), "Should show binary name");
}

#[test]
fn test_status_against_server() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/pfpstatus")
        .with_status(200)
        .with_header("content-type", "application/json; charset=UTF-8")
        .with_body(r#"{"nodes":2}"#)
        .create();

    let output = pfpctl(&home, &["--api-url", &server.url(), "status"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Tracked nodes"));
    assert!(stdout.contains('2'));
    mock.assert();
}

#[test]
fn test_status_json_format() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/pfpstatus")
        .with_status(200)
        .with_body(r#"{"nodes":0}"#)
        .create();

    let output = pfpctl(&home, &["status", "--format", "json", "--api-url", &server.url()]);

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["nodes"], 0);
}

#[test]
fn test_api_url_from_config_file() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/pfpstatus")
        .with_status(200)
        .with_body(r#"{"nodes":1}"#)
        .create();

    let config_dir = home.path().join(".config").join("pfpctl");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.json"),
        format!(r#"{{"api_url":"{}","default_format":"json"}}"#, server.url()),
    )
    .unwrap();

    let output = pfpctl(&home, &["status"]);

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["nodes"], 1);
    mock.assert();
}

#[test]
fn test_node_table() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/pfpstatus/worker-0")
        .with_status(200)
        .with_body(WINDOW_DUMP)
        .create();

    let output = pfpctl(&home, &["--api-url", &server.url(), "node", "worker-0"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("worker-0"));
    assert!(stdout.contains("pfp0v001bb"));
    assert!(stdout.contains("2024-03-01 12:00:10"));
    assert!(stdout.contains("does not match"));
    assert!(stdout.contains("batch/job-1"));
}

#[test]
fn test_list_table() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/pfpstatus/_all")
        .with_status(200)
        .with_body(format!(
            r#"{{"worker-0":{},"worker-1":[{{"fingerprintExpected":"x","fingerprintComputed":"x",
                "nodeName":"worker-1","lastWrite":"2024-03-01T12:01:00Z","seqNo":4}}]}}"#,
            WINDOW_DUMP
        ))
        .create();

    let output = pfpctl(&home, &["--api-url", &server.url(), "list"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("worker-0"));
    assert!(stdout.contains("worker-1"));
    assert!(stdout.contains("2024-03-01 12:01:00"));
    assert!(stdout.contains("does not match on: worker-0"));
    mock.assert();
}

#[test]
fn test_list_json_format() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/pfpstatus/_all")
        .with_status(200)
        .with_body(format!(r#"{{"worker-0":{}}}"#, WINDOW_DUMP))
        .create();

    let output = pfpctl(&home, &["list", "--format", "json", "--api-url", &server.url()]);

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["worker-0"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["worker-0"][1]["seqNo"], 5);
}

#[test]
fn test_unknown_node_fails() {
    let home = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/pfpstatus/ghost")
        .with_status(422)
        .with_body("unknown node name")
        .create();

    let output = pfpctl(&home, &["--api-url", &server.url(), "node", "ghost"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("no fingerprint status recorded for node 'ghost'"));
}

#[test]
fn test_inspect_dump_file_as_json() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("worker-0.json");
    std::fs::write(&path, WINDOW_DUMP).unwrap();

    let output = pfpctl(&home, &["-f", "json", "inspect", path.to_str().unwrap()]);

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let samples = parsed.as_array().unwrap();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0]["seqNo"], 3);
    assert_eq!(samples[1]["fingerprintComputed"], "pfp0v001bb");
}

#[test]
fn test_inspect_latest_dump_uses_file_stem() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("worker-9.json");
    std::fs::write(
        &path,
        r#"{"fingerprintExpected":"x","fingerprintComputed":"x",
            "lastWrite":"2024-03-01T12:00:00Z","seqNo":1}"#,
    )
    .unwrap();

    let output = pfpctl(&home, &["inspect", path.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("worker-9"));
    assert!(!stdout.contains("does not match"));
}

#[test]
fn test_inspect_missing_file_fails() {
    let home = TempDir::new().unwrap();
    let output = pfpctl(&home, &["inspect", "/nonexistent/worker-0.json"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read dump file"));
}
