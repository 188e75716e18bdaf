//! Integration tests for CLI argument handling
//!
//! Runs the built binary with flags that make it exit before binding a socket.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_finsight"))
        .args(args)
        .env_remove("FINSIGHT_UPSTREAM_TIMEOUT_SECS")
        .env_remove("FINSIGHT_LOG_FORMAT")
        .output()
        .expect("Failed to execute finsight")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("finsight"), "Help should mention finsight");
    assert!(stdout.contains("--cache-dir"), "Help should mention --cache-dir");
    assert!(stdout.contains("--upstream-timeout-secs"));
}

#[test]
fn test_help_does_not_leak_api_key_default() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("finsight-secret-123"));
}

#[test]
fn test_version_flag_exits_successfully() {
    let output = run_cli(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_zero_timeout_prints_error_and_exits() {
    let output = run_cli(&["--upstream-timeout-secs", "0"]);
    assert!(!output.status.success(), "Expected zero timeout to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("upstream-timeout-secs"),
        "Should name the offending flag: {}",
        stderr
    );
}

#[test]
fn test_invalid_log_format_prints_error_and_exits() {
    let output = run_cli(&["--log-format", "xml"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("xml") || stderr.contains("invalid"), "{}", stderr);
}
