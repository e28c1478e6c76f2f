//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against the dev data directory
//! and verify exit codes and output shape.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "stint-cli", "--"])
        .args(args)
        .env("STINT_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn timer_status_reports_a_session() {
    let (stdout, _, code) = run_cli(&["timer", "status"]);
    assert_eq!(code, 0, "timer status failed");
    let state: serde_json::Value = serde_json::from_str(&stdout).expect("status is JSON");
    assert!(state.get("phase").is_some());
    assert!(state.get("plan").is_some());
}

#[test]
fn plan_list_is_json_array() {
    let (stdout, _, code) = run_cli(&["plan", "list"]);
    assert_eq!(code, 0, "plan list failed");
    let plan: serde_json::Value = serde_json::from_str(&stdout).expect("plan is JSON");
    assert!(plan.is_array());
}

#[test]
fn config_show_prints_timer_table() {
    let (stdout, _, code) = run_cli(&["config", "show"]);
    assert_eq!(code, 0, "config show failed");
    assert!(stdout.contains("[timer]"));
    assert!(stdout.contains("work_minutes"));
}

#[test]
fn log_summary_reports_totals() {
    let (stdout, _, code) = run_cli(&["log", "summary"]);
    assert_eq!(code, 0, "log summary failed");
    let summary: serde_json::Value = serde_json::from_str(&stdout).expect("summary is JSON");
    assert!(summary.get("total_hours").is_some());
}
