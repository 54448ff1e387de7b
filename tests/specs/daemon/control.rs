//! Control-plane specs: health, logs, reload, degraded mode.

use crate::prelude::*;
use serial_test::serial;

#[test]
#[serial]
fn health_reports_handler_counts_and_no_errors() {
    let project = Project::empty();
    let _daemon = project.daemon();

    let stdout = project.hk().args(&["daemon", "health"]).passes();
    let health: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(health["running"], true);
    assert_eq!(health["degraded"], false);
    assert_eq!(health["config_errors"], serde_json::json!([]));
    assert_eq!(health["handler_count_by_event"]["PreToolUse"], 2);
}

#[test]
#[serial]
fn health_exits_one_when_daemon_is_down() {
    let project = Project::empty();
    let stdout = project.hk().args(&["daemon", "health"]).fails_with(1);
    let health: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(health["running"], false);
}

#[test]
#[serial]
fn invalid_config_degrades_and_health_names_the_error() {
    let project = Project::empty();
    project.config("handlers:\n  PreToolUse:\n    block-dangerous-bash: { priority: 99 }\n");
    let _daemon = project.daemon();

    let stdout = project.hk().args(&["daemon", "health"]).passes();
    let health: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(health["degraded"], true);
    let errors = health["config_errors"].as_array().unwrap();
    assert!(!errors.is_empty());
    assert!(errors[0].as_str().unwrap().contains("priority"), "{errors:?}");

    // Degraded daemons still answer events, with a warning attached
    let response = forward_event(&project, "SessionStart", r#"{"source":"startup"}"#);
    let context = response["hookSpecificOutput"]["additionalContext"]
        .as_str()
        .unwrap();
    assert!(context.contains("configuration invalid"), "{context}");
}

#[test]
#[serial]
fn reload_picks_up_a_fixed_config() {
    let project = Project::empty();
    project.config("handlers:\n  PreToolUse:\n    block-dangerous-bash: { priority: 99 }\n");
    let _daemon = project.daemon();

    project.config("daemon: { idle_timeout_seconds: 600 }\n");
    let stdout = project.hk().args(&["daemon", "reload"]).passes();
    assert!(stdout.contains("reloaded"), "{stdout}");

    let stdout = project.hk().args(&["daemon", "health"]).passes();
    let health: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(health["degraded"], false);
}

#[test]
#[serial]
fn reload_with_broken_config_keeps_serving_and_exits_one() {
    let project = Project::empty();
    let _daemon = project.daemon();

    project.config("handlers: [broken\n");
    project.hk().args(&["daemon", "reload"]).fails_with(1);

    // Previous registry still enforces the bash guard
    let response = forward_event(
        &project,
        "PreToolUse",
        r#"{"tool_name":"Bash","tool_input":{"command":"rm -rf /"}}"#,
    );
    assert_eq!(response["hookSpecificOutput"]["permissionDecision"], "deny");
}

#[test]
#[serial]
fn logs_returns_recent_daemon_activity() {
    let project = Project::empty();
    let _daemon = project.daemon();

    // Generate some traffic first
    let _ = forward_event(&project, "Notification", r#"{"message":"hi"}"#);

    let stdout = project.hk().args(&["daemon", "logs"]).passes();
    assert!(!stdout.trim().is_empty(), "log buffer should not be empty");
}
