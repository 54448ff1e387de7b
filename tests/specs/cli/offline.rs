//! Specs for CLI commands that work without a running daemon.

use crate::prelude::*;

#[test]
fn validate_config_accepts_the_minimal_config() {
    let project = Project::empty();
    project.config("daemon: { idle_timeout_seconds: 600, log_level: INFO }\nhandlers: {}\n");

    let stdout = project.hk().args(&["validate-config"]).passes();
    assert!(stdout.contains("OK"), "{stdout}");
}

#[test]
fn validate_config_accepts_a_missing_config() {
    let project = Project::empty();
    let stdout = project.hk().args(&["validate-config"]).passes();
    assert!(stdout.contains("OK"), "{stdout}");
}

#[test]
fn validate_config_rejects_unknown_handler_ids() {
    let project = Project::empty();
    project.config("handlers:\n  PreToolUse:\n    no-such-handler: { enabled: true }\n");

    let stdout = project.hk().args(&["validate-config"]).fails_with(1);
    assert!(stdout.contains("unknown-handler"), "{stdout}");
}

#[test]
fn validate_config_warns_on_unknown_top_level_keys() {
    let project = Project::empty();
    project.config("daemon: {}\nhandelrs: {}\n");

    // Warnings only: exit 0, but the diagnostic is printed
    let stdout = project.hk().args(&["validate-config"]).passes();
    assert!(stdout.contains("unknown-key"), "{stdout}");
}

#[test]
fn generate_playbook_lists_builtin_checks() {
    let project = Project::empty();
    let stdout = project.hk().args(&["generate-playbook"]).passes();

    assert!(stdout.starts_with("# Hooks Acceptance Playbook"), "{stdout}");
    assert!(stdout.contains("`block-dangerous-bash`"), "{stdout}");
    assert!(stdout.contains("Expect decision: `deny`"), "{stdout}");
}

#[test]
fn self_test_passes_on_a_clean_project() {
    let project = Project::empty();
    let stdout = project.hk().args(&["self-test"]).passes();
    assert!(stdout.contains("self-test OK"), "{stdout}");
}

#[test]
fn self_test_fails_on_config_errors() {
    let project = Project::empty();
    project.config("handlers:\n  PreToolUse:\n    block-dangerous-bash: { priority: 99 }\n");

    let stdout = project.hk().args(&["self-test"]).fails_with(1);
    assert!(stdout.contains("FAILED"), "{stdout}");
}

#[test]
fn usage_errors_exit_two() {
    let project = Project::empty();
    let output = project.hk().args(&["no-such-command"]).run();
    assert_eq!(output.status.code(), Some(2));
}
