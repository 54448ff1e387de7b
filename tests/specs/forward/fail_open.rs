//! Forwarder fail-open specs.
//!
//! The forwarder's contract is the reason a crashed daemon never blocks
//! the host: any failure yields `{}` on stdout and exit code 0.

use crate::prelude::*;

#[test]
fn no_daemon_yields_empty_object_and_exit_zero() {
    let project = Project::empty();

    let output = project
        .hk()
        .args(&["forward", "PreToolUse"])
        .stdin(r#"{"tool_name":"Bash","tool_input":{"command":"ls"}}"#)
        .run();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "{}\n");
    assert!(
        !output.stderr.is_empty(),
        "the failure reason belongs on stderr"
    );
}

#[test]
fn garbage_stdin_still_fails_open() {
    let project = Project::empty();

    let output = project
        .hk()
        .args(&["forward", "PreToolUse"])
        .stdin("this is not json")
        .run();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "{}\n");
}

#[test]
fn missing_event_type_fails_open() {
    let project = Project::empty();

    let output = project
        .hk()
        .args(&["forward"])
        .stdin(r#"{"tool_name":"Bash"}"#)
        .run();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "{}\n");
}

#[test]
fn event_type_can_come_from_the_payload() {
    let project = Project::empty();

    // No daemon: still fail-open, but the missing-daemon path is reached
    // (event type resolution succeeded)
    let output = project
        .hk()
        .args(&["forward"])
        .stdin(r#"{"hook_event_name":"SessionStart","source":"startup"}"#)
        .run();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "{}\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no daemon"), "{stderr}");
}

#[test]
fn outside_a_project_fails_open() {
    let dir = tempfile::tempdir().unwrap();

    let output = CliBuilder::new()
        .pwd(dir.path())
        .args(&["forward", "PreToolUse"])
        .stdin("{}")
        .run();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "{}\n");
}
