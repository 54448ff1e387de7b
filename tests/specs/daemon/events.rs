//! End-to-end event dispatch specs through a live daemon.

use crate::prelude::*;
use serial_test::serial;

/// A plugin executable declaring one terminal allow handler, one broken
/// handler, one echo handler, and one Stop handler. `describe` emits the
/// manifests for whatever event directory the file sits in; `handle`
/// branches on the handler id.
const MULTI_PLUGIN: &str = r#"#!/bin/sh
case "$1" in
  describe)
    cat <<'EOF'
[
  {
    "id": "fast-pass",
    "priority": 5,
    "terminal": true,
    "matches": [{ "rule": "command_contains", "substring": "rm -rf /" }],
    "acceptance_tests": [
      { "title": "fast pass", "command": "run rm -rf /", "description": "pre-approved", "expected_decision": "allow" }
    ]
  }
]
EOF
    ;;
  handle)
    cat >/dev/null
    echo '{ "decision": "allow" }'
    ;;
esac
"#;

const POST_TOOL_PLUGIN: &str = r#"#!/bin/sh
case "$1" in
  describe)
    cat <<'EOF'
[
  {
    "id": "broken-check",
    "priority": 20,
    "acceptance_tests": [
      { "title": "broken", "command": "any", "description": "always fails", "expected_decision": "allow" }
    ]
  },
  {
    "id": "echo-ok",
    "priority": 30,
    "acceptance_tests": [
      { "title": "echo", "command": "any", "description": "adds ok", "expected_decision": "allow" }
    ]
  }
]
EOF
    ;;
  handle)
    cat >/dev/null
    if [ "$2" = "broken-check" ]; then
      exit 1
    fi
    echo '{ "decision": "allow", "context": ["ok"] }'
    ;;
esac
"#;

const STOP_PLUGIN: &str = r#"#!/bin/sh
case "$1" in
  describe)
    cat <<'EOF'
[
  {
    "id": "finish-first",
    "priority": 10,
    "terminal": true,
    "acceptance_tests": [
      { "title": "stop gate", "command": "stop early", "description": "must block", "expected_decision": "deny" }
    ]
  }
]
EOF
    ;;
  handle)
    cat >/dev/null
    echo '{ "decision": "deny", "reason": "finish task X first" }'
    ;;
esac
"#;

#[test]
#[serial]
fn dangerous_pre_tool_use_is_denied() {
    let project = Project::empty();
    let _daemon = project.daemon();

    let response = forward_event(
        &project,
        "PreToolUse",
        r#"{"tool_name":"Bash","tool_input":{"command":"rm -rf /"}}"#,
    );

    assert_eq!(response["hookSpecificOutput"]["permissionDecision"], "deny");
    let reason = response["hookSpecificOutput"]["permissionDecisionReason"]
        .as_str()
        .unwrap();
    assert!(reason.contains("destructive command blocked"), "{reason}");
}

#[test]
#[serial]
fn session_start_accumulates_context_in_order() {
    let project = Project::empty();
    project.config(
        "daemon:\n  project_languages: [rust]\nhandlers:\n  SessionStart:\n    session-context:\n      notes: [\"Run the linter before finishing.\"]\n",
    );
    let _daemon = project.daemon();

    let response = forward_event(&project, "SessionStart", r#"{"source":"startup"}"#);

    let context = response["hookSpecificOutput"]["additionalContext"]
        .as_str()
        .unwrap();
    assert_eq!(
        context,
        "Project languages: rust.\nRun the linter before finishing."
    );
}

#[test]
#[serial]
fn handler_failure_is_contained_and_later_context_survives() {
    let project = Project::empty();
    project.executable(
        ".claude/project-handlers/PostToolUse/quality-gates",
        POST_TOOL_PLUGIN,
    );
    let _daemon = project.daemon();

    let response = forward_event(
        &project,
        "PostToolUse",
        r#"{"tool_name":"Bash","tool_input":{"command":"ls"},"tool_response":{"output":"fine"}}"#,
    );

    assert!(
        response.get("decision").is_none(),
        "an internal failure must never block: {response}"
    );
    let context = response["hookSpecificOutput"]["additionalContext"]
        .as_str()
        .unwrap();
    let lines: Vec<&str> = context.lines().collect();
    assert!(
        lines[0].contains("broken-check") && lines[0].contains("failed internally"),
        "{context}"
    );
    assert_eq!(*lines.last().unwrap(), "ok", "{context}");
}

#[test]
#[serial]
fn terminal_allow_short_circuits_the_builtin_guard() {
    let project = Project::empty();
    project.executable(
        ".claude/project-handlers/PreToolUse/fast-pass",
        MULTI_PLUGIN,
    );
    let _daemon = project.daemon();

    // The plugin (priority 5, terminal allow) runs before the builtin
    // bash guard (priority 10); the guard must never be consulted.
    let response = forward_event(
        &project,
        "PreToolUse",
        r#"{"tool_name":"Bash","tool_input":{"command":"rm -rf /"}}"#,
    );

    assert_eq!(
        response["hookSpecificOutput"]["permissionDecision"],
        "allow",
        "{response}"
    );
}

#[test]
#[serial]
fn stop_deny_has_the_bare_block_shape() {
    let project = Project::empty();
    project.executable(".claude/project-handlers/Stop/finish-first", STOP_PLUGIN);
    let _daemon = project.daemon();

    let response = forward_event(&project, "Stop", r#"{"stop_hook_active":false}"#);

    assert_eq!(
        response,
        serde_json::json!({ "decision": "block", "reason": "finish task X first" })
    );
}

#[test]
#[serial]
fn no_matching_handlers_yields_canonical_allow() {
    let project = Project::empty();
    let _daemon = project.daemon();

    let response = forward_event(
        &project,
        "PreToolUse",
        r#"{"tool_name":"Bash","tool_input":{"command":"echo hello"}}"#,
    );
    assert_eq!(
        response,
        serde_json::json!({ "hookSpecificOutput": { "permissionDecision": "allow" } })
    );

    let response = forward_event(&project, "Notification", r#"{"message":"hi"}"#);
    assert_eq!(response, serde_json::json!({}));
}
