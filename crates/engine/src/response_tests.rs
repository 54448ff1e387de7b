// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dispatch::DispatchOutcome;
use hk_core::Decision;
use serde_json::json;

fn outcome(decision: Decision, context: &[&str]) -> DispatchOutcome {
    DispatchOutcome {
        decision,
        context: context.iter().map(|s| s.to_string()).collect(),
        updated_input: None,
    }
}

#[test]
fn pre_tool_use_deny_carries_reason() {
    let rendered = render(
        EventType::PreToolUse,
        &outcome(Decision::deny("dangerous"), &[]),
    );
    assert_eq!(
        rendered,
        json!({
            "hookSpecificOutput": {
                "permissionDecision": "deny",
                "permissionDecisionReason": "dangerous",
            }
        })
    );
}

#[test]
fn pre_tool_use_allow_is_minimal() {
    let rendered = render(EventType::PreToolUse, &DispatchOutcome::allow());
    assert_eq!(
        rendered,
        json!({ "hookSpecificOutput": { "permissionDecision": "allow" } })
    );
}

#[test]
fn pre_tool_use_allow_carries_updated_input_and_context() {
    let input = match json!({"command": "echo safe"}) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    let mut outcome = outcome(Decision::Allow, &["note"]);
    outcome.updated_input = Some(input);

    let rendered = render(EventType::PreToolUse, &outcome);
    assert_eq!(
        rendered,
        json!({
            "hookSpecificOutput": {
                "permissionDecision": "allow",
                "updatedInput": { "command": "echo safe" },
                "additionalContext": "note",
            }
        })
    );
}

#[test]
fn context_joins_with_newline_in_order() {
    let rendered = render(
        EventType::SessionStart,
        &outcome(Decision::Allow, &["A", "B"]),
    );
    assert_eq!(
        rendered,
        json!({ "hookSpecificOutput": { "additionalContext": "A\nB" } })
    );
}

#[test]
fn context_only_allow_without_context_is_empty_object() {
    let rendered = render(EventType::Notification, &DispatchOutcome::allow());
    assert_eq!(rendered, json!({}));
}

#[test]
fn context_only_events_drop_blocking_decisions() {
    let rendered = render(
        EventType::SessionEnd,
        &outcome(Decision::deny("nope"), &["bye"]),
    );
    assert_eq!(
        rendered,
        json!({ "hookSpecificOutput": { "additionalContext": "bye" } })
    );
}

#[test]
fn stop_deny_is_bare_block_without_hook_specific_output() {
    let rendered = render(
        EventType::Stop,
        &outcome(Decision::deny("finish task X first"), &[]),
    );
    assert_eq!(
        rendered,
        json!({ "decision": "block", "reason": "finish task X first" })
    );
}

#[test]
fn stop_allow_is_empty_and_context_is_dropped() {
    let rendered = render(EventType::Stop, &outcome(Decision::Allow, &["noise"]));
    assert_eq!(rendered, json!({}));
}

#[test]
fn post_tool_use_deny_maps_to_block_with_context() {
    let rendered = render(
        EventType::PostToolUse,
        &outcome(Decision::deny("bad output"), &["check the file"]),
    );
    assert_eq!(
        rendered,
        json!({
            "decision": "block",
            "reason": "bad output",
            "hookSpecificOutput": { "additionalContext": "check the file" },
        })
    );
}

#[test]
fn user_prompt_submit_allow_with_context() {
    let rendered = render(
        EventType::UserPromptSubmit,
        &outcome(Decision::Allow, &["reminder"]),
    );
    assert_eq!(
        rendered,
        json!({ "hookSpecificOutput": { "additionalContext": "reminder" } })
    );
}

#[test]
fn permission_request_allow_and_deny_shapes() {
    let rendered = render(EventType::PermissionRequest, &DispatchOutcome::allow());
    assert_eq!(
        rendered,
        json!({ "hookSpecificOutput": { "decision": { "behavior": "allow" } } })
    );

    let rendered = render(
        EventType::PermissionRequest,
        &outcome(Decision::deny("not now"), &[]),
    );
    assert_eq!(
        rendered,
        json!({
            "hookSpecificOutput": {
                "decision": {
                    "behavior": "deny",
                    "message": "not now",
                    "interrupt": false,
                }
            }
        })
    );
}

#[test]
fn ask_degrades_to_deny_on_permission_request() {
    let rendered = render(
        EventType::PermissionRequest,
        &outcome(Decision::ask("are you sure"), &[]),
    );
    assert_eq!(
        rendered["hookSpecificOutput"]["decision"]["behavior"],
        json!("deny")
    );
}

#[test]
fn ask_renders_as_ask_on_pre_tool_use() {
    let rendered = render(
        EventType::PreToolUse,
        &outcome(Decision::ask("confirm the push"), &[]),
    );
    assert_eq!(
        rendered,
        json!({
            "hookSpecificOutput": {
                "permissionDecision": "ask",
                "permissionDecisionReason": "confirm the push",
            }
        })
    );
}

#[test]
fn every_canonical_allow_validates() {
    for event in EventType::ALL {
        let rendered = render(event, &DispatchOutcome::allow());
        assert_eq!(
            validate(event, &rendered),
            Ok(()),
            "canonical allow for {event} failed validation: {rendered}"
        );
    }
}

#[test]
fn every_deny_render_validates_for_its_event() {
    for event in EventType::ALL {
        let rendered = render(event, &outcome(Decision::deny("because"), &["ctx"]));
        assert_eq!(
            validate(event, &rendered),
            Ok(()),
            "deny render for {event} failed validation: {rendered}"
        );
    }
}

#[test]
fn validator_rejects_foreign_top_level_keys() {
    let err = validate(
        EventType::Stop,
        &json!({ "decision": "block", "reason": "x", "hookSpecificOutput": {} }),
    )
    .unwrap_err();
    assert!(err.contains("hookSpecificOutput"), "{err}");

    let err = validate(EventType::PreToolUse, &json!({ "decision": "block" })).unwrap_err();
    assert!(err.contains("unexpected top-level key"), "{err}");
}

#[test]
fn validator_rejects_block_without_reason() {
    let err = validate(EventType::Stop, &json!({ "decision": "block" })).unwrap_err();
    assert!(err.contains("reason"), "{err}");
}

#[test]
fn validator_rejects_deny_without_reason_key() {
    let err = validate(
        EventType::PreToolUse,
        &json!({ "hookSpecificOutput": { "permissionDecision": "deny" } }),
    )
    .unwrap_err();
    assert!(err.contains("permissionDecisionReason"), "{err}");
}
