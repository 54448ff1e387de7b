// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn allow_builder_starts_empty() {
    let result = HookResult::allow();
    assert!(result.decision.is_allow());
    assert!(result.context.is_empty());
    assert!(result.updated_input.is_none());
}

#[test]
fn context_lines_accumulate_in_order() {
    let result = HookResult::allow()
        .with_context("first")
        .with_context("second");
    assert_eq!(result.context, vec!["first", "second"]);
}

#[test]
fn deny_serializes_with_flattened_decision() {
    let result = HookResult::deny("blocked").with_context("details");
    let encoded = serde_json::to_value(&result).unwrap();
    assert_eq!(
        encoded,
        json!({
            "decision": "deny",
            "reason": "blocked",
            "context": ["details"],
        })
    );
}

#[test]
fn updated_input_round_trips() {
    let input = match json!({"command": "echo safe"}) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    let result = HookResult::allow().with_updated_input(input.clone());

    let encoded = serde_json::to_string(&result).unwrap();
    let decoded: HookResult = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.updated_input, Some(input));
}
