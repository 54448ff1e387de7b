// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn deny_and_ask_always_carry_a_reason() {
    let deny = Decision::deny("dangerous command");
    assert_eq!(deny.reason(), Some("dangerous command"));
    assert_eq!(deny.kind(), DecisionKind::Deny);

    let ask = Decision::ask("confirm the push");
    assert_eq!(ask.reason(), Some("confirm the push"));
    assert_eq!(ask.kind(), DecisionKind::Ask);

    assert_eq!(Decision::Allow.reason(), None);
    assert!(Decision::Allow.is_allow());
}

#[test]
fn serialization_uses_snake_case_tags() {
    let encoded = serde_json::to_value(Decision::deny("nope")).unwrap();
    assert_eq!(
        encoded,
        serde_json::json!({"decision": "deny", "reason": "nope"})
    );

    let encoded = serde_json::to_value(Decision::Allow).unwrap();
    assert_eq!(encoded, serde_json::json!({"decision": "allow"}));
}

#[test]
fn kind_renders_lowercase_strings() {
    assert_eq!(DecisionKind::Allow.as_str(), "allow");
    assert_eq!(DecisionKind::Deny.as_str(), "deny");
    assert_eq!(DecisionKind::Ask.as_str(), "ask");
}
