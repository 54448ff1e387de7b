// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::bash_event;

fn guard() -> BashGuard {
    BashGuard::new(Map::new())
}

#[yare::parameterized(
    root_wipe = { "rm -rf /" },
    home_wipe = { "sudo rm -rf ~" },
    mkfs = { "mkfs.ext4 /dev/sda1" },
    fork_bomb = { ":(){ :|:& };:" },
    dd_device = { "dd if=/dev/zero of=/dev/sda bs=1M" },
)]
fn destructive_commands_match_and_deny(command: &str) {
    let guard = guard();
    let event = bash_event(command);
    assert!(guard.matches(&event).unwrap());

    let result = guard.handle(&event).unwrap();
    let reason = result.decision.reason().unwrap();
    assert!(reason.contains("destructive command blocked"), "{reason}");
}

#[yare::parameterized(
    list = { "ls -la" },
    scoped_rm = { "rm -rf target/debug" },
    echo = { "echo rm is a command" },
)]
fn ordinary_commands_do_not_match(command: &str) {
    assert!(!guard().matches(&bash_event(command)).unwrap());
}

#[test]
fn non_bash_tools_never_match() {
    let event = crate::test_support::empty_event(EventType::PreToolUse);
    assert!(!guard().matches(&event).unwrap());

    let payload = serde_json::json!({
        "tool_name": "Write",
        "tool_input": { "file_path": "rm -rf /" },
    });
    let event = match payload {
        Value::Object(map) => HookEvent::from_payload(EventType::PreToolUse, map),
        _ => unreachable!(),
    };
    assert!(!guard().matches(&event).unwrap());
}

#[test]
fn bash_without_command_does_not_match() {
    let payload = serde_json::json!({ "tool_name": "Bash", "tool_input": {} });
    let event = match payload {
        Value::Object(map) => HookEvent::from_payload(EventType::PreToolUse, map),
        _ => unreachable!(),
    };
    assert!(!guard().matches(&event).unwrap());
}

#[test]
fn extra_patterns_extend_the_blocklist() {
    let opts = match serde_json::json!({ "extra_patterns": ["git push --force origin main"] }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    let guard = BashGuard::new(opts);
    let event = bash_event("git push --force origin main");
    assert!(guard.matches(&event).unwrap());
    let result = guard.handle(&event).unwrap();
    assert!(!result.decision.is_allow());
}

#[test]
fn contract_fields() {
    let guard = guard();
    assert_eq!(guard.id(), BashGuard::ID);
    assert_eq!(guard.event_type(), EventType::PreToolUse);
    assert_eq!(guard.priority(), 10);
    assert!(guard.terminal());
    assert!(guard.tags().contains(&"safety".to_string()));
    assert!(!guard.acceptance_tests().is_empty());
}
