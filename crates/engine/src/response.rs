// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event-aware response rendering.
//!
//! The host rejects responses that do not match the schema for the event
//! that produced them, so every shape here is built key by key, with no
//! serialize-a-superset shortcuts and no extra keys. Three families exist:
//!
//! * permission shapes (`PreToolUse`, `PermissionRequest`) that carry the
//!   decision explicitly,
//! * block-capable shapes (`PostToolUse`, `UserPromptSubmit`, `Stop`,
//!   `SubagentStop`) where a deny maps to `decision: "block"`,
//! * context-only shapes (everything else) that can only attach
//!   `additionalContext`.

use serde_json::{json, Map, Value};
use tracing::warn;

use hk_core::{Decision, EventType};

use crate::dispatch::DispatchOutcome;

/// Shape family for one event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// `hookSpecificOutput.permissionDecision` allow/deny/ask.
    Permission,
    /// `hookSpecificOutput.decision.behavior` allow/deny.
    PermissionRequest,
    /// Optional `decision: "block"` plus optional context block.
    Block,
    /// Optional `decision: "block"`, no `hookSpecificOutput` at all.
    BlockBare,
    /// Only `hookSpecificOutput.additionalContext`.
    ContextOnly,
}

fn shape_of(event_type: EventType) -> Shape {
    match event_type {
        EventType::PreToolUse => Shape::Permission,
        EventType::PermissionRequest => Shape::PermissionRequest,
        EventType::PostToolUse | EventType::UserPromptSubmit => Shape::Block,
        EventType::Stop | EventType::SubagentStop => Shape::BlockBare,
        EventType::PostToolUseFailure
        | EventType::SessionStart
        | EventType::SessionEnd
        | EventType::SubagentStart
        | EventType::PreCompact
        | EventType::Notification => Shape::ContextOnly,
    }
}

/// Render a dispatch outcome into the exact response for its event type.
pub fn render(event_type: EventType, outcome: &DispatchOutcome) -> Value {
    let context = join_context(&outcome.context);

    match shape_of(event_type) {
        Shape::Permission => {
            let mut inner = Map::new();
            inner.insert(
                "permissionDecision".into(),
                json!(outcome.decision.kind().as_str()),
            );
            if let Some(reason) = outcome.decision.reason() {
                inner.insert("permissionDecisionReason".into(), json!(reason));
            }
            if let Some(input) = &outcome.updated_input {
                if outcome.decision.is_allow() {
                    inner.insert("updatedInput".into(), Value::Object(input.clone()));
                }
            }
            if let Some(context) = context {
                inner.insert("additionalContext".into(), json!(context));
            }
            json!({ "hookSpecificOutput": inner })
        }

        Shape::PermissionRequest => {
            let mut decision = Map::new();
            match &outcome.decision {
                Decision::Allow => {
                    decision.insert("behavior".into(), json!("allow"));
                }
                Decision::Deny { reason } | Decision::Ask { reason } => {
                    // The shape has no ask slot; asking degrades to deny.
                    decision.insert("behavior".into(), json!("deny"));
                    decision.insert("message".into(), json!(reason));
                    decision.insert("interrupt".into(), json!(false));
                }
            }
            json!({ "hookSpecificOutput": { "decision": decision } })
        }

        Shape::Block => {
            let mut top = Map::new();
            if let Some(reason) = outcome.decision.reason() {
                top.insert("decision".into(), json!("block"));
                top.insert("reason".into(), json!(reason));
            }
            if let Some(context) = context {
                top.insert(
                    "hookSpecificOutput".into(),
                    json!({ "additionalContext": context }),
                );
            }
            Value::Object(top)
        }

        Shape::BlockBare => {
            if !outcome.context.is_empty() {
                warn!(
                    event = %event_type,
                    "context has no slot in this event's response; dropped"
                );
            }
            let mut top = Map::new();
            if let Some(reason) = outcome.decision.reason() {
                top.insert("decision".into(), json!("block"));
                top.insert("reason".into(), json!(reason));
            }
            Value::Object(top)
        }

        Shape::ContextOnly => {
            if !outcome.decision.is_allow() {
                warn!(
                    event = %event_type,
                    decision = outcome.decision.kind().as_str(),
                    "blocking decision on a context-only event; dropped (handler misconfiguration)"
                );
            }
            let mut top = Map::new();
            if let Some(context) = context {
                top.insert(
                    "hookSpecificOutput".into(),
                    json!({ "additionalContext": context }),
                );
            }
            Value::Object(top)
        }
    }
}

/// Context entries join with a newline, order preserved.
fn join_context(context: &[String]) -> Option<String> {
    (!context.is_empty()).then(|| context.join("\n"))
}

/// Structural check of a rendered response against its event's shape.
///
/// Best-effort guard used by test builds and `HK_VALIDATE_RESPONSES=1`;
/// violations are logged, never propagated. A malformed response still
/// beats no response.
pub fn validate(event_type: EventType, response: &Value) -> Result<(), String> {
    let Some(top) = response.as_object() else {
        return Err("response is not a JSON object".to_string());
    };

    let allowed_top: &[&str] = match shape_of(event_type) {
        Shape::Permission | Shape::PermissionRequest | Shape::ContextOnly => {
            &["hookSpecificOutput"]
        }
        Shape::Block => &["decision", "reason", "hookSpecificOutput"],
        Shape::BlockBare => &["decision", "reason"],
    };
    for key in top.keys() {
        if !allowed_top.contains(&key.as_str()) {
            return Err(format!("unexpected top-level key {key:?} for {event_type}"));
        }
    }

    if let Some(decision) = top.get("decision") {
        if decision != "block" {
            return Err(format!("decision must be \"block\", got {decision}"));
        }
        if !top.get("reason").is_some_and(Value::is_string) {
            return Err("block decision without a string reason".to_string());
        }
    }

    let Some(hso) = top.get("hookSpecificOutput") else {
        return Ok(());
    };
    let Some(hso) = hso.as_object() else {
        return Err("hookSpecificOutput is not an object".to_string());
    };

    let allowed_inner: &[&str] = match shape_of(event_type) {
        Shape::Permission => &[
            "permissionDecision",
            "permissionDecisionReason",
            "updatedInput",
            "additionalContext",
        ],
        Shape::PermissionRequest => &["decision"],
        Shape::Block | Shape::ContextOnly => &["additionalContext"],
        Shape::BlockBare => {
            return Err(format!("{event_type} responses must not carry hookSpecificOutput"));
        }
    };
    for key in hso.keys() {
        if !allowed_inner.contains(&key.as_str()) {
            return Err(format!(
                "unexpected hookSpecificOutput key {key:?} for {event_type}"
            ));
        }
    }

    if shape_of(event_type) == Shape::Permission {
        let decision = hso
            .get("permissionDecision")
            .and_then(Value::as_str)
            .ok_or_else(|| "missing permissionDecision".to_string())?;
        if !["allow", "deny", "ask"].contains(&decision) {
            return Err(format!("invalid permissionDecision {decision:?}"));
        }
        if decision != "allow" && !hso.contains_key("permissionDecisionReason") {
            return Err(format!("{decision} without permissionDecisionReason"));
        }
    }

    if shape_of(event_type) == Shape::PermissionRequest {
        let behavior = hso
            .get("decision")
            .and_then(|d| d.get("behavior"))
            .and_then(Value::as_str)
            .ok_or_else(|| "missing decision.behavior".to_string())?;
        if !["allow", "deny"].contains(&behavior) {
            return Err(format!("invalid decision.behavior {behavior:?}"));
        }
    }

    Ok(())
}

/// Whether response validation is active for this process.
pub fn validation_enabled() -> bool {
    cfg!(debug_assertions) || std::env::var_os("HK_VALIDATE_RESPONSES").is_some()
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
