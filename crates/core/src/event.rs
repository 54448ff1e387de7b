// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook events delivered by the host tool.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle point at which the host invokes a hook.
///
/// The set is closed: the host only ever sends these twelve names, spelled
/// exactly as the variants serialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    PreToolUse,
    PostToolUse,
    PostToolUseFailure,
    SessionStart,
    SessionEnd,
    UserPromptSubmit,
    Stop,
    SubagentStart,
    SubagentStop,
    PreCompact,
    Notification,
    PermissionRequest,
}

impl EventType {
    /// All event types, in a stable display order.
    pub const ALL: [EventType; 12] = [
        EventType::PreToolUse,
        EventType::PostToolUse,
        EventType::PostToolUseFailure,
        EventType::SessionStart,
        EventType::SessionEnd,
        EventType::UserPromptSubmit,
        EventType::Stop,
        EventType::SubagentStart,
        EventType::SubagentStop,
        EventType::PreCompact,
        EventType::Notification,
        EventType::PermissionRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PreToolUse => "PreToolUse",
            EventType::PostToolUse => "PostToolUse",
            EventType::PostToolUseFailure => "PostToolUseFailure",
            EventType::SessionStart => "SessionStart",
            EventType::SessionEnd => "SessionEnd",
            EventType::UserPromptSubmit => "UserPromptSubmit",
            EventType::Stop => "Stop",
            EventType::SubagentStart => "SubagentStart",
            EventType::SubagentStop => "SubagentStop",
            EventType::PreCompact => "PreCompact",
            EventType::Notification => "Notification",
            EventType::PermissionRequest => "PermissionRequest",
        }
    }

    /// Whether a handler's `updated_input` may flow through for this event.
    ///
    /// Only `PreToolUse` responses carry a transformed tool input; every
    /// other event discards it.
    pub fn allows_updated_input(&self) -> bool {
        matches!(self, EventType::PreToolUse)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized event names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .iter()
            .find(|e| e.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// One event as received from the host, immutable for the life of a request.
///
/// The common fields are lifted out of the payload at construction so
/// handlers can read them without string-key plumbing; the payload itself is
/// kept verbatim because its schema varies per event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookEvent {
    pub event_type: EventType,
    pub payload: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_mode: Option<String>,
}

impl HookEvent {
    /// Build an event from the raw wire payload, lifting the common fields.
    pub fn from_payload(event_type: EventType, payload: Map<String, Value>) -> Self {
        let str_of = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .map(|s| s.to_string())
        };
        HookEvent {
            session_id: str_of("session_id"),
            transcript_path: str_of("transcript_path").map(PathBuf::from),
            cwd: str_of("cwd").map(PathBuf::from),
            permission_mode: str_of("permission_mode"),
            event_type,
            payload,
        }
    }

    /// Copy of this event with the payload replaced.
    ///
    /// Used when an earlier handler produced an `updated_input`: later
    /// handlers in the chain observe the transformed payload.
    pub fn with_payload(&self, payload: Map<String, Value>) -> Self {
        HookEvent {
            payload,
            ..self.clone()
        }
    }

    /// String field of the payload, if present.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Name of the tool for tool events (`PreToolUse`, `PostToolUse`, ...).
    pub fn tool_name(&self) -> Option<&str> {
        self.payload_str("tool_name")
    }

    /// The `tool_input` object for tool events.
    pub fn tool_input(&self) -> Option<&Map<String, Value>> {
        self.payload.get("tool_input").and_then(Value::as_object)
    }

    /// The shell command for Bash tool events.
    pub fn command(&self) -> Option<&str> {
        self.tool_input()?.get("command")?.as_str()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
