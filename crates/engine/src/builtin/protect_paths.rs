// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal guard against edits to protected paths.

use serde_json::{Map, Value};

use hk_core::{
    AcceptanceTest, DecisionKind, EventType, Handler, HandlerError, HookEvent, HookResult,
};

/// Tools whose `tool_input.file_path` writes to the filesystem.
const WRITE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Denies file writes under configured path prefixes (default: `.git/`).
pub struct ProtectPaths {
    prefixes: Vec<String>,
}

impl ProtectPaths {
    pub const ID: &'static str = "protect-paths";

    pub fn new(opts: Map<String, Value>) -> Self {
        let prefixes = opts
            .get("paths")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|| vec![".git/".to_string()]);
        ProtectPaths { prefixes }
    }

    fn protected_prefix(&self, path: &str) -> Option<&str> {
        self.prefixes.iter().map(String::as_str).find(|prefix| {
            path.starts_with(prefix) || path.contains(&format!("/{prefix}"))
        })
    }

    fn target_path<'e>(&self, event: &'e HookEvent) -> Option<&'e str> {
        if !WRITE_TOOLS.contains(&event.tool_name()?) {
            return None;
        }
        event.tool_input()?.get("file_path")?.as_str()
    }
}

impl Handler for ProtectPaths {
    fn id(&self) -> &str {
        Self::ID
    }

    fn event_type(&self) -> EventType {
        EventType::PreToolUse
    }

    fn priority(&self) -> u8 {
        15
    }

    fn terminal(&self) -> bool {
        true
    }

    fn tags(&self) -> Vec<String> {
        vec!["files".into(), "safety".into(), "broad".into()]
    }

    fn matches(&self, event: &HookEvent) -> Result<bool, HandlerError> {
        Ok(self
            .target_path(event)
            .is_some_and(|path| self.protected_prefix(path).is_some()))
    }

    fn handle(&self, event: &HookEvent) -> Result<HookResult, HandlerError> {
        let path = self
            .target_path(event)
            .ok_or_else(|| HandlerError::Failed("matched event has no file path".into()))?;
        let prefix = self
            .protected_prefix(path)
            .ok_or_else(|| HandlerError::Failed("matched path no longer protected".into()))?;
        Ok(HookResult::deny(format!(
            "write to protected path {path:?} blocked (protected prefix {prefix:?})"
        )))
    }

    fn acceptance_tests(&self) -> Vec<AcceptanceTest> {
        vec![AcceptanceTest::new(
            "git internals are write-protected",
            "ask the agent to edit `.git/config`",
            "the edit must be denied with the protected prefix in the reason",
            DecisionKind::Deny,
        )
        .with_pattern("protected path")]
    }
}

#[cfg(test)]
#[path = "protect_paths_tests.rs"]
mod tests;
