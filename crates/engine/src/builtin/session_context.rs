// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-start context injection.

use serde_json::{Map, Value};

use hk_core::{
    AcceptanceTest, DecisionKind, EventType, Handler, HandlerError, HookEvent, HookResult,
};

/// Injects project languages and configured workflow notes at the start of
/// every session. Matches only when it has something to say.
pub struct SessionContext {
    languages: Vec<String>,
    notes: Vec<String>,
}

impl SessionContext {
    pub const ID: &'static str = "session-context";

    pub fn new(opts: Map<String, Value>, languages: Vec<String>) -> Self {
        let notes = opts
            .get("notes")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        SessionContext { languages, notes }
    }
}

impl Handler for SessionContext {
    fn id(&self) -> &str {
        Self::ID
    }

    fn event_type(&self) -> EventType {
        EventType::SessionStart
    }

    fn priority(&self) -> u8 {
        40
    }

    fn tags(&self) -> Vec<String> {
        vec!["workflow".into(), "broad".into()]
    }

    fn matches(&self, _event: &HookEvent) -> Result<bool, HandlerError> {
        Ok(!self.languages.is_empty() || !self.notes.is_empty())
    }

    fn handle(&self, _event: &HookEvent) -> Result<HookResult, HandlerError> {
        let mut result = HookResult::allow();
        if !self.languages.is_empty() {
            result = result.with_context(format!(
                "Project languages: {}.",
                self.languages.join(", ")
            ));
        }
        for note in &self.notes {
            result = result.with_context(note.clone());
        }
        Ok(result)
    }

    fn acceptance_tests(&self) -> Vec<AcceptanceTest> {
        vec![AcceptanceTest::new(
            "languages appear at session start",
            "start a new session with `daemon.project_languages` configured",
            "the session-start context must list the configured languages",
            DecisionKind::Allow,
        )
        .with_pattern("Project languages")
        .advisory()]
    }
}

#[cfg(test)]
#[path = "session_context_tests.rs"]
mod tests;
