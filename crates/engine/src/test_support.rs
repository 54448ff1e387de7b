// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler fakes for engine and daemon tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use hk_core::{
    AcceptanceTest, DecisionKind, EventType, Handler, HandlerError, HookEvent, HookResult,
};

/// What a [`FakeHandler`] does when invoked.
#[derive(Clone)]
pub enum FakeBehavior {
    /// Allow, appending these context lines.
    Allow(Vec<String>),
    /// Allow with a replaced tool input.
    AllowWithInput(Map<String, Value>),
    Deny(String),
    Ask(String),
    /// `matches` fails.
    FailMatch,
    /// `matches` succeeds, `handle` fails.
    FailHandle(String),
    /// `matches` returns false.
    NoMatch,
}

/// Scriptable handler recording its invocations into a shared log.
pub struct FakeHandler {
    pub id: String,
    pub event_type: EventType,
    pub priority: u8,
    pub terminal: bool,
    pub tags: Vec<String>,
    pub behavior: FakeBehavior,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl FakeHandler {
    pub fn new(id: &str, event_type: EventType, behavior: FakeBehavior) -> Self {
        FakeHandler {
            id: id.to_string(),
            event_type,
            priority: hk_core::DEFAULT_PRIORITY,
            terminal: false,
            tags: Vec::new(),
            behavior,
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Share one call log across several handlers to assert ordering.
    pub fn log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.log = log;
        self
    }

    pub fn into_arc(self) -> Arc<dyn Handler> {
        Arc::new(self)
    }
}

impl Handler for FakeHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn priority(&self) -> u8 {
        self.priority
    }

    fn terminal(&self) -> bool {
        self.terminal
    }

    fn tags(&self) -> Vec<String> {
        self.tags.clone()
    }

    fn matches(&self, _event: &HookEvent) -> Result<bool, HandlerError> {
        self.log.lock().push(format!("match:{}", self.id));
        match &self.behavior {
            FakeBehavior::FailMatch => Err(HandlerError::Failed("match exploded".into())),
            FakeBehavior::NoMatch => Ok(false),
            _ => Ok(true),
        }
    }

    fn handle(&self, _event: &HookEvent) -> Result<HookResult, HandlerError> {
        self.log.lock().push(format!("handle:{}", self.id));
        match &self.behavior {
            FakeBehavior::Allow(context) => {
                let mut result = HookResult::allow();
                for line in context {
                    result = result.with_context(line.clone());
                }
                Ok(result)
            }
            FakeBehavior::AllowWithInput(input) => {
                Ok(HookResult::allow().with_updated_input(input.clone()))
            }
            FakeBehavior::Deny(reason) => Ok(HookResult::deny(reason.clone())),
            FakeBehavior::Ask(reason) => Ok(HookResult::ask(reason.clone())),
            FakeBehavior::FailHandle(cause) => Err(HandlerError::Failed(cause.clone())),
            FakeBehavior::FailMatch | FakeBehavior::NoMatch => {
                Err(HandlerError::Failed("handle called without a match".into()))
            }
        }
    }

    fn acceptance_tests(&self) -> Vec<AcceptanceTest> {
        vec![AcceptanceTest::new(
            format!("{} smoke", self.id),
            "trigger the event",
            "fake handler for tests",
            DecisionKind::Allow,
        )]
    }
}

/// Event helper: a `PreToolUse` Bash invocation.
pub fn bash_event(command: &str) -> HookEvent {
    let payload = serde_json::json!({
        "tool_name": "Bash",
        "tool_input": { "command": command },
        "session_id": "ses-test",
    });
    match payload {
        Value::Object(map) => HookEvent::from_payload(EventType::PreToolUse, map),
        _ => unreachable!(),
    }
}

/// Event helper: an arbitrary event with an empty payload.
pub fn empty_event(event_type: EventType) -> HookEvent {
    HookEvent::from_payload(event_type, Map::new())
}
