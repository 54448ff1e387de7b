// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler-declared acceptance tests.
//!
//! Every handler describes how a human (or the self-test command) can verify
//! it end to end. The playbook generator collects these into an ephemeral
//! markdown document.

use serde::{Deserialize, Serialize};

use crate::decision::DecisionKind;
use crate::event::EventType;

/// How strictly a failed acceptance test should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    /// The handler must produce the expected decision.
    #[default]
    Blocking,
    /// The handler adds context; absence is a quality issue, not a failure.
    Advisory,
}

/// One manual verification step declared by a handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceTest {
    pub title: String,
    /// Command (or action) the tester performs in a session.
    pub command: String,
    pub description: String,
    pub expected_decision: DecisionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected_message_patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_notes: Option<String>,
    #[serde(default)]
    pub test_type: TestType,
    /// Event the tester must trigger when it is not obvious from the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_event: Option<EventType>,
}

impl AcceptanceTest {
    pub fn new(
        title: impl Into<String>,
        command: impl Into<String>,
        description: impl Into<String>,
        expected_decision: DecisionKind,
    ) -> Self {
        AcceptanceTest {
            title: title.into(),
            command: command.into(),
            description: description.into(),
            expected_decision,
            expected_message_patterns: Vec::new(),
            safety_notes: None,
            test_type: TestType::default(),
            requires_event: None,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.expected_message_patterns.push(pattern.into());
        self
    }

    pub fn with_safety_notes(mut self, notes: impl Into<String>) -> Self {
        self.safety_notes = Some(notes.into());
        self
    }

    pub fn advisory(mut self) -> Self {
        self.test_type = TestType::Advisory;
        self
    }
}
