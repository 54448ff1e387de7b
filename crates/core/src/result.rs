// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What a handler returns for one event.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::decision::Decision;

/// A single handler's contribution to the response.
///
/// `context` lines are advisory text accumulated across the chain;
/// `updated_input` is a transformed tool payload that only `PreToolUse`
/// events honor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookResult {
    #[serde(flatten)]
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_input: Option<Map<String, Value>>,
}

impl HookResult {
    pub fn allow() -> Self {
        HookResult {
            decision: Decision::Allow,
            context: Vec::new(),
            updated_input: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        HookResult {
            decision: Decision::deny(reason),
            context: Vec::new(),
            updated_input: None,
        }
    }

    pub fn ask(reason: impl Into<String>) -> Self {
        HookResult {
            decision: Decision::ask(reason),
            context: Vec::new(),
            updated_input: None,
        }
    }

    pub fn with_context(mut self, line: impl Into<String>) -> Self {
        self.context.push(line.into());
        self
    }

    pub fn with_updated_input(mut self, input: Map<String, Value>) -> Self {
        self.updated_input = Some(input);
        self
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
