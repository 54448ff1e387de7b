// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal guard against destructive shell commands.

use serde_json::{Map, Value};

use hk_core::{
    AcceptanceTest, DecisionKind, EventType, Handler, HandlerError, HookEvent, HookResult,
};

/// Command fragments that are destructive in essentially every context.
const DANGEROUS_FRAGMENTS: &[&str] = &[
    "rm -rf /",
    "rm -rf ~",
    "rm -rf *",
    "rm -fr /",
    "mkfs",
    "dd if=/dev/zero of=/dev/",
    "dd of=/dev/sd",
    ":(){ :|:& };:",
    "> /dev/sda",
    "chmod -R 777 /",
];

/// Denies Bash commands containing a known-destructive fragment.
///
/// Terminal: once a command is recognized as destructive there is nothing a
/// later handler could add.
pub struct BashGuard {
    extra: Vec<String>,
}

impl BashGuard {
    pub const ID: &'static str = "block-dangerous-bash";

    pub fn new(opts: Map<String, Value>) -> Self {
        let extra = opts
            .get("extra_patterns")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        BashGuard { extra }
    }

    fn offending_fragment(&self, command: &str) -> Option<String> {
        DANGEROUS_FRAGMENTS
            .iter()
            .find(|f| command.contains(*f))
            .map(|f| (*f).to_string())
            .or_else(|| {
                self.extra
                    .iter()
                    .find(|f| command.contains(f.as_str()))
                    .cloned()
            })
    }
}

impl Handler for BashGuard {
    fn id(&self) -> &str {
        Self::ID
    }

    fn event_type(&self) -> EventType {
        EventType::PreToolUse
    }

    fn priority(&self) -> u8 {
        10
    }

    fn terminal(&self) -> bool {
        true
    }

    fn tags(&self) -> Vec<String> {
        vec!["bash".into(), "safety".into(), "broad".into()]
    }

    fn matches(&self, event: &HookEvent) -> Result<bool, HandlerError> {
        if event.tool_name() != Some("Bash") {
            return Ok(false);
        }
        let Some(command) = event.command() else {
            return Ok(false);
        };
        Ok(self.offending_fragment(command).is_some())
    }

    fn handle(&self, event: &HookEvent) -> Result<HookResult, HandlerError> {
        let command = event.command().unwrap_or_default();
        let fragment = self
            .offending_fragment(command)
            .ok_or_else(|| HandlerError::Failed("matched command no longer matches".into()))?;
        Ok(HookResult::deny(format!(
            "destructive command blocked: contains {fragment:?}"
        )))
    }

    fn acceptance_tests(&self) -> Vec<AcceptanceTest> {
        vec![
            AcceptanceTest::new(
                "recursive root delete is denied",
                "ask the agent to run `rm -rf /`",
                "the command must be denied before execution with a reason naming the fragment",
                DecisionKind::Deny,
            )
            .with_pattern("destructive command blocked")
            .with_safety_notes("do not run the command outside a sandbox if the hook fails"),
            AcceptanceTest::new(
                "ordinary commands pass",
                "ask the agent to run `ls`",
                "no denial, no context from this handler",
                DecisionKind::Allow,
            ),
        ]
    }
}

#[cfg(test)]
#[path = "bash_guard_tests.rs"]
mod tests;
