// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory scan for credential-shaped strings in tool traffic.

use serde_json::Value;

use hk_core::{
    AcceptanceTest, DecisionKind, EventType, Handler, HandlerError, HookEvent, HookResult,
};

/// Appends advisory context when a tool's input or response contains
/// something that looks like a credential. Non-terminal: it informs, the
/// operator decides.
pub struct SecretScan;

impl SecretScan {
    pub const ID: &'static str = "secret-scan";

    pub fn new() -> Self {
        SecretScan
    }

    fn findings(event: &HookEvent) -> Vec<&'static str> {
        let mut haystacks: Vec<&str> = Vec::new();
        if let Some(input) = event.tool_input() {
            haystacks.extend(input.values().filter_map(Value::as_str));
        }
        if let Some(response) = event.payload.get("tool_response") {
            collect_strings(response, &mut haystacks);
        }

        let mut found = Vec::new();
        for text in haystacks {
            if text.contains("-----BEGIN") && text.contains("PRIVATE KEY-----") {
                found.push("a PEM private key block");
            }
            if find_token(text, "AKIA", 16, |c: char| c.is_ascii_uppercase() || c.is_ascii_digit())
            {
                found.push("an AWS access key id");
            }
            if find_token(text, "ghp_", 36, |c: char| c.is_ascii_alphanumeric()) {
                found.push("a GitHub personal access token");
            }
            if find_token(text, "sk-ant-", 24, |c: char| {
                c.is_ascii_alphanumeric() || c == '-' || c == '_'
            }) {
                found.push("an Anthropic API key");
            }
        }
        found.sort_unstable();
        found.dedup();
        found
    }
}

impl Default for SecretScan {
    fn default() -> Self {
        Self::new()
    }
}

/// True when `prefix` occurs followed by at least `len` chars of `charset`.
fn find_token(text: &str, prefix: &str, len: usize, charset: impl Fn(char) -> bool) -> bool {
    let mut rest = text;
    while let Some(pos) = rest.find(prefix) {
        let tail = &rest[pos + prefix.len()..];
        if tail.chars().take_while(|c| charset(*c)).count() >= len {
            return true;
        }
        rest = &rest[pos + prefix.len()..];
    }
    false
}

fn collect_strings<'v>(value: &'v Value, out: &mut Vec<&'v str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

impl Handler for SecretScan {
    fn id(&self) -> &str {
        Self::ID
    }

    fn event_type(&self) -> EventType {
        EventType::PostToolUse
    }

    fn priority(&self) -> u8 {
        30
    }

    fn tags(&self) -> Vec<String> {
        vec!["files".into(), "security".into(), "narrow".into()]
    }

    fn matches(&self, event: &HookEvent) -> Result<bool, HandlerError> {
        Ok(!Self::findings(event).is_empty())
    }

    fn handle(&self, event: &HookEvent) -> Result<HookResult, HandlerError> {
        let mut result = HookResult::allow();
        for finding in Self::findings(event) {
            result = result.with_context(format!(
                "secret-scan: tool traffic contains {finding}; make sure it is not committed \
                 or echoed into logs"
            ));
        }
        Ok(result)
    }

    fn acceptance_tests(&self) -> Vec<AcceptanceTest> {
        vec![AcceptanceTest::new(
            "private key material is flagged",
            "cat a file containing a PEM private key",
            "the response context must mention the private key finding",
            DecisionKind::Allow,
        )
        .with_pattern("PEM private key")
        .advisory()]
    }
}

#[cfg(test)]
#[path = "secret_scan_tests.rs"]
mod tests;
