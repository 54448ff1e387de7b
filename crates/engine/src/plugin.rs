// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executable plugin handlers.
//!
//! A plugin is a standalone executable speaking a small JSON contract:
//!
//! * `<plugin> describe` prints a JSON array of handler manifests
//!   (id, priority, terminal, tags, match rules, acceptance tests).
//! * `<plugin> handle <id>` reads the event JSON on stdin and prints a
//!   `HookResult` JSON on stdout.
//!
//! Match rules are declared in the manifest and evaluated in-process so the
//! relevance check stays well under a millisecond; only `handle` pays the
//! process-spawn cost, and only for events the handler actually matched.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use hk_core::{
    AcceptanceTest, EventType, Handler, HandlerError, HookEvent, HookResult, DEFAULT_PRIORITY,
};

/// Budget for the one-shot `describe` call at load time.
const DESCRIBE_TIMEOUT: Duration = Duration::from_secs(2);
/// Budget for one `handle` invocation.
const HANDLE_TIMEOUT: Duration = Duration::from_secs(5);
/// Exit-poll interval while waiting on a plugin process.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One handler as declared by a plugin's `describe` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerManifest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default)]
    pub terminal: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// All rules must hold for the handler to match; empty means match-all.
    #[serde(default)]
    pub matches: Vec<MatchRule>,
    #[serde(default)]
    pub acceptance_tests: Vec<AcceptanceTest>,
}

/// Declarative relevance rules, evaluated in-process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum MatchRule {
    /// `payload.tool_name == equals`
    ToolName { equals: String },
    /// Payload string field contains a substring.
    PayloadContains { field: String, substring: String },
    /// Payload string field equals a value.
    PayloadEquals { field: String, equals: String },
    /// `tool_input.command` contains a substring.
    CommandContains { substring: String },
}

impl MatchRule {
    fn holds(&self, event: &HookEvent) -> bool {
        match self {
            MatchRule::ToolName { equals } => event.tool_name() == Some(equals.as_str()),
            MatchRule::PayloadContains { field, substring } => event
                .payload_str(field)
                .is_some_and(|v| v.contains(substring.as_str())),
            MatchRule::PayloadEquals { field, equals } => {
                event.payload_str(field) == Some(equals.as_str())
            }
            MatchRule::CommandContains { substring } => {
                event.command().is_some_and(|c| c.contains(substring.as_str()))
            }
        }
    }
}

/// A handler backed by a plugin executable.
pub struct ExecHandler {
    path: PathBuf,
    event_type: EventType,
    manifest: HandlerManifest,
}

impl Handler for ExecHandler {
    fn id(&self) -> &str {
        &self.manifest.id
    }

    fn event_type(&self) -> EventType {
        self.event_type
    }

    fn priority(&self) -> u8 {
        self.manifest.priority.unwrap_or(DEFAULT_PRIORITY)
    }

    fn terminal(&self) -> bool {
        self.manifest.terminal
    }

    fn tags(&self) -> Vec<String> {
        self.manifest.tags.clone()
    }

    fn matches(&self, event: &HookEvent) -> Result<bool, HandlerError> {
        Ok(self.manifest.matches.iter().all(|r| r.holds(event)))
    }

    fn handle(&self, event: &HookEvent) -> Result<HookResult, HandlerError> {
        let input = serde_json::to_vec(event)?;
        let output = run_with_timeout(
            Command::new(&self.path).args(["handle", &self.manifest.id]),
            Some(&input),
            HANDLE_TIMEOUT,
        )?;
        Ok(serde_json::from_slice(&output)?)
    }

    fn acceptance_tests(&self) -> Vec<AcceptanceTest> {
        self.manifest.acceptance_tests.clone()
    }
}

/// Load a plugin executable's declared handlers for one event type.
pub fn load(path: &Path, event_type: EventType) -> Result<Vec<ExecHandler>, HandlerError> {
    let output = run_with_timeout(Command::new(path).arg("describe"), None, DESCRIBE_TIMEOUT)?;
    let manifests: Vec<HandlerManifest> = serde_json::from_slice(&output)?;
    Ok(manifests
        .into_iter()
        .map(|manifest| ExecHandler {
            path: path.to_path_buf(),
            event_type,
            manifest,
        })
        .collect())
}

/// Run a child process with optional stdin bytes and a hard deadline.
///
/// The child is killed at the deadline; the caller sees a `HandlerError`
/// that the dispatcher contains like any other handler failure. Expected
/// outputs are small (well under the pipe buffer), so stdout is drained
/// after exit.
fn run_with_timeout(
    command: &mut Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
) -> Result<Vec<u8>, HandlerError> {
    use std::io::Write;

    let mut child = command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(bytes) = stdin {
        if let Some(mut pipe) = child.stdin.take() {
            // A plugin that exits without reading stdin breaks the pipe;
            // that shows up as its real error below, not here.
            let _ = pipe.write_all(bytes);
        }
    }

    let start = Instant::now();
    loop {
        match child.try_wait()? {
            Some(status) if status.success() => break,
            Some(status) => {
                return Err(HandlerError::Failed(format!(
                    "plugin exited with {status}"
                )));
            }
            None if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(HandlerError::Failed(format!(
                    "plugin timed out after {}s",
                    timeout.as_secs()
                )));
            }
            None => std::thread::sleep(POLL_INTERVAL),
        }
    }

    let output = child.wait_with_output()?;
    Ok(output.stdout)
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
