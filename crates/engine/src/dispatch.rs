// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-event dispatch pipeline.
//!
//! One event runs through its handler chain sequentially, in registry
//! order. Failure containment is absolute: a broken handler can delay its
//! chain, it can never block the host. The only decisions that stick come
//! from terminal handlers; everything else contributes context.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use hk_core::{Decision, EventType, HookEvent};

use crate::registry::HandlerRegistry;

/// Minimum gap between repeated error logs for one handler.
const ERROR_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// What one dispatch produced; the response formatter renders it.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub decision: Decision,
    pub context: Vec<String>,
    pub updated_input: Option<Map<String, Value>>,
}

impl DispatchOutcome {
    /// The canonical "allow, no context" outcome.
    pub fn allow() -> Self {
        DispatchOutcome {
            decision: Decision::Allow,
            context: Vec::new(),
            updated_input: None,
        }
    }
}

/// Runs events through handler chains.
///
/// Holds only log-dedup state; the registry itself arrives per call so
/// concurrent dispatches can run against different snapshots during reload.
pub struct Dispatcher {
    /// Last time an error was logged, per handler id.
    error_log_at: Mutex<HashMap<String, Instant>>,
    /// Handlers already warned about a discarded `updated_input`.
    updated_input_warned: Mutex<HashSet<String>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher {
            error_log_at: Mutex::new(HashMap::new()),
            updated_input_warned: Mutex::new(HashSet::new()),
        }
    }

    /// Run one event through its chain and produce the final outcome.
    pub fn dispatch(
        &self,
        registry: &HandlerRegistry,
        event: &HookEvent,
        request_id: &str,
    ) -> DispatchOutcome {
        let chain = registry.for_event(event.event_type);
        if chain.is_empty() {
            return DispatchOutcome::allow();
        }

        let mut context: Vec<String> = Vec::new();
        let mut effective = event.clone();
        let mut input_changed = false;
        let mut final_decision = Decision::Allow;

        for registration in chain {
            let handler = registration.handler.as_ref();
            let id = handler.id();

            let matched = match handler.matches(&effective) {
                Ok(matched) => matched,
                Err(e) => {
                    self.log_handler_error("match", id, request_id, &e.to_string());
                    false
                }
            };
            if !matched {
                continue;
            }

            let result = match handler.handle(&effective) {
                Ok(result) => result,
                Err(e) => {
                    let cause = truncate(&e.to_string(), 200);
                    self.log_handler_error("handle", id, request_id, &cause);
                    context.push(format!("handler {id} failed internally: {cause}"));
                    continue;
                }
            };

            context.extend(result.context);

            if let Some(updated) = result.updated_input {
                if event.event_type.allows_updated_input() {
                    effective = effective.with_payload(updated);
                    input_changed = true;
                } else {
                    self.warn_discarded_input(id, event.event_type);
                }
            }

            if registration.handler.terminal() {
                match &result.decision {
                    Decision::Allow => {
                        // Terminal allow is an explicit "no further checks".
                        debug!(handler = id, request_id, "terminal allow short-circuit");
                    }
                    decision => {
                        final_decision = decision.clone();
                    }
                }
                break;
            } else if !result.decision.is_allow() {
                // Only terminal handlers decide; this one is misflagged.
                warn!(
                    handler = id,
                    request_id,
                    decision = result.decision.kind().as_str(),
                    "non-terminal handler returned a blocking decision; ignored"
                );
            }
        }

        DispatchOutcome {
            decision: final_decision,
            context,
            updated_input: input_changed.then_some(effective.payload),
        }
    }

    /// Structured, rate-limited error log for a failing handler.
    fn log_handler_error(&self, phase: &str, handler_id: &str, request_id: &str, cause: &str) {
        let key = format!("{phase}:{handler_id}");
        let mut gate = self.error_log_at.lock();
        let now = Instant::now();
        let due = gate
            .get(&key)
            .map(|at| now.duration_since(*at) >= ERROR_LOG_INTERVAL)
            .unwrap_or(true);
        if due {
            gate.insert(key, now);
            warn!(
                kind = "HandlerError",
                phase,
                handler_id,
                request_id,
                cause,
                "handler failed; continuing fail-open"
            );
        }
    }

    fn warn_discarded_input(&self, handler_id: &str, event_type: EventType) {
        let mut warned = self.updated_input_warned.lock();
        if warned.insert(handler_id.to_string()) {
            warn!(
                handler_id,
                event = %event_type,
                "updated_input is only honored for PreToolUse; discarded"
            );
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…", &s[..cut])
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
