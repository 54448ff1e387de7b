// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The handler contract.
//!
//! A handler listens to exactly one event type. The dispatcher calls
//! `matches` first and `handle` only on a match; both return `Result` so a
//! failing handler is contained instead of poisoning the chain.

use thiserror::Error;

use crate::acceptance::AcceptanceTest;
use crate::event::{EventType, HookEvent};
use crate::result::HookResult;

/// Lowest priority a handler may declare (runs first).
pub const PRIORITY_MIN: u8 = 5;
/// Highest priority a handler may declare (runs last).
pub const PRIORITY_MAX: u8 = 60;
/// Priority used when a handler does not declare one.
pub const DEFAULT_PRIORITY: u8 = 30;

/// Failure inside a handler. Always contained by the dispatcher: a failing
/// `matches` reads as no-match, a failing `handle` degrades to allow with a
/// diagnostic context line.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid handler output: {0}")]
    Output(#[from] serde_json::Error),
}

/// A unit that may observe and respond to one event type.
pub trait Handler: Send + Sync {
    /// Stable identifier, unique within the process.
    fn id(&self) -> &str;

    /// The single event type this handler listens to.
    fn event_type(&self) -> EventType;

    /// Dispatch order within the event type; lower runs first.
    fn priority(&self) -> u8 {
        DEFAULT_PRIORITY
    }

    /// Whether this handler's result short-circuits the chain.
    fn terminal(&self) -> bool {
        false
    }

    /// Taxonomy tags used by the config's enable/disable filters.
    fn tags(&self) -> Vec<String> {
        Vec::new()
    }

    /// Cheap, side-effect-free relevance check. Target under a millisecond.
    fn matches(&self, event: &HookEvent) -> Result<bool, HandlerError>;

    /// Produce this handler's result. Only called after `matches` was true.
    fn handle(&self, event: &HookEvent) -> Result<HookResult, HandlerError>;

    /// Manual verification steps this handler ships with. Must be non-empty;
    /// the registry warns on (and for plugins, rejects) an empty list.
    fn acceptance_tests(&self) -> Vec<AcceptanceTest>;
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
