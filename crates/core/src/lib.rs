// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hk-core: Core types for the hooks daemon.
//!
//! Events, decisions, the handler contract, and path resolution. Everything
//! here is shared by the engine, the daemon, and the CLI.

pub mod acceptance;
pub mod decision;
pub mod event;
pub mod handler;
pub mod paths;
pub mod result;

pub use acceptance::{AcceptanceTest, TestType};
pub use decision::{Decision, DecisionKind};
pub use event::{EventType, HookEvent};
pub use handler::{Handler, HandlerError, DEFAULT_PRIORITY, PRIORITY_MAX, PRIORITY_MIN};
pub use paths::{find_project_root, DaemonPaths, PathError};
pub use result::HookResult;
