// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hk-config: the daemon's on-disk configuration.
//!
//! The config file is YAML, committed at `.claude/hooks-daemon.yaml`.
//! Loading never fails the process: a missing file yields the default
//! config, and a broken one yields the default config plus error
//! diagnostics that put the daemon into degraded mode.

pub mod loader;
pub mod schema;
pub mod validate;

pub use loader::{load, read_self_install_mode, LoadedConfig};
pub use schema::{Config, DaemonSection, HandlerEntry, PluginSpec, ProjectHandlers};
pub use validate::{has_errors, Diagnostic, Severity};
