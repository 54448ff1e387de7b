// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hooks daemon library.
//!
//! Exposes the IPC protocol types and wire helpers for CLI and forwarder
//! clients; the daemon binary itself lives in `main.rs`.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod lifecycle;
pub mod listener;
pub mod logbuf;
pub mod protocol;
pub mod shared;

pub use protocol::{
    HealthInfo, ProtocolError, Request, StatusInfo, DEFAULT_IPC_TIMEOUT, MAX_MESSAGE_SIZE,
};
