// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for one IPC request (status, event, reload, ...).
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("HK_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for a spawned daemon to accept connections.
pub fn timeout_connect() -> Duration {
    parse_duration_ms("HK_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for a daemon process to exit.
pub fn timeout_exit() -> Duration {
    parse_duration_ms("HK_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Timeout for reading an event response (must outlast the daemon's own
/// per-request deadline so silence means fail-open, not a short read).
pub fn timeout_event() -> Duration {
    parse_duration_ms("HK_TIMEOUT_EVENT_MS").unwrap_or(Duration::from_secs(11))
}

/// Polling interval for connection and exit retries.
pub fn poll_interval() -> Duration {
    parse_duration_ms("HK_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}

/// Explicit daemon binary override (tests point this at the build output).
pub fn daemon_binary() -> Option<String> {
    std::env::var("HK_DAEMON_BINARY").ok()
}
