// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in handlers.
//!
//! Registered explicitly: the catalog function is the single source of
//! truth for what ships in the binary. Handler-specific options from
//! `handlers.<event>.<id>` are injected at construction.

mod bash_guard;
mod protect_paths;
mod secret_scan;
mod session_context;

use std::sync::Arc;

use hk_config::Config;
use hk_core::{EventType, Handler};

pub use bash_guard::BashGuard;
pub use protect_paths::ProtectPaths;
pub use secret_scan::SecretScan;
pub use session_context::SessionContext;

/// Construct every built-in handler with its configured options.
pub fn catalog(config: &Config) -> Vec<Arc<dyn Handler>> {
    vec![
        Arc::new(BashGuard::new(
            config.handler_opts(EventType::PreToolUse, BashGuard::ID),
        )),
        Arc::new(ProtectPaths::new(
            config.handler_opts(EventType::PreToolUse, ProtectPaths::ID),
        )),
        Arc::new(SecretScan::new()),
        Arc::new(SessionContext::new(
            config.handler_opts(EventType::SessionStart, SessionContext::ID),
            config.daemon.project_languages.clone().unwrap_or_default(),
        )),
    ]
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
