// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State shared between the listener tasks and the main loop.
//!
//! Config and registry are immutable between reloads: dispatches take an
//! `Arc` snapshot at request entry, a reload swaps the snapshot atomically,
//! and in-flight requests keep running against the one they took.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{info, warn};

use hk_config::{Config, LoadedConfig};
use hk_core::DaemonPaths;
use hk_engine::{Dispatcher, HandlerRegistry};

use crate::logbuf::LogBuffer;

/// One config generation: what a dispatch sees from entry to reply.
pub struct Snapshot {
    pub config: Arc<Config>,
    pub registry: Arc<HandlerRegistry>,
    /// Error lines when the config generation is invalid. The registry is
    /// then the last good one (or the defaults at first startup).
    pub degraded: Option<Vec<String>>,
}

impl Snapshot {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Result of a `reload` control request.
pub struct ReloadOutcome {
    pub ok: bool,
    pub errors: Vec<String>,
}

/// Process-wide daemon state.
pub struct SharedState {
    snapshot: RwLock<Arc<Snapshot>>,
    pub dispatcher: Dispatcher,
    pub paths: DaemonPaths,
    pub log_buffer: LogBuffer,
    start: Instant,
    /// Milliseconds since `start` of the last accepted connection.
    last_activity_ms: AtomicU64,
}

impl SharedState {
    /// Build the initial snapshot from the startup config load.
    ///
    /// An invalid config does not stop the daemon: dispatch runs against
    /// the default config's registry and every response carries the error
    /// context until a reload fixes it.
    pub fn new(paths: DaemonPaths, loaded: LoadedConfig, log_buffer: LogBuffer) -> Self {
        let snapshot = build_snapshot(&paths, loaded, None);
        SharedState {
            snapshot: RwLock::new(Arc::new(snapshot)),
            dispatcher: Dispatcher::new(),
            paths,
            log_buffer,
            start: Instant::now(),
            last_activity_ms: AtomicU64::new(0),
        }
    }

    /// The current config generation.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Reload config and registry from disk.
    ///
    /// On validation failure the previous snapshot's config and registry
    /// stay in place; only the degraded annotation changes.
    pub fn reload(&self) -> ReloadOutcome {
        let loaded = hk_config::load(&self.paths.config_path);
        let previous = self.snapshot();
        let next = build_snapshot(&self.paths, loaded, Some(&previous));
        let outcome = ReloadOutcome {
            ok: !next.is_degraded(),
            errors: next.degraded.clone().unwrap_or_default(),
        };
        if outcome.ok {
            info!("config reloaded");
        } else {
            warn!(errors = outcome.errors.len(), "reload kept previous registry (config invalid)");
        }
        *self.snapshot.write() = Arc::new(next);
        outcome
    }

    /// Stamp activity (called for every accepted connection).
    pub fn touch(&self) {
        let elapsed = self.start.elapsed().as_millis() as u64;
        self.last_activity_ms.store(elapsed, Ordering::Relaxed);
    }

    /// Time since the last accepted connection.
    pub fn idle_for(&self) -> Duration {
        let last = self.last_activity_ms.load(Ordering::Relaxed);
        self.start.elapsed().saturating_sub(Duration::from_millis(last))
    }

    pub fn uptime(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Build a snapshot for one config load.
///
/// `previous` carries the last good registry for reloads; at first startup
/// an invalid config falls back to the default config's registry instead.
fn build_snapshot(
    paths: &DaemonPaths,
    loaded: LoadedConfig,
    previous: Option<&Snapshot>,
) -> Snapshot {
    let registry = HandlerRegistry::build(&loaded.config, &paths.project_root);

    let mut errors = loaded.error_messages();
    errors.extend(
        registry
            .diagnostics()
            .iter()
            .filter(|d| d.severity == hk_config::Severity::Error)
            .map(|d| d.to_string()),
    );

    if errors.is_empty() {
        return Snapshot {
            config: Arc::new(loaded.config),
            registry: Arc::new(registry),
            degraded: None,
        };
    }

    warn!(
        errors = errors.len(),
        "config invalid; running degraded"
    );
    match previous {
        Some(previous) => Snapshot {
            config: Arc::clone(&previous.config),
            registry: Arc::clone(&previous.registry),
            degraded: Some(errors),
        },
        None => {
            let default = Config::default();
            let registry = HandlerRegistry::build(&default, &paths.project_root);
            Snapshot {
                config: Arc::new(default),
                registry: Arc::new(registry),
                degraded: Some(errors),
            }
        }
    }
}

#[cfg(test)]
#[path = "shared_tests.rs"]
mod tests;
