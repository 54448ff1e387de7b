// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed configuration tree.
//!
//! Every field carries a serde default so the minimal config
//! (`daemon: { idle_timeout_seconds: 600, log_level: INFO }` with an empty
//! `handlers:` map) and the empty file both deserialize cleanly.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use hk_core::EventType;

/// Immutable view of the whole config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonSection,

    /// Per-event, per-handler settings: `handlers.<EventType>.<handler-id>`.
    #[serde(default)]
    pub handlers: BTreeMap<EventType, BTreeMap<String, HandlerEntry>>,

    /// Plugin executables declared directly in the config.
    #[serde(default)]
    pub plugins: Vec<PluginSpec>,

    #[serde(default)]
    pub project_handlers: ProjectHandlers,

    /// When non-empty, only handlers sharing at least one tag are admitted.
    #[serde(default)]
    pub enable_tags: BTreeSet<String>,

    /// Handlers sharing any of these tags are excluded.
    #[serde(default)]
    pub disable_tags: BTreeSet<String>,
}

impl Config {
    /// Settings entry for one handler, if configured.
    pub fn handler_entry(&self, event: EventType, id: &str) -> Option<&HandlerEntry> {
        self.handlers.get(&event)?.get(id)
    }

    /// Handler-specific options for injection at construction time.
    pub fn handler_opts(&self, event: EventType, id: &str) -> Map<String, Value> {
        self.handler_entry(event, id)
            .map(|e| e.opts.clone())
            .unwrap_or_default()
    }
}

/// `daemon:` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonSection {
    /// Seconds of inactivity before auto-shutdown. `0` disables the timer.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,

    /// Log filter level; the `LOG_LEVEL` env var overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Treat the project root itself as the daemon root (used when this
    /// repository is the daemon checkout, not a consumer of it).
    #[serde(default)]
    pub self_install_mode: bool,

    /// Refuse to start while any other daemon process is alive, regardless
    /// of project root. Unset means "only inside containers"; an explicit
    /// value wins either way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce_single_daemon_process: Option<bool>,

    /// Let the hook forwarder start a daemon lazily when none is running.
    #[serde(default)]
    pub autostart_on_hook: bool,

    /// Per-request deadline, after which the connection is closed without a
    /// reply and the forwarder fails open.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Languages of the project, surfaced to handlers that tailor their
    /// advice (e.g. the session-context handler).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_languages: Option<Vec<String>>,
}

impl DaemonSection {
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_seconds > 0).then(|| Duration::from_secs(self.idle_timeout_seconds))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }
}

impl Default for DaemonSection {
    fn default() -> Self {
        DaemonSection {
            idle_timeout_seconds: default_idle_timeout(),
            log_level: default_log_level(),
            self_install_mode: false,
            enforce_single_daemon_process: None,
            autostart_on_hook: false,
            request_timeout_seconds: default_request_timeout(),
            project_languages: None,
        }
    }
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_log_level() -> String {
    "INFO".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

/// Settings for one handler under `handlers.<event>.<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerEntry {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Dispatch-order override; must stay within the allowed range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    /// Handler-specific options, passed through at construction.
    #[serde(flatten)]
    pub opts: Map<String, Value>,
}

impl Default for HandlerEntry {
    fn default() -> Self {
        HandlerEntry {
            enabled: true,
            priority: None,
            opts: Map::new(),
        }
    }
}

/// One config-declared plugin executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSpec {
    /// Executable path, resolved relative to the project root.
    pub path: PathBuf,

    pub event_type: EventType,

    /// Register only this subset of the plugin's declared handlers
    /// (all when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handlers: Option<Vec<String>>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// `project_handlers:` section, the committed per-project plugin tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectHandlers {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Root of the tree, resolved relative to the project root. Each
    /// event-type subdirectory holds plugin executables.
    #[serde(default = "default_project_handlers_path")]
    pub path: PathBuf,
}

impl Default for ProjectHandlers {
    fn default() -> Self {
        ProjectHandlers {
            enabled: true,
            path: default_project_handlers_path(),
        }
    }
}

fn default_project_handlers_path() -> PathBuf {
    PathBuf::from(".claude/project-handlers")
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
