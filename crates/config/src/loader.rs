// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config file loading.

use std::path::Path;

use tracing::{debug, warn};

use crate::schema::Config;
use crate::validate::{self, Diagnostic};

/// Result of loading the config file. Always usable: on any failure
/// `config` falls back to the defaults and `diagnostics` records why.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: Config,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadedConfig {
    pub fn has_errors(&self) -> bool {
        validate::has_errors(&self.diagnostics)
    }

    /// Human-readable error lines, for degraded-mode context and `health`.
    pub fn error_messages(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == crate::validate::Severity::Error)
            .map(|d| d.to_string())
            .collect()
    }
}

/// Top-level keys the schema understands; anything else is a warning.
const KNOWN_TOP_LEVEL_KEYS: &[&str] = &[
    "daemon",
    "handlers",
    "plugins",
    "project_handlers",
    "enable_tags",
    "disable_tags",
];

/// Load and validate the config file at `path`.
///
/// A missing file is not an error: the daemon synthesizes the minimal
/// default config and keeps going. Parse and schema failures degrade to the
/// defaults with an error diagnostic instead of failing startup.
pub fn load(path: &Path) -> LoadedConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return LoadedConfig::default();
        }
        Err(e) => {
            return LoadedConfig {
                config: Config::default(),
                diagnostics: vec![Diagnostic::error(
                    "syntax",
                    "",
                    format!("failed to read {}: {e}", path.display()),
                )],
            };
        }
    };

    parse(&text)
}

/// Parse config text (exposed for `hk validate-config` and tests).
pub fn parse(text: &str) -> LoadedConfig {
    let value: serde_yaml::Value = match serde_yaml::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            return LoadedConfig {
                config: Config::default(),
                diagnostics: vec![Diagnostic::error("syntax", "", e.to_string())],
            };
        }
    };

    // An empty file parses to null; treat it like a missing file.
    if value.is_null() {
        return LoadedConfig::default();
    }

    let mut diagnostics = unknown_key_warnings(&value);

    let config = match serde_yaml::from_value::<Config>(value) {
        Ok(config) => config,
        Err(e) => {
            diagnostics.push(Diagnostic::error("schema", "", e.to_string()));
            return LoadedConfig {
                config: Config::default(),
                diagnostics,
            };
        }
    };

    diagnostics.extend(validate::validate(&config));
    for d in &diagnostics {
        warn!(category = d.category, path = %d.path, "{d}");
    }

    LoadedConfig {
        config,
        diagnostics,
    }
}

fn unknown_key_warnings(value: &serde_yaml::Value) -> Vec<Diagnostic> {
    let Some(mapping) = value.as_mapping() else {
        return Vec::new();
    };
    mapping
        .keys()
        .filter_map(|k| k.as_str())
        .filter(|k| !KNOWN_TOP_LEVEL_KEYS.contains(k))
        .map(|k| {
            Diagnostic::warning(
                "unknown-key",
                k.to_string(),
                format!("unknown top-level key {k:?} is ignored"),
            )
        })
        .collect()
}

/// Cheap pre-load sniff of `daemon.self_install_mode`.
///
/// Path resolution needs this flag before the full config (whose own
/// location depends on the project root, not the daemon root), so it is
/// read with a tolerant one-field probe; any failure reads as `false`.
pub fn read_self_install_mode(config_path: &Path) -> bool {
    let Ok(text) = std::fs::read_to_string(config_path) else {
        return false;
    };
    let Ok(value) = serde_yaml::from_str::<serde_yaml::Value>(&text) else {
        return false;
    };
    value
        .get("daemon")
        .and_then(|d| d.get("self_install_mode"))
        .and_then(serde_yaml::Value::as_bool)
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
