// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config validation diagnostics.
//!
//! Validation never aborts the daemon. Errors flip it into degraded mode;
//! warnings only surface in logs and `hk validate-config` output.

use std::fmt;

use hk_core::{PRIORITY_MAX, PRIORITY_MIN};

use crate::schema::Config;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category slug: "syntax", "schema", "unknown-key", "unknown-handler",
    /// "priority-range", "tag-filters", "log-level", "plugin".
    pub category: &'static str,
    /// Dotted config path, e.g. `handlers.PreToolUse.block-dangerous-bash`.
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    pub fn error(category: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            category,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn warning(
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} [{}]: {}", self.severity, self.category, self.message)
        } else {
            write!(
                f,
                "{} [{}] at {}: {}",
                self.severity, self.category, self.path, self.message
            )
        }
    }
}

/// Whether any diagnostic is an error (⇒ degraded mode).
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}

/// Filter levels tracing understands (case-insensitive).
const KNOWN_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Structural validation of a parsed config.
///
/// Handler-id existence is checked where the catalog lives (when the
/// registry is built) and merges into the same diagnostics list.
pub fn validate(config: &Config) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    for (event, entries) in &config.handlers {
        for (id, entry) in entries {
            if let Some(priority) = entry.priority {
                if !(PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
                    out.push(Diagnostic::error(
                        "priority-range",
                        format!("handlers.{event}.{id}.priority"),
                        format!(
                            "priority {priority} outside allowed range \
                             [{PRIORITY_MIN}, {PRIORITY_MAX}]"
                        ),
                    ));
                }
            }
        }
    }

    for (idx, plugin) in config.plugins.iter().enumerate() {
        if plugin.path.as_os_str().is_empty() {
            out.push(Diagnostic::error(
                "plugin",
                format!("plugins[{idx}].path"),
                "plugin path must not be empty",
            ));
        }
        if let Some(names) = &plugin.handlers {
            if names.is_empty() {
                out.push(Diagnostic::warning(
                    "plugin",
                    format!("plugins[{idx}].handlers"),
                    "empty handler list registers nothing; omit the key to register all",
                ));
            }
        }
    }

    let both: Vec<_> = config
        .enable_tags
        .intersection(&config.disable_tags)
        .cloned()
        .collect();
    if !both.is_empty() {
        out.push(Diagnostic::warning(
            "tag-filters",
            "enable_tags",
            format!(
                "tag(s) {} appear in both enable_tags and disable_tags; disable wins",
                both.join(", ")
            ),
        ));
    }

    let level = config.daemon.log_level.to_ascii_lowercase();
    if !KNOWN_LOG_LEVELS.contains(&level.as_str()) {
        out.push(Diagnostic::warning(
            "log-level",
            "daemon.log_level",
            format!("unknown log level {:?}, using INFO", config.daemon.log_level),
        ));
    }

    out
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
