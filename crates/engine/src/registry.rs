// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler discovery, filtering, and ordering.
//!
//! Built-ins register first, then project-tree plugins, then config-declared
//! plugins. Duplicate ids keep the first registration. Enable flags, tag
//! filters, and priority overrides are applied in one pass after discovery,
//! and the surviving handlers are bucketed per event type in dispatch order.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use hk_config::{Config, Diagnostic};
use hk_core::{EventType, Handler};

use crate::builtin;
use crate::plugin;

/// Where a handler came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOrigin {
    Builtin,
    Plugin,
}

impl HandlerOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerOrigin::Builtin => "builtin",
            HandlerOrigin::Plugin => "plugin",
        }
    }
}

/// One discovered handler plus its resolved runtime settings.
#[derive(Clone)]
pub struct HandlerRegistration {
    pub handler: Arc<dyn Handler>,
    pub enabled: bool,
    pub priority: u8,
    pub origin: HandlerOrigin,
    /// Executable path for plugins; `None` for built-ins.
    pub source: Option<PathBuf>,
}

impl HandlerRegistration {
    pub fn id(&self) -> &str {
        self.handler.id()
    }

    pub fn event_type(&self) -> EventType {
        self.handler.event_type()
    }
}

/// The immutable handler table for one config generation.
///
/// Rebuilt only on explicit reload; dispatches hold an `Arc` snapshot.
pub struct HandlerRegistry {
    by_event: BTreeMap<EventType, Vec<HandlerRegistration>>,
    all: Vec<HandlerRegistration>,
    diagnostics: Vec<Diagnostic>,
}

impl HandlerRegistry {
    /// Discover, filter, and order handlers for `config`.
    ///
    /// `project_root` anchors relative plugin paths. Diagnostics collected
    /// here (unknown handler ids, rejected plugins) merge with the config's
    /// own on the daemon side.
    pub fn build(config: &Config, project_root: &Path) -> Self {
        let mut diagnostics = Vec::new();
        let discovered = discover(config, project_root, &mut diagnostics);

        // Unknown-handler validation needs the discovered catalog, so it
        // lives here rather than in the config crate.
        for (event, entries) in &config.handlers {
            for id in entries.keys() {
                let known = discovered
                    .values()
                    .any(|r| r.id() == id.as_str() && r.event_type() == *event);
                if !known {
                    diagnostics.push(Diagnostic::error(
                        "unknown-handler",
                        format!("handlers.{event}.{id}"),
                        format!("no {event} handler with id {id:?} is registered"),
                    ));
                }
            }
        }

        let mut all = Vec::with_capacity(discovered.len());
        for (_, mut registration) in discovered {
            let event = registration.event_type();
            let entry = config.handler_entry(event, registration.id());

            if let Some(priority) = entry.and_then(|e| e.priority) {
                registration.priority = priority;
            }

            // One filter step: the per-handler flag always wins, tag
            // admission only applies to handlers left enabled.
            let explicitly_enabled = entry.map(|e| e.enabled).unwrap_or(true);
            registration.enabled = explicitly_enabled
                && tags_admit(
                    &registration.handler.tags(),
                    &config.enable_tags,
                    &config.disable_tags,
                );

            if registration.enabled && registration.handler.acceptance_tests().is_empty() {
                warn!(
                    handler = registration.id(),
                    "handler declares no acceptance tests"
                );
            }

            all.push(registration);
        }

        let mut by_event: BTreeMap<EventType, Vec<HandlerRegistration>> = BTreeMap::new();
        for registration in all.iter().filter(|r| r.enabled) {
            by_event
                .entry(registration.event_type())
                .or_default()
                .push(registration.clone());
        }
        for chain in by_event.values_mut() {
            // Stable: equal priorities keep registration order.
            chain.sort_by_key(|r| r.priority);
        }

        debug!(
            handlers = all.len(),
            enabled = all.iter().filter(|r| r.enabled).count(),
            "handler registry built"
        );

        HandlerRegistry {
            by_event,
            all,
            diagnostics,
        }
    }

    /// The ordered dispatch chain for one event type (enabled handlers only).
    pub fn for_event(&self, event: EventType) -> &[HandlerRegistration] {
        self.by_event.get(&event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every surviving registration, including disabled ones.
    pub fn all(&self) -> &[HandlerRegistration] {
        &self.all
    }

    /// Diagnostics produced while building (unknown ids, rejected plugins).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Enabled-handler count per event type, for `health`.
    pub fn counts_by_event(&self) -> BTreeMap<String, usize> {
        self.by_event
            .iter()
            .map(|(event, chain)| (event.to_string(), chain.len()))
            .collect()
    }

    /// Registry over explicit handler instances, for tests.
    #[cfg(any(test, feature = "test-support"))]
    pub fn from_handlers(handlers: Vec<Arc<dyn Handler>>) -> Self {
        let all: Vec<HandlerRegistration> = handlers
            .into_iter()
            .map(|handler| {
                let priority = handler.priority();
                HandlerRegistration {
                    handler,
                    enabled: true,
                    priority,
                    origin: HandlerOrigin::Builtin,
                    source: None,
                }
            })
            .collect();

        let mut by_event: BTreeMap<EventType, Vec<HandlerRegistration>> = BTreeMap::new();
        for registration in &all {
            by_event
                .entry(registration.event_type())
                .or_default()
                .push(registration.clone());
        }
        for chain in by_event.values_mut() {
            chain.sort_by_key(|r| r.priority);
        }

        HandlerRegistry {
            by_event,
            all,
            diagnostics: Vec::new(),
        }
    }
}

/// Discovery in registration order, first id wins.
fn discover(
    config: &Config,
    project_root: &Path,
    diagnostics: &mut Vec<Diagnostic>,
) -> IndexMap<String, HandlerRegistration> {
    let mut discovered: IndexMap<String, HandlerRegistration> = IndexMap::new();

    let mut register = |handler: Arc<dyn Handler>, origin: HandlerOrigin, source: Option<PathBuf>| {
        let id = handler.id().to_string();
        if let Some(existing) = discovered.get(&id) {
            warn!(
                handler = %id,
                first = existing.origin.as_str(),
                duplicate = origin.as_str(),
                "duplicate handler id; keeping the first registration"
            );
            return;
        }
        let priority = handler.priority();
        discovered.insert(
            id,
            HandlerRegistration {
                handler,
                enabled: true,
                priority,
                origin,
                source,
            },
        );
    };

    for handler in builtin::catalog(config) {
        register(handler, HandlerOrigin::Builtin, None);
    }

    if config.project_handlers.enabled {
        let root = resolve_path(project_root, &config.project_handlers.path);
        for (path, event) in scan_project_tree(&root) {
            load_plugin_into(&path, event, None, &mut register, diagnostics);
        }
    }

    for (idx, spec) in config.plugins.iter().enumerate() {
        if !spec.enabled {
            continue;
        }
        let path = resolve_path(project_root, &spec.path);
        let subset = spec.handlers.as_deref();
        if !path.is_file() {
            diagnostics.push(Diagnostic::warning(
                "plugin",
                format!("plugins[{idx}].path"),
                format!("plugin {} not found; skipping", path.display()),
            ));
            continue;
        }
        load_plugin_into(&path, spec.event_type, subset, &mut register, diagnostics);
    }

    discovered
}

/// Load one plugin executable and register its (possibly filtered) handlers.
fn load_plugin_into(
    path: &Path,
    event: EventType,
    subset: Option<&[String]>,
    register: &mut impl FnMut(Arc<dyn Handler>, HandlerOrigin, Option<PathBuf>),
    diagnostics: &mut Vec<Diagnostic>,
) {
    match plugin::load(path, event) {
        Ok(handlers) => {
            for handler in handlers {
                if let Some(names) = subset {
                    if !names.iter().any(|n| n == handler.id()) {
                        continue;
                    }
                }
                if handler.acceptance_tests().is_empty() {
                    warn!(
                        handler = handler.id(),
                        plugin = %path.display(),
                        "plugin handler declares no acceptance tests; rejected"
                    );
                    diagnostics.push(Diagnostic::warning(
                        "plugin",
                        handler.id().to_string(),
                        format!(
                            "plugin handler {:?} from {} declares no acceptance tests",
                            handler.id(),
                            path.display()
                        ),
                    ));
                    continue;
                }
                register(Arc::new(handler), HandlerOrigin::Plugin, Some(path.to_path_buf()));
            }
        }
        Err(e) => {
            warn!(plugin = %path.display(), error = %e, "failed to load plugin");
            diagnostics.push(Diagnostic::warning(
                "plugin",
                path.display().to_string(),
                format!("failed to load plugin: {e}"),
            ));
        }
    }
}

/// Walk the committed project-handlers tree: one subdirectory per event
/// type, one executable per handler module. Names starting with `_` or
/// `test_` are skipped.
fn scan_project_tree(root: &Path) -> Vec<(PathBuf, EventType)> {
    let mut found = Vec::new();
    let Ok(event_dirs) = std::fs::read_dir(root) else {
        return found;
    };
    let mut event_dirs: Vec<_> = event_dirs.flatten().collect();
    event_dirs.sort_by_key(std::fs::DirEntry::file_name);

    for dir in event_dirs {
        let Ok(event) = dir.file_name().to_string_lossy().parse::<EventType>() else {
            debug!(dir = %dir.path().display(), "skipping non-event directory");
            continue;
        };
        let Ok(files) = std::fs::read_dir(dir.path()) else {
            continue;
        };
        let mut files: Vec<_> = files.flatten().collect();
        files.sort_by_key(std::fs::DirEntry::file_name);

        for file in files {
            let name = file.file_name().to_string_lossy().into_owned();
            if name.starts_with('_') || name.starts_with("test_") {
                continue;
            }
            if file.path().is_file() {
                found.push((file.path(), event));
            }
        }
    }
    found
}

fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

/// Tag admission: enabled unless disabled tags intersect, and when
/// `enable_tags` is non-empty at least one tag must be listed there.
fn tags_admit(tags: &[String], enable: &BTreeSet<String>, disable: &BTreeSet<String>) -> bool {
    if tags.iter().any(|t| disable.contains(t)) {
        return false;
    }
    enable.is_empty() || tags.iter().any(|t| enable.contains(t))
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
