// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hk self-test` - offline invariant checks over the live registry.
//!
//! No daemon involved: load config, build the registry, and verify the
//! properties every healthy installation must have. Used after editing
//! config or installing plugins, and by the acceptance playbook's first
//! step.

use std::collections::HashSet;

use anyhow::Result;

use hk_core::EventType;
use hk_engine::{response, DispatchOutcome, HandlerRegistry};

use crate::exit_error::ExitError;

pub fn self_test() -> Result<()> {
    let paths = crate::paths::resolve()?;
    let loaded = hk_config::load(&paths.config_path);
    let registry = HandlerRegistry::build(&loaded.config, &paths.project_root);

    let mut failures: Vec<String> = Vec::new();

    for d in loaded
        .diagnostics
        .iter()
        .chain(registry.diagnostics().iter())
    {
        if d.severity == hk_config::Severity::Error {
            failures.push(format!("config: {d}"));
        }
    }

    let mut seen = HashSet::new();
    for registration in registry.all() {
        let id = registration.id();
        if !seen.insert(id.to_string()) {
            failures.push(format!("duplicate handler id {id:?}"));
        }
        let priority = registration.priority;
        if !(hk_core::PRIORITY_MIN..=hk_core::PRIORITY_MAX).contains(&priority) {
            failures.push(format!("{id}: priority {priority} out of range"));
        }
        if registration.handler.acceptance_tests().is_empty() {
            failures.push(format!("{id}: no acceptance tests"));
        }
    }

    // Every event type must render a schema-clean canonical allow
    for event in EventType::ALL {
        let rendered = response::render(event, &DispatchOutcome::allow());
        if let Err(e) = response::validate(event, &rendered) {
            failures.push(format!("{event}: canonical allow fails schema: {e}"));
        }
    }

    let handlers = registry.all().len();
    let enabled = registry.all().iter().filter(|r| r.enabled).count();
    if failures.is_empty() {
        println!("self-test OK: {handlers} handlers ({enabled} enabled), schemas clean");
        Ok(())
    } else {
        println!("self-test FAILED:");
        for failure in &failures {
            println!("  {failure}");
        }
        Err(ExitError::silent(1).into())
    }
}
