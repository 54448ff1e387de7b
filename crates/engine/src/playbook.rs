// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acceptance-playbook generation.
//!
//! Walks every registered handler and renders its declared acceptance tests
//! into a markdown document. The playbook is ephemeral working material for
//! a manual verification pass; it is printed to stdout and never committed.

use std::fmt::Write as _;

use hk_core::{EventType, TestType};

use crate::registry::HandlerRegistry;

/// Render the acceptance playbook for every handler in the registry.
pub fn generate(registry: &HandlerRegistry) -> String {
    let mut out = String::new();
    let mut total = 0usize;

    let _ = writeln!(out, "# Hooks Acceptance Playbook");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Generated from the live handler registry. Work through each check in \
         a scratch session; nothing here is meant to be committed."
    );

    for event in EventType::ALL {
        let registrations: Vec<_> = registry
            .all()
            .iter()
            .filter(|r| r.event_type() == event)
            .collect();
        if registrations.is_empty() {
            continue;
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "## {event}");

        for registration in registrations {
            let handler = registration.handler.as_ref();
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "### `{}` (priority {}, {}{}{})",
                handler.id(),
                registration.priority,
                registration.origin.as_str(),
                if handler.terminal() { ", terminal" } else { "" },
                if registration.enabled { "" } else { ", disabled" },
            );
            let tags = handler.tags();
            if !tags.is_empty() {
                let _ = writeln!(out, "Tags: {}", tags.join(", "));
            }

            for test in handler.acceptance_tests() {
                total += 1;
                let _ = writeln!(out);
                let kind = match test.test_type {
                    TestType::Blocking => "blocking",
                    TestType::Advisory => "advisory",
                };
                let _ = writeln!(out, "- [ ] **{}** ({kind})", test.title);
                let _ = writeln!(out, "  - Do: `{}`", test.command);
                let _ = writeln!(out, "  - {}", test.description);
                let _ = writeln!(
                    out,
                    "  - Expect decision: `{}`",
                    test.expected_decision.as_str()
                );
                for pattern in &test.expected_message_patterns {
                    let _ = writeln!(out, "  - Expect message matching: `{pattern}`");
                }
                if let Some(notes) = &test.safety_notes {
                    let _ = writeln!(out, "  - Safety: {notes}");
                }
                if let Some(event) = test.requires_event {
                    let _ = writeln!(out, "  - Requires event: `{event}`");
                }
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "---");
    let _ = writeln!(out, "{total} checks across {} handlers.", registry.all().len());
    out
}

#[cfg(test)]
#[path = "playbook_tests.rs"]
mod tests;
