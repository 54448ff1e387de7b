// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hk validate-config` - run the config validator and report diagnostics.

use anyhow::Result;

use hk_engine::HandlerRegistry;

use crate::exit_error::ExitError;
use crate::output::OutputFormat;

pub fn validate_config(format: OutputFormat) -> Result<()> {
    let paths = crate::paths::resolve()?;
    let loaded = hk_config::load(&paths.config_path);

    // Registry-level checks (unknown handler ids) belong to validation too
    let registry = HandlerRegistry::build(&loaded.config, &paths.project_root);
    let mut diagnostics = loaded.diagnostics;
    diagnostics.extend(registry.diagnostics().iter().cloned());

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == hk_config::Severity::Error)
        .count();

    match format {
        OutputFormat::Text => {
            if diagnostics.is_empty() {
                println!("{}: OK", paths.config_path.display());
            } else {
                println!("{}:", paths.config_path.display());
                for d in &diagnostics {
                    println!("  {d}");
                }
            }
        }
        OutputFormat::Json => {
            let items: Vec<_> = diagnostics
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "severity": d.severity.to_string(),
                        "category": d.category,
                        "path": d.path,
                        "message": d.message,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "config": paths.config_path.display().to_string(),
                    "errors": errors,
                    "diagnostics": items,
                }))?
            );
        }
    }

    if errors > 0 {
        Err(ExitError::silent(1).into())
    } else {
        Ok(())
    }
}
