// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hk generate-playbook` - emit the acceptance playbook on stdout.

use anyhow::Result;

use hk_engine::{playbook, HandlerRegistry};

pub fn generate_playbook() -> Result<()> {
    let paths = crate::paths::resolve()?;
    let loaded = hk_config::load(&paths.config_path);
    let registry = HandlerRegistry::build(&loaded.config, &paths.project_root);

    print!("{}", playbook::generate(&registry));
    Ok(())
}
