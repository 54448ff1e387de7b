// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path resolution shared by every CLI command.

use std::path::Path;

use hk_core::{DaemonPaths, PathError};

/// Resolve the daemon paths the same way the daemon itself does, including
/// the `self_install_mode` sniff.
pub fn resolve() -> Result<DaemonPaths, PathError> {
    let cwd = std::env::current_dir()?;
    resolve_from(&cwd)
}

pub fn resolve_from(cwd: &Path) -> Result<DaemonPaths, PathError> {
    let self_install = match hk_core::find_project_root(cwd) {
        Ok(root) => hk_config::read_self_install_mode(&hk_core::paths::config_path(&root)),
        Err(_) => false,
    };
    DaemonPaths::resolve(cwd, self_install)
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
