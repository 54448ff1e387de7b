// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn resolves_project_root_from_a_subdirectory() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("repo");
    std::fs::create_dir_all(root.join(".claude")).unwrap();
    let deep = root.join("src/app");
    std::fs::create_dir_all(&deep).unwrap();

    let paths = resolve_from(&deep).unwrap();
    assert_eq!(paths.project_root, root);
    assert_eq!(paths.daemon_root, root.join(".claude/hooks-daemon"));
}

#[test]
fn self_install_mode_in_config_collapses_daemon_root() {
    let temp = tempdir().unwrap();
    let root = temp.path().join("repo");
    std::fs::create_dir_all(root.join(".claude")).unwrap();
    std::fs::write(
        root.join(".claude/hooks-daemon.yaml"),
        "daemon:\n  self_install_mode: true\n",
    )
    .unwrap();

    let paths = resolve_from(&root).unwrap();
    assert_eq!(paths.daemon_root, root);
}

#[test]
fn no_project_root_is_an_error() {
    let temp = tempdir().unwrap();
    assert!(resolve_from(temp.path()).is_err());
}
