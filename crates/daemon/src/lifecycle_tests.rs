// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn test_paths(dir: &Path) -> DaemonPaths {
    let project_root = dir.to_path_buf();
    let daemon_root = project_root.join(".claude/hooks-daemon");
    let runtime = daemon_root.join("untracked");
    DaemonPaths {
        config_path: project_root.join(".claude/hooks-daemon.yaml"),
        socket_path: runtime.join("daemon-test.sock"),
        pid_path: runtime.join("daemon-test.pid"),
        log_path: runtime.join("daemon-test.log"),
        project_root,
        daemon_root,
    }
}

#[tokio::test]
async fn startup_writes_pid_and_binds_socket() {
    let temp = tempdir().unwrap();
    let paths = test_paths(temp.path());

    let result = startup(&paths, Some(false)).await.unwrap();
    assert_eq!(read_pid(&paths.pid_path), Some(std::process::id()));
    assert!(paths.socket_path.exists());

    drop(result);
}

#[tokio::test]
async fn socket_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempdir().unwrap();
    let paths = test_paths(temp.path());
    let _result = startup(&paths, Some(false)).await.unwrap();

    let mode = std::fs::metadata(&paths.socket_path)
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn second_startup_fails_already_running_without_touching_files() {
    let temp = tempdir().unwrap();
    let paths = test_paths(temp.path());

    let first = startup(&paths, Some(false)).await.unwrap();
    let err = startup(&paths, Some(false)).await.unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyRunning { .. }));

    // The running daemon's files survive the failed second attempt
    assert!(paths.socket_path.exists());
    assert_eq!(read_pid(&paths.pid_path), Some(std::process::id()));

    drop(first);
}

#[tokio::test]
async fn stale_socket_is_removed_on_startup() {
    let temp = tempdir().unwrap();
    let paths = test_paths(temp.path());

    // A crashed daemon left a socket file but no live lock
    std::fs::create_dir_all(paths.socket_path.parent().unwrap()).unwrap();
    std::fs::write(&paths.socket_path, b"").unwrap();
    std::fs::write(&paths.pid_path, b"999999\n").unwrap();

    let result = startup(&paths, Some(false)).await.unwrap();
    // Rebind succeeded and the PID file now records this process
    assert_eq!(read_pid(&paths.pid_path), Some(std::process::id()));
    drop(result);
}

#[tokio::test]
async fn shutdown_removes_socket_and_pid_file() {
    let temp = tempdir().unwrap();
    let paths = test_paths(temp.path());

    let StartupResult { state, listener } = startup(&paths, Some(false)).await.unwrap();
    drop(listener);
    state.shutdown();

    assert!(!paths.socket_path.exists());
    assert!(!paths.pid_path.exists());
}

#[test]
fn read_pid_tolerates_garbage() {
    let temp = tempdir().unwrap();
    let pid_path = temp.path().join("pid");

    assert_eq!(read_pid(&pid_path), None);
    std::fs::write(&pid_path, b"not a pid\n").unwrap();
    assert_eq!(read_pid(&pid_path), None);
    std::fs::write(&pid_path, b"  4242\n").unwrap();
    assert_eq!(read_pid(&pid_path), Some(4242));
}

#[test]
fn process_exists_detects_self_and_rejects_absurd_pids() {
    assert!(process_exists(std::process::id()));
    assert!(!process_exists(u32::MAX));
}
