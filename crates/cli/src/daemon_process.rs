// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon process management utilities.
//!
//! Starting, stopping, and probing the hkd process for one project.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use hk_core::DaemonPaths;

use crate::client::ClientError;

/// Start the daemon in the background, returning the child handle.
///
/// The daemon resolves its own paths from the working directory, so the
/// child is spawned in the project root.
pub fn start_daemon_background(paths: &DaemonPaths) -> Result<std::process::Child, ClientError> {
    let hkd_path = find_hkd_binary();

    Command::new(&hkd_path)
        .current_dir(&paths.project_root)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {e}", hkd_path.display())))
}

/// Find the hkd binary: env override, then dev target, then sibling, then PATH.
pub fn find_hkd_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }

    let current_exe = std::env::current_exe().ok();

    // Only use CARGO_MANIFEST_DIR when the CLI itself is a debug build, so
    // release binaries in inherited environments never pick a dev daemon.
    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .map(|s| s.contains("target/debug"))
        .unwrap_or(false);

    if is_debug_build {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let dev_path = PathBuf::from(manifest_dir)
                .parent()
                .and_then(|p| p.parent())
                .map(|p| p.join("target/debug/hkd"));
            if let Some(path) = dev_path {
                if path.exists() {
                    return path;
                }
            }
        }
    }

    if let Some(ref exe) = current_exe {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("hkd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("hkd")
}

/// The PID recorded in the daemon's PID file, if any.
pub fn read_daemon_pid(paths: &DaemonPaths) -> Option<u32> {
    std::fs::read_to_string(&paths.pid_path)
        .ok()?
        .trim()
        .parse::<u32>()
        .ok()
}

/// Execute kill with the given signal argument.
fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Whether a process with the given PID exists.
pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

/// Stop the daemon via SIGTERM, escalating to SIGKILL after a grace period.
/// Returns true when a process was actually signalled.
pub async fn stop_daemon_process(paths: &DaemonPaths) -> bool {
    let Some(pid) = read_daemon_pid(paths) else {
        return false;
    };
    if !process_exists(pid) {
        cleanup_stale_files(paths);
        return false;
    }

    kill_signal("-15", pid);
    if wait_for_exit(pid, crate::env::timeout_exit()).await {
        return true;
    }

    kill_signal("-9", pid);
    wait_for_exit(pid, crate::env::timeout_exit()).await;
    cleanup_stale_files(paths);
    true
}

/// Wait for a process to exit.
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(crate::env::poll_interval()).await;
    }
    false
}

/// Probe whether the daemon socket is accepting connections.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

/// Remove stale socket and PID files when the recorded daemon is dead.
pub fn cleanup_stale_socket(paths: &DaemonPaths) {
    match read_daemon_pid(paths) {
        Some(pid) if process_exists(pid) => {}
        _ => cleanup_stale_files(paths),
    }
}

fn cleanup_stale_files(paths: &DaemonPaths) {
    let _ = std::fs::remove_file(&paths.socket_path);
    let _ = std::fs::remove_file(&paths.pid_path);
}

/// Startup marker prefix the daemon writes before anything else.
const STARTUP_MARKER_PREFIX: &str = "--- hkd: starting (pid: ";

/// Read the daemon log from the latest startup marker, looking for errors.
pub fn read_startup_error(paths: &DaemonPaths) -> Option<String> {
    let content = std::fs::read_to_string(&paths.log_path).ok()?;
    parse_startup_error(&content)
}

/// Parse startup errors from log content (pure logic, no I/O).
fn parse_startup_error(content: &str) -> Option<String> {
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    let errors: Vec<&str> = startup_log
        .lines()
        .filter(|line| line.contains("ERROR") || line.contains("Failed to start"))
        .collect();
    if errors.is_empty() {
        return None;
    }
    Some(errors.join("\n"))
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
