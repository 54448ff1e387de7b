// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, single-instance guard, shutdown.

use std::fs::File;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use hk_core::{DaemonPaths, PathError};

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("daemon already running{}", pid.map(|p| format!(" (pid {p})")).unwrap_or_default())]
    AlreadyRunning { pid: Option<u32> },

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Live daemon state for the life of the process.
#[derive(Debug)]
pub struct DaemonState {
    pub paths: DaemonPaths,
    // NOTE(lifetime): held to maintain the exclusive PID lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub start_time: Instant,
}

/// What startup hands back to `main`.
#[derive(Debug)]
pub struct StartupResult {
    pub state: DaemonState,
    pub listener: UnixListener,
}

/// Start the daemon: take the instance lock, clean stale files, bind.
///
/// `enforce_single_process: None` means "only inside containers".
pub async fn startup(
    paths: &DaemonPaths,
    enforce_single_process: Option<bool>,
) -> Result<StartupResult, LifecycleError> {
    match startup_inner(paths, enforce_single_process).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Never clean up when the lock is held elsewhere: those files
            // belong to the running daemon.
            if !matches!(e, LifecycleError::AlreadyRunning { .. }) {
                cleanup_on_failure(paths);
            }
            Err(e)
        }
    }
}

async fn startup_inner(
    paths: &DaemonPaths,
    enforce_single_process: Option<bool>,
) -> Result<StartupResult, LifecycleError> {
    if let Some(parent) = paths.pid_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Some(parent) = paths.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Acquire the PID lock FIRST. Open without truncating so a losing race
    // does not wipe the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.pid_path)?;
    if lock_file.try_lock_exclusive().is_err() {
        return Err(LifecycleError::AlreadyRunning {
            pid: read_pid(&paths.pid_path),
        });
    }

    // The lock is ours; a recorded PID now belongs to a dead daemon.
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    if enforce_single_process.unwrap_or_else(in_container) {
        if let Some(pid) = other_daemon_process() {
            return Err(LifecycleError::AlreadyRunning { pid: Some(pid) });
        }
    }

    // Stale socket from a crashed daemon: we hold the lock, so any socket
    // file left at this path has no owner.
    if paths.socket_path.exists() {
        std::fs::remove_file(&paths.socket_path)?;
    }
    let listener = UnixListener::bind(&paths.socket_path)
        .map_err(|e| LifecycleError::BindFailed(paths.socket_path.clone(), e))?;
    restrict_socket_mode(&paths.socket_path);

    info!(socket = %paths.socket_path.display(), "daemon started");

    Ok(StartupResult {
        state: DaemonState {
            paths: paths.clone(),
            lock_file,
            start_time: Instant::now(),
        },
        listener,
    })
}

impl DaemonState {
    /// Graceful shutdown: remove socket and PID file; the lock releases
    /// when `lock_file` drops.
    pub fn shutdown(&self) {
        info!("shutting down daemon");
        for path in [&self.paths.socket_path, &self.paths.pid_path] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), "failed to remove runtime file: {e}");
                }
            }
        }
        info!("daemon shutdown complete");
    }
}

/// The socket is the trust boundary; keep it owner-only.
fn restrict_socket_mode(socket_path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) =
        std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))
    {
        warn!(socket = %socket_path.display(), "failed to restrict socket mode: {e}");
    }
}

/// Read the PID recorded in a PID file.
pub fn read_pid(pid_path: &Path) -> Option<u32> {
    std::fs::read_to_string(pid_path)
        .ok()?
        .trim()
        .parse::<u32>()
        .ok()
}

/// Whether a process with this PID is alive (signal 0 probe).
pub fn process_exists(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
}

/// Container heuristic for auto-enabling the process-table guard.
fn in_container() -> bool {
    Path::new("/.dockerenv").exists() || std::env::var_os("container").is_some()
}

/// Scan the process table for another live daemon binary.
#[cfg(target_os = "linux")]
fn other_daemon_process() -> Option<u32> {
    let own_pid = std::process::id();
    let entries = std::fs::read_dir("/proc").ok()?;
    for entry in entries.flatten() {
        let Ok(pid) = entry.file_name().to_string_lossy().parse::<u32>() else {
            continue;
        };
        if pid == own_pid {
            continue;
        }
        let Ok(comm) = std::fs::read_to_string(entry.path().join("comm")) else {
            continue;
        };
        if comm.trim() == "hkd" {
            return Some(pid);
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
fn other_daemon_process() -> Option<u32> {
    None
}

/// Remove runtime files created by a failed startup.
fn cleanup_on_failure(paths: &DaemonPaths) {
    for path in [&paths.socket_path, &paths.pid_path] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
