// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hooks Daemon (hkd)
//!
//! Long-lived background process that executes hook handlers for a host
//! tool with millisecond latency.
//!
//! Architecture:
//! - Listener task: accepts socket connections, one task per request
//! - Main loop: signals, idle auto-shutdown, drain

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod lifecycle;
mod listener;
mod logbuf;
mod protocol;
mod shared;

use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{info, warn};

use hk_core::DaemonPaths;

use crate::lifecycle::{LifecycleError, StartupResult};
use crate::listener::{ListenCtx, Listener};
use crate::logbuf::LogBuffer;
use crate::shared::SharedState;

/// Exit code for the single-instance guard.
const EXIT_ALREADY_RUNNING: i32 = 3;

#[tokio::main]
async fn main() {
    // Info flags before any lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("hkd {}", protocol::VERSION);
                return;
            }
            "--help" | "-h" | "help" => {
                print_help();
                return;
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: hkd [--help | --version]");
                std::process::exit(2);
            }
        }
    }

    let exit_code = run().await;
    std::process::exit(exit_code);
}

async fn run() -> i32 {
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("error: cannot determine working directory: {e}");
            return 1;
        }
    };

    // Resolve all paths once. self_install_mode has to be sniffed before
    // the full config load because it decides where the daemon root is.
    let self_install = match hk_core::find_project_root(&cwd) {
        Ok(root) => hk_config::read_self_install_mode(&hk_core::paths::config_path(&root)),
        Err(_) => false,
    };
    let paths = match DaemonPaths::resolve(&cwd, self_install) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };

    let loaded = hk_config::load(&paths.config_path);
    let enforce_single: Option<bool> = loaded.config.daemon.enforce_single_daemon_process;
    let idle_timeout = loaded.config.daemon.idle_timeout();
    let request_timeout = loaded.config.daemon.request_timeout();

    rotate_log_if_needed(&paths.log_path);
    if let Err(e) = write_startup_marker(&paths.log_path) {
        eprintln!("error: cannot write log file: {e}");
        return 1;
    }

    let log_buffer = LogBuffer::default();
    let log_guard = match setup_logging(&paths, &loaded.config.daemon.log_level, log_buffer.clone())
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: logging setup failed: {e}");
            return 1;
        }
    };

    info!("starting hooks daemon");

    let StartupResult { state, listener } =
        match lifecycle::startup(&paths, enforce_single).await {
            Ok(result) => result,
            Err(LifecycleError::AlreadyRunning { pid }) => {
                eprintln!("hkd is already running");
                if let Some(pid) = pid {
                    eprintln!("  pid: {pid}");
                }
                return EXIT_ALREADY_RUNNING;
            }
            Err(e) => {
                write_startup_error(&paths.log_path, &e);
                tracing::error!("failed to start daemon: {e}");
                drop(log_guard);
                eprintln!("error: {e}");
                return 1;
            }
        };

    let shutdown_notify = Arc::new(Notify::new());
    let shared = Arc::new(SharedState::new(paths.clone(), loaded, log_buffer));
    let ctx = Arc::new(ListenCtx::new(
        Arc::clone(&shared),
        Arc::clone(&shutdown_notify),
    ));

    let listener_task = tokio::spawn(Listener::new(listener, Arc::clone(&ctx)).run());

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot install SIGTERM handler: {e}");
            return 1;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot install SIGINT handler: {e}");
            return 1;
        }
    };

    info!(
        socket = %paths.socket_path.display(),
        idle_timeout_secs = idle_timeout.map(|t| t.as_secs()),
        "daemon ready"
    );

    // Signal readiness to the spawning CLI
    println!("READY");

    // NOTE: must be created outside the loop; select! re-evaluates branches
    // on each iteration and a fresh interval would never fire under load.
    let mut idle_check = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = shutdown_notify.notified() => {
                info!("shutdown requested via socket");
                break;
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
            _ = idle_check.tick() => {
                let Some(limit) = idle_timeout else { continue };
                if ctx.inflight() == 0 && shared.idle_for() >= limit {
                    info!(
                        idle_secs = shared.idle_for().as_secs(),
                        "idle timeout reached, shutting down"
                    );
                    break;
                }
            }
        }
    }

    // Draining: stop accepting, then wait out in-flight requests bounded
    // by the request timeout.
    listener_task.abort();
    let drain_start = std::time::Instant::now();
    while ctx.inflight() > 0 && drain_start.elapsed() < request_timeout {
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    if ctx.inflight() > 0 {
        warn!(inflight = ctx.inflight(), "drain timeout; abandoning in-flight requests");
    }

    state.shutdown();
    info!("daemon stopped");
    0
}

fn print_help() {
    println!("hkd {}", protocol::VERSION);
    println!("Hooks daemon - executes hook handlers for the host tool");
    println!();
    println!("USAGE:");
    println!("    hkd");
    println!();
    println!("The daemon is normally started by the `hk` CLI (or lazily by the");
    println!("hook forwarder) and should not be invoked directly. It listens on");
    println!("a per-project Unix socket for hook events and control requests.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log at startup if it has grown too large.
///
/// Best-effort: rotation failures must not keep the daemon down.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let _ = std::fs::rename(format!("{log_str}.{i}"), format!("{log_str}.{}", i + 1));
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Startup marker prefix written to the log before anything else.
/// The CLI uses it to find where the current startup attempt begins.
const STARTUP_MARKER_PREFIX: &str = "--- hkd: starting (pid: ";

fn write_startup_marker(log_path: &std::path::Path) -> std::io::Result<()> {
    use std::io::Write;

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(file, "{}{}) ---\n", STARTUP_MARKER_PREFIX, std::process::id())
}

/// Write a startup error synchronously so the CLI can surface it even when
/// the process exits before the async log writer flushes.
fn write_startup_error(log_path: &std::path::Path, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {error}");
}

fn setup_logging(
    paths: &DaemonPaths,
    config_level: &str,
    buffer: LogBuffer,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let parent = paths
        .log_path
        .parent()
        .ok_or_else(|| LifecycleError::Io(std::io::Error::other("log path has no parent")))?;
    std::fs::create_dir_all(parent)?;
    let file_name = paths
        .log_path
        .file_name()
        .ok_or_else(|| LifecycleError::Io(std::io::Error::other("log path has no file name")))?;

    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // LOG_LEVEL env wins over the config's log_level
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| config_level.to_string());
    let filter = EnvFilter::try_new(level.to_ascii_lowercase())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .with(crate::logbuf::BufferLayer::new(buffer))
        .init();

    Ok(guard)
}
