// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hk daemon` - daemon management commands

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::{ClientError, DaemonClient};
use crate::daemon_process;
use crate::exit_error::{ExitError, EXIT_ALREADY_RUNNING};
use crate::output::OutputFormat;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (background by default)
    Start {
        /// Run in the foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop,
    /// Check daemon status (exit 0 iff running)
    Status,
    /// Stop and restart the daemon
    Restart,
    /// Dump the daemon's in-memory log buffer
    Logs {
        /// Read the log file directly instead of asking the daemon
        #[arg(long)]
        file: bool,
    },
    /// Print the daemon's health report as JSON
    Health,
    /// Ask the running daemon to rebuild config and handler registry
    Reload,
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    match args.command {
        DaemonCommand::Start { foreground } => start(foreground).await,
        DaemonCommand::Stop => stop().await,
        DaemonCommand::Status => status(format).await,
        DaemonCommand::Restart => restart().await,
        DaemonCommand::Logs { file } => logs(file).await,
        DaemonCommand::Health => health().await,
        DaemonCommand::Reload => reload().await,
    }
}

async fn start(foreground: bool) -> Result<()> {
    let paths = crate::paths::resolve()?;

    if foreground {
        let status = std::process::Command::new(daemon_process::find_hkd_binary())
            .current_dir(&paths.project_root)
            .status()?;
        return match status.code() {
            Some(0) => Ok(()),
            Some(EXIT_ALREADY_RUNNING) => {
                Err(ExitError::new(EXIT_ALREADY_RUNNING, "daemon already running").into())
            }
            _ => Err(anyhow!("daemon exited with {status}")),
        };
    }

    // Already running?
    if let Ok(client) = DaemonClient::connect(paths.clone()) {
        if let Ok(info) = client.status().await {
            println!("Daemon already running (pid {}, uptime {}s)", info.pid, info.uptime_seconds);
            return Err(ExitError::silent(EXIT_ALREADY_RUNNING).into());
        }
    }

    match DaemonClient::connect_or_start(paths) {
        Ok(_) => {
            println!("Daemon started");
            Ok(())
        }
        Err(e) => Err(anyhow!("{e}")),
    }
}

async fn stop() -> Result<()> {
    let paths = crate::paths::resolve()?;

    // Prefer the graceful socket path; fall back to signals.
    if let Ok(client) = DaemonClient::connect(paths.clone()) {
        if client.stop().await.is_ok() {
            if let Some(pid) = daemon_process::read_daemon_pid(&paths) {
                daemon_process::wait_for_exit(pid, crate::env::timeout_exit()).await;
            }
            println!("Daemon stopped");
            return Ok(());
        }
    }

    if daemon_process::stop_daemon_process(&paths).await {
        println!("Daemon stopped");
    } else {
        println!("Daemon not running");
    }
    Ok(())
}

async fn status(format: OutputFormat) -> Result<()> {
    let paths = crate::paths::resolve()?;

    let not_running = || -> Result<()> {
        match format {
            OutputFormat::Text => println!("NOT RUNNING"),
            OutputFormat::Json => println!(r#"{{ "running": false }}"#),
        }
        Err(ExitError::silent(1).into())
    };

    let Ok(client) = DaemonClient::connect(paths) else {
        return not_running();
    };
    let info = match client.status().await {
        Ok(info) => info,
        Err(ClientError::Io(_)) | Err(ClientError::Protocol(_)) => return not_running(),
        Err(e) => return Err(anyhow!("{e}")),
    };

    match format {
        OutputFormat::Text => {
            println!("RUNNING");
            println!("  pid: {}", info.pid);
            println!("  version: {}", info.version);
            println!("  uptime: {}s", info.uptime_seconds);
            println!("  handlers: {}", info.handler_count);
            println!("  socket: {}", info.socket_path);
            if info.degraded {
                println!("  degraded: yes (run `hk daemon health` for details)");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
    }
    Ok(())
}

async fn restart() -> Result<()> {
    let paths = crate::paths::resolve()?;

    if let Ok(client) = DaemonClient::connect(paths.clone()) {
        let _ = client.stop().await;
        if let Some(pid) = daemon_process::read_daemon_pid(&paths) {
            daemon_process::wait_for_exit(pid, crate::env::timeout_exit()).await;
        }
    } else {
        daemon_process::stop_daemon_process(&paths).await;
    }

    match DaemonClient::connect_or_start(paths) {
        Ok(_) => {
            println!("Daemon restarted");
            Ok(())
        }
        Err(e) => Err(anyhow!("{e}")),
    }
}

async fn logs(from_file: bool) -> Result<()> {
    let paths = crate::paths::resolve()?;

    if from_file {
        match std::fs::read_to_string(&paths.log_path) {
            Ok(content) => print!("{content}"),
            Err(_) => println!("No log file at {}", paths.log_path.display()),
        }
        return Ok(());
    }

    let client = DaemonClient::connect(paths).map_err(|e| anyhow!("{e}"))?;
    for line in client.logs().await.map_err(|e| anyhow!("{e}"))? {
        println!("{line}");
    }
    Ok(())
}

async fn health() -> Result<()> {
    let paths = crate::paths::resolve()?;

    let offline = hk_daemon::protocol::HealthInfo {
        running: false,
        degraded: false,
        config_errors: Vec::new(),
        handler_count_by_event: Default::default(),
        uptime_seconds: 0,
    };

    let info = match DaemonClient::connect(paths) {
        Ok(client) => client.health().await.unwrap_or(offline),
        Err(_) => offline,
    };
    println!("{}", serde_json::to_string_pretty(&info)?);
    if info.running {
        Ok(())
    } else {
        Err(ExitError::silent(1).into())
    }
}

async fn reload() -> Result<()> {
    let paths = crate::paths::resolve()?;
    let client = DaemonClient::connect(paths).map_err(|e| anyhow!("{e}"))?;

    let (ok, errors) = client.reload().await.map_err(|e| anyhow!("{e}"))?;
    if ok {
        println!("Config reloaded");
        Ok(())
    } else {
        eprintln!("Config invalid; previous registry kept:");
        for error in errors {
            eprintln!("  {error}");
        }
        Err(ExitError::silent(1).into())
    }
}
