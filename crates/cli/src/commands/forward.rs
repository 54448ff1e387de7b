// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hk forward` - the hook forwarder.
//!
//! The host tool invokes the committed hook scripts with the event JSON on
//! stdin; each script execs `hk forward <EventType>`. The contract is
//! load-bearing: whatever goes wrong (no daemon, no socket, broken
//! response, timeout) stdout gets exactly `{}` and the exit code is 0, so
//! a dead daemon can never block the host.

use std::io::Read;

use anyhow::Result;
use clap::Args;
use serde_json::{Map, Value};
use tokio::net::UnixStream;

use hk_core::DaemonPaths;
use hk_daemon::protocol::{self, Request};

use crate::client::DaemonClient;

#[derive(Args)]
pub struct ForwardArgs {
    /// Event type (read from the payload's hook_event_name when omitted)
    pub event_type: Option<String>,

    /// Start a daemon when none is running, then retry once
    #[arg(long)]
    pub spawn: bool,
}

pub async fn forward(args: ForwardArgs) -> Result<()> {
    match try_forward(args).await {
        Ok(response) => println!("{response}"),
        Err(e) => {
            // Fail open. Never an error exit, never a missing response.
            eprintln!("hk forward: {e}");
            println!("{{}}");
        }
    }
    Ok(())
}

async fn try_forward(args: ForwardArgs) -> Result<String, ForwardError> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let payload: Map<String, Value> = match serde_json::from_str(&input) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) if input.trim().is_empty() => Map::new(),
        Ok(other) => return Err(ForwardError::BadInput(format!("expected object, got {other}"))),
        Err(e) => return Err(ForwardError::BadInput(e.to_string())),
    };

    let event_type = args
        .event_type
        .clone()
        .or_else(|| {
            payload
                .get("hook_event_name")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .ok_or(ForwardError::NoEventType)?;

    let paths = crate::paths::resolve()?;
    let autostart = args.spawn
        || hk_config::load(&paths.config_path)
            .config
            .daemon
            .autostart_on_hook;

    let socket_path = connect_target(&paths, autostart)?;

    let stream = UnixStream::connect(&socket_path).await?;
    let (mut reader, mut writer) = stream.into_split();

    let request = Request::Event {
        event_type,
        payload,
    };
    let data = protocol::encode(&request)?;
    tokio::time::timeout(
        crate::env::timeout_ipc(),
        protocol::write_frame(&mut writer, &data),
    )
    .await
    .map_err(|_| protocol::ProtocolError::Timeout)??;

    // The daemon enforces its own request deadline and answers with
    // silence on overrun; outlast it slightly and treat silence as an
    // error (which fails open above).
    let frame = tokio::time::timeout(
        crate::env::timeout_event(),
        protocol::read_frame(&mut reader),
    )
    .await
    .map_err(|_| protocol::ProtocolError::Timeout)??;

    // Pass the daemon's JSON through verbatim, but never emit garbage
    let response: Value = serde_json::from_slice(&frame)?;
    Ok(response.to_string())
}

/// Socket to talk to, optionally lazily starting a daemon.
fn connect_target(
    paths: &DaemonPaths,
    autostart: bool,
) -> Result<std::path::PathBuf, ForwardError> {
    if crate::daemon_process::probe_socket(&paths.socket_path) {
        return Ok(paths.socket_path.clone());
    }
    if !autostart {
        return Err(ForwardError::NoDaemon(paths.socket_path.clone()));
    }

    crate::daemon_process::cleanup_stale_socket(paths);
    let client = DaemonClient::connect_or_start(paths.clone())
        .map_err(|e| ForwardError::Spawn(e.to_string()))?;
    Ok(client.socket_path().clone())
}

#[derive(Debug, thiserror::Error)]
enum ForwardError {
    #[error("no daemon listening at {}", .0.display())]
    NoDaemon(std::path::PathBuf),

    #[error("event type not given and payload has no hook_event_name")]
    NoEventType,

    #[error("invalid event payload: {0}")]
    BadInput(String),

    #[error("failed to start daemon: {0}")]
    Spawn(String),

    #[error(transparent)]
    Paths(#[from] hk_core::PathError),

    #[error(transparent)]
    Protocol(#[from] hk_daemon::protocol::ProtocolError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
