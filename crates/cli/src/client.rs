// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::UnixStream;

use hk_core::DaemonPaths;
use hk_daemon::protocol::{self, HealthInfo, ProtocolError, Request, StatusInfo};

use crate::daemon_process::{
    cleanup_stale_socket, probe_socket, read_startup_error, start_daemon_background,
};
use crate::env::{poll_interval, timeout_connect, timeout_exit, timeout_ipc};

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Daemon rejected request: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One-shot request client for the daemon socket.
#[derive(Debug)]
pub struct DaemonClient {
    paths: DaemonPaths,
}

impl DaemonClient {
    /// Connect to an existing daemon (no auto-start).
    pub fn connect(paths: DaemonPaths) -> Result<Self, ClientError> {
        if !paths.socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(DaemonClient { paths })
    }

    /// Connect, starting a daemon first when none is running.
    pub fn connect_or_start(paths: DaemonPaths) -> Result<Self, ClientError> {
        match Self::connect(paths.clone()) {
            Ok(client) => {
                if probe_socket(&client.paths.socket_path) {
                    Ok(client)
                } else {
                    // Socket file without a listener: crashed daemon
                    cleanup_stale_socket(&client.paths);
                    let child = start_daemon_background(&client.paths)?;
                    Self::connect_with_retry(paths, timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background(&paths)?;
                Self::connect_with_retry(paths, timeout_connect(), child)
            }
            Err(e) => Err(e),
        }
    }

    pub fn socket_path(&self) -> &PathBuf {
        &self.paths.socket_path
    }

    fn connect_with_retry(
        paths: DaemonPaths,
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            // A child that exited early is a startup failure; surface the
            // error line it wrote behind the startup marker.
            if let Ok(Some(status)) = child.try_wait() {
                let poll_start = Instant::now();
                while poll_start.elapsed() < timeout_exit() {
                    if let Some(err) = read_startup_error(&paths) {
                        return Err(ClientError::DaemonStartFailed(err));
                    }
                    std::thread::sleep(poll_interval());
                }
                return Err(ClientError::DaemonStartFailed(format!(
                    "exited with {status}"
                )));
            }

            if paths.socket_path.exists() && probe_socket(&paths.socket_path) {
                return Ok(DaemonClient { paths });
            }
            std::thread::sleep(poll_interval());
        }
        Err(ClientError::DaemonStartTimeout)
    }

    /// Send one request and read the response JSON.
    pub async fn send(&self, request: &Request) -> Result<Value, ClientError> {
        self.send_with_timeout(request, timeout_ipc()).await
    }

    /// Send one request with an explicit read timeout.
    pub async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
    ) -> Result<Value, ClientError> {
        let stream = UnixStream::connect(&self.paths.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(request)?;
        tokio::time::timeout(timeout_ipc(), protocol::write_frame(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let frame = tokio::time::timeout(read_timeout, protocol::read_frame(&mut reader))
            .await
            .map_err(|_| ProtocolError::Timeout)??;
        Ok(protocol::decode(&frame)?)
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        let response = self.send(&Request::Ping).await?;
        if response.get("ok") == Some(&Value::Bool(true)) {
            Ok(())
        } else {
            Err(ClientError::UnexpectedResponse)
        }
    }

    pub async fn status(&self) -> Result<StatusInfo, ClientError> {
        let response = self.send(&Request::Status).await?;
        serde_json::from_value(response).map_err(|_| ClientError::UnexpectedResponse)
    }

    pub async fn health(&self) -> Result<HealthInfo, ClientError> {
        let response = self.send(&Request::Health).await?;
        serde_json::from_value(response).map_err(|_| ClientError::UnexpectedResponse)
    }

    pub async fn logs(&self) -> Result<Vec<String>, ClientError> {
        let response = self.send(&Request::Logs).await?;
        serde_json::from_value(
            response
                .get("lines")
                .cloned()
                .unwrap_or_else(|| json!([])),
        )
        .map_err(|_| ClientError::UnexpectedResponse)
    }

    pub async fn reload(&self) -> Result<(bool, Vec<String>), ClientError> {
        let response = self.send(&Request::Reload).await?;
        let ok = response.get("ok").and_then(Value::as_bool).unwrap_or(false);
        let errors = response
            .get("errors")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok((ok, errors))
    }

    pub async fn stop(&self) -> Result<(), ClientError> {
        let response = self.send(&Request::Stop).await?;
        if response.get("stopping") == Some(&Value::Bool(true)) {
            Ok(())
        } else {
            Err(ClientError::UnexpectedResponse)
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
