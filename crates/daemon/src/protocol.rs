// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for daemon communication.
//!
//! Wire format, both directions: one UTF-8 JSON object terminated by `\n`
//! (or by half-close). One request, one response, one connection.
//!
//! Requests are a tagged enum. Responses are deliberately not: an event
//! request is answered with the event-shaped JSON the host consumes
//! verbatim, and control requests get small ad-hoc objects, so the write
//! side works in `serde_json::Value`.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,
}

/// Maximum frame size (1 MiB). Hook payloads are tool inputs and prompts;
/// anything larger is a protocol violation, not data.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Default timeout for one read or write on the socket.
pub const DEFAULT_IPC_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Daemon version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Request from a forwarder or the CLI to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Request {
    /// Liveness probe.
    Ping,

    /// Dispatch one hook event.
    ///
    /// `event_type` stays a string at this layer so an unknown name from a
    /// newer host degrades to a logged fail-open instead of a parse error.
    Event {
        event_type: String,
        #[serde(default)]
        payload: Map<String, Value>,
    },

    /// Human-oriented status summary.
    Status,

    /// Graceful shutdown.
    Stop,

    /// Rebuild config and handler registry.
    Reload,

    /// Current contents of the in-memory log ring buffer.
    Logs,

    /// Machine-oriented health report.
    Health,
}

/// `status` response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub running: bool,
    pub pid: u32,
    pub version: String,
    pub uptime_seconds: u64,
    pub degraded: bool,
    pub handler_count: usize,
    pub socket_path: String,
}

/// `health` response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthInfo {
    pub running: bool,
    pub degraded: bool,
    pub config_errors: Vec<String>,
    pub handler_count_by_event: BTreeMap<String, usize>,
    pub uptime_seconds: u64,
}

/// Encode a message to JSON bytes (no frame terminator).
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: json.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(json)
}

/// Decode a message from frame bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one newline-terminated frame from an async reader.
///
/// EOF before any byte is a closed connection; EOF after bytes terminates
/// the frame like a newline would (clients may half-close instead of
/// sending `\n`).
pub async fn read_frame<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<Vec<u8>, ProtocolError> {
    let mut frame = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            if frame.is_empty() {
                return Err(ProtocolError::ConnectionClosed);
            }
            return Ok(frame);
        }
        if let Some(pos) = chunk[..n].iter().position(|b| *b == b'\n') {
            frame.extend_from_slice(&chunk[..pos]);
            return Ok(frame);
        }
        frame.extend_from_slice(&chunk[..n]);
        if frame.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: frame.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
    }
}

/// Write one frame followed by the `\n` terminator.
pub async fn write_frame<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    writer.write_all(data).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Read a request with a timeout.
pub async fn read_request<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_frame(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

/// Write a JSON response with a timeout.
pub async fn write_json<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    value: &Value,
    timeout: std::time::Duration,
) -> Result<(), ProtocolError> {
    let data = encode(value)?;
    tokio::time::timeout(timeout, write_frame(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
