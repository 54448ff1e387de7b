// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for socket I/O.
//!
//! Accepts connections and handles each on its own task, gated by a fixed
//! worker pool. One request per connection. A request that overruns its
//! deadline gets no reply (the forwarder treats silence as fail-open), so
//! a stuck handler costs one worker slot, never the host.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::net::UnixListener;
use tokio::sync::{Notify, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use hk_core::{EventType, HookEvent};
use hk_engine::response;

use crate::protocol::{self, HealthInfo, ProtocolError, Request, StatusInfo};
use crate::shared::SharedState;

/// Fixed worker-pool size.
pub const WORKER_POOL_SIZE: usize = 8;

/// Shared context for all connection tasks.
pub struct ListenCtx {
    pub shared: Arc<SharedState>,
    pub shutdown: Arc<Notify>,
    permits: Arc<Semaphore>,
    inflight: Arc<AtomicUsize>,
}

impl ListenCtx {
    pub fn new(shared: Arc<SharedState>, shutdown: Arc<Notify>) -> Self {
        ListenCtx {
            shared,
            shutdown,
            permits: Arc::new(Semaphore::new(WORKER_POOL_SIZE)),
            inflight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of requests currently being processed (drain/idle guard).
    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter on drop, so early returns and timeouts
/// cannot leak a slot.
struct InflightGuard(Arc<AtomicUsize>);

impl InflightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        InflightGuard(Arc::clone(counter))
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Listener task accepting socket connections.
pub struct Listener {
    unix: UnixListener,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Listener { unix, ctx }
    }

    /// Accept loop; runs until the task is aborted at shutdown.
    pub async fn run(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    ctx.shared.touch();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("accept error: {}", e),
            }
        }
    }
}

fn log_connection_error(e: ProtocolError) {
    match e {
        ProtocolError::ConnectionClosed => debug!("client disconnected"),
        ProtocolError::Timeout => warn!("connection timeout"),
        _ => error!("connection error: {}", e),
    }
}

/// Handle a single client connection.
async fn handle_connection(
    stream: tokio::net::UnixStream,
    ctx: &ListenCtx,
) -> Result<(), ProtocolError> {
    let request_timeout = ctx.shared.snapshot().config.daemon.request_timeout();

    // Backpressure: wait for a worker slot, bounded by the request timeout.
    // Saturation past the bound closes the connection without a reply.
    let Ok(permit) = tokio::time::timeout(request_timeout, ctx.permits.acquire()).await else {
        warn!("worker pool saturated; closing connection (client fails open)");
        return Ok(());
    };
    let _permit = permit.map_err(|_| ProtocolError::ConnectionClosed)?;
    let _inflight = InflightGuard::enter(&ctx.inflight);

    let (mut reader, mut writer) = stream.into_split();
    let request = protocol::read_request(&mut reader, request_timeout).await?;
    let request_id = Uuid::new_v4().to_string();

    if matches!(request, Request::Event { .. }) {
        debug!(request_id, "received event request");
    } else {
        info!(request_id, request = ?request, "received control request");
    }

    // Per-request deadline. On overrun: log and close without replying.
    let response =
        match tokio::time::timeout(request_timeout, handle_request(request, ctx, &request_id))
            .await
        {
            Ok(response) => response,
            Err(_) => {
                warn!(
                    kind = "RequestTimeout",
                    request_id,
                    timeout_secs = request_timeout.as_secs(),
                    "request exceeded deadline; closing without reply"
                );
                return Ok(());
            }
        };

    protocol::write_json(&mut writer, &response, request_timeout).await?;
    Ok(())
}

/// Handle one request and produce the response JSON.
async fn handle_request(request: Request, ctx: &ListenCtx, request_id: &str) -> Value {
    match request {
        Request::Ping => json!({ "ok": true }),

        Request::Event {
            event_type,
            payload,
        } => handle_event(event_type, payload, ctx, request_id).await,

        Request::Status => {
            let snapshot = ctx.shared.snapshot();
            let info = StatusInfo {
                running: true,
                pid: std::process::id(),
                version: protocol::VERSION.to_string(),
                uptime_seconds: ctx.shared.uptime().as_secs(),
                degraded: snapshot.is_degraded(),
                handler_count: snapshot.registry.all().iter().filter(|r| r.enabled).count(),
                socket_path: ctx.shared.paths.socket_path.display().to_string(),
            };
            serde_json::to_value(info).unwrap_or_else(|_| json!({ "running": true }))
        }

        Request::Health => {
            let snapshot = ctx.shared.snapshot();
            let info = HealthInfo {
                running: true,
                degraded: snapshot.is_degraded(),
                config_errors: snapshot.degraded.clone().unwrap_or_default(),
                handler_count_by_event: snapshot.registry.counts_by_event(),
                uptime_seconds: ctx.shared.uptime().as_secs(),
            };
            serde_json::to_value(info).unwrap_or_else(|_| json!({ "running": true }))
        }

        Request::Logs => json!({ "lines": ctx.shared.log_buffer.lines() }),

        Request::Reload => {
            let outcome = ctx.shared.reload();
            json!({ "ok": outcome.ok, "errors": outcome.errors })
        }

        Request::Stop => {
            info!("shutdown requested via socket");
            ctx.shutdown.notify_one();
            json!({ "stopping": true })
        }
    }
}

/// Dispatch one hook event and render its response.
async fn handle_event(
    event_type: String,
    payload: serde_json::Map<String, Value>,
    ctx: &ListenCtx,
    request_id: &str,
) -> Value {
    let Ok(event_type) = event_type.parse::<EventType>() else {
        // Unknown lifecycle point from a newer host: fail open with the
        // universally-valid empty response.
        warn!(request_id, event_type = %event_type, "unknown event type; replying fail-open");
        return json!({});
    };

    let event = HookEvent::from_payload(event_type, payload);
    let snapshot = ctx.shared.snapshot();

    // Dispatch is CPU-bound handler code; keep it off the I/O workers.
    let outcome = {
        let shared = Arc::clone(&ctx.shared);
        let snapshot = Arc::clone(&snapshot);
        let request_id_owned = request_id.to_string();
        let handle = tokio::task::spawn_blocking(move || {
            shared
                .dispatcher
                .dispatch(&snapshot.registry, &event, &request_id_owned)
        });
        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                // A panicking handler is still contained: fail open.
                error!(request_id, "dispatch task failed: {e}");
                hk_engine::DispatchOutcome::allow()
            }
        }
    };

    let mut outcome = outcome;
    if let Some(errors) = &snapshot.degraded {
        let summary = errors.first().cloned().unwrap_or_default();
        outcome.context.insert(
            0,
            format!("hooks-daemon: configuration invalid, fix .claude/hooks-daemon.yaml ({summary})"),
        );
    }

    let rendered = response::render(event_type, &outcome);
    if response::validation_enabled() {
        if let Err(e) = response::validate(event_type, &rendered) {
            warn!(
                kind = "SchemaRenderError",
                request_id,
                event = %event_type,
                "rendered response failed schema check: {e}"
            );
        }
    }
    rendered
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
