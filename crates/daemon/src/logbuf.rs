// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory log ring buffer.
//!
//! A bounded buffer of formatted log lines, fed by a `tracing` layer and
//! served by the `logs` control request. Writers hold the lock only for the
//! append; readers get a snapshot copy.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Default number of retained lines.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Bounded ring of formatted log lines.
#[derive(Clone)]
pub struct LogBuffer {
    inner: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        LogBuffer {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, line: String) {
        let mut buf = self.inner.lock();
        if buf.len() == self.capacity {
            buf.pop_front();
        }
        buf.push_back(line);
    }

    /// Snapshot of the current contents, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// `tracing` layer appending formatted events to a [`LogBuffer`].
pub struct BufferLayer {
    buffer: LogBuffer,
}

impl BufferLayer {
    pub fn new(buffer: LogBuffer) -> Self {
        BufferLayer { buffer }
    }
}

impl<S: tracing::Subscriber> Layer<S> for BufferLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let mut line = format!(
            "{}.{:03} {:>5} {}: {}",
            ts.as_secs(),
            ts.subsec_millis(),
            meta.level(),
            meta.target(),
            visitor.message,
        );
        if !visitor.fields.is_empty() {
            let _ = write!(line, " {}", visitor.fields.trim_end());
        }
        self.buffer.push(line);
    }
}

/// Collects the `message` field plus `key=value` pairs.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            let _ = write!(self.fields, "{}={:?} ", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, "{}={} ", field.name(), value);
        }
    }
}

#[cfg(test)]
#[path = "logbuf_tests.rs"]
mod tests;
