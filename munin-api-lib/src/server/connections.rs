use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::telemetry::Metrics;

/// Counters for accepted connections, read by shutdown logging and metrics.
#[derive(Debug, Default)]
pub struct ConnectionCount {
    current: AtomicUsize,
    total: AtomicUsize,
}

impl ConnectionCount {
    pub fn increment(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement(&self) {
        self.current
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1))
            .ok();
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }
}

/// Decrements the connection counters when the connection task finishes,
/// however it finishes.
pub(crate) struct ConnectionGuard {
    connections: Arc<ConnectionCount>,
    metrics: Option<Arc<Metrics>>,
}

impl ConnectionGuard {
    pub(crate) fn new(connections: Arc<ConnectionCount>, metrics: Option<Arc<Metrics>>) -> Self {
        connections.increment();
        if let Some(m) = &metrics {
            m.record_connection_opened();
        }
        Self { connections, metrics }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.connections.decrement();
        if let Some(m) = &self.metrics {
            m.record_connection_closed();
        }
    }
}
