use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for one node, shared between the node task and the monitor.
pub struct NodeMetrics {
    node_id: String,
    tuples_joined: AtomicU64,
    values_emitted: AtomicU64,
    errors_count: AtomicU64,
    total_transform_us: AtomicU64,
    transform_samples: AtomicU64,
}

/// Point-in-time copy of a node's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub node_id: String,
    pub tuples_joined: u64,
    pub values_emitted: u64,
    pub errors_count: u64,
    pub avg_transform_us: u64,
}

impl NodeMetrics {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            tuples_joined: AtomicU64::new(0),
            values_emitted: AtomicU64::new(0),
            errors_count: AtomicU64::new(0),
            total_transform_us: AtomicU64::new(0),
            transform_samples: AtomicU64::new(0),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn tuples_joined(&self) -> u64 {
        self.tuples_joined.load(Ordering::Relaxed)
    }

    pub fn values_emitted(&self) -> u64 {
        self.values_emitted.load(Ordering::Relaxed)
    }

    pub fn errors_count(&self) -> u64 {
        self.errors_count.load(Ordering::Relaxed)
    }

    pub fn record_tuple(&self) {
        self.tuples_joined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emitted(&self, count: usize) {
        self.values_emitted.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_transform(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_transform(&self, start: Instant) {
        let elapsed_us = start.elapsed().as_micros() as u64;
        self.total_transform_us.fetch_add(elapsed_us, Ordering::Relaxed);
        self.transform_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Mean transformation time in microseconds, 0 before the first call
    pub fn avg_transform_us(&self) -> u64 {
        let samples = self.transform_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_transform_us.load(Ordering::Relaxed) / samples
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            node_id: self.node_id.clone(),
            tuples_joined: self.tuples_joined(),
            values_emitted: self.values_emitted(),
            errors_count: self.errors_count(),
            avg_transform_us: self.avg_transform_us(),
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    /// One report block per node.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.node_id)?;
        writeln!(f, "  Joined: {} tuples", self.tuples_joined)?;
        writeln!(f, "  Emitted: {} values", self.values_emitted)?;
        match self.errors_count {
            1 => writeln!(f, "  Errors: 1 error")?,
            n => writeln!(f, "  Errors: {} errors", n)?,
        }
        writeln!(f, "  Avg Transform: {}μs", self.avg_transform_us)
    }
}
