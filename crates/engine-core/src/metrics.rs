use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    fetch_calls: AtomicU64,
    rows_fetched: AtomicU64,
    rows_written: AtomicU64,
    truncated_fetches: AtomicU64,
    failure_count: AtomicU64,
}

/// Run counters, shared by every task of a run.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub fetch_calls: u64,
    pub rows_fetched: u64,
    pub rows_written: u64,
    pub truncated_fetches: u64,
    pub failure_count: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_fetches(&self, count: u64) {
        self.inner.fetch_calls.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_rows_fetched(&self, count: u64) {
        self.inner.rows_fetched.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_rows_written(&self, count: u64) {
        self.inner.rows_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_truncations(&self, count: u64) {
        self.inner
            .truncated_fetches
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_failures(&self, count: u64) {
        self.inner.failure_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fetch_calls: self.inner.fetch_calls.load(Ordering::Relaxed),
            rows_fetched: self.inner.rows_fetched.load(Ordering::Relaxed),
            rows_written: self.inner.rows_written.load(Ordering::Relaxed),
            truncated_fetches: self.inner.truncated_fetches.load(Ordering::Relaxed),
            failure_count: self.inner.failure_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
