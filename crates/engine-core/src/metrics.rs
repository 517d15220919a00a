use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    bytes_fetched: AtomicU64,
    rows_written: AtomicU64,
    chunks_written: AtomicU64,
    values_nulled: AtomicU64,
    partitions_completed: AtomicU64,
    partitions_failed: AtomicU64,
    retry_count: AtomicU64,
}

/// Run-wide counters shared by every partition task.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub bytes_fetched: u64,
    pub rows_written: u64,
    pub chunks_written: u64,
    pub values_nulled: u64,
    pub partitions_completed: u64,
    pub partitions_failed: u64,
    pub retry_count: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_bytes(&self, count: u64) {
        self.inner.bytes_fetched.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_rows(&self, count: u64) {
        self.inner.rows_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_chunks(&self, count: u64) {
        self.inner.chunks_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_nulled(&self, count: u64) {
        self.inner.values_nulled.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_completed(&self) {
        self.inner
            .partitions_completed
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.inner.partitions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retries(&self, count: u64) {
        self.inner.retry_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bytes_fetched: self.inner.bytes_fetched.load(Ordering::Relaxed),
            rows_written: self.inner.rows_written.load(Ordering::Relaxed),
            chunks_written: self.inner.chunks_written.load(Ordering::Relaxed),
            values_nulled: self.inner.values_nulled.load(Ordering::Relaxed),
            partitions_completed: self.inner.partitions_completed.load(Ordering::Relaxed),
            partitions_failed: self.inner.partitions_failed.load(Ordering::Relaxed),
            retry_count: self.inner.retry_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = Metrics::new();
        let clone = metrics.clone();
        clone.increment_rows(250_000);
        clone.increment_chunks(3);
        metrics.increment_completed();
        metrics.increment_nulled(1);

        let snap = metrics.snapshot();
        assert_eq!(snap.rows_written, 250_000);
        assert_eq!(snap.chunks_written, 3);
        assert_eq!(snap.partitions_completed, 1);
        assert_eq!(snap.values_nulled, 1);
        assert_eq!(snap.partitions_failed, 0);
    }
}
