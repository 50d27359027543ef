use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::info;

/// Global metrics registry used across the journal.
pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::default);

#[derive(Default)]
struct MetricsInner {
    trades_created: AtomicU64,
    trades_updated: AtomicU64,
    trades_deleted: AtomicU64,
    uploads_ok: AtomicU64,
    uploads_failed: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

/// Lightweight metrics handle backed by atomics so it can be cloned cheaply.
#[derive(Clone, Default)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

impl Metrics {
    pub fn record_trade_created(&self, trade_id: &str) {
        self.inner.trades_created.fetch_add(1, Ordering::Relaxed);
        info!(
            target: "metrics",
            event = "trade_created",
            trade_id = %trade_id,
            total_created = self.inner.trades_created.load(Ordering::Relaxed),
            "trade created"
        );
    }

    pub fn record_trade_updated(&self, trade_id: &str) {
        self.inner.trades_updated.fetch_add(1, Ordering::Relaxed);
        info!(target: "metrics", event = "trade_updated", trade_id = %trade_id, "trade updated");
    }

    pub fn record_trade_deleted(&self, id: &str) {
        self.inner.trades_deleted.fetch_add(1, Ordering::Relaxed);
        info!(target: "metrics", event = "trade_deleted", id = %id, "trade deleted");
    }

    pub fn record_upload(&self, name: &str, ok: bool) {
        let counter = if ok {
            &self.inner.uploads_ok
        } else {
            &self.inner.uploads_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
        info!(target: "metrics", event = "upload", name = %name, ok, "attachment upload");
    }

    pub fn record_cache_hit(&self) {
        self.inner.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.inner.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            trades_created: load(&self.inner.trades_created),
            trades_updated: load(&self.inner.trades_updated),
            trades_deleted: load(&self.inner.trades_deleted),
            uploads_ok: load(&self.inner.uploads_ok),
            uploads_failed: load(&self.inner.uploads_failed),
            cache_hits: load(&self.inner.cache_hits),
            cache_misses: load(&self.inner.cache_misses),
        }
    }
}

/// Serializable view of current counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub trades_created: u64,
    pub trades_updated: u64,
    pub trades_deleted: u64,
    pub uploads_ok: u64,
    pub uploads_failed: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

pub fn log_metrics_snapshot(snapshot: &MetricsSnapshot) {
    info!(
        target: "metrics",
        event = "metrics_snapshot",
        trades_created = snapshot.trades_created,
        trades_updated = snapshot.trades_updated,
        trades_deleted = snapshot.trades_deleted,
        uploads_ok = snapshot.uploads_ok,
        uploads_failed = snapshot.uploads_failed,
        cache_hits = snapshot.cache_hits,
        cache_misses = snapshot.cache_misses,
        "metrics snapshot"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let m = Metrics::default();
        m.record_upload("a.png", true);
        m.record_upload("b.png", false);
        m.record_upload("c.png", false);
        m.record_cache_hit();
        let s = m.snapshot();
        assert_eq!(s.uploads_ok, 1);
        assert_eq!(s.uploads_failed, 2);
        assert_eq!(s.cache_hits, 1);
        assert_eq!(s.trades_created, 0);
    }
}
