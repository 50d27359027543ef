use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::monitoring::metrics::METRICS;

/// Time-boxed read-through memo for a single value.
///
/// The value is reused until `ttl` elapses or [`invalidate`](Self::invalidate)
/// clears it. Concurrent misses may both load; the last one wins. A load
/// that overlaps an invalidation is returned to its caller but not stored.
pub struct ReadCache<T> {
    ttl: Duration,
    slot: Mutex<Option<(Instant, T)>>,
    generation: AtomicU64,
}

impl<T: Clone> ReadCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn get(&self) -> Option<T> {
        let slot = self.slot.lock().ok()?;
        match slot.as_ref() {
            Some((at, value)) if at.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    pub fn put(&self, value: T) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some((Instant::now(), value));
        }
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }

    /// Return the cached value or run `load` and cache its successful result.
    pub async fn get_or_load<E, F, Fut>(&self, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(v) = self.get() {
            METRICS.record_cache_hit();
            return Ok(v);
        }
        METRICS.record_cache_miss();
        let started = self.generation.load(Ordering::SeqCst);
        let value = load().await?;
        if let Ok(mut slot) = self.slot.lock() {
            if self.generation.load(Ordering::SeqCst) == started {
                *slot = Some((Instant::now(), value.clone()));
            }
        }
        Ok(value)
    }
}
