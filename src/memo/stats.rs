//! Memo Statistics Module
//!
//! Tracks how calls to a memoized function were served.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Memo Stats ==
/// Live counters for one memoized function.
#[derive(Debug, Default)]
pub struct MemoStats {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    computations: AtomicU64,
    producer_failures: AtomicU64,
    store_read_errors: AtomicU64,
    store_write_errors: AtomicU64,
    skipped_writes: AtomicU64,
}

impl MemoStats {
    // == Constructor ==
    /// Creates a new MemoStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Served from the store.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Not found in the store (including reads that failed).
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Attached to a computation another caller started.
    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    /// Started a producer invocation.
    pub fn record_computation(&self) {
        self.computations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_producer_failure(&self) {
        self.producer_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_read_error(&self) {
        self.store_read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_write_error(&self) {
        self.store_write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_write(&self) {
        self.skipped_writes.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            producer_failures: self.producer_failures.load(Ordering::Relaxed),
            store_read_errors: self.store_read_errors.load(Ordering::Relaxed),
            store_write_errors: self.store_write_errors.load(Ordering::Relaxed),
            skipped_writes: self.skipped_writes.load(Ordering::Relaxed),
            taken_at: Utc::now(),
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time copy of [`MemoStats`].
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Calls answered from the store
    pub hits: u64,
    /// Calls that found nothing in the store
    pub misses: u64,
    /// Misses that joined an in-flight computation
    pub coalesced: u64,
    /// Producer invocations
    pub computations: u64,
    /// Producer invocations that failed
    pub producer_failures: u64,
    /// Store reads that errored (served as misses)
    pub store_read_errors: u64,
    /// Store writes that errored (dropped)
    pub store_write_errors: u64,
    /// Writes skipped because the TTL resolved to zero
    pub skipped_writes: u64,
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Calculates the store hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no calls have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = MemoStats::new().snapshot();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.coalesced, 0);
        assert_eq!(stats.computations, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(MemoStats::new().snapshot().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = MemoStats::new();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.snapshot().hit_rate(), 0.5);
    }

    #[test]
    fn test_failure_counters() {
        let stats = MemoStats::new();
        stats.record_producer_failure();
        stats.record_store_read_error();
        stats.record_store_write_error();
        stats.record_store_write_error();
        stats.record_skipped_write();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.producer_failures, 1);
        assert_eq!(snapshot.store_read_errors, 1);
        assert_eq!(snapshot.store_write_errors, 2);
        assert_eq!(snapshot.skipped_writes, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let stats = MemoStats::new();
        stats.record_computation();

        let json = serde_json::to_string(&stats.snapshot()).unwrap();
        assert!(json.contains("\"computations\":1"));
        assert!(json.contains("taken_at"));
    }
}
