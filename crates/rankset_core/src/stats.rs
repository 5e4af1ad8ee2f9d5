//! Counters for rebalancing and cache-aside reads.
//!
//! All counters are atomic, monotonically increasing, and can be read while
//! operations are in progress.
//!
//! # Usage
//!
//! ```rust,ignore
//! let reader = CacheAside::new(set);
//! // ... reads ...
//! let stats = reader.stats();
//! println!("hit ratio: {:.2}", stats.hit_ratio());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by a partitioned set.
#[derive(Debug, Default)]
pub struct RebalanceStats {
    /// Logical inserts.
    inserts: AtomicU64,
    /// Logical removes.
    removes: AtomicU64,
    /// Elements pushed to a later segment by overflow propagation.
    moved_backward: AtomicU64,
    /// Elements pulled to an earlier segment by backfill.
    moved_forward: AtomicU64,
}

impl RebalanceStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_moved_backward(&self, count: u64) {
        self.moved_backward.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_moved_forward(&self, count: u64) {
        self.moved_forward.fetch_add(count, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters.
    pub fn snapshot(&self) -> RebalanceSnapshot {
        RebalanceSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            moved_backward: self.moved_backward.load(Ordering::Relaxed),
            moved_forward: self.moved_forward.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RebalanceStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebalanceSnapshot {
    /// Logical inserts.
    pub inserts: u64,
    /// Logical removes.
    pub removes: u64,
    /// Elements pushed to a later segment.
    pub moved_backward: u64,
    /// Elements pulled to an earlier segment.
    pub moved_forward: u64,
}

/// Counters kept by a cache-aside reader.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    double_check_hits: AtomicU64,
    loader_calls: AtomicU64,
    loader_failures: AtomicU64,
    write_backs: AtomicU64,
    entries_written: AtomicU64,
}

impl CacheStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_double_check_hit(&self) {
        self.double_check_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_loader_call(&self) {
        self.loader_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_loader_failure(&self) {
        self.loader_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write_back(&self, entries: u64) {
        self.write_backs.fetch_add(1, Ordering::Relaxed);
        self.entries_written.fetch_add(entries, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters.
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            double_check_hits: self.double_check_hits.load(Ordering::Relaxed),
            loader_calls: self.loader_calls.load(Ordering::Relaxed),
            loader_failures: self.loader_failures.load(Ordering::Relaxed),
            write_backs: self.write_backs.load(Ordering::Relaxed),
            entries_written: self.entries_written.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheSnapshot {
    /// Reads answered by the first, lock-free query.
    pub hits: u64,
    /// Reads whose first query came back insufficient.
    pub misses: u64,
    /// Misses answered by the re-query under the lock.
    pub double_check_hits: u64,
    /// Loader invocations.
    pub loader_calls: u64,
    /// Loader invocations that failed.
    pub loader_failures: u64,
    /// Write-backs of loader results.
    pub write_backs: u64,
    /// Entries written back in total.
    pub entries_written: u64,
}

impl CacheSnapshot {
    /// Fraction of reads served without calling the loader.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let reads = self.hits + self.misses;
        if reads == 0 {
            return 0.0;
        }
        reads.saturating_sub(self.loader_calls) as f64 / reads as f64
    }
}
