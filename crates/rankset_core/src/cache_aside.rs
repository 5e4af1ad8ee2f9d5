//! Read-through reloads for ranked sets.
//!
//! A read that comes back insufficient (empty, or short of the requested
//! count) takes a per-set mutex, re-runs the read, and only then calls the
//! caller's loader. Cacheable loader results are written back through the
//! wrapped set, so a partitioned set rebalances them like any other insert.
//!
//! ## Concurrency
//!
//! The mutex is in-process and keyed by [`RankedSet::set_id`]: reloads of
//! one logical set are serialized, reloads of different sets run in
//! parallel. Other processes sharing the store are not excluded, so the
//! loader runs at most once per miss per process, not globally.

use crate::error::{CoreError, CoreResult, LoaderError};
use crate::key::TenantPath;
use crate::set::RankedSet;
use crate::stats::{CacheSnapshot, CacheStats};
use crate::types::{RangeQuery, ScoreEntry};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a loader returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    /// Entries from the authoritative source, in query order.
    pub entries: Vec<ScoreEntry<T>>,
    /// Whether the entries should be written back to the store.
    pub cacheable: bool,
}

impl<T> Loaded<T> {
    /// Entries to return and write back.
    pub fn cacheable(entries: Vec<ScoreEntry<T>>) -> Self {
        Self {
            entries,
            cacheable: true,
        }
    }

    /// Entries to return without writing back.
    pub fn transient(entries: Vec<ScoreEntry<T>>) -> Self {
        Self {
            entries,
            cacheable: false,
        }
    }

    /// Nothing found at the source.
    pub fn empty() -> Self {
        Self::transient(Vec::new())
    }
}

/// One mutex per logical set, created on first use.
#[derive(Debug, Default)]
struct ReloadLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ReloadLocks {
    fn lock_for(&self, set_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(set_id.to_string()).or_default())
    }
}

/// Wraps a [`RankedSet`] with cache-aside reads.
///
/// Plain writes and reads go straight to [`CacheAside::set`].
///
/// # Example
///
/// ```rust,ignore
/// let reader = CacheAside::new(board);
/// let top = reader.read_with_fallback(&tenant, &RangeQuery::by_rank(0, 9).descending(), || {
///     let rows = db.top_scores(tenant_id, 10)?;
///     Ok(Loaded::cacheable(rows))
/// })?;
/// ```
pub struct CacheAside<S> {
    set: S,
    locks: ReloadLocks,
    stats: CacheStats,
}

impl<S: RankedSet> CacheAside<S> {
    /// Wraps `set`.
    pub fn new(set: S) -> Self {
        Self {
            set,
            locks: ReloadLocks::default(),
            stats: CacheStats::new(),
        }
    }

    /// Returns the wrapped set.
    pub fn set(&self) -> &S {
        &self.set
    }

    /// Returns the read counters.
    pub fn stats(&self) -> CacheSnapshot {
        self.stats.snapshot()
    }

    /// Runs `query`, falling back to `loader` on a miss.
    ///
    /// On a miss the loader's entries are returned as-is, not re-read from
    /// the store.
    ///
    /// # Errors
    ///
    /// Store failures propagate unchanged. A loader failure is returned as
    /// [`CoreError::Loader`] and nothing is written back.
    pub fn read_with_fallback<F>(
        &self,
        tenant: &TenantPath,
        query: &RangeQuery,
        loader: F,
    ) -> CoreResult<Vec<ScoreEntry<S::Member>>>
    where
        F: FnOnce() -> Result<Loaded<S::Member>, LoaderError>,
    {
        self.read_through(
            tenant,
            query,
            || self.set.fetch(tenant, query),
            loader,
            |entries| entries,
        )
    }

    /// Like [`CacheAside::read_with_fallback`], returning members only.
    pub fn read_members_with_fallback<F>(
        &self,
        tenant: &TenantPath,
        query: &RangeQuery,
        loader: F,
    ) -> CoreResult<Vec<S::Member>>
    where
        F: FnOnce() -> Result<Loaded<S::Member>, LoaderError>,
    {
        self.read_through(
            tenant,
            query,
            || self.set.fetch_members(tenant, query),
            loader,
            |entries| entries.into_iter().map(|entry| entry.member).collect(),
        )
    }

    fn read_through<R, Q, F, M>(
        &self,
        tenant: &TenantPath,
        query: &RangeQuery,
        read: Q,
        loader: F,
        into_results: M,
    ) -> CoreResult<Vec<R>>
    where
        Q: Fn() -> CoreResult<Vec<R>>,
        F: FnOnce() -> Result<Loaded<S::Member>, LoaderError>,
        M: FnOnce(Vec<ScoreEntry<S::Member>>) -> Vec<R>,
    {
        let found = read()?;
        if query.is_satisfied_by(found.len()) {
            self.stats.record_hit();
            return Ok(found);
        }
        self.stats.record_miss();

        let set_id = self.set.set_id(tenant);
        let lock = self.locks.lock_for(&set_id);
        let _guard = lock.lock();

        let found = read()?;
        if query.is_satisfied_by(found.len()) {
            self.stats.record_double_check_hit();
            return Ok(found);
        }

        self.stats.record_loader_call();
        let loaded = loader().map_err(|source| {
            self.stats.record_loader_failure();
            warn!(set = %set_id, error = %source, "loader failed");
            CoreError::loader(source)
        })?;

        if loaded.cacheable && !loaded.entries.is_empty() {
            let added = self.set.add_all(tenant, &loaded.entries)?;
            self.stats.record_write_back(loaded.entries.len() as u64);
            debug!(set = %set_id, entries = loaded.entries.len(), added, "wrote back loaded entries");
        }

        Ok(into_results(loaded.entries))
    }
}

impl<S> std::fmt::Debug for CacheAside<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAside")
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringCodec;
    use crate::config::SegmentConfig;
    use crate::partitioned::PartitionedSet;
    use crate::single::SingleKeySet;
    use rankset_store::InMemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    fn entry(member: &str, score: f64) -> ScoreEntry<String> {
        ScoreEntry::new(member.to_string(), score)
    }

    fn single() -> CacheAside<SingleKeySet<StringCodec>> {
        let store = Arc::new(InMemoryStore::new());
        CacheAside::new(SingleKeySet::new(store, "feed", StringCodec))
    }

    fn partitioned() -> CacheAside<PartitionedSet<StringCodec>> {
        let store = Arc::new(InMemoryStore::new());
        let config = SegmentConfig::new().segment_count(3).initial_segment_size(2);
        CacheAside::new(PartitionedSet::new(store, "board", config, StringCodec).unwrap())
    }

    #[test]
    fn miss_loads_and_writes_back() {
        let reader = single();
        let tenant = TenantPath::from(1u64);
        let query = RangeQuery::by_score(f64::NEG_INFINITY, f64::INFINITY);
        let loaded = vec![entry("A", 10.0), entry("B", 20.0)];

        let result = reader
            .read_with_fallback(&tenant, &query, || Ok(Loaded::cacheable(loaded.clone())))
            .unwrap();
        assert_eq!(result, loaded);
        assert_eq!(reader.set().fetch(&tenant, &query).unwrap(), loaded);

        let again = reader
            .read_with_fallback(&tenant, &query, || panic!("loader called on a hit"))
            .unwrap();
        assert_eq!(again, loaded);

        let stats = reader.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.loader_calls, 1);
        assert_eq!(stats.entries_written, 2);
    }

    #[test]
    fn transient_results_are_not_written() {
        let reader = single();
        let tenant = TenantPath::root();
        let query = RangeQuery::by_rank(0, -1);

        let members = reader
            .read_members_with_fallback(&tenant, &query, || {
                Ok(Loaded::transient(vec![entry("x", 1.0)]))
            })
            .unwrap();
        assert_eq!(members, vec!["x".to_string()]);
        assert_eq!(reader.set().size(&tenant).unwrap(), 0);
        assert_eq!(reader.stats().write_backs, 0);
    }

    #[test]
    fn short_page_counts_as_miss() {
        let reader = partitioned();
        let tenant = TenantPath::root();
        reader.set().add(&tenant, &"a".to_string(), 1.0).unwrap();

        let query = RangeQuery::by_score(0.0, 100.0).with_limit(0, 3);
        let calls = AtomicUsize::new(0);
        let result = reader
            .read_with_fallback(&tenant, &query, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Loaded::cacheable(vec![
                    entry("a", 1.0),
                    entry("b", 2.0),
                    entry("c", 3.0),
                ]))
            })
            .unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(reader.set().segment_sizes(&tenant).unwrap(), vec![2, 1, 0]);

        let cached = reader
            .read_members_with_fallback(&tenant, &query, || panic!("loader called on a hit"))
            .unwrap();
        assert_eq!(cached, vec!["a", "b", "c"]);
    }

    #[test]
    fn loader_failure_writes_nothing() {
        let reader = partitioned();
        let tenant = TenantPath::from(9u64);
        let result = reader.read_with_fallback(&tenant, &RangeQuery::by_rank(0, 9), || {
            Err("source unavailable".into())
        });

        match result {
            Err(CoreError::Loader { source }) => {
                assert_eq!(source.to_string(), "source unavailable");
            }
            other => panic!("expected loader error, got {other:?}"),
        }
        assert_eq!(reader.set().size(&tenant).unwrap(), 0);
        assert_eq!(reader.stats().loader_failures, 1);

        // The lock was released: a later reload goes through.
        let result = reader
            .read_with_fallback(&tenant, &RangeQuery::by_rank(0, 9), || {
                Ok(Loaded::cacheable(vec![entry("a", 1.0)]))
            })
            .unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn empty_load_returns_empty() {
        let reader = single();
        let tenant = TenantPath::root();
        let result = reader
            .read_with_fallback(&tenant, &RangeQuery::by_rank(0, -1), || Ok(Loaded::empty()))
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(reader.stats().write_backs, 0);
    }

    #[test]
    fn concurrent_misses_load_once() {
        let reader = partitioned();
        let tenant = TenantPath::from(3u64);
        let query = RangeQuery::by_rank(0, -1).descending();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(2);

        std::thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| {
                    barrier.wait();
                    let result = reader
                        .read_with_fallback(&tenant, &query, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(20));
                            Ok(Loaded::cacheable(vec![entry("b", 2.0), entry("a", 1.0)]))
                        })
                        .unwrap();
                    assert_eq!(result.len(), 2);
                    assert_eq!(result[0].member, "b");
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(reader.set().size(&tenant).unwrap(), 2);
    }
}
