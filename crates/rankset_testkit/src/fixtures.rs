//! Test fixtures.
//!
//! Wires sets to a fresh [`InMemoryStore`] and offers shortcuts for the
//! string-member case most tests use.

use rankset_core::{
    PartitionedSet, RangeQuery, RankedSet, ScoreEntry, SegmentConfig, SingleKeySet, StringCodec,
    TenantPath,
};
use rankset_store::{InMemoryStore, Order, SortedSetStore};
use std::sync::Arc;

/// A partitioned set of strings over its own in-memory store.
pub struct PartitionedFixture {
    /// The backing store.
    pub store: Arc<InMemoryStore>,
    /// The set under test.
    pub set: PartitionedSet<StringCodec>,
    /// The tenant every shortcut uses.
    pub tenant: TenantPath,
}

impl PartitionedFixture {
    /// Creates a fixture with the given layout.
    pub fn new(segment_count: usize, initial_segment_size: u64) -> Self {
        let config = SegmentConfig::new()
            .segment_count(segment_count)
            .initial_segment_size(initial_segment_size);
        Self::with_config(config)
    }

    /// Creates a fixture from a full configuration.
    pub fn with_config(config: SegmentConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let set = PartitionedSet::new(store.clone(), "fixture", config, StringCodec)
            .expect("Invalid fixture configuration");
        Self {
            store,
            set,
            tenant: TenantPath::from_ids(&[1, 1]),
        }
    }

    /// Three segments with capacities [2, 4, unbounded].
    pub fn small() -> Self {
        Self::new(3, 2)
    }

    /// Adds `member` with `score`.
    pub fn insert(&self, member: &str, score: f64) -> bool {
        self.set
            .add(&self.tenant, &member.to_string(), score)
            .expect("Insert failed")
    }

    /// Removes `member`.
    pub fn remove(&self, member: &str) -> bool {
        self.set
            .remove(&self.tenant, &member.to_string())
            .expect("Remove failed")
    }

    /// Returns every entry in ascending order.
    pub fn entries(&self) -> Vec<ScoreEntry<String>> {
        self.set
            .fetch(&self.tenant, &RangeQuery::by_rank(0, -1))
            .expect("Read failed")
    }

    /// Returns the members of each segment, each in ascending order.
    pub fn layout(&self) -> Vec<Vec<String>> {
        self.set
            .segment_keys(&self.tenant)
            .iter()
            .map(|key| {
                self.store
                    .range_by_rank(key, 0, -1, Order::Ascending)
                    .expect("Read failed")
            })
            .collect()
    }
}

/// A single-key set of strings over its own in-memory store.
pub fn single_fixture(base: &str) -> (Arc<InMemoryStore>, SingleKeySet<StringCodec>) {
    let store = Arc::new(InMemoryStore::new());
    let set = SingleKeySet::new(store.clone(), base, StringCodec);
    (store, set)
}

/// Builds entries from `(member, score)` pairs.
pub fn entries(pairs: &[(&str, f64)]) -> Vec<ScoreEntry<String>> {
    pairs
        .iter()
        .map(|(member, score)| ScoreEntry::new((*member).to_string(), *score))
        .collect()
}
