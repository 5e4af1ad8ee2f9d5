//! Benchmark utilities.

#![warn(missing_docs)]

use rand::Rng;
use rankset_core::{PartitionedSet, RankedSet, SegmentConfig, StringCodec, TenantPath};
use rankset_store::InMemoryStore;
use std::sync::Arc;

/// Generate `count` members with random scores in `[0, 1_000_000)`.
pub fn random_entries(count: usize) -> Vec<(String, f64)> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| (format!("member-{i}"), f64::from(rng.gen_range(0..1_000_000u32))))
        .collect()
}

/// Build a partitioned set over a fresh in-memory store.
pub fn partitioned(segment_count: usize, initial_segment_size: u64) -> PartitionedSet<StringCodec> {
    let config = SegmentConfig::new()
        .segment_count(segment_count)
        .initial_segment_size(initial_segment_size);
    PartitionedSet::new(Arc::new(InMemoryStore::new()), "bench", config, StringCodec)
        .expect("Invalid bench configuration")
}

/// Build a partitioned set already holding `entries`.
pub fn populated(
    segment_count: usize,
    initial_segment_size: u64,
    entries: &[(String, f64)],
) -> (PartitionedSet<StringCodec>, TenantPath) {
    let set = partitioned(segment_count, initial_segment_size);
    let tenant = TenantPath::root();
    for (member, score) in entries {
        set.add(&tenant, member, *score).expect("Insert failed");
    }
    (set, tenant)
}
