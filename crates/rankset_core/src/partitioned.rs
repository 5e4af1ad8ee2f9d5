//! Logical sets spread over capacity-bounded segments.
//!
//! Writes go through the rebalancer so that segment `i` always holds the
//! lowest scores not held by earlier segments. Reads rely on that ordering:
//! they visit segments in query order and stop as soon as a segment's
//! boundary score passes the requested range.

use crate::codec::{decode_entries, MemberCodec};
use crate::config::SegmentConfig;
use crate::error::CoreResult;
use crate::key::{set_key, TenantPath};
use crate::segment::{Rebalancer, SegmentIndex, SegmentLocation};
use crate::set::RankedSet;
use crate::stats::{RebalanceSnapshot, RebalanceStats};
use crate::types::{RangeQuery, ScoreEntry, ScoreRange};
use rankset_store::{Limit, Order, ScoredMember, SortedSetStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// A family of logical sets, each partitioned over `K` physical keys.
///
/// # Example
///
/// ```rust,ignore
/// let store = Arc::new(InMemoryStore::new());
/// let board = PartitionedSet::new(store, "board", SegmentConfig::default(), StringCodec)?;
/// board.add(&TenantPath::from(42u64), &"alice".to_string(), 1200.0)?;
/// let top = board.fetch(&TenantPath::from(42u64), &RangeQuery::by_rank(0, 9).descending())?;
/// ```
///
/// Mutations issue several store calls with no cross-call atomicity.
/// Concurrent writers to the same tenant's set must be serialized by the
/// caller.
pub struct PartitionedSet<C> {
    store: Arc<dyn SortedSetStore>,
    index: SegmentIndex,
    codec: C,
    stats: RebalanceStats,
}

impl<C: MemberCodec> PartitionedSet<C> {
    /// Creates a family named `base`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` does not validate.
    pub fn new(
        store: Arc<dyn SortedSetStore>,
        base: impl Into<String>,
        config: SegmentConfig,
        codec: C,
    ) -> CoreResult<Self> {
        Ok(Self {
            store,
            index: SegmentIndex::new(base, config)?,
            codec,
            stats: RebalanceStats::new(),
        })
    }

    /// Returns the segment layout.
    #[must_use]
    pub fn index(&self) -> &SegmentIndex {
        &self.index
    }

    /// Returns the rebalancing counters.
    #[must_use]
    pub fn stats(&self) -> RebalanceSnapshot {
        self.stats.snapshot()
    }

    /// Returns the capacity of every segment; `None` for the unbounded last.
    #[must_use]
    pub fn capacities(&self) -> Vec<Option<u64>> {
        self.index.capacities()
    }

    /// Returns the physical key of every segment for `tenant`.
    #[must_use]
    pub fn segment_keys(&self, tenant: &TenantPath) -> Vec<String> {
        self.index.keys(tenant)
    }

    /// Returns the current size of every segment for `tenant`.
    pub fn segment_sizes(&self, tenant: &TenantPath) -> CoreResult<Vec<u64>> {
        self.index.sizes(self.store.as_ref(), tenant)
    }

    /// Returns the segment holding `member`, if any.
    pub fn locate(&self, tenant: &TenantPath, member: &C::Member) -> CoreResult<Option<SegmentLocation>> {
        let raw = self.codec.encode(member)?;
        self.index.locate(self.store.as_ref(), tenant, &raw)
    }

    fn rebalancer<'a>(&'a self, tenant: &'a TenantPath) -> Rebalancer<'a> {
        Rebalancer::new(self.store.as_ref(), &self.index, tenant, &self.stats)
    }

    /// Segment indices in the order a query visits them.
    fn visit_order(&self, order: Order) -> Box<dyn Iterator<Item = usize>> {
        let count = self.index.segment_count();
        match order {
            Order::Ascending => Box::new(0..count),
            Order::Descending => Box::new((0..count).rev()),
        }
    }

    /// The boundary member a walk in `order` checks against the range: the
    /// segment's tail when ascending, its head when descending.
    fn edge(&self, key: &str, order: Order) -> CoreResult<Option<ScoredMember>> {
        let edge_rank = if order.is_ascending() { -1 } else { 0 };
        Ok(self
            .store
            .range_by_rank_with_scores(key, edge_rank, edge_rank, Order::Ascending)?
            .into_iter()
            .next())
    }

    fn fetch_by_score(
        &self,
        tenant: &TenantPath,
        range: ScoreRange,
        order: Order,
        limit: Option<Limit>,
    ) -> CoreResult<Vec<ScoredMember>> {
        let mut found = Vec::new();
        if range.min > range.max {
            return Ok(found);
        }
        let mut skip = limit.map_or(0, |limit| limit.offset);
        let mut remaining = limit.map(|limit| limit.count);
        if remaining == Some(0) {
            return Ok(found);
        }

        for segment in self.visit_order(order) {
            let key = self.index.key(segment, tenant);
            let Some(edge) = self.edge(&key, order)? else {
                if order.is_ascending() {
                    break;
                }
                continue;
            };
            let (before_range, past_range) = match order {
                Order::Ascending => (edge.score < range.min, edge.score > range.max),
                Order::Descending => (edge.score > range.max, edge.score < range.min),
            };
            if before_range {
                continue;
            }
            trace!(segment, edge = edge.score, "reading segment");

            match remaining {
                None => found.extend(self.store.range_by_score_with_scores(
                    &key, range.min, range.max, order, None,
                )?),
                Some(count) => {
                    let matches = self.store.count_by_score(&key, range.min, range.max)?;
                    if skip >= matches {
                        skip -= matches;
                    } else {
                        let page = self.store.range_by_score_with_scores(
                            &key,
                            range.min,
                            range.max,
                            order,
                            Some(Limit::new(skip, count)),
                        )?;
                        skip = 0;
                        let left = count.saturating_sub(page.len() as u64);
                        found.extend(page);
                        if left == 0 {
                            break;
                        }
                        remaining = Some(left);
                    }
                }
            }

            if past_range {
                break;
            }
        }
        Ok(found)
    }

    fn fetch_by_rank(
        &self,
        tenant: &TenantPath,
        start: i64,
        end: i64,
        order: Order,
    ) -> CoreResult<Vec<ScoredMember>> {
        let sizes = self.segment_sizes(tenant)?;
        let total = sizes.iter().sum();
        let Some((first, last)) = resolve_ranks(start, end, total) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        let mut preceding = 0u64;
        for segment in self.visit_order(order) {
            let size = sizes[segment];
            let local = local_ranks(first, last, preceding, size);
            preceding += size;
            if let Some((local_start, local_end)) = local {
                found.extend(self.store.range_by_rank_with_scores(
                    &self.index.key(segment, tenant),
                    local_start,
                    local_end,
                    order,
                )?);
            }
            if preceding > last {
                break;
            }
        }
        Ok(found)
    }
}

/// Resolves an inclusive, possibly negative rank range against `total`
/// members. Returns `None` when the range selects nothing.
fn resolve_ranks(start: i64, end: i64, total: u64) -> Option<(u64, u64)> {
    let len = i64::try_from(total).unwrap_or(i64::MAX);
    let start = if start < 0 { len + start } else { start }.max(0);
    let end = if end < 0 { len + end } else { end }.min(len - 1);
    if start > end || start >= len {
        return None;
    }
    Some((start as u64, end as u64))
}

/// Intersects the global range `[first, last]` with the segment covering
/// global ranks `[preceding, preceding + size)`, in segment-local ranks.
fn local_ranks(first: u64, last: u64, preceding: u64, size: u64) -> Option<(i64, i64)> {
    if size == 0 || last < preceding || first >= preceding + size {
        return None;
    }
    let local_start = first.saturating_sub(preceding);
    let local_end = (last - preceding).min(size - 1);
    Some((local_start as i64, local_end as i64))
}

impl<C: MemberCodec> RankedSet for PartitionedSet<C> {
    type Member = C::Member;

    fn set_id(&self, tenant: &TenantPath) -> String {
        set_key(self.index.base(), tenant)
    }

    fn add(&self, tenant: &TenantPath, member: &C::Member, score: f64) -> CoreResult<bool> {
        let raw = self.codec.encode(member)?;
        self.rebalancer(tenant).insert(&raw, score)
    }

    fn add_all(&self, tenant: &TenantPath, entries: &[ScoreEntry<C::Member>]) -> CoreResult<u64> {
        let rebalancer = self.rebalancer(tenant);
        let mut added = 0;
        for entry in entries {
            let raw = self.codec.encode(&entry.member)?;
            if rebalancer.insert(&raw, entry.score)? {
                added += 1;
            }
        }
        Ok(added)
    }

    fn incr_score(&self, tenant: &TenantPath, member: &C::Member, delta: f64) -> CoreResult<f64> {
        let raw = self.codec.encode(member)?;
        let current = self.index.locate(self.store.as_ref(), tenant, &raw)?;
        let score = current.map_or(0.0, |location| location.score) + delta;
        self.rebalancer(tenant).insert(&raw, score)?;
        Ok(score)
    }

    fn score(&self, tenant: &TenantPath, member: &C::Member) -> CoreResult<Option<f64>> {
        Ok(self.locate(tenant, member)?.map(|location| location.score))
    }

    fn size(&self, tenant: &TenantPath) -> CoreResult<u64> {
        Ok(self.segment_sizes(tenant)?.iter().sum())
    }

    fn count_by_score(&self, tenant: &TenantPath, range: ScoreRange) -> CoreResult<u64> {
        let mut count = 0;
        if range.min > range.max {
            return Ok(count);
        }
        for segment in 0..self.index.segment_count() {
            let key = self.index.key(segment, tenant);
            let Some(tail) = self.edge(&key, Order::Ascending)? else {
                break;
            };
            if tail.score < range.min {
                continue;
            }
            count += self.store.count_by_score(&key, range.min, range.max)?;
            if tail.score > range.max {
                break;
            }
        }
        Ok(count)
    }

    fn fetch(
        &self,
        tenant: &TenantPath,
        query: &RangeQuery,
    ) -> CoreResult<Vec<ScoreEntry<C::Member>>> {
        let raw = match *query {
            RangeQuery::Score {
                range,
                order,
                limit,
            } => self.fetch_by_score(tenant, range, order, limit)?,
            RangeQuery::Rank { start, end, order } => {
                self.fetch_by_rank(tenant, start, end, order)?
            }
        };
        decode_entries(&self.codec, raw)
    }

    fn remove(&self, tenant: &TenantPath, member: &C::Member) -> CoreResult<bool> {
        let raw = self.codec.encode(member)?;
        self.rebalancer(tenant).remove(&raw)
    }

    fn remove_by_rank(&self, tenant: &TenantPath, start: i64, end: i64) -> CoreResult<bool> {
        let sizes = self.segment_sizes(tenant)?;
        let Some((first, last)) = resolve_ranks(start, end, sizes.iter().sum()) else {
            return Ok(false);
        };

        let mut affected = None;
        let mut preceding = 0u64;
        for (segment, &size) in sizes.iter().enumerate() {
            if let Some((local_start, local_end)) = local_ranks(first, last, preceding, size) {
                let key = self.index.key(segment, tenant);
                if self.store.remove_by_rank(&key, local_start, local_end)? {
                    affected.get_or_insert(segment);
                }
            }
            preceding += size;
        }

        match affected {
            Some(segment) => {
                self.rebalancer(tenant).backfill(segment)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_by_score(&self, tenant: &TenantPath, range: ScoreRange) -> CoreResult<bool> {
        let mut affected = None;
        for segment in 0..self.index.segment_count() {
            let key = self.index.key(segment, tenant);
            if self.store.remove_by_score(&key, range.min, range.max)? {
                affected.get_or_insert(segment);
            }
        }

        match affected {
            Some(segment) => {
                self.rebalancer(tenant).backfill(segment)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, tenant: &TenantPath) -> CoreResult<bool> {
        let mut deleted = false;
        for key in self.index.keys(tenant) {
            deleted |= self.store.delete(&key)?;
        }
        Ok(deleted)
    }

    fn expire(&self, tenant: &TenantPath, ttl: Duration) -> CoreResult<bool> {
        let mut applied = false;
        for key in self.index.keys(tenant) {
            applied |= self.store.expire(&key, ttl)?;
        }
        Ok(applied)
    }
}

impl<C> std::fmt::Debug for PartitionedSet<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionedSet")
            .field("index", &self.index)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringCodec;
    use rankset_store::InMemoryStore;

    fn board(count: usize, initial: u64) -> (Arc<InMemoryStore>, PartitionedSet<StringCodec>) {
        let store = Arc::new(InMemoryStore::new());
        let config = SegmentConfig::new()
            .segment_count(count)
            .initial_segment_size(initial);
        let set = PartitionedSet::new(store.clone(), "lb", config, StringCodec).unwrap();
        (store, set)
    }

    fn s(value: &str) -> String {
        value.to_string()
    }

    /// Inserts `m1..=mN` with scores `1..=N`. Capacities [2, 4, inf] put
    /// seven members at sizes [2, 4, 1].
    fn seeded(n: u32) -> (Arc<InMemoryStore>, PartitionedSet<StringCodec>, TenantPath) {
        let (store, set) = board(3, 2);
        let tenant = TenantPath::from(1u64);
        for i in 1..=n {
            set.add(&tenant, &format!("m{i}"), f64::from(i)).unwrap();
        }
        (store, set, tenant)
    }

    fn members(entries: Vec<ScoreEntry<String>>) -> Vec<String> {
        entries.into_iter().map(|entry| entry.member).collect()
    }

    #[test]
    fn rejects_invalid_config() {
        let store = Arc::new(InMemoryStore::new());
        let config = SegmentConfig::new().initial_segment_size(0);
        assert!(PartitionedSet::new(store, "lb", config, StringCodec).is_err());
    }

    #[test]
    fn sizes_and_keys() {
        let (store, set, tenant) = seeded(7);
        assert_eq!(set.segment_sizes(&tenant).unwrap(), vec![2, 4, 1]);
        assert_eq!(set.size(&tenant).unwrap(), 7);
        assert_eq!(set.segment_keys(&tenant), vec!["lb:0:1", "lb:1:1", "lb:2:1"]);
        assert_eq!(store.keys(), vec!["lb:0:1", "lb:1:1", "lb:2:1"]);
        assert_eq!(set.stats().inserts, 7);
    }

    #[test]
    fn score_lookup_spans_segments() {
        let (_store, set, tenant) = seeded(7);
        assert_eq!(set.score(&tenant, &s("m6")).unwrap(), Some(6.0));
        assert_eq!(set.locate(&tenant, &s("m7")).unwrap().map(|l| l.segment), Some(2));
        assert_eq!(set.score(&tenant, &s("nope")).unwrap(), None);
    }

    #[test]
    fn zero_score_is_a_member() {
        let (_store, set) = board(3, 2);
        let tenant = TenantPath::root();
        assert!(set.add(&tenant, &s("zero"), 0.0).unwrap());
        assert!(set.contains(&tenant, &s("zero")).unwrap());
        assert!(!set.add(&tenant, &s("zero"), 0.0).unwrap());
        assert_eq!(set.size(&tenant).unwrap(), 1);
    }

    #[test]
    fn ascending_score_range() {
        let (_store, set, tenant) = seeded(7);
        let all = set.fetch_members(&tenant, &RangeQuery::by_score(f64::NEG_INFINITY, f64::INFINITY)).unwrap();
        assert_eq!(all, (1..=7).map(|i| format!("m{i}")).collect::<Vec<_>>());

        let middle = set.fetch(&tenant, &RangeQuery::by_score(2.0, 5.0)).unwrap();
        assert_eq!(members(middle), vec!["m2", "m3", "m4", "m5"]);

        let empty = set.fetch(&tenant, &RangeQuery::by_score(5.5, 5.9)).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn descending_score_range() {
        let (_store, set, tenant) = seeded(7);
        let top = set
            .fetch(&tenant, &RangeQuery::by_score(2.0, 7.0).descending())
            .unwrap();
        assert_eq!(top[0], ScoreEntry::new(s("m7"), 7.0));
        assert_eq!(members(top), vec!["m7", "m6", "m5", "m4", "m3", "m2"]);
    }

    #[test]
    fn score_range_windows_cross_segments() {
        let (_store, set, tenant) = seeded(7);
        let all = RangeQuery::by_score(f64::NEG_INFINITY, f64::INFINITY);

        let page = set.fetch_members(&tenant, &all.with_limit(1, 3)).unwrap();
        assert_eq!(page, vec!["m2", "m3", "m4"]);

        let page = set.fetch_members(&tenant, &all.with_limit(5, 10)).unwrap();
        assert_eq!(page, vec!["m6", "m7"]);

        let page = set
            .fetch_members(&tenant, &all.descending().with_limit(1, 2))
            .unwrap();
        assert_eq!(page, vec!["m6", "m5"]);

        let page = set
            .fetch_members(&tenant, &RangeQuery::by_score(3.0, 6.0).with_limit(0, 0))
            .unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn rank_ranges() {
        let (_store, set, tenant) = seeded(7);
        let page = set.fetch_members(&tenant, &RangeQuery::by_rank(1, 4)).unwrap();
        assert_eq!(page, vec!["m2", "m3", "m4", "m5"]);

        let tail = set.fetch_members(&tenant, &RangeQuery::by_rank(-2, -1)).unwrap();
        assert_eq!(tail, vec!["m6", "m7"]);

        let top = set
            .fetch_members(&tenant, &RangeQuery::by_rank(0, 2).descending())
            .unwrap();
        assert_eq!(top, vec!["m7", "m6", "m5"]);

        assert!(set.fetch(&tenant, &RangeQuery::by_rank(7, 9)).unwrap().is_empty());
        assert_eq!(set.first(&tenant).unwrap(), Some(ScoreEntry::new(s("m1"), 1.0)));
        assert_eq!(set.last(&tenant).unwrap(), Some(ScoreEntry::new(s("m7"), 7.0)));
    }

    #[test]
    fn counts_by_score() {
        let (_store, set, tenant) = seeded(7);
        assert_eq!(set.count_by_score(&tenant, ScoreRange::all()).unwrap(), 7);
        assert_eq!(set.count_by_score(&tenant, ScoreRange::new(2.0, 6.0)).unwrap(), 5);
        assert_eq!(set.count_by_score(&tenant, ScoreRange::new(10.0, 20.0)).unwrap(), 0);
    }

    #[test]
    fn incr_score_moves_member() {
        let (_store, set, tenant) = seeded(7);
        assert_eq!(set.incr_score(&tenant, &s("m1"), 10.0).unwrap(), 11.0);
        assert_eq!(set.last(&tenant).unwrap(), Some(ScoreEntry::new(s("m1"), 11.0)));
        assert_eq!(set.incr_score(&tenant, &s("new"), 0.5).unwrap(), 0.5);
        assert_eq!(set.first(&tenant).unwrap(), Some(ScoreEntry::new(s("new"), 0.5)));
        assert_eq!(set.size(&tenant).unwrap(), 8);
    }

    #[test]
    fn remove_backfills() {
        let (_store, set, tenant) = seeded(7);
        assert!(set.remove(&tenant, &s("m1")).unwrap());
        assert_eq!(set.segment_sizes(&tenant).unwrap(), vec![2, 4, 0]);
        assert_eq!(set.first(&tenant).unwrap(), Some(ScoreEntry::new(s("m2"), 2.0)));
        assert!(!set.remove(&tenant, &s("m1")).unwrap());
    }

    #[test]
    fn remove_by_rank_spans_segments() {
        let (_store, set, tenant) = seeded(7);
        assert!(set.remove_by_rank(&tenant, 1, 3).unwrap());
        assert_eq!(set.segment_sizes(&tenant).unwrap(), vec![2, 2, 0]);
        let left = set.fetch_members(&tenant, &RangeQuery::by_rank(0, -1)).unwrap();
        assert_eq!(left, vec!["m1", "m5", "m6", "m7"]);
        assert!(!set.remove_by_rank(&tenant, 10, 20).unwrap());
    }

    #[test]
    fn remove_by_score_backfills() {
        let (_store, set, tenant) = seeded(7);
        assert!(set.remove_by_score(&tenant, ScoreRange::new(1.0, 2.0)).unwrap());
        assert_eq!(set.segment_sizes(&tenant).unwrap(), vec![2, 3, 0]);
        assert_eq!(set.first(&tenant).unwrap(), Some(ScoreEntry::new(s("m3"), 3.0)));
        assert!(!set.remove_by_score(&tenant, ScoreRange::new(100.0, 200.0)).unwrap());
    }

    #[test]
    fn tenants_are_isolated() {
        let (_store, set) = board(2, 1);
        let eu = TenantPath::from("eu");
        let us = TenantPath::from("us");
        set.add(&eu, &s("a"), 1.0).unwrap();
        set.add(&us, &s("b"), 2.0).unwrap();
        assert_eq!(set.size(&eu).unwrap(), 1);
        assert!(!set.contains(&eu, &s("b")).unwrap());
        assert_ne!(set.set_id(&eu), set.set_id(&us));
    }

    #[test]
    fn delete_and_expire_touch_every_segment() {
        let (store, set, tenant) = seeded(7);
        assert!(set.expire(&tenant, Duration::from_secs(60)).unwrap());
        assert!(set.delete(&tenant).unwrap());
        assert!(store.keys().is_empty());
        assert!(!set.delete(&tenant).unwrap());
        assert!(!set.expire(&tenant, Duration::from_secs(60)).unwrap());
    }

    #[test]
    fn local_rank_translation() {
        assert_eq!(resolve_ranks(0, -1, 7), Some((0, 6)));
        assert_eq!(resolve_ranks(-3, -1, 7), Some((4, 6)));
        assert_eq!(resolve_ranks(5, 2, 7), None);
        assert_eq!(resolve_ranks(0, -1, 0), None);

        assert_eq!(local_ranks(1, 4, 0, 2), Some((1, 1)));
        assert_eq!(local_ranks(1, 4, 2, 4), Some((0, 2)));
        assert_eq!(local_ranks(1, 4, 6, 1), None);
    }
}
