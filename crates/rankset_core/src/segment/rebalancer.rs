//! Insert, overflow and backfill across segments.
//!
//! Every step keeps the fill-prefix ordering: scores in segment `i` never
//! exceed scores in segment `i + 1`, and a segment only holds members once
//! every earlier segment is at capacity. Moves are written as add-then-remove,
//! so a failure halfway leaves a member duplicated rather than lost.

use super::index::SegmentIndex;
use crate::error::{CoreError, CoreResult};
use crate::key::TenantPath;
use crate::stats::RebalanceStats;
use rankset_store::{Order, SortedSetStore};
use tracing::{debug, error};

/// One rebalancing pass over a single tenant's segments.
pub(crate) struct Rebalancer<'a> {
    store: &'a dyn SortedSetStore,
    index: &'a SegmentIndex,
    tenant: &'a TenantPath,
    stats: &'a RebalanceStats,
}

impl<'a> Rebalancer<'a> {
    pub(crate) fn new(
        store: &'a dyn SortedSetStore,
        index: &'a SegmentIndex,
        tenant: &'a TenantPath,
        stats: &'a RebalanceStats,
    ) -> Self {
        Self {
            store,
            index,
            tenant,
            stats,
        }
    }

    fn key(&self, segment: usize) -> String {
        self.index.key(segment, self.tenant)
    }

    /// Writes `member` with `score`, moving it between segments if needed.
    ///
    /// Returns true if the member was not present in any segment.
    pub(crate) fn insert(&self, member: &str, score: f64) -> CoreResult<bool> {
        let previous = self.index.locate(self.store, self.tenant, member)?;
        let target = self.find_target(score)?;
        self.store.add(&self.key(target), member, score)?;

        match previous {
            Some(prev) if prev.segment < target => {
                self.store.remove(&self.key(prev.segment), member)?;
                self.backfill(prev.segment)?;
                self.overflow(target)?;
            }
            Some(prev) if prev.segment > target => {
                self.store.remove(&self.key(prev.segment), member)?;
                self.overflow(target)?;
                self.backfill(prev.segment)?;
            }
            _ => self.overflow(target)?,
        }

        self.stats.record_insert();
        Ok(previous.is_none())
    }

    /// Removes `member` from whichever segment holds it, then backfills.
    pub(crate) fn remove(&self, member: &str) -> CoreResult<bool> {
        let Some(location) = self.index.locate(self.store, self.tenant, member)? else {
            return Ok(false);
        };
        self.store.remove(&self.key(location.segment), member)?;
        self.backfill(location.segment)?;
        self.stats.record_remove();
        Ok(true)
    }

    /// Picks the segment a member with `score` belongs in.
    ///
    /// A segment with room takes it. A full segment takes it only when the
    /// score sorts below the segment's current tail; ties go further back.
    fn find_target(&self, score: f64) -> CoreResult<usize> {
        for segment in 0..self.index.last() {
            let Some(capacity) = self.index.capacity(segment) else {
                break;
            };
            let key = self.key(segment);
            if self.store.size(&key)? < capacity {
                return Ok(segment);
            }
            let tail = self
                .store
                .range_by_rank_with_scores(&key, -1, -1, Order::Ascending)?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    error!(segment, key = %key, "full segment has no tail");
                    CoreError::invariant_violation(segment, "full segment has no tail")
                })?;
            if score < tail.score {
                return Ok(segment);
            }
        }
        Ok(self.index.last())
    }

    /// Pushes each segment's surplus into the next, starting at `from`.
    pub(crate) fn overflow(&self, from: usize) -> CoreResult<()> {
        for segment in from..self.index.last() {
            let Some(capacity) = self.index.capacity(segment) else {
                break;
            };
            let key = self.key(segment);
            if self.store.size(&key)? <= capacity {
                break;
            }

            let surplus =
                self.store
                    .range_by_rank_with_scores(&key, rank(capacity), -1, Order::Ascending)?;
            if surplus.is_empty() {
                error!(segment, key = %key, "segment over capacity but no surplus found");
                return Err(CoreError::invariant_violation(
                    segment,
                    "segment over capacity but no surplus found",
                ));
            }

            let next = self.key(segment + 1);
            self.store.add_all(&next, &surplus)?;
            self.store.remove_by_rank(&key, rank(capacity), -1)?;

            let moved = surplus.len() as u64;
            self.stats.record_moved_backward(moved);
            debug!(segment, moved, "overflowed into next segment");
        }
        Ok(())
    }

    /// Refills segments below capacity from the segments after them,
    /// starting at `from`.
    pub(crate) fn backfill(&self, from: usize) -> CoreResult<()> {
        for segment in from..self.index.last() {
            let Some(capacity) = self.index.capacity(segment) else {
                break;
            };
            let mut deficit = capacity.saturating_sub(self.store.size(&self.key(segment))?);
            if deficit == 0 {
                continue;
            }
            for source in segment + 1..self.index.segment_count() {
                deficit -= self.pull(source, segment, deficit)?;
                if deficit == 0 {
                    break;
                }
            }
            if deficit > 0 {
                // Everything after this segment is empty now.
                break;
            }
        }
        Ok(())
    }

    /// Moves up to `count` of the lowest members of `source` into `into`.
    fn pull(&self, source: usize, into: usize, count: u64) -> CoreResult<u64> {
        let source_key = self.key(source);
        let end = rank(count) - 1;
        let lowest = self
            .store
            .range_by_rank_with_scores(&source_key, 0, end, Order::Ascending)?;
        if lowest.is_empty() {
            return Ok(0);
        }

        self.store.add_all(&self.key(into), &lowest)?;
        self.store
            .remove_by_rank(&source_key, 0, rank(lowest.len() as u64) - 1)?;

        let moved = lowest.len() as u64;
        self.stats.record_moved_forward(moved);
        debug!(source, into, moved, "backfilled from later segment");
        Ok(moved)
    }
}

fn rank(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
