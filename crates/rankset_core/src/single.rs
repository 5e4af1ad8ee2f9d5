//! Logical sets backed by one physical key.

use crate::codec::{decode_entries, decode_members, MemberCodec};
use crate::error::CoreResult;
use crate::key::{set_key, TenantPath};
use crate::set::RankedSet;
use crate::types::{RangeQuery, ScoreEntry, ScoreRange};
use rankset_store::{ScoredMember, SortedSetStore};
use std::sync::Arc;
use std::time::Duration;

/// A family of logical sets, each stored under a single key.
///
/// Every operation maps to one store call. Suitable while a set fits
/// comfortably in one physical sorted set; use
/// [`crate::PartitionedSet`] beyond that.
pub struct SingleKeySet<C> {
    store: Arc<dyn SortedSetStore>,
    base: String,
    codec: C,
}

impl<C: MemberCodec> SingleKeySet<C> {
    /// Creates a family named `base`.
    pub fn new(store: Arc<dyn SortedSetStore>, base: impl Into<String>, codec: C) -> Self {
        Self {
            store,
            base: base.into(),
            codec,
        }
    }

    /// Returns the physical key for `tenant`.
    #[must_use]
    pub fn key(&self, tenant: &TenantPath) -> String {
        set_key(&self.base, tenant)
    }

    /// Returns the family's base name.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }
}

impl<C: MemberCodec> RankedSet for SingleKeySet<C> {
    type Member = C::Member;

    fn set_id(&self, tenant: &TenantPath) -> String {
        self.key(tenant)
    }

    fn add(&self, tenant: &TenantPath, member: &C::Member, score: f64) -> CoreResult<bool> {
        let raw = self.codec.encode(member)?;
        Ok(self.store.add(&self.key(tenant), &raw, score)?)
    }

    fn add_all(&self, tenant: &TenantPath, entries: &[ScoreEntry<C::Member>]) -> CoreResult<u64> {
        let raw = entries
            .iter()
            .map(|entry| Ok(ScoredMember::new(self.codec.encode(&entry.member)?, entry.score)))
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(self.store.add_all(&self.key(tenant), &raw)?)
    }

    fn incr_score(&self, tenant: &TenantPath, member: &C::Member, delta: f64) -> CoreResult<f64> {
        let raw = self.codec.encode(member)?;
        Ok(self.store.incr_score(&self.key(tenant), &raw, delta)?)
    }

    fn score(&self, tenant: &TenantPath, member: &C::Member) -> CoreResult<Option<f64>> {
        let raw = self.codec.encode(member)?;
        Ok(self.store.score(&self.key(tenant), &raw)?)
    }

    fn size(&self, tenant: &TenantPath) -> CoreResult<u64> {
        Ok(self.store.size(&self.key(tenant))?)
    }

    fn count_by_score(&self, tenant: &TenantPath, range: ScoreRange) -> CoreResult<u64> {
        Ok(self
            .store
            .count_by_score(&self.key(tenant), range.min, range.max)?)
    }

    fn fetch(
        &self,
        tenant: &TenantPath,
        query: &RangeQuery,
    ) -> CoreResult<Vec<ScoreEntry<C::Member>>> {
        let key = self.key(tenant);
        let raw = match *query {
            RangeQuery::Score {
                range,
                order,
                limit,
            } => self
                .store
                .range_by_score_with_scores(&key, range.min, range.max, order, limit)?,
            RangeQuery::Rank { start, end, order } => {
                self.store.range_by_rank_with_scores(&key, start, end, order)?
            }
        };
        decode_entries(&self.codec, raw)
    }

    fn fetch_members(&self, tenant: &TenantPath, query: &RangeQuery) -> CoreResult<Vec<C::Member>> {
        let key = self.key(tenant);
        let raw = match *query {
            RangeQuery::Score {
                range,
                order,
                limit,
            } => self
                .store
                .range_by_score(&key, range.min, range.max, order, limit)?,
            RangeQuery::Rank { start, end, order } => {
                self.store.range_by_rank(&key, start, end, order)?
            }
        };
        decode_members(&self.codec, raw)
    }

    fn remove(&self, tenant: &TenantPath, member: &C::Member) -> CoreResult<bool> {
        let raw = self.codec.encode(member)?;
        Ok(self.store.remove(&self.key(tenant), &raw)?)
    }

    fn remove_by_rank(&self, tenant: &TenantPath, start: i64, end: i64) -> CoreResult<bool> {
        Ok(self.store.remove_by_rank(&self.key(tenant), start, end)?)
    }

    fn remove_by_score(&self, tenant: &TenantPath, range: ScoreRange) -> CoreResult<bool> {
        Ok(self
            .store
            .remove_by_score(&self.key(tenant), range.min, range.max)?)
    }

    fn delete(&self, tenant: &TenantPath) -> CoreResult<bool> {
        Ok(self.store.delete(&self.key(tenant))?)
    }

    fn expire(&self, tenant: &TenantPath, ttl: Duration) -> CoreResult<bool> {
        Ok(self.store.expire(&self.key(tenant), ttl)?)
    }
}

impl<C> std::fmt::Debug for SingleKeySet<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleKeySet")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}
