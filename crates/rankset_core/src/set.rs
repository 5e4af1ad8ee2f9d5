//! The logical sorted-set trait.

use crate::error::CoreResult;
use crate::key::TenantPath;
use crate::types::{RangeQuery, ScoreEntry, ScoreRange};
use std::time::Duration;

/// Operations on a family of logical sorted sets.
///
/// A value implementing this trait owns a base name; each [`TenantPath`]
/// selects one logical set in the family. Single-key and partitioned
/// layouts both implement it, so callers (and the cache-aside reader) do
/// not care how a logical set is laid out.
pub trait RankedSet: Send + Sync {
    /// The decoded member type.
    type Member;

    /// Returns the identity of the logical set for `tenant`.
    ///
    /// Two handles naming the same logical set return the same identity.
    fn set_id(&self, tenant: &TenantPath) -> String;

    /// Adds `member` with `score`, moving it if it already exists.
    ///
    /// Returns true if the member was not in the set before.
    fn add(&self, tenant: &TenantPath, member: &Self::Member, score: f64) -> CoreResult<bool>;

    /// Adds every entry. Returns the number of members newly added.
    fn add_all(&self, tenant: &TenantPath, entries: &[ScoreEntry<Self::Member>])
        -> CoreResult<u64>;

    /// Adds `delta` to the member's score (0 if absent). Returns the new score.
    fn incr_score(&self, tenant: &TenantPath, member: &Self::Member, delta: f64)
        -> CoreResult<f64>;

    /// Returns the member's score, or `None` if it is not in the set.
    fn score(&self, tenant: &TenantPath, member: &Self::Member) -> CoreResult<Option<f64>>;

    /// Returns true if the member is in the set.
    fn contains(&self, tenant: &TenantPath, member: &Self::Member) -> CoreResult<bool> {
        Ok(self.score(tenant, member)?.is_some())
    }

    /// Returns the number of members.
    fn size(&self, tenant: &TenantPath) -> CoreResult<u64>;

    /// Counts members whose score lies in `range`.
    fn count_by_score(&self, tenant: &TenantPath, range: ScoreRange) -> CoreResult<u64>;

    /// Runs a range query, returning members with their scores.
    fn fetch(&self, tenant: &TenantPath, query: &RangeQuery)
        -> CoreResult<Vec<ScoreEntry<Self::Member>>>;

    /// Runs a range query, returning members only.
    fn fetch_members(&self, tenant: &TenantPath, query: &RangeQuery)
        -> CoreResult<Vec<Self::Member>> {
        Ok(self
            .fetch(tenant, query)?
            .into_iter()
            .map(|entry| entry.member)
            .collect())
    }

    /// Returns the lowest-scored entry.
    fn first(&self, tenant: &TenantPath) -> CoreResult<Option<ScoreEntry<Self::Member>>> {
        Ok(self.fetch(tenant, &RangeQuery::by_rank(0, 0))?.into_iter().next())
    }

    /// Returns the highest-scored entry.
    fn last(&self, tenant: &TenantPath) -> CoreResult<Option<ScoreEntry<Self::Member>>> {
        Ok(self
            .fetch(tenant, &RangeQuery::by_rank(0, 0).descending())?
            .into_iter()
            .next())
    }

    /// Removes the member. Returns true if it was present.
    fn remove(&self, tenant: &TenantPath, member: &Self::Member) -> CoreResult<bool>;

    /// Removes members in the inclusive ascending rank range.
    fn remove_by_rank(&self, tenant: &TenantPath, start: i64, end: i64) -> CoreResult<bool>;

    /// Removes members whose score lies in `range`.
    fn remove_by_score(&self, tenant: &TenantPath, range: ScoreRange) -> CoreResult<bool>;

    /// Deletes the whole logical set. Returns true if anything existed.
    fn delete(&self, tenant: &TenantPath) -> CoreResult<bool>;

    /// Sets a time-to-live on the logical set.
    ///
    /// Returns true if at least one physical key received it.
    fn expire(&self, tenant: &TenantPath, ttl: Duration) -> CoreResult<bool>;
}
