//! Sorted-set store trait definition.

use crate::error::StoreResult;
use crate::types::{Limit, Order, ScoredMember};
use std::time::Duration;

/// A remote collection of sorted sets addressed by string keys.
///
/// Each key holds members with exactly one score per member. Members are
/// ordered by score, ties broken by member bytes. Every call is independent:
/// the store offers no atomicity across calls.
///
/// # Rank semantics
///
/// Rank ranges are inclusive on both ends. Negative ranks count from the
/// end of the ordering (`-1` is the last element). Out-of-range bounds are
/// clamped; an empty range yields an empty result.
///
/// # Score semantics
///
/// Score ranges are inclusive on both ends. `f64::NEG_INFINITY` and
/// `f64::INFINITY` may be used as open bounds.
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing and embedding
pub trait SortedSetStore: Send + Sync {
    /// Adds `member` with `score`, or updates its score.
    ///
    /// Returns true if the member was newly added.
    fn add(&self, key: &str, member: &str, score: f64) -> StoreResult<bool>;

    /// Adds several members at once.
    ///
    /// Returns the number of members newly added.
    fn add_all(&self, key: &str, members: &[ScoredMember]) -> StoreResult<u64> {
        let mut added = 0;
        for entry in members {
            if self.add(key, &entry.member, entry.score)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Increments the score of `member` by `delta`, adding it if absent.
    ///
    /// Returns the new score.
    fn incr_score(&self, key: &str, member: &str, delta: f64) -> StoreResult<f64>;

    /// Returns members in the inclusive rank range.
    fn range_by_rank(&self, key: &str, start: i64, end: i64, order: Order)
        -> StoreResult<Vec<String>>;

    /// Returns members and scores in the inclusive rank range.
    fn range_by_rank_with_scores(
        &self,
        key: &str,
        start: i64,
        end: i64,
        order: Order,
    ) -> StoreResult<Vec<ScoredMember>>;

    /// Returns members whose score lies in `[min, max]`.
    ///
    /// `limit` skips and caps the result after ordering.
    fn range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
        order: Order,
        limit: Option<Limit>,
    ) -> StoreResult<Vec<String>>;

    /// Returns members and scores whose score lies in `[min, max]`.
    fn range_by_score_with_scores(
        &self,
        key: &str,
        min: f64,
        max: f64,
        order: Order,
        limit: Option<Limit>,
    ) -> StoreResult<Vec<ScoredMember>>;

    /// Returns the score of `member`, or `None` if it is not in the set.
    fn score(&self, key: &str, member: &str) -> StoreResult<Option<f64>>;

    /// Returns the number of members under `key` (0 for a missing key).
    fn size(&self, key: &str) -> StoreResult<u64>;

    /// Counts members whose score lies in `[min, max]`.
    fn count_by_score(&self, key: &str, min: f64, max: f64) -> StoreResult<u64>;

    /// Removes `member`. Returns true if it was present.
    fn remove(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Removes members in the inclusive ascending rank range.
    ///
    /// Returns true if anything was removed.
    fn remove_by_rank(&self, key: &str, start: i64, end: i64) -> StoreResult<bool>;

    /// Removes members whose score lies in `[min, max]`.
    ///
    /// Returns true if anything was removed.
    fn remove_by_score(&self, key: &str, min: f64, max: f64) -> StoreResult<bool>;

    /// Deletes `key` entirely. Returns true if it existed.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Sets a time-to-live on `key`. Returns false if the key does not exist.
    fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;
}
