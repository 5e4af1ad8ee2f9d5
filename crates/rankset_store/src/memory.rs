//! In-memory sorted-set store.

use crate::error::{StoreError, StoreResult};
use crate::store::SortedSetStore;
use crate::types::{Limit, Order, ScoredMember};
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

/// One sorted set: a member -> score map plus a (score, member) ordering.
#[derive(Debug, Default)]
struct SortedSet {
    scores: HashMap<String, f64>,
    ordered: BTreeSet<(OrderedFloat<f64>, String)>,
}

impl SortedSet {
    fn len(&self) -> usize {
        self.scores.len()
    }

    fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    fn insert(&mut self, member: &str, score: f64) -> bool {
        match self.scores.insert(member.to_string(), score) {
            Some(old) => {
                self.ordered.remove(&(OrderedFloat(old), member.to_string()));
                self.ordered.insert((OrderedFloat(score), member.to_string()));
                false
            }
            None => {
                self.ordered.insert((OrderedFloat(score), member.to_string()));
                true
            }
        }
    }

    fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.ordered.remove(&(OrderedFloat(score), member.to_string()));
                true
            }
            None => false,
        }
    }

    /// Resolves an inclusive, possibly negative rank range to `(skip, take)`.
    fn resolve_ranks(&self, start: i64, end: i64) -> Option<(usize, usize)> {
        let len = self.len() as i64;
        let start = if start < 0 { len + start } else { start }.max(0);
        let end = if end < 0 { len + end } else { end }.min(len - 1);
        if start > end || start >= len {
            return None;
        }
        Some((start as usize, (end - start + 1) as usize))
    }

    fn by_rank(&self, start: i64, end: i64, order: Order) -> Vec<ScoredMember> {
        let Some((skip, take)) = self.resolve_ranks(start, end) else {
            return Vec::new();
        };
        let to_entry = |(score, member): &(OrderedFloat<f64>, String)| {
            ScoredMember::new(member.clone(), score.0)
        };
        match order {
            Order::Ascending => self.ordered.iter().skip(skip).take(take).map(to_entry).collect(),
            Order::Descending => self
                .ordered
                .iter()
                .rev()
                .skip(skip)
                .take(take)
                .map(to_entry)
                .collect(),
        }
    }

    fn by_score(&self, min: f64, max: f64, order: Order, limit: Option<Limit>) -> Vec<ScoredMember> {
        if min > max {
            return Vec::new();
        }
        let mut matched: Vec<ScoredMember> = self
            .ordered
            .range((OrderedFloat(min), String::new())..)
            .take_while(|(score, _)| score.0 <= max)
            .map(|(score, member)| ScoredMember::new(member.clone(), score.0))
            .collect();
        if !order.is_ascending() {
            matched.reverse();
        }
        match limit {
            Some(limit) => matched
                .into_iter()
                .skip(limit.offset as usize)
                .take(limit.count as usize)
                .collect(),
            None => matched,
        }
    }
}

#[derive(Debug, Default)]
struct Entry {
    set: SortedSet,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// An in-memory sorted-set store.
///
/// Behaves like a single remote store node: members are ordered by score
/// then by member, empty sets disappear, and keys with a time-to-live
/// expire lazily when next touched.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use rankset_store::{InMemoryStore, Order, SortedSetStore};
///
/// let store = InMemoryStore::new();
/// store.add("board", "alice", 10.0).unwrap();
/// store.add("board", "bob", 5.0).unwrap();
/// let names = store.range_by_rank("board", 0, -1, Order::Ascending).unwrap();
/// assert_eq!(names, vec!["bob".to_string(), "alice".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    sets: RwLock<HashMap<String, Entry>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .sets
            .read()
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Removes every key.
    pub fn clear(&self) {
        self.sets.write().clear();
    }

    fn read<R>(&self, key: &str, f: impl FnOnce(Option<&SortedSet>) -> R) -> R {
        let sets = self.sets.read();
        let now = Instant::now();
        f(sets
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| &entry.set))
    }

    fn write<R>(&self, key: &str, f: impl FnOnce(&mut SortedSet) -> R) -> R {
        let mut sets = self.sets.write();
        if sets
            .get(key)
            .is_some_and(|entry| entry.is_expired(Instant::now()))
        {
            sets.remove(key);
        }
        let entry = sets.entry(key.to_string()).or_default();
        let result = f(&mut entry.set);
        let empty = entry.set.is_empty();
        if empty {
            sets.remove(key);
        }
        result
    }
}

fn check_score(score: f64) -> StoreResult<()> {
    if score.is_nan() {
        return Err(StoreError::invalid_argument("score is NaN"));
    }
    Ok(())
}

impl SortedSetStore for InMemoryStore {
    fn add(&self, key: &str, member: &str, score: f64) -> StoreResult<bool> {
        check_score(score)?;
        Ok(self.write(key, |set| set.insert(member, score)))
    }

    fn incr_score(&self, key: &str, member: &str, delta: f64) -> StoreResult<f64> {
        check_score(delta)?;
        self.write(key, |set| {
            let score = set.scores.get(member).copied().unwrap_or(0.0) + delta;
            check_score(score)?;
            set.insert(member, score);
            Ok(score)
        })
    }

    fn range_by_rank(
        &self,
        key: &str,
        start: i64,
        end: i64,
        order: Order,
    ) -> StoreResult<Vec<String>> {
        Ok(self
            .range_by_rank_with_scores(key, start, end, order)?
            .into_iter()
            .map(|entry| entry.member)
            .collect())
    }

    fn range_by_rank_with_scores(
        &self,
        key: &str,
        start: i64,
        end: i64,
        order: Order,
    ) -> StoreResult<Vec<ScoredMember>> {
        Ok(self.read(key, |set| {
            set.map(|set| set.by_rank(start, end, order))
                .unwrap_or_default()
        }))
    }

    fn range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
        order: Order,
        limit: Option<Limit>,
    ) -> StoreResult<Vec<String>> {
        Ok(self
            .range_by_score_with_scores(key, min, max, order, limit)?
            .into_iter()
            .map(|entry| entry.member)
            .collect())
    }

    fn range_by_score_with_scores(
        &self,
        key: &str,
        min: f64,
        max: f64,
        order: Order,
        limit: Option<Limit>,
    ) -> StoreResult<Vec<ScoredMember>> {
        check_score(min)?;
        check_score(max)?;
        Ok(self.read(key, |set| {
            set.map(|set| set.by_score(min, max, order, limit))
                .unwrap_or_default()
        }))
    }

    fn score(&self, key: &str, member: &str) -> StoreResult<Option<f64>> {
        Ok(self.read(key, |set| set.and_then(|set| set.scores.get(member).copied())))
    }

    fn size(&self, key: &str) -> StoreResult<u64> {
        Ok(self.read(key, |set| set.map_or(0, |set| set.len() as u64)))
    }

    fn count_by_score(&self, key: &str, min: f64, max: f64) -> StoreResult<u64> {
        check_score(min)?;
        check_score(max)?;
        Ok(self.read(key, |set| {
            set.map_or(0, |set| set.by_score(min, max, Order::Ascending, None).len() as u64)
        }))
    }

    fn remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        Ok(self.write(key, |set| set.remove(member)))
    }

    fn remove_by_rank(&self, key: &str, start: i64, end: i64) -> StoreResult<bool> {
        Ok(self.write(key, |set| {
            let doomed = set.by_rank(start, end, Order::Ascending);
            for entry in &doomed {
                set.remove(&entry.member);
            }
            !doomed.is_empty()
        }))
    }

    fn remove_by_score(&self, key: &str, min: f64, max: f64) -> StoreResult<bool> {
        check_score(min)?;
        check_score(max)?;
        Ok(self.write(key, |set| {
            let doomed = set.by_score(min, max, Order::Ascending, None);
            for entry in &doomed {
                set.remove(&entry.member);
            }
            !doomed.is_empty()
        }))
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut sets = self.sets.write();
        let now = Instant::now();
        Ok(sets
            .remove(key)
            .is_some_and(|entry| !entry.is_expired(now)))
    }

    fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let mut sets = self.sets.write();
        let now = Instant::now();
        match sets.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            Some(_) => {
                sets.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        for (member, score) in [("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0), ("e", 5.0)] {
            store.add("z", member, score).unwrap();
        }
        store
    }

    #[test]
    fn add_reports_new_members() {
        let store = InMemoryStore::new();
        assert!(store.add("z", "a", 1.0).unwrap());
        assert!(!store.add("z", "a", 2.0).unwrap());
        assert_eq!(store.size("z").unwrap(), 1);
        assert_eq!(store.score("z", "a").unwrap(), Some(2.0));
    }

    #[test]
    fn zero_score_is_present() {
        let store = InMemoryStore::new();
        store.add("z", "zero", 0.0).unwrap();
        assert_eq!(store.score("z", "zero").unwrap(), Some(0.0));
        assert_eq!(store.score("z", "other").unwrap(), None);
    }

    #[test]
    fn nan_score_rejected() {
        let store = InMemoryStore::new();
        let result = store.add("z", "a", f64::NAN);
        assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
    }

    #[test]
    fn incr_score_adds_missing_member() {
        let store = InMemoryStore::new();
        assert_eq!(store.incr_score("z", "a", 2.5).unwrap(), 2.5);
        assert_eq!(store.incr_score("z", "a", 1.0).unwrap(), 3.5);
    }

    #[test]
    fn rank_ranges_with_negative_bounds() {
        let store = seeded();
        assert_eq!(
            store.range_by_rank("z", 0, 1, Order::Ascending).unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(
            store.range_by_rank("z", -2, -1, Order::Ascending).unwrap(),
            vec!["d", "e"]
        );
        assert_eq!(
            store.range_by_rank("z", 0, 1, Order::Descending).unwrap(),
            vec!["e", "d"]
        );
        assert_eq!(
            store.range_by_rank("z", 3, 100, Order::Ascending).unwrap(),
            vec!["d", "e"]
        );
        assert!(store.range_by_rank("z", 7, 9, Order::Ascending).unwrap().is_empty());
        assert!(store.range_by_rank("z", 3, 1, Order::Ascending).unwrap().is_empty());
    }

    #[test]
    fn score_ranges_are_inclusive() {
        let store = seeded();
        assert_eq!(
            store
                .range_by_score("z", 2.0, 4.0, Order::Ascending, None)
                .unwrap(),
            vec!["b", "c", "d"]
        );
        assert_eq!(
            store
                .range_by_score("z", 2.0, 4.0, Order::Descending, None)
                .unwrap(),
            vec!["d", "c", "b"]
        );
        assert_eq!(store.count_by_score("z", 2.0, 4.0).unwrap(), 3);
    }

    #[test]
    fn score_range_limit() {
        let store = seeded();
        let page = store
            .range_by_score_with_scores(
                "z",
                f64::NEG_INFINITY,
                f64::INFINITY,
                Order::Descending,
                Some(Limit::new(1, 2)),
            )
            .unwrap();
        assert_eq!(
            page,
            vec![ScoredMember::new("d", 4.0), ScoredMember::new("c", 3.0)]
        );
    }

    #[test]
    fn ties_order_by_member() {
        let store = InMemoryStore::new();
        store.add("z", "b", 1.0).unwrap();
        store.add("z", "a", 1.0).unwrap();
        assert_eq!(
            store.range_by_rank("z", 0, -1, Order::Ascending).unwrap(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn removals() {
        let store = seeded();
        assert!(store.remove("z", "a").unwrap());
        assert!(!store.remove("z", "a").unwrap());
        assert!(store.remove_by_rank("z", 0, 0).unwrap());
        assert!(store.remove_by_score("z", 5.0, 5.0).unwrap());
        assert!(!store.remove_by_score("z", 10.0, 20.0).unwrap());
        assert_eq!(
            store.range_by_rank("z", 0, -1, Order::Ascending).unwrap(),
            vec!["c", "d"]
        );
    }

    #[test]
    fn empty_set_disappears() {
        let store = InMemoryStore::new();
        store.add("z", "a", 1.0).unwrap();
        store.remove("z", "a").unwrap();
        assert!(store.keys().is_empty());
        assert!(!store.delete("z").unwrap());
    }

    #[test]
    fn delete_and_expire() {
        let store = seeded();
        assert!(store.expire("z", Duration::from_secs(60)).unwrap());
        assert_eq!(store.size("z").unwrap(), 5);
        assert!(store.delete("z").unwrap());
        assert!(!store.expire("z", Duration::from_secs(60)).unwrap());
    }

    #[test]
    fn expired_key_reads_as_missing() {
        let store = seeded();
        assert!(store.expire("z", Duration::ZERO).unwrap());
        assert_eq!(store.size("z").unwrap(), 0);
        assert_eq!(store.score("z", "a").unwrap(), None);

        // A write after expiry starts a fresh set.
        store.add("z", "x", 9.0).unwrap();
        assert_eq!(store.size("z").unwrap(), 1);
    }

    proptest::proptest! {
        #[test]
        fn ascending_ranks_follow_scores(scores in proptest::collection::vec(-1000i32..1000, 0..40)) {
            let store = InMemoryStore::new();
            for (i, score) in scores.iter().enumerate() {
                store.add("z", &format!("m{i:03}"), f64::from(*score)).unwrap();
            }
            let ranked = store
                .range_by_rank_with_scores("z", 0, -1, Order::Ascending)
                .unwrap();
            proptest::prop_assert_eq!(ranked.len(), scores.len());
            proptest::prop_assert!(ranked.windows(2).all(|w| w[0].score <= w[1].score));
        }
    }

    #[test]
    fn keys_are_sorted() {
        let store = InMemoryStore::new();
        store.add("b", "m", 1.0).unwrap();
        store.add("a", "m", 1.0).unwrap();
        assert_eq!(store.keys(), vec!["a", "b"]);
        store.clear();
        assert!(store.keys().is_empty());
    }
}
