//! Core types for RankSet.

use rankset_store::{Limit, Order};

/// A decoded member with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry<T> {
    /// The member.
    pub member: T,
    /// The member's score.
    pub score: f64,
}

impl<T> ScoreEntry<T> {
    /// Creates a new entry.
    pub fn new(member: T, score: f64) -> Self {
        Self { member, score }
    }
}

/// An inclusive score interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    /// Lowest score included.
    pub min: f64,
    /// Highest score included.
    pub max: f64,
}

impl ScoreRange {
    /// Creates a range covering `[min, max]`.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Creates a range covering every score.
    #[must_use]
    pub const fn all() -> Self {
        Self::new(f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Returns true if `score` lies in the range.
    #[must_use]
    pub fn contains(&self, score: f64) -> bool {
        self.min <= score && score <= self.max
    }
}

/// A read against a logical set.
///
/// Every read the sets serve is one of these shapes, which lets the
/// cache-aside reader re-run the same query after taking its lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeQuery {
    /// Members whose score lies in a range.
    Score {
        /// The score interval.
        range: ScoreRange,
        /// Result order.
        order: Order,
        /// Optional offset/count window over the ordered matches.
        limit: Option<Limit>,
    },
    /// Members in an inclusive rank range, counted in `order`.
    ///
    /// Negative ranks count from the end.
    Rank {
        /// First rank.
        start: i64,
        /// Last rank.
        end: i64,
        /// Result order.
        order: Order,
    },
}

impl RangeQuery {
    /// An ascending score range query.
    #[must_use]
    pub const fn by_score(min: f64, max: f64) -> Self {
        Self::Score {
            range: ScoreRange::new(min, max),
            order: Order::Ascending,
            limit: None,
        }
    }

    /// An ascending rank range query.
    #[must_use]
    pub const fn by_rank(start: i64, end: i64) -> Self {
        Self::Rank {
            start,
            end,
            order: Order::Ascending,
        }
    }

    /// Returns the query with the given order.
    #[must_use]
    pub const fn with_order(self, order: Order) -> Self {
        match self {
            Self::Score { range, limit, .. } => Self::Score {
                range,
                order,
                limit,
            },
            Self::Rank { start, end, .. } => Self::Rank { start, end, order },
        }
    }

    /// Returns the query in descending order.
    #[must_use]
    pub const fn descending(self) -> Self {
        self.with_order(Order::Descending)
    }

    /// Returns the query with an offset/count window.
    ///
    /// Rank queries are already bounded by their rank range and are
    /// returned unchanged.
    #[must_use]
    pub const fn with_limit(self, offset: u64, count: u64) -> Self {
        match self {
            Self::Score { range, order, .. } => Self::Score {
                range,
                order,
                limit: Some(Limit::new(offset, count)),
            },
            rank @ Self::Rank { .. } => rank,
        }
    }

    /// Returns the query's order.
    #[must_use]
    pub const fn order(&self) -> Order {
        match self {
            Self::Score { order, .. } | Self::Rank { order, .. } => *order,
        }
    }

    /// The number of results a full cache must hold, if the query asks for
    /// a specific count.
    #[must_use]
    pub const fn requested_count(&self) -> Option<u64> {
        match self {
            Self::Score {
                limit: Some(limit), ..
            } => Some(limit.count),
            _ => None,
        }
    }

    /// Returns true if a result of `len` elements counts as a cache hit.
    #[must_use]
    pub fn is_satisfied_by(&self, len: usize) -> bool {
        len > 0 && self.requested_count().map_or(true, |count| len as u64 >= count)
    }
}
