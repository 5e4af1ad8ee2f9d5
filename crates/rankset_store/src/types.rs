//! Query vocabulary shared by stores and their callers.

/// Traversal order of a range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    /// Smallest score first. Rank 0 is the smallest score.
    #[default]
    Ascending,
    /// Largest score first.
    Descending,
}

impl Order {
    /// Returns the opposite order.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    /// Returns true for [`Order::Ascending`].
    #[must_use]
    pub const fn is_ascending(self) -> bool {
        matches!(self, Self::Ascending)
    }
}

/// Offset/count window applied after a score range is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limit {
    /// Number of matching elements to skip.
    pub offset: u64,
    /// Maximum number of elements to return.
    pub count: u64,
}

impl Limit {
    /// Creates a new limit.
    #[must_use]
    pub const fn new(offset: u64, count: u64) -> Self {
        Self { offset, count }
    }
}

/// A member together with its score, as returned by with-scores queries.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    /// The encoded member.
    pub member: String,
    /// The member's score.
    pub score: f64,
}

impl ScoredMember {
    /// Creates a new scored member.
    pub fn new(member: impl Into<String>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}
