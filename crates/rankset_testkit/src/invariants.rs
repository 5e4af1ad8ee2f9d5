//! Segment invariant checkers.
//!
//! After any single-threaded sequence of writes a partitioned set must
//! satisfy three properties:
//!
//! - **Ordering**: every score in segment `i` is `<=` every score in
//!   segment `j` for `i < j`.
//! - **Fill**: a segment below capacity is followed by empty segments only.
//! - **Conservation**: each member is stored in exactly one segment and the
//!   segment sizes add up to the logical size.

use crate::fixtures::PartitionedFixture;
use rankset_core::{RankedSet, ScoreEntry};
use rankset_store::{Order, SortedSetStore};
use std::collections::HashSet;
use thiserror::Error;

/// A broken segment invariant.
#[derive(Debug, Error, PartialEq)]
pub enum InvariantError {
    /// A segment holds a score above a later segment's lowest score.
    #[error("segment {segment} max {max} exceeds segment {later} min {min}")]
    Ordering {
        /// The earlier segment.
        segment: usize,
        /// Its highest score.
        max: f64,
        /// The later segment.
        later: usize,
        /// Its lowest score.
        min: f64,
    },

    /// A segment below capacity is followed by a non-empty segment.
    #[error("segment {segment} holds {size} of {capacity} but segment {later} is not empty")]
    Fill {
        /// The under-filled segment.
        segment: usize,
        /// Its size.
        size: u64,
        /// Its capacity.
        capacity: u64,
        /// The non-empty later segment.
        later: usize,
    },

    /// A segment exceeds its capacity.
    #[error("segment {segment} holds {size}, capacity {capacity}")]
    Overfull {
        /// The segment.
        segment: usize,
        /// Its size.
        size: u64,
        /// Its capacity.
        capacity: u64,
    },

    /// A member is stored in more than one segment.
    #[error("member {member:?} stored in more than one segment")]
    Duplicate {
        /// The duplicated member.
        member: String,
    },

    /// Segment sizes disagree with the logical size.
    #[error("segments hold {segments} members, logical size is {logical}")]
    Conservation {
        /// Sum of segment sizes.
        segments: u64,
        /// Logical size reported by the set.
        logical: u64,
    },

    /// The store failed while reading segments.
    #[error("read failed: {0}")]
    Read(String),
}

/// Reads every segment of the fixture's tenant, each ascending.
pub fn segment_contents(fx: &PartitionedFixture) -> Result<Vec<Vec<ScoreEntry<String>>>, InvariantError> {
    fx.set
        .segment_keys(&fx.tenant)
        .iter()
        .map(|key| {
            fx.store
                .range_by_rank_with_scores(key, 0, -1, Order::Ascending)
                .map(|members| {
                    members
                        .into_iter()
                        .map(|m| ScoreEntry::new(m.member, m.score))
                        .collect::<Vec<_>>()
                })
                .map_err(|e| InvariantError::Read(e.to_string()))
        })
        .collect()
}

/// Checks the cross-segment ordering.
pub fn check_ordering(segments: &[Vec<ScoreEntry<String>>]) -> Result<(), InvariantError> {
    let mut running_max: Option<(usize, f64)> = None;
    for (index, segment) in segments.iter().enumerate() {
        let (Some(first), Some(last)) = (segment.first(), segment.last()) else {
            continue;
        };
        if let Some((earlier, max)) = running_max {
            if max > first.score {
                return Err(InvariantError::Ordering {
                    segment: earlier,
                    max,
                    later: index,
                    min: first.score,
                });
            }
        }
        running_max = Some((index, last.score));
    }
    Ok(())
}

/// Checks capacities and that only the tail of the segment list is sparse.
pub fn check_fill(
    segments: &[Vec<ScoreEntry<String>>],
    capacities: &[Option<u64>],
) -> Result<(), InvariantError> {
    for (index, segment) in segments.iter().enumerate() {
        let Some(capacity) = capacities.get(index).copied().flatten() else {
            continue;
        };
        let size = segment.len() as u64;
        if size > capacity {
            return Err(InvariantError::Overfull {
                segment: index,
                size,
                capacity,
            });
        }
        if size < capacity {
            if let Some(later) = (index + 1..segments.len()).find(|&j| !segments[j].is_empty()) {
                return Err(InvariantError::Fill {
                    segment: index,
                    size,
                    capacity,
                    later,
                });
            }
        }
    }
    Ok(())
}

/// Checks that no member is stored twice and sizes add up.
pub fn check_conservation(
    segments: &[Vec<ScoreEntry<String>>],
    logical_size: u64,
) -> Result<(), InvariantError> {
    let mut seen = HashSet::new();
    for entry in segments.iter().flatten() {
        if !seen.insert(entry.member.as_str()) {
            return Err(InvariantError::Duplicate {
                member: entry.member.clone(),
            });
        }
    }
    let total: u64 = segments.iter().map(|segment| segment.len() as u64).sum();
    if total != logical_size {
        return Err(InvariantError::Conservation {
            segments: total,
            logical: logical_size,
        });
    }
    Ok(())
}

/// Runs every check against the fixture's tenant.
pub fn check_segments(fx: &PartitionedFixture) -> Result<(), InvariantError> {
    let segments = segment_contents(fx)?;
    let logical = fx
        .set
        .size(&fx.tenant)
        .map_err(|e| InvariantError::Read(e.to_string()))?;
    check_ordering(&segments)?;
    check_fill(&segments, &fx.set.index().capacities())?;
    check_conservation(&segments, logical)
}
