//! Property-based test generators using proptest.
//!
//! Members come from a small pool and scores from a narrow integer range,
//! so generated sequences hit re-scores, ties and zero scores often.

use proptest::prelude::*;
use rankset_core::SegmentConfig;

/// One write against a logical set.
#[derive(Debug, Clone, PartialEq)]
pub enum SetOperation {
    /// Add or re-score a member
    Add {
        /// Member
        member: String,
        /// Score
        score: f64,
    },
    /// Increment a member's score
    IncrScore {
        /// Member
        member: String,
        /// Increment
        delta: f64,
    },
    /// Remove a member
    Remove {
        /// Member
        member: String,
    },
    /// Remove members by ascending rank
    RemoveByRank {
        /// First rank
        start: i64,
        /// Last rank
        end: i64,
    },
    /// Remove members by score
    RemoveByScore {
        /// Lowest score removed
        min: f64,
        /// Highest score removed
        max: f64,
    },
}

impl SetOperation {
    /// Returns true for operations [`crate::ModelSet`] reproduces exactly.
    pub fn is_modelled(&self) -> bool {
        !matches!(self, Self::RemoveByRank { .. })
    }
}

/// Strategy for generating members from a pool of 40.
pub fn member_strategy() -> impl Strategy<Value = String> {
    (0u32..40).prop_map(|i| format!("m{i}"))
}

/// Strategy for generating integral scores, zero and negatives included.
pub fn score_strategy() -> impl Strategy<Value = f64> {
    (-50i32..50).prop_map(f64::from)
}

/// Strategy for generating distinct members with distinct scores.
pub fn distinct_entries_strategy(max: usize) -> impl Strategy<Value = Vec<(String, f64)>> {
    prop::collection::hash_set(-10_000i32..10_000, 0..max).prop_map(|scores| {
        scores
            .into_iter()
            .enumerate()
            .map(|(i, score)| (format!("d{i}"), f64::from(score)))
            .collect()
    })
}

/// Strategy for generating small segment layouts.
pub fn segment_config_strategy() -> impl Strategy<Value = SegmentConfig> {
    (1usize..5, 1u64..4).prop_map(|(count, initial)| {
        SegmentConfig::new()
            .segment_count(count)
            .initial_segment_size(initial)
    })
}

/// Strategy for generating one write.
pub fn set_operation_strategy() -> impl Strategy<Value = SetOperation> {
    prop_oneof![
        6 => (member_strategy(), score_strategy())
            .prop_map(|(member, score)| SetOperation::Add { member, score }),
        2 => (member_strategy(), -5i32..5)
            .prop_map(|(member, delta)| SetOperation::IncrScore { member, delta: f64::from(delta) }),
        3 => member_strategy().prop_map(|member| SetOperation::Remove { member }),
        1 => (-10i64..10, -10i64..10)
            .prop_map(|(start, end)| SetOperation::RemoveByRank { start, end }),
        1 => (score_strategy(), 0i32..10)
            .prop_map(|(min, width)| SetOperation::RemoveByScore { min, max: min + f64::from(width) }),
    ]
}

/// Strategy for generating a sequence of writes.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<SetOperation>> {
    prop::collection::vec(set_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn configs_are_valid(config in segment_config_strategy()) {
            prop_assert!(config.validate().is_ok());
        }

        #[test]
        fn score_ranges_are_ordered(op in set_operation_strategy()) {
            if let SetOperation::RemoveByScore { min, max } = op {
                prop_assert!(min <= max);
            }
        }

        #[test]
        fn distinct_entries_have_distinct_scores(entries in distinct_entries_strategy(50)) {
            let mut scores: Vec<i64> = entries.iter().map(|(_, s)| *s as i64).collect();
            scores.sort_unstable();
            scores.dedup();
            prop_assert_eq!(scores.len(), entries.len());
        }
    }
}
