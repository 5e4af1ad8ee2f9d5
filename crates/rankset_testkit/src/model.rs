//! A reference model of one logical sorted set.
//!
//! Plain `HashMap` semantics, no segments. Property tests run the same
//! operations against the model and a partitioned set and compare.

use crate::generators::SetOperation;
use rankset_core::{CoreResult, RankedSet, ScoreRange, TenantPath};
use std::collections::HashMap;

/// The expected contents of a logical set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelSet {
    scores: HashMap<String, f64>,
}

impl ModelSet {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one operation. Rank removals are not modelled and are
    /// ignored.
    pub fn apply(&mut self, op: &SetOperation) {
        match op {
            SetOperation::Add { member, score } => {
                self.scores.insert(member.clone(), *score);
            }
            SetOperation::IncrScore { member, delta } => {
                *self.scores.entry(member.clone()).or_insert(0.0) += delta;
            }
            SetOperation::Remove { member } => {
                self.scores.remove(member);
            }
            SetOperation::RemoveByScore { min, max } => {
                let range = ScoreRange::new(*min, *max);
                self.scores.retain(|_, score| !range.contains(*score));
            }
            SetOperation::RemoveByRank { .. } => {}
        }
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Returns true if the model is empty.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Returns the member's score.
    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Returns `(member, score)` pairs sorted by score, then member.
    pub fn sorted(&self) -> Vec<(String, f64)> {
        let mut pairs: Vec<_> = self
            .scores
            .iter()
            .map(|(member, score)| (member.clone(), *score))
            .collect();
        pairs.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        pairs
    }

    /// Returns the scores in ascending order.
    pub fn sorted_scores(&self) -> Vec<f64> {
        self.sorted().into_iter().map(|(_, score)| score).collect()
    }
}

/// Applies `op` to a set of strings.
pub fn apply_operation<S>(set: &S, tenant: &TenantPath, op: &SetOperation) -> CoreResult<()>
where
    S: RankedSet<Member = String>,
{
    match op {
        SetOperation::Add { member, score } => {
            set.add(tenant, member, *score)?;
        }
        SetOperation::IncrScore { member, delta } => {
            set.incr_score(tenant, member, *delta)?;
        }
        SetOperation::Remove { member } => {
            set.remove(tenant, member)?;
        }
        SetOperation::RemoveByScore { min, max } => {
            set.remove_by_score(tenant, ScoreRange::new(*min, *max))?;
        }
        SetOperation::RemoveByRank { start, end } => {
            set.remove_by_rank(tenant, *start, *end)?;
        }
    }
    Ok(())
}
