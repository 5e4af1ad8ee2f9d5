//! Segment layout: capacities, keys and member location.

use crate::config::SegmentConfig;
use crate::error::CoreResult;
use crate::key::{segment_key, TenantPath};
use rankset_store::SortedSetStore;

/// Where a member currently lives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLocation {
    /// Index of the segment holding the member.
    pub segment: usize,
    /// The member's score.
    pub score: f64,
}

/// Maps a logical set onto its segments.
///
/// Segment `i < K-1` holds at most `(1 + 1 + 2 + ... + i) * initial` members;
/// the last segment is unbounded so an insert always finds room.
#[derive(Debug, Clone)]
pub struct SegmentIndex {
    base: String,
    config: SegmentConfig,
}

impl SegmentIndex {
    /// Creates the index for the family `base`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` does not validate.
    pub fn new(base: impl Into<String>, config: SegmentConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            base: base.into(),
            config,
        })
    }

    /// Returns the family's base name.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.config.segment_count
    }

    /// Returns the index of the last, unbounded segment.
    #[must_use]
    pub fn last(&self) -> usize {
        self.config.segment_count - 1
    }

    /// Returns the capacity threshold of segment `index`.
    ///
    /// `None` means unbounded, which is the case for the last segment only.
    #[must_use]
    pub fn capacity(&self, index: usize) -> Option<u64> {
        if index >= self.last() {
            return None;
        }
        let index = index as u64;
        let steps = 1 + index * (index + 1) / 2;
        Some(steps.saturating_mul(self.config.initial_segment_size))
    }

    /// Returns the capacity thresholds of all segments.
    #[must_use]
    pub fn capacities(&self) -> Vec<Option<u64>> {
        (0..self.segment_count())
            .map(|index| self.capacity(index))
            .collect()
    }

    /// Returns the physical key of segment `index` for `tenant`.
    #[must_use]
    pub fn key(&self, index: usize, tenant: &TenantPath) -> String {
        segment_key(&self.base, index, tenant)
    }

    /// Returns the physical keys of every segment for `tenant`.
    #[must_use]
    pub fn keys(&self, tenant: &TenantPath) -> Vec<String> {
        (0..self.segment_count())
            .map(|index| self.key(index, tenant))
            .collect()
    }

    /// Finds the first segment holding the encoded `member`.
    pub fn locate(
        &self,
        store: &dyn SortedSetStore,
        tenant: &TenantPath,
        member: &str,
    ) -> CoreResult<Option<SegmentLocation>> {
        for segment in 0..self.segment_count() {
            if let Some(score) = store.score(&self.key(segment, tenant), member)? {
                return Ok(Some(SegmentLocation { segment, score }));
            }
        }
        Ok(None)
    }

    /// Reads the size of every segment for `tenant`.
    pub fn sizes(&self, store: &dyn SortedSetStore, tenant: &TenantPath) -> CoreResult<Vec<u64>> {
        (0..self.segment_count())
            .map(|segment| Ok(store.size(&self.key(segment, tenant))?))
            .collect()
    }
}
