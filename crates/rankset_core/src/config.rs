//! Segment configuration.

use crate::error::{CoreError, CoreResult};

/// Configuration for a family of partitioned sorted sets.
///
/// Every logical set built from one configuration has the same number of
/// segments and the same capacity schedule. The segment count cannot change
/// once data has been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentConfig {
    /// Number of physical segments per logical set.
    pub segment_count: usize,

    /// Capacity of the first segment. Later segments grow triangularly.
    pub initial_segment_size: u64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            segment_count: 4,
            initial_segment_size: 10_000,
        }
    }
}

impl SegmentConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of segments.
    #[must_use]
    pub const fn segment_count(mut self, count: usize) -> Self {
        self.segment_count = count;
        self
    }

    /// Sets the capacity of the first segment.
    #[must_use]
    pub const fn initial_segment_size(mut self, size: u64) -> Self {
        self.initial_segment_size = size;
        self
    }

    /// Checks that the configuration describes a usable layout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if there are no segments or the first
    /// segment has no room.
    pub fn validate(&self) -> CoreResult<()> {
        if self.segment_count == 0 {
            return Err(CoreError::invalid_config("segment_count must be at least 1"));
        }
        if self.initial_segment_size == 0 {
            return Err(CoreError::invalid_config(
                "initial_segment_size must be at least 1",
            ));
        }
        Ok(())
    }
}
