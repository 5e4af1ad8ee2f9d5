//! Segment layout and rebalancing.
//!
//! A partitioned set spreads one logical set over `K` physical keys. The
//! [`SegmentIndex`] knows where segments live and how large they may grow;
//! the rebalancer moves members across segment boundaries so the segments
//! read back, in order, as one sorted set.

mod index;
mod rebalancer;

pub use index::{SegmentIndex, SegmentLocation};
pub(crate) use rebalancer::Rebalancer;
