//! # RankSet Core
//!
//! Large ranked collections over a sorted-set store.
//!
//! A logical sorted set (a leaderboard, a time-ordered feed, a priority
//! queue) may outgrow a single physical key. [`PartitionedSet`] spreads it
//! over `K` segments with growing capacities and keeps the segments ordered
//! relative to each other, so reads can walk them like one set.
//! [`CacheAside`] wraps any [`RankedSet`] with read-through reloads from an
//! authoritative source.
//!
//! ## Layout
//!
//! ```text
//! segment:    0      1        2           K-1
//! capacity:   n      2n       4n    ...   unbounded
//! scores:     lowest ------------------>  highest
//! ```
//!
//! Capacities follow `(1 + 1 + 2 + ... + i) * n`. Inserts go to the first
//! segment that has room or whose tail scores higher than the new member;
//! surplus spills into the next segment. Removals pull the lowest members
//! of later segments forward.
//!
//! ## Example
//!
//! ```rust
//! use rankset_core::{PartitionedSet, RangeQuery, RankedSet, SegmentConfig, StringCodec, TenantPath};
//! use rankset_store::InMemoryStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryStore::new());
//! let config = SegmentConfig::new().segment_count(3).initial_segment_size(2);
//! let board = PartitionedSet::new(store, "board", config, StringCodec).unwrap();
//! let tenant = TenantPath::from(7u64);
//!
//! for (i, name) in ["ann", "bob", "cid", "dee", "eve"].iter().enumerate() {
//!     board.add(&tenant, &name.to_string(), i as f64).unwrap();
//! }
//! assert_eq!(board.segment_sizes(&tenant).unwrap(), vec![2, 3, 0]);
//!
//! let top = board.fetch_members(&tenant, &RangeQuery::by_rank(0, 1).descending()).unwrap();
//! assert_eq!(top, vec!["eve", "dee"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache_aside;
mod codec;
mod config;
mod error;
mod key;
mod partitioned;
mod segment;
mod set;
mod single;
mod stats;
mod types;

pub use cache_aside::{CacheAside, Loaded};
pub use codec::{JsonCodec, MemberCodec, StringCodec};
pub use config::SegmentConfig;
pub use error::{CoreError, CoreResult, LoaderError};
pub use key::TenantPath;
pub use partitioned::PartitionedSet;
pub use segment::{SegmentIndex, SegmentLocation};
pub use set::RankedSet;
pub use single::SingleKeySet;
pub use stats::{CacheSnapshot, CacheStats, RebalanceSnapshot, RebalanceStats};
pub use types::{RangeQuery, ScoreEntry, ScoreRange};

// Query vocabulary shared with the store.
pub use rankset_store::{Limit, Order};
