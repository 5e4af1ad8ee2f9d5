//! # RankSet Testkit
//!
//! Test utilities for RankSet.
//!
//! This crate provides:
//! - Fixtures wiring sets to an in-memory store
//! - Property-based test generators using proptest
//! - Segment invariant checkers (ordering, fill, conservation)
//! - A reference model to compare partitioned sets against
//! - Tracing setup for tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rankset_testkit::prelude::*;
//!
//! #[test]
//! fn keeps_segments_ordered() {
//!     let fx = PartitionedFixture::small();
//!     fx.insert("a", 1.0);
//!     check_segments(&fx).unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod invariants;
pub mod logging;
pub mod model;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::invariants::*;
    pub use crate::logging::*;
    pub use crate::model::*;
}

pub use fixtures::*;
pub use generators::*;
pub use invariants::*;
pub use logging::*;
pub use model::*;
