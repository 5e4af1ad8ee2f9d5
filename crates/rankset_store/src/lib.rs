//! # RankSet Store
//!
//! Sorted-set store contract and implementations for RankSet.
//!
//! This crate provides the lowest-level abstraction RankSet talks to: a
//! collection of physical sorted sets addressed by string keys. Stores know
//! nothing about segments, tenants or caching - they only order members by
//! score.
//!
//! ## Design Principles
//!
//! - Members are opaque strings; encoding belongs to the caller
//! - One call, one store round trip; no atomicity across calls
//! - Absence is `None`, never a magic score
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and embedding
//!
//! ## Example
//!
//! ```rust
//! use rankset_store::{InMemoryStore, SortedSetStore};
//!
//! let store = InMemoryStore::new();
//! store.add("scores", "alice", 42.0).unwrap();
//! assert_eq!(store.score("scores", "alice").unwrap(), Some(42.0));
//! assert_eq!(store.score("scores", "bob").unwrap(), None);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod store;
mod types;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use store::SortedSetStore;
pub use types::{Limit, Order, ScoredMember};
