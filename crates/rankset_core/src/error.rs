//! Error types for RankSet core.

use rankset_store::StoreError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Boxed error returned by a backing loader.
pub type LoaderError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur in RankSet core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The sorted-set store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A member could not be encoded or decoded.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// The configuration is not usable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// The cross-segment ordering invariant is already broken.
    ///
    /// Raised when a rebalancing precondition does not hold, which only
    /// happens after concurrent, unsynchronized mutation of the same set.
    #[error("segment {segment} invariant violated: {message}")]
    InvariantViolation {
        /// The segment being rebalanced.
        segment: usize,
        /// Description of the violated precondition.
        message: String,
    },

    /// The backing loader failed; nothing was written back.
    #[error("loader failed: {source}")]
    Loader {
        /// The loader's error.
        #[source]
        source: LoaderError,
    },
}

impl CoreError {
    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invariant violation error.
    pub fn invariant_violation(segment: usize, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            segment,
            message: message.into(),
        }
    }

    /// Wraps a loader failure.
    pub fn loader(source: impl Into<LoaderError>) -> Self {
        Self::Loader {
            source: source.into(),
        }
    }

    /// Returns true if the error came from the store.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
