//! Error types for cache operations.

use offsync_store::StoreError;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The backing store reported an error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A cache entry could not be (de)serialized.
    #[error("entry codec error: {0}")]
    Codec(#[from] serde_json::Error),
}
