//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row or query value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing storage reported an error.
    #[error("store backend error: {0}")]
    Backend(String),

    /// The store was closed or deleted.
    #[error("store is closed")]
    Closed,
}
