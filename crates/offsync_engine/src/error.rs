//! Error types for the engine.

use offsync_cache::CacheError;
use offsync_http::{Request, Response};
use offsync_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the proxy and sync engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A persistent store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// An offline cache operation failed.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// A request, response, or shredded row could not be (de)serialized.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The network transport failed to produce a response.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// A response body did not match the shredder's expected shape.
    #[error("shredding error: {0}")]
    Shredding(String),

    /// A network call did not complete within its deadline.
    #[error("operation timed out")]
    Timeout,

    /// `sync()` was called while a sync cycle was already running.
    #[error("cannot start sync while sync is in progress")]
    SyncInProgress,

    /// A sync log entry could not be found.
    #[error("sync log entry not found: {0}")]
    EntryNotFound(String),

    /// A replay failed; the sync cycle was aborted.
    ///
    /// The failing entry and everything after it stay in the sync log so
    /// a later `sync()` can retry.
    #[error("sync failed for request {}: {}", .0.request_id, .0.error)]
    SyncFailed(Box<SyncFailure>),
}

/// Context for a failed sync replay.
#[derive(Debug, Clone)]
pub struct SyncFailure {
    /// What went wrong.
    pub error: String,
    /// Id of the sync log entry that failed.
    pub request_id: String,
    /// The request that was being replayed.
    pub request: Request,
    /// The server response, when the failure was an HTTP error status.
    pub response: Option<Response>,
}

impl EngineError {
    /// Creates a transport failure.
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    /// Wraps a replay failure.
    pub fn sync_failed(
        error: impl Into<String>,
        request_id: impl Into<String>,
        request: Request,
        response: Option<Response>,
    ) -> Self {
        Self::SyncFailed(Box::new(SyncFailure {
            error: error.into(),
            request_id: request_id.into(),
            request,
            response,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_failed_display_carries_context() {
        let err = EngineError::sync_failed(
            "Not Found",
            "abc",
            Request::put("https://example.com/items/1"),
            Some(Response::new(404, "Not Found")),
        );
        let text = err.to_string();
        assert!(text.contains("abc"));
        assert!(text.contains("Not Found"));
    }

    #[test]
    fn error_display() {
        assert_eq!(
            EngineError::SyncInProgress.to_string(),
            "cannot start sync while sync is in progress"
        );
        assert_eq!(EngineError::Timeout.to_string(), "operation timed out");
    }
}
