//! # offsync engine
//!
//! Offline-first request proxy, cache strategy, and sync engine.
//!
//! This crate provides:
//! - [`RequestProxy`]: routes every outgoing request through fetch and
//!   cache policies, persists structured ("shredded") results, and queues
//!   mutations made while offline
//! - [`HttpCacheHeaderStrategy`]: HTTP cache-control semantics (expiry,
//!   revalidation, conditional requests) over the offline cache
//! - [`SyncLog`]: a durable, ordered queue of pending requests with
//!   undo/redo snapshots of the local mutations they caused
//! - [`SyncEngine`]: single-flight replay of the sync log once
//!   connectivity returns, with lifecycle hooks and preflight probing
//!
//! ## Architecture
//!
//! The proxy sits between the application's data-access layer and the
//! network transport:
//!
//! ```text
//! application -> RequestProxy -> {FetchStrategy, CacheStrategy} -> OfflineCache
//!                     |  (offline / failure)
//!                     v
//!                  SyncLog  <- SyncEngine -> network
//! ```
//!
//! ## Key Invariants
//!
//! - Every mutating request applied locally while offline (or whose
//!   network application failed) has a sync log entry until a confirmed
//!   successful replay
//! - Undo/redo records are stored before their sync log entry is removed
//! - At most one sync replay cycle runs at a time
//! - Replay is strictly sequential: mutations first, reads last

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache_control;
mod connectivity;
mod context;
mod error;
mod events;
mod fetch;
mod options;
mod proxy;
mod shred;
mod sync;
mod sync_log;

pub use cache_control::{cache_control_directive, CacheStrategy, Directive, HttpCacheHeaderStrategy};
pub use connectivity::{
    fetch_with_timeout, ConnectivityOracle, FetchClient, MockFetchClient, NetworkStatus,
};
pub use context::EngineContext;
pub use error::{EngineError, EngineResult, SyncFailure};
pub use events::{ListenerId, ListenerRegistry, SyncAction, SyncEvent, SyncEventListener, SyncEventType};
pub use fetch::{CacheFirstStrategy, CacheIfOfflineStrategy, FetchStrategy};
pub use options::{HandlerOverrides, ProxyOptions, RequestHandler};
pub use proxy::RequestProxy;
pub use shred::{ResourceType, ShreddedItem, Shredder, SimpleJsonShredder, Unshredder};
pub use sync::{SyncEngine, SyncOptions, SyncState};
pub use sync_log::{
    SyncLog, SyncLogEntry, UndoRedoEntry, UndoRedoOperation, UndoRedoRecord, REDO_UNDO_STORE,
    SYNC_LOG_STORE,
};
