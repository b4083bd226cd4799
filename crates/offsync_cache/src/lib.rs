//! # offsync cache
//!
//! Offline HTTP response cache for the offsync toolkit.
//!
//! This crate provides:
//! - [`OfflineCache`]: a named, durable mapping from request signatures to
//!   stored responses over a [`offsync_store::PersistenceStore`]
//! - [`MatchOptions`] controlling signature comparison (query string,
//!   method restriction, `Vary` handling)
//! - [`CacheRegistry`]: named caches opened lazily and searched in
//!   insertion order
//!
//! ## Key Invariants
//!
//! - Cache entries for GET/HEAD requests are the sole source of offline
//!   responses for those methods
//! - A match returns the response with `from_cache` set
//! - `put` overwrites the entry for the same signature

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod entry;
mod error;
mod registry;

pub use cache::OfflineCache;
pub use entry::MatchOptions;
pub use error::{CacheError, CacheResult};
pub use registry::CacheRegistry;
