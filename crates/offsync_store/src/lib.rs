//! # offsync store
//!
//! Keyed persistent store contract for the offsync toolkit.
//!
//! This crate provides:
//! - The [`PersistenceStore`] trait the engine is written against
//! - [`RecordMetadata`] carried alongside every row
//! - A simple document [`Query`] (selector / sort / fields)
//! - [`MemoryStore`], the in-memory reference implementation
//! - [`StoreManager`], which opens stores lazily by name via a
//!   [`StoreFactory`]
//!
//! ## Contract
//!
//! Concrete durable backends (files, embedded databases, browser storage)
//! live outside this workspace; the engine only requires the key/value
//! contract defined here. `MemoryStore` exists for tests and ephemeral use.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod manager;
mod memory;
mod query;
mod store;

pub use error::{StoreError, StoreResult};
pub use manager::{MemoryStoreFactory, StoreFactory, StoreManager, StoreOptions};
pub use memory::MemoryStore;
pub use query::{Query, Selector, SortDirection, SortKey};
pub use store::{FoundRecord, PersistenceStore, RecordMetadata, StoreRecord};
