//! Store trait definition.

use crate::error::StoreResult;
use crate::query::Query;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata stored alongside every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Creation time in unix epoch milliseconds.
    pub created: u64,
}

impl RecordMetadata {
    /// Creates metadata with the given creation timestamp.
    pub fn new(created: u64) -> Self {
        Self { created }
    }
}

/// A key/value pair handed to [`PersistenceStore::upsert_all`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    /// Row key.
    pub key: String,
    /// Row value.
    pub value: Value,
}

impl StoreRecord {
    /// Creates a record.
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A row returned by [`PersistenceStore::find`].
#[derive(Debug, Clone, PartialEq)]
pub struct FoundRecord {
    /// Row key.
    pub key: String,
    /// Row metadata.
    pub metadata: RecordMetadata,
    /// Row value, possibly projected down to the query's `fields`.
    pub value: Value,
}

/// A keyed persistent store.
///
/// Stores are **opaque row holders**: they persist JSON values under string
/// keys and answer simple document queries. The engine owns all semantics -
/// stores do not understand requests, cache entries, or sync log records.
///
/// # Invariants
///
/// - `upsert` with an existing key replaces the value but keeps the
///   original `created` metadata
/// - `find` results honor the query's sort order
/// - Implementations must be `Send + Sync`; callers serialize conflicting
///   writes themselves
pub trait PersistenceStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn find_by_key(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Inserts or replaces the row under `key`.
    fn upsert(&self, key: &str, metadata: RecordMetadata, value: Value) -> StoreResult<()>;

    /// Inserts or replaces a batch of rows.
    ///
    /// Rows are applied in order; existing rows keep their metadata.
    fn upsert_all(&self, records: &[StoreRecord]) -> StoreResult<()>;

    /// Removes the row under `key`. Returns true if a row was removed.
    fn remove_by_key(&self, key: &str) -> StoreResult<bool>;

    /// Runs a document query over all rows.
    fn find(&self, query: &Query) -> StoreResult<Vec<FoundRecord>>;

    /// Returns all row keys.
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Removes every row in the store.
    fn delete_all(&self) -> StoreResult<()>;
}
