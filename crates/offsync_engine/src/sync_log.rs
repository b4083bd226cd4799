//! The durable queue of pending requests.
//!
//! Two reserved stores back the log: `syncLog` holds the queued requests
//! and `redoUndoLog` holds, under the same entry id, the snapshots needed
//! to reverse or reapply the local mutations each request caused.

use crate::error::{EngineError, EngineResult};
use offsync_http::{now_millis, Request};
use offsync_store::{
    PersistenceStore, Query, RecordMetadata, Selector, StoreManager, StoreRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Store holding the queued requests.
pub const SYNC_LOG_STORE: &str = "syncLog";

/// Store holding undo/redo snapshots, keyed by sync log entry id.
pub const REDO_UNDO_STORE: &str = "redoUndoLog";

/// How an undo/redo record is applied to its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndoRedoOperation {
    /// Rows were inserted or replaced.
    Upsert,
    /// Rows were removed.
    Remove,
}

/// Before/after snapshot for one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoRedoEntry {
    /// Row key.
    pub key: String,
    /// Value before the mutation; `None` if the row did not exist.
    pub undo: Option<Value>,
    /// Value after the mutation; `None` for removals.
    pub redo: Option<Value>,
}

/// Snapshots for all rows one request touched in one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoRedoRecord {
    /// The affected store.
    pub store_name: String,
    /// How the rows were mutated.
    pub operation: UndoRedoOperation,
    /// Per-row snapshots, in mutation order.
    pub entries: Vec<UndoRedoEntry>,
}

/// A queued request as read back from the log.
#[derive(Debug, Clone)]
pub struct SyncLogEntry {
    /// Entry id, also the key of its undo/redo record.
    pub request_id: String,
    /// Row metadata (creation time drives replay order).
    pub metadata: RecordMetadata,
    /// The request to replay.
    pub request: Request,
}

/// The durable, ordered queue of pending requests.
pub struct SyncLog {
    stores: Arc<StoreManager>,
    clock: AtomicU64,
}

impl SyncLog {
    /// Creates a log over the given store manager.
    pub fn new(stores: Arc<StoreManager>) -> Self {
        Self {
            stores,
            clock: AtomicU64::new(0),
        }
    }

    /// Wall-clock millis, bumped past the previous value so two inserts
    /// in the same millisecond still order deterministically.
    fn next_created(&self) -> u64 {
        let now = now_millis().max(0) as u64;
        let prev = self
            .clock
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(now.max(prev + 1))
            })
            .unwrap_or(now);
        now.max(prev + 1)
    }

    fn log_store(&self) -> EngineResult<Arc<dyn PersistenceStore>> {
        Ok(self.stores.open_store(SYNC_LOG_STORE)?)
    }

    fn undo_redo_store(&self) -> EngineResult<Arc<dyn PersistenceStore>> {
        Ok(self.stores.open_store(REDO_UNDO_STORE)?)
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> EngineResult<Vec<SyncLogEntry>> {
        let query = Query::new()
            .with_selector(Selector::FieldExists("metadata.created".to_string()))
            .sort_by("metadata.created");
        let mut entries = Vec::new();
        for record in self.log_store()?.find(&query)? {
            let request: Request = serde_json::from_value(record.value)?;
            entries.push(SyncLogEntry {
                request_id: record.key,
                metadata: record.metadata,
                request,
            });
        }
        Ok(entries)
    }

    /// Queues a request, storing its undo/redo snapshots under the same
    /// id. Returns the new entry id.
    ///
    /// The snapshots are written first so a log entry is never observable
    /// without them.
    pub fn insert(
        &self,
        request: &Request,
        undo_redo: Option<Vec<UndoRedoRecord>>,
    ) -> EngineResult<String> {
        let id = Uuid::new_v4().to_string();
        let metadata = RecordMetadata::new(self.next_created());
        if let Some(records) = undo_redo {
            self.undo_redo_store()?
                .upsert(&id, metadata, serde_json::to_value(&records)?)?;
        }
        self.log_store()?
            .upsert(&id, metadata, serde_json::to_value(request)?)?;
        debug!(request_id = %id, method = %request.method.as_str(), url = %request.url, "queued request");
        Ok(id)
    }

    /// Removes an entry and its undo/redo record, returning the queued
    /// request if the entry existed.
    pub fn remove(&self, id: &str) -> EngineResult<Option<Request>> {
        let store = self.log_store()?;
        let Some(value) = store.find_by_key(id)? else {
            return Ok(None);
        };
        let request: Request = serde_json::from_value(value)?;
        store.remove_by_key(id)?;
        self.undo_redo_store()?.remove_by_key(id)?;
        debug!(request_id = %id, "removed sync log entry");
        Ok(Some(request))
    }

    /// Replaces the request stored under an existing entry id.
    pub fn update(&self, id: &str, request: &Request) -> EngineResult<()> {
        let store = self.log_store()?;
        if store.find_by_key(id)?.is_none() {
            return Err(EngineError::EntryNotFound(id.to_string()));
        }
        // the existing row keeps its metadata; the entry's position in
        // the queue does not change
        store.upsert(id, RecordMetadata::default(), serde_json::to_value(request)?)?;
        Ok(())
    }

    /// Reverts the local mutations recorded for `id`. Returns false if no
    /// undo/redo record exists.
    pub fn undo(&self, id: &str) -> EngineResult<bool> {
        self.apply(id, true)
    }

    /// Reapplies the local mutations recorded for `id`. Returns false if
    /// no undo/redo record exists.
    pub fn redo(&self, id: &str) -> EngineResult<bool> {
        self.apply(id, false)
    }

    fn apply(&self, id: &str, undo: bool) -> EngineResult<bool> {
        let Some(value) = self.undo_redo_store()?.find_by_key(id)? else {
            return Ok(false);
        };
        let records: Vec<UndoRedoRecord> = serde_json::from_value(value)?;
        for record in &records {
            let store = self.stores.open_store(&record.store_name)?;
            match record.operation {
                UndoRedoOperation::Upsert => {
                    let rows = record
                        .entries
                        .iter()
                        .map(|entry| {
                            let snapshot = if undo { &entry.undo } else { &entry.redo };
                            StoreRecord::new(
                                entry.key.clone(),
                                snapshot.clone().unwrap_or(Value::Null),
                            )
                        })
                        .collect::<Vec<_>>();
                    store.upsert_all(&rows)?;
                }
                UndoRedoOperation::Remove => {
                    if undo {
                        for entry in &record.entries {
                            store.upsert(
                                &entry.key,
                                RecordMetadata::default(),
                                entry.undo.clone().unwrap_or(Value::Null),
                            )?;
                        }
                    } else {
                        for entry in &record.entries {
                            store.remove_by_key(&entry.key)?;
                        }
                    }
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn log() -> (SyncLog, Arc<StoreManager>) {
        let stores = Arc::new(StoreManager::in_memory());
        (SyncLog::new(Arc::clone(&stores)), stores)
    }

    #[test]
    fn insert_then_entries_in_creation_order() {
        let (log, _) = log();
        let a = log.insert(&Request::put("http://x/items/1"), None).unwrap();
        let b = log.insert(&Request::get("http://x/items"), None).unwrap();
        assert_ne!(a, b);

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].request_id, a);
        assert_eq!(entries[1].request_id, b);
        assert_eq!(entries[0].request.url, "http://x/items/1");
    }

    #[test]
    fn remove_returns_request_and_clears_snapshots() {
        let (log, stores) = log();
        let records = vec![UndoRedoRecord {
            store_name: "items".to_string(),
            operation: UndoRedoOperation::Upsert,
            entries: vec![UndoRedoEntry {
                key: "1".to_string(),
                undo: None,
                redo: Some(json!({"id": "1"})),
            }],
        }];
        let id = log
            .insert(&Request::put("http://x/items/1"), Some(records))
            .unwrap();

        let undo_redo = stores.open_store(REDO_UNDO_STORE).unwrap();
        assert!(undo_redo.find_by_key(&id).unwrap().is_some());

        let removed = log.remove(&id).unwrap().unwrap();
        assert_eq!(removed.url, "http://x/items/1");
        assert!(undo_redo.find_by_key(&id).unwrap().is_none());
        assert!(log.remove(&id).unwrap().is_none());
    }

    #[test]
    fn update_replaces_request_for_existing_entry() {
        let (log, _) = log();
        let id = log.insert(&Request::put("http://x/items/1"), None).unwrap();
        log.update(&id, &Request::put("http://x/items/2")).unwrap();
        assert_eq!(log.entries().unwrap()[0].request.url, "http://x/items/2");

        let err = log
            .update("missing", &Request::get("http://x"))
            .unwrap_err();
        assert!(matches!(err, EngineError::EntryNotFound(_)));
    }

    #[test]
    fn update_keeps_queue_position() {
        let (log, _) = log();
        let first = log.insert(&Request::put("http://x/items/1"), None).unwrap();
        let second = log.insert(&Request::put("http://x/items/2"), None).unwrap();

        log.update(&first, &Request::put("http://x/items/1?v=2"))
            .unwrap();

        let entries = log.entries().unwrap();
        assert_eq!(entries[0].request_id, first);
        assert_eq!(entries[0].request.url, "http://x/items/1?v=2");
        assert_eq!(entries[1].request_id, second);
    }

    #[test]
    fn undo_restores_prior_values_including_null() {
        let (log, stores) = log();
        let items = stores.open_store("items").unwrap();
        items
            .upsert("1", RecordMetadata::default(), json!({"n": 1}))
            .unwrap();

        let records = vec![UndoRedoRecord {
            store_name: "items".to_string(),
            operation: UndoRedoOperation::Upsert,
            entries: vec![
                UndoRedoEntry {
                    key: "1".to_string(),
                    undo: Some(json!({"n": 1})),
                    redo: Some(json!({"n": 2})),
                },
                UndoRedoEntry {
                    key: "2".to_string(),
                    undo: None,
                    redo: Some(json!({"n": 9})),
                },
            ],
        }];
        let id = log
            .insert(&Request::put("http://x/items"), Some(records))
            .unwrap();

        assert!(log.redo(&id).unwrap());
        assert_eq!(items.find_by_key("1").unwrap(), Some(json!({"n": 2})));
        assert_eq!(items.find_by_key("2").unwrap(), Some(json!({"n": 9})));

        assert!(log.undo(&id).unwrap());
        assert_eq!(items.find_by_key("1").unwrap(), Some(json!({"n": 1})));
        assert_eq!(items.find_by_key("2").unwrap(), Some(Value::Null));
    }

    #[test]
    fn remove_operation_redo_deletes_and_undo_restores() {
        let (log, stores) = log();
        let items = stores.open_store("items").unwrap();
        items
            .upsert("42", RecordMetadata::default(), json!({"id": "42"}))
            .unwrap();

        let records = vec![UndoRedoRecord {
            store_name: "items".to_string(),
            operation: UndoRedoOperation::Remove,
            entries: vec![UndoRedoEntry {
                key: "42".to_string(),
                undo: Some(json!({"id": "42"})),
                redo: None,
            }],
        }];
        let id = log
            .insert(&Request::delete("http://x/items/42"), Some(records))
            .unwrap();

        assert!(log.redo(&id).unwrap());
        assert!(items.find_by_key("42").unwrap().is_none());

        assert!(log.undo(&id).unwrap());
        assert_eq!(items.find_by_key("42").unwrap(), Some(json!({"id": "42"})));
    }

    #[test]
    fn undo_without_record_is_false() {
        let (log, _) = log();
        let id = log.insert(&Request::get("http://x/items"), None).unwrap();
        assert!(!log.undo(&id).unwrap());
        assert!(!log.redo("missing").unwrap());
    }
}
