//! In-memory store implementation.

use crate::error::StoreResult;
use crate::query::{compare_values, project_value, resolve_field, Query};
use crate::store::{FoundRecord, PersistenceStore, RecordMetadata, StoreRecord};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
struct Row {
    metadata: RecordMetadata,
    value: Value,
}

/// An in-memory keyed store.
///
/// The reference implementation of [`PersistenceStore`], suitable for:
/// - Unit and integration tests
/// - Ephemeral applications that don't need persistence
///
/// # Thread Safety
///
/// Thread-safe; internal state lives behind a `parking_lot::RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<BTreeMap<String, Row>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Returns true if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

impl PersistenceStore for MemoryStore {
    fn find_by_key(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.rows.read().get(key).map(|row| row.value.clone()))
    }

    fn upsert(&self, key: &str, metadata: RecordMetadata, value: Value) -> StoreResult<()> {
        let mut rows = self.rows.write();
        match rows.get_mut(key) {
            Some(existing) => existing.value = value,
            None => {
                rows.insert(key.to_string(), Row { metadata, value });
            }
        }
        Ok(())
    }

    fn upsert_all(&self, records: &[StoreRecord]) -> StoreResult<()> {
        let mut rows = self.rows.write();
        let created = Self::now_millis();
        for record in records {
            match rows.get_mut(&record.key) {
                Some(existing) => existing.value = record.value.clone(),
                None => {
                    rows.insert(
                        record.key.clone(),
                        Row {
                            metadata: RecordMetadata::new(created),
                            value: record.value.clone(),
                        },
                    );
                }
            }
        }
        Ok(())
    }

    fn remove_by_key(&self, key: &str) -> StoreResult<bool> {
        Ok(self.rows.write().remove(key).is_some())
    }

    fn find(&self, query: &Query) -> StoreResult<Vec<FoundRecord>> {
        let rows = self.rows.read();
        let mut results: Vec<FoundRecord> = rows
            .iter()
            .filter(|(_, row)| {
                query
                    .selector
                    .as_ref()
                    .is_none_or(|s| s.matches(&row.metadata, &row.value))
            })
            .map(|(key, row)| FoundRecord {
                key: key.clone(),
                metadata: row.metadata,
                value: project_value(&query.fields, &row.value),
            })
            .collect();

        if !query.sort.is_empty() {
            // projection may have dropped sort fields, so resolve against
            // the original rows
            results.sort_by(|a, b| {
                for sort_key in &query.sort {
                    let left = rows
                        .get(&a.key)
                        .and_then(|row| resolve_field(&row.metadata, &row.value, &sort_key.field));
                    let right = rows
                        .get(&b.key)
                        .and_then(|row| resolve_field(&row.metadata, &row.value, &sort_key.field));
                    let ordering = match sort_key.direction {
                        crate::query::SortDirection::Ascending => compare_values(&left, &right),
                        crate::query::SortDirection::Descending => {
                            compare_values(&left, &right).reverse()
                        }
                    };
                    if ordering != std::cmp::Ordering::Equal {
                        return ordering;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }

        Ok(results)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.rows.read().keys().cloned().collect())
    }

    fn delete_all(&self) -> StoreResult<()> {
        self.rows.write().clear();
        Ok(())
    }
}
