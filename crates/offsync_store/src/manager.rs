//! Store factory and manager.

use crate::error::StoreResult;
use crate::memory::MemoryStore;
use crate::store::PersistenceStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Options for opening a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Fields the backend should index. Advisory; backends without
    /// secondary indexes may ignore it.
    pub index: Vec<String>,
}

impl StoreOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an index field.
    pub fn with_index(mut self, field: impl Into<String>) -> Self {
        self.index.push(field.into());
        self
    }
}

/// Creates concrete stores for the [`StoreManager`].
///
/// Implement this to plug in a durable backend; [`MemoryStoreFactory`]
/// is the in-memory implementation.
pub trait StoreFactory: Send + Sync {
    /// Creates the store backing `name`.
    fn create_store(&self, name: &str, options: &StoreOptions)
        -> StoreResult<Arc<dyn PersistenceStore>>;
}

/// A factory producing [`MemoryStore`]s.
#[derive(Debug, Default)]
pub struct MemoryStoreFactory;

impl MemoryStoreFactory {
    /// Creates the factory.
    pub fn new() -> Self {
        Self
    }
}

impl StoreFactory for MemoryStoreFactory {
    fn create_store(
        &self,
        _name: &str,
        _options: &StoreOptions,
    ) -> StoreResult<Arc<dyn PersistenceStore>> {
        Ok(Arc::new(MemoryStore::new()))
    }
}

/// Opens stores lazily by name and caches them for the process lifetime.
///
/// Repeated `open_store` calls for the same name return the same store
/// instance, so every component sees a single view of each named store.
pub struct StoreManager {
    factory: Box<dyn StoreFactory>,
    open: RwLock<HashMap<String, Arc<dyn PersistenceStore>>>,
}

impl StoreManager {
    /// Creates a manager backed by the given factory.
    pub fn new(factory: Box<dyn StoreFactory>) -> Self {
        Self {
            factory,
            open: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a manager producing in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStoreFactory::new()))
    }

    /// Opens (or returns the already-open) store named `name`.
    pub fn open_store(&self, name: &str) -> StoreResult<Arc<dyn PersistenceStore>> {
        self.open_store_with(name, &StoreOptions::default())
    }

    /// Opens a store with explicit options.
    ///
    /// Options only apply on first open; later calls return the cached
    /// instance unchanged.
    pub fn open_store_with(
        &self,
        name: &str,
        options: &StoreOptions,
    ) -> StoreResult<Arc<dyn PersistenceStore>> {
        if let Some(store) = self.open.read().get(name) {
            return Ok(Arc::clone(store));
        }
        let mut open = self.open.write();
        // another caller may have opened it between the two locks
        if let Some(store) = open.get(name) {
            return Ok(Arc::clone(store));
        }
        let store = self.factory.create_store(name, options)?;
        open.insert(name.to_string(), Arc::clone(&store));
        Ok(store)
    }

    /// Returns true if the named store has been opened.
    pub fn has_store(&self, name: &str) -> bool {
        self.open.read().contains_key(name)
    }

    /// Deletes a store: drops its rows and forgets the instance.
    ///
    /// Returns true if the store was open.
    pub fn delete_store(&self, name: &str) -> StoreResult<bool> {
        let removed = self.open.write().remove(name);
        match removed {
            Some(store) => {
                store.delete_all()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordMetadata;
    use serde_json::json;

    #[test]
    fn open_store_caches_by_name() {
        let manager = StoreManager::in_memory();
        let a = manager.open_store("items").unwrap();
        a.upsert("1", RecordMetadata::new(1), json!({"n": 1})).unwrap();

        let b = manager.open_store("items").unwrap();
        assert_eq!(b.find_by_key("1").unwrap(), Some(json!({"n": 1})));

        let other = manager.open_store("other").unwrap();
        assert_eq!(other.find_by_key("1").unwrap(), None);
    }

    #[test]
    fn delete_store_drops_rows() {
        let manager = StoreManager::in_memory();
        let store = manager.open_store("items").unwrap();
        store.upsert("1", RecordMetadata::new(1), json!(1)).unwrap();

        assert!(manager.delete_store("items").unwrap());
        assert!(!manager.has_store("items"));
        // store handle still usable but empty
        assert_eq!(store.find_by_key("1").unwrap(), None);

        assert!(!manager.delete_store("items").unwrap());
    }

    #[test]
    fn open_with_index_options() {
        let manager = StoreManager::in_memory();
        let options = StoreOptions::new().with_index("metadata.created");
        let store = manager.open_store_with("syncLog", &options).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }
}
