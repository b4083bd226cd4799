//! Named cache registry.

use crate::cache::OfflineCache;
use crate::entry::MatchOptions;
use crate::error::CacheResult;
use offsync_http::{Request, Response};
use offsync_store::StoreManager;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Store-name prefix separating cache stores from application stores.
const CACHE_STORE_PREFIX: &str = "offline-caches-";

#[derive(Default)]
struct Caches {
    by_name: HashMap<String, Arc<OfflineCache>>,
    /// Names in insertion order; `match_request` searches in this order.
    order: Vec<String>,
}

/// Opens and tracks named [`OfflineCache`]s for the process lifetime.
pub struct CacheRegistry {
    stores: Arc<StoreManager>,
    caches: RwLock<Caches>,
}

impl CacheRegistry {
    /// Creates a registry over the given store manager.
    pub fn new(stores: Arc<StoreManager>) -> Self {
        Self {
            stores,
            caches: RwLock::new(Caches::default()),
        }
    }

    /// Creates or retrieves the cache named `name`.
    pub fn open(&self, name: &str) -> CacheResult<Arc<OfflineCache>> {
        if let Some(cache) = self.caches.read().by_name.get(name) {
            return Ok(Arc::clone(cache));
        }
        let store = self
            .stores
            .open_store(&format!("{CACHE_STORE_PREFIX}{name}"))?;
        let mut caches = self.caches.write();
        if let Some(cache) = caches.by_name.get(name) {
            return Ok(Arc::clone(cache));
        }
        let cache = Arc::new(OfflineCache::new(name, store));
        caches.by_name.insert(name.to_string(), Arc::clone(&cache));
        caches.order.push(name.to_string());
        Ok(cache)
    }

    /// Returns true if a cache with this name has been opened.
    pub fn has(&self, name: &str) -> bool {
        self.caches.read().by_name.contains_key(name)
    }

    /// Deletes a cache and its stored entries. Returns true if it existed.
    pub fn delete(&self, name: &str) -> CacheResult<bool> {
        let mut caches = self.caches.write();
        if caches.by_name.remove(name).is_none() {
            return Ok(false);
        }
        caches.order.retain(|n| n != name);
        self.stores
            .delete_store(&format!("{CACHE_STORE_PREFIX}{name}"))?;
        Ok(true)
    }

    /// Names of all open caches, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.caches.read().order.clone()
    }

    /// Searches all caches in insertion order; first match wins.
    pub fn match_request(
        &self,
        request: &Request,
        options: &MatchOptions,
    ) -> CacheResult<Option<Response>> {
        let caches: Vec<Arc<OfflineCache>> = {
            let guard = self.caches.read();
            guard
                .order
                .iter()
                .filter_map(|name| guard.by_name.get(name).cloned())
                .collect()
        };
        for cache in caches {
            if let Some(response) = cache.match_request(request, options)? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }
}
