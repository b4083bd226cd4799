//! A single named response cache.

use crate::entry::{entry_key, CacheEntry, MatchOptions};
use crate::error::CacheResult;
use offsync_http::{Request, Response};
use offsync_store::{PersistenceStore, Query, RecordMetadata};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// A named, durable mapping from request signatures to stored responses.
///
/// Entries are keyed by the normalized signature `"{METHOD} {url}"`; the
/// relaxed match modes (`ignore_search`, `ignore_method`, `ignore_vary`)
/// fall back to a scan over all entries.
pub struct OfflineCache {
    name: String,
    store: Arc<dyn PersistenceStore>,
}

impl OfflineCache {
    /// Creates a cache over the given store.
    pub fn new(name: impl Into<String>, store: Arc<dyn PersistenceStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    /// The cache name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores (or overwrites) the response for this request's signature.
    pub fn put(&self, request: &Request, response: &Response) -> CacheResult<()> {
        let entry = CacheEntry::new(request, response);
        let key = entry.key();
        let created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.store
            .upsert(&key, RecordMetadata::new(created), serde_json::to_value(&entry)?)?;
        debug!(cache = %self.name, %key, "cached response");
        Ok(())
    }

    /// Returns the first stored response matching `request`.
    ///
    /// A hit is returned with `from_cache` set.
    pub fn match_request(
        &self,
        request: &Request,
        options: &MatchOptions,
    ) -> CacheResult<Option<Response>> {
        Ok(self
            .find_entry(request, options)?
            .map(|(_, entry)| {
                let mut response = entry.response;
                response.from_cache = true;
                response
            }))
    }

    /// Returns true if any stored entry matches `request`.
    pub fn has_match(&self, request: &Request, options: &MatchOptions) -> CacheResult<bool> {
        Ok(self.find_entry(request, options)?.is_some())
    }

    /// Evicts entries matching `request`. Returns true if any were removed.
    pub fn delete(&self, request: &Request, options: &MatchOptions) -> CacheResult<bool> {
        let mut removed = false;
        while let Some((key, _)) = self.find_entry(request, options)? {
            removed |= self.store.remove_by_key(&key)?;
            debug!(cache = %self.name, %key, "evicted cache entry");
        }
        Ok(removed)
    }

    /// All entry signature keys.
    pub fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(self.store.keys()?)
    }

    fn find_entry(
        &self,
        request: &Request,
        options: &MatchOptions,
    ) -> CacheResult<Option<(String, CacheEntry)>> {
        // fast path: strict matching hits the signature key directly
        if !options.ignore_search && !options.ignore_method {
            let key = entry_key(request.method, &request.url);
            if let Some(value) = self.store.find_by_key(&key)? {
                let entry: CacheEntry = serde_json::from_value(value)?;
                if entry.matches(request, options) {
                    return Ok(Some((key, entry)));
                }
                return Ok(None);
            }
            return Ok(None);
        }

        for record in self.store.find(&Query::new())? {
            let entry: CacheEntry = serde_json::from_value(record.value)?;
            if entry.matches(request, options) {
                return Ok(Some((record.key, entry)));
            }
        }
        Ok(None)
    }
}
