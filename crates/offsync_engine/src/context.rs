//! Shared engine wiring.

use crate::connectivity::{ConnectivityOracle, FetchClient};
use crate::error::EngineResult;
use offsync_cache::{CacheRegistry, OfflineCache};
use offsync_http::{Request, Response};
use offsync_store::{PersistenceStore, StoreManager};
use std::sync::Arc;

/// The collaborators every engine component works against.
///
/// One context is built at startup and shared (via `Arc`) by the request
/// proxy, the strategies, and the sync engine, so they all observe the
/// same connectivity state, transport, stores, and caches.
pub struct EngineContext {
    connectivity: Arc<dyn ConnectivityOracle>,
    client: Arc<dyn FetchClient>,
    stores: Arc<StoreManager>,
    caches: Arc<CacheRegistry>,
    default_cache: String,
}

impl EngineContext {
    /// Creates a context. The cache registry is built over `stores`.
    pub fn new(
        connectivity: Arc<dyn ConnectivityOracle>,
        client: Arc<dyn FetchClient>,
        stores: Arc<StoreManager>,
    ) -> Self {
        let caches = Arc::new(CacheRegistry::new(Arc::clone(&stores)));
        Self {
            connectivity,
            client,
            stores,
            caches,
            default_cache: "default".to_string(),
        }
    }

    /// Uses `name` as the default cache partition.
    pub fn with_default_cache(mut self, name: impl Into<String>) -> Self {
        self.default_cache = name.into();
        self
    }

    /// True if the device is online.
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Performs a network call through the configured transport.
    pub fn fetch(&self, request: &Request) -> EngineResult<Response> {
        self.client.fetch(request)
    }

    /// The network transport.
    pub fn client(&self) -> &Arc<dyn FetchClient> {
        &self.client
    }

    /// The store manager.
    pub fn stores(&self) -> &Arc<StoreManager> {
        &self.stores
    }

    /// The cache registry.
    pub fn caches(&self) -> &Arc<CacheRegistry> {
        &self.caches
    }

    /// Opens the default response cache.
    pub fn default_cache(&self) -> EngineResult<Arc<OfflineCache>> {
        Ok(self.caches.open(&self.default_cache)?)
    }

    /// Opens a named structured-data store.
    pub fn open_store(&self, name: &str) -> EngineResult<Arc<dyn PersistenceStore>> {
        Ok(self.stores.open_store(name)?)
    }
}
