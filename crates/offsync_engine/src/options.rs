//! Proxy configuration.

use crate::cache_control::{CacheStrategy, HttpCacheHeaderStrategy};
use crate::context::EngineContext;
use crate::error::EngineResult;
use crate::fetch::{CacheIfOfflineStrategy, FetchStrategy};
use crate::shred::{Shredder, Unshredder};
use offsync_http::{Request, Response};
use std::sync::Arc;

/// Replaces the proxy's built-in handling for one HTTP method.
pub trait RequestHandler: Send + Sync {
    /// Produces the response for `request`.
    fn handle(&self, request: &Request, ctx: &EngineContext) -> EngineResult<Response>;
}

/// Per-method handler overrides. Unset methods use the built-in handlers.
#[derive(Default, Clone)]
pub struct HandlerOverrides {
    /// Override for GET.
    pub get: Option<Arc<dyn RequestHandler>>,
    /// Override for HEAD.
    pub head: Option<Arc<dyn RequestHandler>>,
    /// Override for POST.
    pub post: Option<Arc<dyn RequestHandler>>,
    /// Override for PUT.
    pub put: Option<Arc<dyn RequestHandler>>,
    /// Override for PATCH.
    pub patch: Option<Arc<dyn RequestHandler>>,
    /// Override for DELETE.
    pub delete: Option<Arc<dyn RequestHandler>>,
    /// Override for OPTIONS.
    pub options: Option<Arc<dyn RequestHandler>>,
}

/// Configuration for [`crate::RequestProxy`].
///
/// Defaults: [`CacheIfOfflineStrategy`] for fetches,
/// [`HttpCacheHeaderStrategy`] for cache policy, no shredder or
/// unshredder, no handler overrides.
#[derive(Clone)]
pub struct ProxyOptions {
    /// How read requests reach a response.
    pub fetch_strategy: Arc<dyn FetchStrategy>,
    /// Post-fetch cache policy for read responses.
    pub cache_strategy: Arc<dyn CacheStrategy>,
    /// Structured-data extraction; `None` disables shredding.
    pub shredder: Option<Arc<dyn Shredder>>,
    /// Body reconstruction for DELETE offline synthesis.
    pub unshredder: Option<Arc<dyn Unshredder>>,
    /// Per-method handler overrides.
    pub handlers: HandlerOverrides,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            fetch_strategy: Arc::new(CacheIfOfflineStrategy::new()),
            cache_strategy: Arc::new(HttpCacheHeaderStrategy::new()),
            shredder: None,
            unshredder: None,
            handlers: HandlerOverrides::default(),
        }
    }
}

impl ProxyOptions {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fetch strategy.
    pub fn with_fetch_strategy(mut self, strategy: Arc<dyn FetchStrategy>) -> Self {
        self.fetch_strategy = strategy;
        self
    }

    /// Sets the cache strategy.
    pub fn with_cache_strategy(mut self, strategy: Arc<dyn CacheStrategy>) -> Self {
        self.cache_strategy = strategy;
        self
    }

    /// Enables shredding with the given shredder.
    pub fn with_shredder(mut self, shredder: Arc<dyn Shredder>) -> Self {
        self.shredder = Some(shredder);
        self
    }

    /// Sets the unshredder used for DELETE offline synthesis.
    pub fn with_unshredder(mut self, unshredder: Arc<dyn Unshredder>) -> Self {
        self.unshredder = Some(unshredder);
        self
    }

    /// Sets handler overrides.
    pub fn with_handlers(mut self, handlers: HandlerOverrides) -> Self {
        self.handlers = handlers;
        self
    }
}
