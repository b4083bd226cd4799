//! Fetch strategies: when to hit the network, when to serve the cache.

use crate::context::EngineContext;
use crate::error::{EngineError, EngineResult};
use offsync_cache::MatchOptions;
use offsync_http::{Request, Response};
use tracing::debug;

/// Decides how a read request reaches a response.
pub trait FetchStrategy: Send + Sync {
    /// Produces a response for `request`, from the network or the cache.
    fn fetch(&self, request: &Request, ctx: &EngineContext) -> EngineResult<Response>;
}

fn offline_response() -> Response {
    Response::new(503, "No cached response exists")
}

/// Network first; the offline cache only when the network is unusable.
///
/// This is the default strategy. Online, the request goes out; if the
/// transport fails or times out, the cache is consulted before the error
/// propagates. Offline, the cache is the only source and a miss yields a
/// synthesized 503.
#[derive(Debug, Default)]
pub struct CacheIfOfflineStrategy;

impl CacheIfOfflineStrategy {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

impl FetchStrategy for CacheIfOfflineStrategy {
    fn fetch(&self, request: &Request, ctx: &EngineContext) -> EngineResult<Response> {
        if ctx.is_online() {
            match ctx.fetch(request) {
                Ok(response) => Ok(response),
                Err(err @ (EngineError::Fetch(_) | EngineError::Timeout)) => {
                    debug!(url = %request.url, %err, "network failed, trying cache");
                    let cache = ctx.default_cache()?;
                    match cache.match_request(request, &MatchOptions::new())? {
                        Some(cached) => Ok(cached),
                        None => Err(err),
                    }
                }
                Err(err) => Err(err),
            }
        } else {
            let cache = ctx.default_cache()?;
            match cache.match_request(request, &MatchOptions::new())? {
                Some(cached) => Ok(cached),
                None => Ok(offline_response()),
            }
        }
    }
}

/// Cache first; the network only on a miss.
///
/// A cache hit short-circuits the network entirely. On a miss, the
/// request goes out if the device is online, and a synthesized 503 comes
/// back otherwise.
#[derive(Debug, Default)]
pub struct CacheFirstStrategy;

impl CacheFirstStrategy {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

impl FetchStrategy for CacheFirstStrategy {
    fn fetch(&self, request: &Request, ctx: &EngineContext) -> EngineResult<Response> {
        let cache = ctx.default_cache()?;
        if let Some(cached) = cache.match_request(request, &MatchOptions::new())? {
            debug!(url = %request.url, "serving from cache");
            return Ok(cached);
        }
        if ctx.is_online() {
            ctx.fetch(request)
        } else {
            Ok(offline_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{MockFetchClient, NetworkStatus};
    use offsync_store::StoreManager;
    use std::sync::Arc;

    fn context(online: bool) -> (EngineContext, Arc<MockFetchClient>) {
        let client = Arc::new(MockFetchClient::new());
        let ctx = EngineContext::new(
            Arc::new(NetworkStatus::new(online)),
            client.clone(),
            Arc::new(StoreManager::in_memory()),
        );
        (ctx, client)
    }

    #[test]
    fn online_goes_to_network() {
        let (ctx, client) = context(true);
        client.push_response(Response::ok());
        let request = Request::get("https://example.com/items");
        let response = CacheIfOfflineStrategy::new().fetch(&request, &ctx).unwrap();
        assert!(response.is_ok());
        assert!(!response.from_cache);
    }

    #[test]
    fn offline_hit_comes_from_cache() {
        let (ctx, client) = context(false);
        let request = Request::get("https://example.com/items");
        ctx.default_cache()
            .unwrap()
            .put(&request, &Response::ok())
            .unwrap();

        let response = CacheIfOfflineStrategy::new().fetch(&request, &ctx).unwrap();
        assert!(response.from_cache);
        assert_eq!(client.request_count(), 0);
    }

    #[test]
    fn offline_miss_synthesizes_503() {
        let (ctx, _) = context(false);
        let request = Request::get("https://example.com/items");
        let response = CacheIfOfflineStrategy::new().fetch(&request, &ctx).unwrap();
        assert_eq!(response.status, 503);
    }

    #[test]
    fn transport_failure_falls_back_to_cache() {
        let (ctx, client) = context(true);
        let request = Request::get("https://example.com/items");
        ctx.default_cache()
            .unwrap()
            .put(&request, &Response::ok())
            .unwrap();
        client.push_failure("connection refused");

        let response = CacheIfOfflineStrategy::new().fetch(&request, &ctx).unwrap();
        assert!(response.from_cache);
    }

    #[test]
    fn transport_failure_without_cache_propagates() {
        let (ctx, client) = context(true);
        client.push_failure("connection refused");
        let request = Request::get("https://example.com/items");
        let err = CacheIfOfflineStrategy::new()
            .fetch(&request, &ctx)
            .unwrap_err();
        assert!(matches!(err, EngineError::Fetch(_)));
    }

    #[test]
    fn cache_first_skips_network_on_hit() {
        let (ctx, client) = context(true);
        let request = Request::get("https://example.com/items");
        ctx.default_cache()
            .unwrap()
            .put(&request, &Response::ok())
            .unwrap();

        let response = CacheFirstStrategy::new().fetch(&request, &ctx).unwrap();
        assert!(response.from_cache);
        assert_eq!(client.request_count(), 0);
    }

    #[test]
    fn cache_first_miss_uses_network_when_online() {
        let (ctx, client) = context(true);
        client.push_response(Response::ok());
        let request = Request::get("https://example.com/items");
        let response = CacheFirstStrategy::new().fetch(&request, &ctx).unwrap();
        assert!(!response.from_cache);
        assert_eq!(client.request_count(), 1);
    }
}
