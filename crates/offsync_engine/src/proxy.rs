//! The request proxy.
//!
//! Every request the application makes goes through
//! [`RequestProxy::process_request`], which routes it to a method handler,
//! applies the cache policy to read responses, persists shredded rows,
//! and queues the request into the sync log when it was applied locally
//! rather than confirmed by the server.

use crate::context::EngineContext;
use crate::error::{EngineError, EngineResult};
use crate::options::{ProxyOptions, RequestHandler};
use crate::shred::{ResourceType, ShreddedItem};
use crate::sync_log::{SyncLog, UndoRedoEntry, UndoRedoOperation, UndoRedoRecord};
use offsync_cache::MatchOptions;
use offsync_http::{Method, Request, Response, CACHE_EXPIRATION_DATE, ETAG_GENERATED};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Result of a method handler: the response, and whether it was
/// synthesized locally instead of confirmed by the server.
struct HandlerOutcome {
    response: Response,
    synthesized: bool,
}

impl HandlerOutcome {
    fn server(response: Response) -> Self {
        Self {
            response,
            synthesized: false,
        }
    }

    fn local(response: Response) -> Self {
        Self {
            response,
            synthesized: true,
        }
    }
}

/// Offline-first entry point for outgoing requests.
pub struct RequestProxy {
    ctx: Arc<EngineContext>,
    options: ProxyOptions,
    log: Arc<SyncLog>,
}

impl RequestProxy {
    /// Creates a proxy.
    pub fn new(ctx: Arc<EngineContext>, options: ProxyOptions, log: Arc<SyncLog>) -> Self {
        Self { ctx, options, log }
    }

    /// The shared engine context.
    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }

    /// The sync log this proxy queues into.
    pub fn sync_log(&self) -> &Arc<SyncLog> {
        &self.log
    }

    /// Processes one request.
    ///
    /// Successful read responses go through the cache strategy; shredded
    /// rows are persisted with undo/redo capture for mutations. The
    /// original request is queued into the sync log when the device is
    /// offline, when the response was synthesized locally, or (best
    /// effort) when processing failed.
    pub fn process_request(&self, request: &Request) -> EngineResult<Response> {
        let original = request.clone();
        match self.run_pipeline(request) {
            Ok((response, undo_redo, synthesized)) => {
                if !self.ctx.is_online() || synthesized {
                    self.log.insert(&original, undo_redo)?;
                }
                Ok(response)
            }
            Err(err) => {
                // the mutation must not be silently lost
                if let Err(log_err) = self.log.insert(&original, None) {
                    warn!(%log_err, url = %original.url, "failed to queue request after error");
                }
                Err(err)
            }
        }
    }

    fn run_pipeline(
        &self,
        request: &Request,
    ) -> EngineResult<(Response, Option<Vec<UndoRedoRecord>>, bool)> {
        let outcome = self.dispatch_handler(request)?;
        let synthesized = outcome.synthesized;
        let mut response = outcome.response;

        if response.is_ok() && request.method.is_read() {
            response = self
                .options
                .cache_strategy
                .apply(request, response, &self.ctx)?;
        }

        let undo_redo = if response.is_ok() {
            self.persist_shredded(request, &response)?
        } else {
            None
        };
        Ok((response, undo_redo, synthesized))
    }

    fn dispatch_handler(&self, request: &Request) -> EngineResult<HandlerOutcome> {
        if let Some(handler) = self.override_for(request.method) {
            return Ok(HandlerOutcome::server(handler.handle(request, &self.ctx)?));
        }
        match request.method {
            Method::Get | Method::Head => Ok(HandlerOutcome::server(
                self.options.fetch_strategy.fetch(request, &self.ctx)?,
            )),
            Method::Post | Method::Patch | Method::Options => {
                if self.ctx.is_online() {
                    Ok(HandlerOutcome::server(self.ctx.fetch(request)?))
                } else {
                    Ok(HandlerOutcome::local(Response::new(
                        503,
                        "Must provide a handler override for offline",
                    )))
                }
            }
            Method::Put => self.handle_put(request),
            Method::Delete => self.handle_delete(request),
        }
    }

    fn override_for(&self, method: Method) -> Option<&Arc<dyn RequestHandler>> {
        let handlers = &self.options.handlers;
        match method {
            Method::Get => handlers.get.as_ref(),
            Method::Head => handlers.head.as_ref(),
            Method::Post => handlers.post.as_ref(),
            Method::Put => handlers.put.as_ref(),
            Method::Patch => handlers.patch.as_ref(),
            Method::Delete => handlers.delete.as_ref(),
            Method::Options => handlers.options.as_ref(),
        }
    }

    /// Online PUT goes to the server; a 5xx or a transport failure falls
    /// back to offline synthesis, while 3xx/4xx come back as-is.
    fn handle_put(&self, request: &Request) -> EngineResult<HandlerOutcome> {
        if self.ctx.is_online() {
            match self.ctx.fetch(request) {
                Ok(response) if response.status < 500 => {
                    return Ok(HandlerOutcome::server(response))
                }
                Ok(response) => {
                    debug!(url = %request.url, status = response.status, "server error, applying PUT locally");
                }
                Err(EngineError::Fetch(_) | EngineError::Timeout) => {
                    debug!(url = %request.url, "network failed, applying PUT locally");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(HandlerOutcome::local(Self::synthesize(request)))
    }

    fn handle_delete(&self, request: &Request) -> EngineResult<HandlerOutcome> {
        if self.ctx.is_online() {
            match self.ctx.fetch(request) {
                Ok(response) if response.status < 500 => {
                    return Ok(HandlerOutcome::server(response))
                }
                Ok(response) => {
                    debug!(url = %request.url, status = response.status, "server error, applying DELETE locally");
                }
                Err(EngineError::Fetch(_) | EngineError::Timeout) => {
                    debug!(url = %request.url, "network failed, applying DELETE locally");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(HandlerOutcome::local(self.offline_delete(request)?))
    }

    /// Mirrors the request into a 200 response, clearing the expiration
    /// marker and minting a validator when the request was conditional.
    fn synthesize(request: &Request) -> Response {
        let mut response = Response::mirror(request);
        response.headers.set("content-type", "application/json");
        response.headers.set(CACHE_EXPIRATION_DATE, "");
        let conditional = response.headers.contains("if-match")
            || response.headers.contains("if-none-match");
        if conditional {
            let etag = Uuid::new_v4().simple().to_string();
            response.headers.set("etag", etag.clone());
            response.headers.set(ETAG_GENERATED, etag);
            response.headers.remove("if-match");
            response.headers.remove("if-none-match");
        }
        response
    }

    /// DELETE synthesis reconstructs the body from the still-present row
    /// (keyed by the trailing URL path segment) before it is removed.
    fn offline_delete(&self, request: &Request) -> EngineResult<Response> {
        let mut response = Self::synthesize(request);
        let (Some(shredder), Some(unshredder)) =
            (&self.options.shredder, &self.options.unshredder)
        else {
            return Ok(response);
        };
        // shred the empty mirror just to learn the target store
        let items = shredder.shred(request, &response)?;
        let (Some(item), Some(key)) = (items.first(), request.url_path_id()) else {
            return Ok(response);
        };
        let store = self.ctx.open_store(&item.store_name)?;
        if let Some(row) = store.find_by_key(&key)? {
            let rebuilt = ShreddedItem {
                store_name: item.store_name.clone(),
                resource_identifier: None,
                keys: vec![key],
                data: vec![row],
                resource_type: ResourceType::Single,
            };
            response = unshredder.unshred(&[rebuilt], response)?;
        }
        Ok(response)
    }

    /// Extracts rows from the response and applies them to their stores,
    /// capturing undo/redo snapshots for mutating requests.
    ///
    /// Read responses are only shredded when a cache entry exists for the
    /// request signature (ignoring the query string), so uncached reads
    /// do not leak rows into the structured stores.
    fn persist_shredded(
        &self,
        request: &Request,
        response: &Response,
    ) -> EngineResult<Option<Vec<UndoRedoRecord>>> {
        let Some(shredder) = &self.options.shredder else {
            return Ok(None);
        };
        if request.method.is_read() {
            let cached = self
                .ctx
                .default_cache()?
                .has_match(request, &MatchOptions::new().ignore_search(true))?;
            if !cached {
                return Ok(None);
            }
        }

        let items = shredder.shred(request, response)?;
        let mut records = Vec::new();
        for item in items {
            let store = self.ctx.open_store(&item.store_name)?;
            if request.method == Method::Delete {
                let mut entries = Vec::new();
                for key in &item.keys {
                    let undo = store.find_by_key(key)?;
                    entries.push(UndoRedoEntry {
                        key: key.clone(),
                        undo,
                        redo: None,
                    });
                    store.remove_by_key(key)?;
                }
                records.push(UndoRedoRecord {
                    store_name: item.store_name,
                    operation: UndoRedoOperation::Remove,
                    entries,
                });
            } else {
                let capture = request.method.is_mutating();
                let mut entries = Vec::new();
                let mut rows = Vec::new();
                for (key, value) in item.keys.iter().zip(item.data.iter()) {
                    if capture {
                        entries.push(UndoRedoEntry {
                            key: key.clone(),
                            undo: store.find_by_key(key)?,
                            redo: Some(value.clone()),
                        });
                    }
                    rows.push(offsync_store::StoreRecord::new(key.clone(), value.clone()));
                }
                store.upsert_all(&rows)?;
                if capture {
                    records.push(UndoRedoRecord {
                        store_name: item.store_name,
                        operation: UndoRedoOperation::Upsert,
                        entries,
                    });
                }
            }
        }
        Ok(if records.is_empty() {
            None
        } else {
            Some(records)
        })
    }
}
