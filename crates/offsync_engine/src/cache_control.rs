//! HTTP `Cache-Control` semantics over the offline cache.
//!
//! [`HttpCacheHeaderStrategy`] runs a fixed pipeline of stages over each
//! successful read response. Order matters: expiration bookkeeping first,
//! conditional checks and revalidation next, the storage decision last.

use crate::context::EngineContext;
use crate::error::EngineResult;
use offsync_cache::MatchOptions;
use offsync_http::{format_http_date, now_millis, parse_http_date, Headers, Request, Response};
use offsync_http::CACHE_EXPIRATION_DATE;
use tracing::debug;

/// A parsed `Cache-Control` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// A bare directive such as `no-store`.
    Flag,
    /// A `name=value` directive such as `max-age=60`.
    Value(String),
}

/// Looks up a directive by name in a `Cache-Control` header.
///
/// The header value is split on commas; each piece is trimmed and matched
/// by prefix, case-insensitively.
pub fn cache_control_directive(headers: &Headers, name: &str) -> Option<Directive> {
    let header = headers.get("cache-control")?;
    for piece in header.split(',') {
        let piece = piece.trim();
        if !piece.to_ascii_lowercase().starts_with(name) {
            continue;
        }
        return Some(match piece.find('=') {
            Some(at) => Directive::Value(piece[at + 1..].trim().to_string()),
            None => Directive::Flag,
        });
    }
    None
}

/// Post-fetch policy applied to read responses.
pub trait CacheStrategy: Send + Sync {
    /// Applies the policy, possibly replacing the response and possibly
    /// persisting it into the default cache.
    fn apply(
        &self,
        request: &Request,
        response: Response,
        ctx: &EngineContext,
    ) -> EngineResult<Response>;
}

/// The standard `Cache-Control` evaluator.
///
/// Stages, in order: `Expires` adoption, `max-age` expiry computation,
/// offline conditional (`If-Match`/`If-None-Match`) checks, forced
/// revalidation under `must-revalidate`, advisory revalidation under
/// `no-cache`/`Pragma`, and finally the `no-store` persistence decision.
#[derive(Debug, Default)]
pub struct HttpCacheHeaderStrategy;

impl HttpCacheHeaderStrategy {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }

    fn handle_expires(response: &mut Response) {
        if !response.from_cache {
            return;
        }
        let marker_absent = response
            .headers
            .get(CACHE_EXPIRATION_DATE)
            .map_or(true, str::is_empty);
        if !marker_absent {
            return;
        }
        if let Some(expires) = response.headers.get("expires").map(str::to_string) {
            response.headers.set(CACHE_EXPIRATION_DATE, expires);
        }
    }

    fn handle_max_age(request: &Request, response: &mut Response) {
        if !response.from_cache {
            return;
        }
        let seconds = match cache_control_directive(&response.headers, "max-age") {
            Some(Directive::Value(v)) => match v.parse::<i64>() {
                Ok(n) => n,
                Err(_) => return,
            },
            _ => return,
        };
        let base = request
            .headers
            .get("date")
            .and_then(parse_http_date)
            .unwrap_or_else(now_millis);
        // an absurd max-age that overflows the clock means no expiration
        let Some(expiration) = seconds
            .checked_mul(1000)
            .and_then(|ms| base.checked_add(ms))
        else {
            return;
        };
        // max-age wins over any Expires-derived value
        response
            .headers
            .set(CACHE_EXPIRATION_DATE, format_http_date(expiration));
    }

    /// Offline conditional checks. `(response, true)` means the pipeline
    /// is finished and the response goes back to the caller as-is.
    fn handle_conditional(
        request: &Request,
        response: Response,
        ctx: &EngineContext,
    ) -> EngineResult<(Response, bool)> {
        let if_match = request.headers.get("if-match").map(str::to_string);
        let if_none_match = request.headers.get("if-none-match").map(str::to_string);
        if if_match.is_none() && if_none_match.is_none() {
            return Ok((response, false));
        }
        if ctx.is_online() {
            return Ok((Self::revalidate(request, response, false, ctx)?, false));
        }
        let etag = response.headers.get("etag").unwrap_or("").to_string();
        if let Some(value) = if_match {
            if !etag.contains(&value) {
                return Ok((
                    Response::new(412, "If-Match failed due to no matching ETag while offline"),
                    true,
                ));
            }
        }
        if let Some(value) = if_none_match {
            if etag.contains(&value) {
                return Ok((
                    Response::new(412, "If-None-Match failed due to matching ETag while offline"),
                    true,
                ));
            }
        }
        Ok((response, false))
    }

    fn handle_must_revalidate(
        request: &Request,
        response: Response,
        ctx: &EngineContext,
    ) -> EngineResult<Response> {
        if cache_control_directive(&response.headers, "must-revalidate").is_none() {
            return Ok(response);
        }
        let expired = response
            .expiration_date()
            .map_or(false, |at| at <= now_millis());
        if !expired {
            return Ok(response);
        }
        Self::revalidate(request, response, true, ctx)
    }

    fn handle_no_cache(
        request: &Request,
        response: Response,
        ctx: &EngineContext,
    ) -> EngineResult<Response> {
        let no_cache = cache_control_directive(&response.headers, "no-cache").is_some()
            || request
                .headers
                .get("pragma")
                .map_or(false, |v| v.contains("no-cache"));
        if !no_cache {
            return Ok(response);
        }
        Self::revalidate(request, response, false, ctx)
    }

    fn handle_no_store(
        request: &Request,
        mut response: Response,
        ctx: &EngineContext,
    ) -> EngineResult<Response> {
        if cache_control_directive(&response.headers, "no-store").is_some() {
            response.headers.remove(CACHE_EXPIRATION_DATE);
            debug!(url = %request.url, "no-store, skipping persistence");
            return Ok(response);
        }
        if !response.from_cache && request.method.is_read() {
            ctx.default_cache()?.put(request, &response)?;
        }
        Ok(response)
    }

    /// Contacts the server to refresh a cached response.
    ///
    /// Offline, `forced` revalidation degrades the response to 504;
    /// advisory revalidation returns the stale response unchanged. Online,
    /// a 304 keeps the cached response, and anything else evicts the old
    /// entry and adopts the server's answer.
    fn revalidate(
        request: &Request,
        response: Response,
        forced: bool,
        ctx: &EngineContext,
    ) -> EngineResult<Response> {
        if !response.from_cache {
            return Ok(response);
        }
        if !ctx.is_online() {
            if forced {
                let mut failed = response;
                failed.status = 504;
                failed.status_text =
                    "cache-control: must-revalidate failed due to application being offline"
                        .to_string();
                return Ok(failed);
            }
            return Ok(response);
        }
        let server = ctx.fetch(request)?;
        if server.status == 304 {
            debug!(url = %request.url, "revalidation: 304, keeping cached response");
            return Ok(response);
        }
        ctx.default_cache()?.delete(request, &MatchOptions::new())?;
        Ok(server)
    }
}

impl CacheStrategy for HttpCacheHeaderStrategy {
    fn apply(
        &self,
        request: &Request,
        mut response: Response,
        ctx: &EngineContext,
    ) -> EngineResult<Response> {
        Self::handle_expires(&mut response);
        Self::handle_max_age(request, &mut response);
        let (response, done) = Self::handle_conditional(request, response, ctx)?;
        if done {
            return Ok(response);
        }
        let response = Self::handle_must_revalidate(request, response, ctx)?;
        let response = Self::handle_no_cache(request, response, ctx)?;
        Self::handle_no_store(request, response, ctx)
    }
}
