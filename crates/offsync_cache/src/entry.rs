//! Cache entries and match options.

use offsync_http::{strip_query, Headers, Method, Request, Response};
use serde::{Deserialize, Serialize};

/// Options controlling how a request is matched against cache entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Skip query-string comparison: `/items?page=2` matches `/items`.
    pub ignore_search: bool,
    /// Bypass the GET/HEAD-only restriction and method comparison.
    pub ignore_method: bool,
    /// Skip `Vary` header comparison.
    pub ignore_vary: bool,
}

impl MatchOptions {
    /// Creates default options (strict matching).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `ignore_search`.
    pub fn ignore_search(mut self, value: bool) -> Self {
        self.ignore_search = value;
        self
    }

    /// Sets `ignore_method`.
    pub fn ignore_method(mut self, value: bool) -> Self {
        self.ignore_method = value;
        self
    }

    /// Sets `ignore_vary`.
    pub fn ignore_vary(mut self, value: bool) -> Self {
        self.ignore_vary = value;
        self
    }
}

/// A stored request/response pair.
///
/// The request context (method, URL, headers) is kept for signature
/// matching and for `Vary` comparison during revalidation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CacheEntry {
    pub method: Method,
    pub url: String,
    pub request_headers: Headers,
    pub response: Response,
}

impl CacheEntry {
    pub fn new(request: &Request, response: &Response) -> Self {
        Self {
            method: request.method,
            url: request.url.clone(),
            request_headers: request.headers.clone(),
            response: response.clone(),
        }
    }

    /// The normalized signature key this entry is stored under.
    pub fn key(&self) -> String {
        entry_key(self.method, &self.url)
    }

    /// Whether this entry satisfies `request` under `options`.
    pub fn matches(&self, request: &Request, options: &MatchOptions) -> bool {
        if !options.ignore_method {
            // only read methods are served from the cache
            if !request.method.is_read() || self.method != request.method {
                return false;
            }
        }

        let url_matches = if options.ignore_search {
            strip_query(&self.url) == strip_query(&request.url)
        } else {
            self.url == request.url
        };
        if !url_matches {
            return false;
        }

        if !options.ignore_vary {
            if let Some(vary) = self.response.headers.get("vary") {
                return vary_matches(vary, &self.request_headers, &request.headers);
            }
        }
        true
    }
}

/// Normalized request signature: method plus full URL.
pub(crate) fn entry_key(method: Method, url: &str) -> String {
    format!("{method} {url}")
}

/// Evaluates a `Vary` header value against the stored and incoming request
/// headers. `Vary: *` never matches.
fn vary_matches(vary: &str, stored: &Headers, incoming: &Headers) -> bool {
    for name in vary.split(',') {
        let name = name.trim();
        if name == "*" {
            return false;
        }
        if name.is_empty() {
            continue;
        }
        if stored.get(name) != incoming.get(name) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_for(request: &Request) -> CacheEntry {
        CacheEntry::new(request, &Response::ok())
    }

    #[test]
    fn strict_match_requires_same_url_and_method() {
        let stored = Request::get("https://example.com/items?a=1");
        let entry = entry_for(&stored);

        assert!(entry.matches(&stored, &MatchOptions::new()));
        assert!(!entry.matches(
            &Request::get("https://example.com/items"),
            &MatchOptions::new()
        ));
        assert!(!entry.matches(
            &Request::head("https://example.com/items?a=1"),
            &MatchOptions::new()
        ));
    }

    #[test]
    fn ignore_search_drops_query() {
        let entry = entry_for(&Request::get("https://example.com/items?a=1"));
        let request = Request::get("https://example.com/items?b=2");
        assert!(entry.matches(&request, &MatchOptions::new().ignore_search(true)));
    }

    #[test]
    fn non_read_methods_only_match_with_ignore_method() {
        let entry = CacheEntry::new(
            &Request::post("https://example.com/items"),
            &Response::ok(),
        );
        let request = Request::post("https://example.com/items");
        assert!(!entry.matches(&request, &MatchOptions::new()));
        assert!(entry.matches(&request, &MatchOptions::new().ignore_method(true)));
    }

    #[test]
    fn vary_header_compares_request_headers() {
        let stored = Request::get("https://example.com/items").with_header("Accept", "text/html");
        let response = Response::ok().with_header("Vary", "Accept");
        let entry = CacheEntry::new(&stored, &response);

        let same = Request::get("https://example.com/items").with_header("Accept", "text/html");
        let different =
            Request::get("https://example.com/items").with_header("Accept", "application/json");

        assert!(entry.matches(&same, &MatchOptions::new()));
        assert!(!entry.matches(&different, &MatchOptions::new()));
        assert!(entry.matches(&different, &MatchOptions::new().ignore_vary(true)));
    }

    #[test]
    fn vary_star_never_matches() {
        let stored = Request::get("https://example.com/items");
        let response = Response::ok().with_header("Vary", "*");
        let entry = CacheEntry::new(&stored, &response);
        assert!(!entry.matches(&stored, &MatchOptions::new()));
    }
}
