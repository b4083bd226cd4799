//! HTTP request value type.

use crate::headers::Headers;
use crate::method::Method;
use serde::{Deserialize, Serialize};
use url::Url;

/// An outgoing HTTP request.
///
/// Requests are plain values: the proxy clones them freely because a single
/// logical request may travel through more than one code path (network
/// attempt, offline synthesis, sync log).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Full request URL.
    pub url: String,
    /// Request headers.
    pub headers: Headers,
    /// Optional request body.
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Creates a request with no headers or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a HEAD request.
    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::Head, url)
    }

    /// Creates a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Creates a PUT request.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    /// Creates a PATCH request.
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    /// Creates a DELETE request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Creates an OPTIONS request.
    pub fn options(url: impl Into<String>) -> Self {
        Self::new(Method::Options, url)
    }

    /// Sets a header, consuming and returning `self`.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Sets the raw body, consuming and returning `self`.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `value` as the JSON body and sets `content-type`.
    pub fn with_json_body<T: Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(value)?);
        self.headers.set("content-type", "application/json");
        Ok(self)
    }

    /// The request URL with any query string removed.
    pub fn url_without_query(&self) -> String {
        strip_query(&self.url)
    }

    /// The trailing path segment of the URL, with the query stripped.
    ///
    /// This is the row key a RESTful DELETE carries in its URL.
    pub fn url_path_id(&self) -> Option<String> {
        let url = self.url_without_query();
        url.rsplit('/')
            .find(|segment| !segment.is_empty())
            .map(|segment| segment.to_string())
    }

    /// The host component of the URL, if the URL parses.
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
    }

    /// The body interpreted as UTF-8 text.
    pub fn text(&self) -> Option<&str> {
        self.body.as_deref().and_then(|b| std::str::from_utf8(b).ok())
    }
}

/// Removes the query string (and fragment) from a URL.
///
/// Falls back to plain string splitting for URLs the `url` crate cannot
/// parse (e.g. relative paths).
pub fn strip_query(url: &str) -> String {
    if let Ok(mut parsed) = Url::parse(url) {
        parsed.set_query(None);
        parsed.set_fragment(None);
        return parsed.to_string();
    }
    url.split(['?', '#']).next().unwrap_or(url).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_query_string() {
        let request = Request::get("https://example.com/items?value=bar");
        assert_eq!(request.url_without_query(), "https://example.com/items");
    }

    #[test]
    fn strips_query_on_relative_url() {
        assert_eq!(strip_query("/items/42?x=1"), "/items/42");
    }

    #[test]
    fn trailing_path_segment() {
        assert_eq!(
            Request::delete("https://example.com/items/42").url_path_id(),
            Some("42".to_string())
        );
        assert_eq!(
            Request::delete("https://example.com/items/42/?q=1").url_path_id(),
            Some("42".to_string())
        );
    }

    #[test]
    fn host_extraction() {
        let request = Request::get("https://api.example.com/items");
        assert_eq!(request.host(), Some("api.example.com".to_string()));
        assert_eq!(Request::get("/items").host(), None);
    }

    #[test]
    fn json_body_sets_content_type() {
        let request = Request::post("https://example.com/items")
            .with_json_body(&serde_json::json!({"name": "x"}))
            .unwrap();
        assert_eq!(request.headers.get("content-type"), Some("application/json"));
        assert_eq!(request.text(), Some(r#"{"name":"x"}"#));
    }

    #[test]
    fn serde_roundtrip() {
        let request = Request::put("https://example.com/items/1")
            .with_header("If-Match", "\"v1\"")
            .with_body(b"payload".to_vec());
        let json = serde_json::to_string(&request).unwrap();
        let back: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
