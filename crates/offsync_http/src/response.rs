//! HTTP response value type.

use crate::date::parse_http_date;
use crate::headers::{Headers, CACHE_EXPIRATION_DATE};
use crate::request::Request;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// An HTTP response.
///
/// `from_cache` distinguishes responses served from the offline cache from
/// responses freshly obtained over the network. It is never persisted: a
/// deserialized response starts out as a network response and the cache
/// flips the flag on a hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Status text accompanying the code.
    pub status_text: String,
    /// Response headers.
    pub headers: Headers,
    /// Optional response body.
    pub body: Option<Vec<u8>>,
    /// True if this response was served from the offline cache.
    #[serde(skip)]
    pub from_cache: bool,
}

impl Response {
    /// Creates a response with no headers or body.
    pub fn new(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: Headers::new(),
            body: None,
            from_cache: false,
        }
    }

    /// Creates a `200 OK` response.
    pub fn ok() -> Self {
        Self::new(200, "OK")
    }

    /// Mirrors a request into a `200 OK` response.
    ///
    /// Requests and responses share their header/body shape, so offline
    /// synthesis builds the response by copying over the request parts.
    pub fn mirror(request: &Request) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            from_cache: false,
        }
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
    pub fn with_json_body<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let mut response = self;
        response.set_json_body(value)?;
        Ok(response)
    }

    /// Replaces the body with `value` serialized as JSON.
    pub fn set_json_body<T: Serialize>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        self.body = Some(serde_json::to_vec(value)?);
        self.headers.set("content-type", "application/json");
        Ok(())
    }

    /// True for 2xx status codes.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body interpreted as UTF-8 text.
    pub fn text(&self) -> Option<&str> {
        self.body.as_deref().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// The body parsed as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_slice(self.body.as_deref()?).ok()
    }

    /// The computed cache expiration date in epoch milliseconds, if set.
    pub fn expiration_date(&self) -> Option<i64> {
        parse_http_date(self.headers.get(CACHE_EXPIRATION_DATE)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::format_http_date;

    #[test]
    fn status_classification() {
        assert!(Response::ok().is_ok());
        assert!(Response::new(204, "No Content").is_ok());
        assert!(!Response::new(304, "Not Modified").is_ok());
        assert!(!Response::new(503, "Service Unavailable").is_ok());
    }

    #[test]
    fn mirror_copies_headers_and_body() {
        let request = Request::put("https://example.com/items/1")
            .with_header("content-type", "application/json")
            .with_body(b"{}".to_vec());
        let response = Response::mirror(&request);
        assert_eq!(response.status, 200);
        assert_eq!(response.headers.get("content-type"), Some("application/json"));
        assert_eq!(response.body, Some(b"{}".to_vec()));
        assert!(!response.from_cache);
    }

    #[test]
    fn from_cache_not_persisted() {
        let mut response = Response::ok();
        response.from_cache = true;
        let json = serde_json::to_string(&response).unwrap();
        let back: Response = serde_json::from_str(&json).unwrap();
        assert!(!back.from_cache);
    }

    #[test]
    fn expiration_date_parsing() {
        let response = Response::ok().with_header(CACHE_EXPIRATION_DATE, format_http_date(1_500_000_000_000));
        assert_eq!(response.expiration_date(), Some(1_500_000_000_000));

        let blank = Response::ok().with_header(CACHE_EXPIRATION_DATE, "");
        assert_eq!(blank.expiration_date(), None);
        assert_eq!(Response::ok().expiration_date(), None);
    }

    #[test]
    fn json_body_roundtrip() {
        let response = Response::ok()
            .with_json_body(&serde_json::json!({"id": 1}))
            .unwrap();
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["id"], 1);
    }
}
