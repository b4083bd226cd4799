//! # offsync HTTP types
//!
//! HTTP request and response types for the offsync toolkit.
//!
//! This crate provides:
//! - `Method` with read/mutation classification
//! - `Headers`, an ordered case-insensitive header map
//! - `Request` and `Response` value types
//! - The toolkit's custom header names
//! - HTTP date parsing and formatting helpers
//!
//! This is a pure types crate with no I/O operations. Everything here is
//! serde-serializable so requests and responses can be persisted to the
//! sync log and the offline cache.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod date;
mod headers;
mod method;
mod request;
mod response;

pub use date::{format_http_date, now_millis, parse_http_date};
pub use headers::{Headers, CACHE_EXPIRATION_DATE, ETAG_GENERATED};
pub use method::{Method, UnknownMethod};
pub use request::{strip_query, Request};
pub use response::Response;
