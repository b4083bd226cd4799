//! Ordered, case-insensitive header map.

use serde::{Deserialize, Serialize};

/// Synthetic response header carrying the computed cache expiration date.
///
/// Populated by the cache strategy from `Expires` or `Cache-Control:
/// max-age` so later stages do not have to re-derive it. The value is an
/// RFC 2822 UTC date string; an empty value marks "no expiration".
pub const CACHE_EXPIRATION_DATE: &str = "x-oracle-jscpt-cache-expiration-date";

/// Header marking an ETag that was minted during offline synthesis.
///
/// When a conditional PUT is satisfied offline the engine has no server
/// ETag to return, so it generates one and flags it with this header.
pub const ETAG_GENERATED: &str = "x-oracle-jscpt-etag-generated";

/// An ordered header map with case-insensitive names.
///
/// Names are folded to lowercase on insertion. Insertion order is
/// preserved, and `set` on an existing name replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `name` to `value`, replacing any existing value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Removes `name`, returning the previous value if there was one.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let index = self.entries.iter().position(|(k, _)| *k == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns true if `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns true if `name` is present with a non-empty value.
    pub fn has_value(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of headers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>, V: Into<String>> FromIterator<(S, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (S, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.set(&name.into(), value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_access() {
        let mut headers = Headers::new();
        headers.set("Content-Type", "application/json");
        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
        assert!(headers.contains("Content-type"));
    }

    #[test]
    fn set_replaces_in_place() {
        let mut headers = Headers::new();
        headers.set("a", "1");
        headers.set("b", "2");
        headers.set("A", "3");
        assert_eq!(headers.len(), 2);
        let pairs: Vec<_> = headers.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn remove_returns_value() {
        let mut headers = Headers::new();
        headers.set("ETag", "\"v1\"");
        assert_eq!(headers.remove("etag"), Some("\"v1\"".to_string()));
        assert_eq!(headers.remove("etag"), None);
    }

    #[test]
    fn has_value_ignores_empty() {
        let mut headers = Headers::new();
        headers.set(CACHE_EXPIRATION_DATE, "");
        assert!(headers.contains(CACHE_EXPIRATION_DATE));
        assert!(!headers.has_value(CACHE_EXPIRATION_DATE));
    }

    #[test]
    fn serde_roundtrip_preserves_order() {
        let headers: Headers = [("b", "2"), ("a", "1")].into_iter().collect();
        let json = serde_json::to_string(&headers).unwrap();
        let back: Headers = serde_json::from_str(&json).unwrap();
        let pairs: Vec<_> = back.iter().collect();
        assert_eq!(pairs, vec![("b", "2"), ("a", "1")]);
    }
}
