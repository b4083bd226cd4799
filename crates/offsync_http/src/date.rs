//! HTTP date helpers.
//!
//! `Expires`, `Date`, and the computed expiration header all carry RFC 2822
//! UTC date strings. Internally the engine works with unix epoch
//! milliseconds.

use chrono::{DateTime, TimeZone, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as unix epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Parses an RFC 2822 HTTP date into epoch milliseconds.
///
/// A malformed or empty date is treated as absent.
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Formats epoch milliseconds as an RFC 2822 UTC date string.
pub fn format_http_date(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis) {
        chrono::LocalResult::Single(dt) => dt.to_rfc2822(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let millis = 1_500_000_000_000;
        let formatted = format_http_date(millis);
        assert_eq!(parse_http_date(&formatted), Some(millis));
    }

    #[test]
    fn malformed_is_absent() {
        assert_eq!(parse_http_date(""), None);
        assert_eq!(parse_http_date("not a date"), None);
    }

    #[test]
    fn parses_standard_http_date() {
        let millis = parse_http_date("Tue, 15 Nov 1994 08:12:31 GMT").unwrap();
        assert_eq!(millis, 784_887_151_000);
    }
}
