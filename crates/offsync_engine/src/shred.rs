//! Decomposing response payloads into store rows and back.

use crate::error::{EngineError, EngineResult};
use offsync_http::{Request, Response, CACHE_EXPIRATION_DATE};
use serde_json::Value;

/// Whether a response carried one resource or a collection of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// A single JSON object.
    Single,
    /// A JSON array of objects.
    Collection,
}

/// One store's worth of rows extracted from a response.
#[derive(Debug, Clone)]
pub struct ShreddedItem {
    /// Store the rows belong to.
    pub store_name: String,
    /// Collection-level identifier, typically the response ETag.
    pub resource_identifier: Option<String>,
    /// Row keys, parallel to `data`.
    pub keys: Vec<String>,
    /// Row values, parallel to `keys`.
    pub data: Vec<Value>,
    /// Shape of the original payload.
    pub resource_type: ResourceType,
}

/// Extracts structured rows from a response body.
pub trait Shredder: Send + Sync {
    /// Splits `response` into per-store row sets. An unparseable body
    /// yields an item with no rows rather than an error.
    fn shred(&self, request: &Request, response: &Response) -> EngineResult<Vec<ShreddedItem>>;
}

/// Rebuilds a response body from previously shredded rows.
pub trait Unshredder: Send + Sync {
    /// Writes the rows in `items` back into `response` as its body.
    fn unshred(&self, items: &[ShreddedItem], response: Response) -> EngineResult<Response>;
}

/// Shredder for flat JSON payloads keyed by a single id field.
///
/// An array body becomes a collection whose row keys are the `id_field`
/// values of its elements. An object body becomes a single row.
pub struct SimpleJsonShredder {
    store_name: String,
    id_field: String,
}

impl SimpleJsonShredder {
    /// Shreds into `store_name`, keying rows by `id_field`.
    pub fn new(store_name: impl Into<String>, id_field: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            id_field: id_field.into(),
        }
    }

    fn key_of(&self, value: &Value) -> String {
        match value.get(&self.id_field) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

impl Shredder for SimpleJsonShredder {
    fn shred(&self, _request: &Request, response: &Response) -> EngineResult<Vec<ShreddedItem>> {
        let parsed: Option<Value> = response.text().and_then(|t| serde_json::from_str(t).ok());
        let (keys, data, resource_type) = match parsed {
            Some(Value::Array(elements)) => {
                let keys = elements.iter().map(|e| self.key_of(e)).collect();
                (keys, elements, ResourceType::Collection)
            }
            Some(value @ Value::Object(_)) => {
                (vec![self.key_of(&value)], vec![value], ResourceType::Single)
            }
            _ => (Vec::new(), Vec::new(), ResourceType::Single),
        };
        Ok(vec![ShreddedItem {
            store_name: self.store_name.clone(),
            resource_identifier: response.headers.get("etag").map(str::to_string),
            keys,
            data,
            resource_type,
        }])
    }
}

impl Unshredder for SimpleJsonShredder {
    fn unshred(&self, items: &[ShreddedItem], mut response: Response) -> EngineResult<Response> {
        if items.len() != 1 {
            return Err(EngineError::Shredding(
                "shredded data is not in the correct format".to_string(),
            ));
        }
        let item = &items[0];
        let body = if item.resource_type == ResourceType::Single && item.data.len() == 1 {
            item.data[0].clone()
        } else {
            Value::Array(item.data.clone())
        };
        response.set_json_body(&body)?;
        response.headers.set(CACHE_EXPIRATION_DATE, "");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shredder() -> SimpleJsonShredder {
        SimpleJsonShredder::new("items", "id")
    }

    #[test]
    fn array_body_becomes_collection() {
        let request = Request::get("http://api/items");
        let response = Response::ok()
            .with_header("etag", "v7")
            .with_json_body(&json!([{"id": "1", "n": 1}, {"id": "2", "n": 2}]))
            .unwrap();
        let items = shredder().shred(&request, &response).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].store_name, "items");
        assert_eq!(items[0].resource_identifier.as_deref(), Some("v7"));
        assert_eq!(items[0].keys, vec!["1", "2"]);
        assert_eq!(items[0].resource_type, ResourceType::Collection);
    }

    #[test]
    fn object_body_becomes_single() {
        let request = Request::get("http://api/items/9");
        let response = Response::ok()
            .with_json_body(&json!({"id": "9", "n": 9}))
            .unwrap();
        let items = shredder().shred(&request, &response).unwrap();
        assert_eq!(items[0].keys, vec!["9"]);
        assert_eq!(items[0].resource_type, ResourceType::Single);
    }

    #[test]
    fn unparseable_body_yields_no_rows() {
        let request = Request::get("http://api/items");
        let response = Response::ok().with_body(b"not json".to_vec());
        let items = shredder().shred(&request, &response).unwrap();
        assert!(items[0].keys.is_empty());
        assert!(items[0].data.is_empty());
    }

    #[test]
    fn unshred_single_restores_object_body() {
        let request = Request::get("http://api/items/9");
        let original = Response::ok()
            .with_json_body(&json!({"id": "9", "n": 9}))
            .unwrap();
        let s = shredder();
        let items = s.shred(&request, &original).unwrap();
        let rebuilt = s.unshred(&items, Response::ok()).unwrap();
        let value: Value = rebuilt.json().unwrap();
        assert_eq!(value, json!({"id": "9", "n": 9}));
        assert_eq!(rebuilt.headers.get(CACHE_EXPIRATION_DATE), Some(""));
    }

    #[test]
    fn unshred_rejects_multiple_items() {
        let s = shredder();
        let item = ShreddedItem {
            store_name: "items".to_string(),
            resource_identifier: None,
            keys: vec![],
            data: vec![],
            resource_type: ResourceType::Single,
        };
        let err = s
            .unshred(&[item.clone(), item], Response::ok())
            .unwrap_err();
        assert!(matches!(err, EngineError::Shredding(_)));
    }
}
