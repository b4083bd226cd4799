//! Simple document queries.
//!
//! Queries address rows through rooted dotted paths: `metadata.created`
//! for the row metadata, `value` (or `value.some.field`) for the stored
//! JSON value. This covers what the engine needs - the sync log sorts by
//! creation time and selects rows where that field exists.

use crate::store::RecordMetadata;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A row filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Matches rows where the field resolves to a value.
    FieldExists(String),
    /// Matches rows where the field equals the given value.
    Equals(String, Value),
    /// Matches rows satisfying every inner selector.
    And(Vec<Selector>),
}

impl Selector {
    /// Evaluates the selector against a row.
    pub fn matches(&self, metadata: &RecordMetadata, value: &Value) -> bool {
        match self {
            Selector::FieldExists(path) => resolve_field(metadata, value, path).is_some(),
            Selector::Equals(path, expected) => {
                resolve_field(metadata, value, path).as_ref() == Some(expected)
            }
            Selector::And(inner) => inner.iter().all(|s| s.matches(metadata, value)),
        }
    }
}

/// Sort direction for a [`SortKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// A single sort criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    /// Rooted dotted path to sort by.
    pub field: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortKey {
    /// Ascending sort on `field`.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort on `field`.
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// A document query: optional selector, sort order, and field projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Row filter; `None` matches everything.
    pub selector: Option<Selector>,
    /// Sort criteria, applied in order.
    pub sort: Vec<SortKey>,
    /// Rooted paths to keep in the result value; empty keeps everything.
    pub fields: Vec<String>,
}

impl Query {
    /// Creates an empty query matching all rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the selector.
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Adds an ascending sort key.
    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort.push(SortKey::ascending(field));
        self
    }

    /// Adds a sort key.
    pub fn with_sort(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    /// Adds a projected field.
    pub fn select(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }
}

/// Resolves a rooted dotted path against a row.
pub(crate) fn resolve_field(metadata: &RecordMetadata, value: &Value, path: &str) -> Option<Value> {
    let mut parts = path.split('.');
    match parts.next()? {
        "metadata" => match (parts.next(), parts.next()) {
            (Some("created"), None) => Some(Value::from(metadata.created)),
            _ => None,
        },
        "value" => {
            let mut current = value;
            for part in parts {
                current = current.get(part)?;
            }
            Some(current.clone())
        }
        _ => None,
    }
}

/// Orders two resolved field values for sorting. Absent sorts first.
pub(crate) fn compare_values(a: &Option<Value>, b: &Option<Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => match (a.as_str(), b.as_str()) {
                (Some(x), Some(y)) => x.cmp(y),
                _ => a.to_string().cmp(&b.to_string()),
            },
        },
    }
}

/// Projects a row value down to the query's `fields`.
///
/// Only paths rooted at `value` affect the projection; metadata is always
/// carried on the record itself. An empty field list keeps the full value.
pub(crate) fn project_value(fields: &[String], value: &Value) -> Value {
    if fields.is_empty() || fields.iter().any(|f| f == "value") {
        return value.clone();
    }
    let mut projected = Map::new();
    for field in fields {
        let Some(rest) = field.strip_prefix("value.") else {
            continue;
        };
        let mut current = value;
        let mut found = true;
        for part in rest.split('.') {
            match current.get(part) {
                Some(next) => current = next,
                None => {
                    found = false;
                    break;
                }
            }
        }
        if found {
            insert_path(&mut projected, rest, current.clone());
        }
    }
    Value::Object(projected)
}

fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(inner) = entry {
                insert_path(inner, rest, value);
            }
        }
    }
}
