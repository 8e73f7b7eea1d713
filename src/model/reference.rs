// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Normalized document references.
//!
//! Legacy data carries references in two encodings: a structured pointer
//! object (`{path, id}`) and a serialized path string
//! (`"teams/t1/tags/tg1"`). Both parse to the same [`Reference`] at the
//! store boundary so the resolver never does runtime type checks.

use serde_json::{json, Map, Value};

/// A pointer to a document: collection path plus document id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Slash-separated collection path, e.g. `teams/t1/tags`
    pub collection_path: String,
    /// Document id within that collection
    pub id: String,
}

impl Reference {
    pub fn new(collection_path: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection_path: collection_path.into(),
            id: id.into(),
        }
    }

    /// Parse a reference from either legacy encoding.
    ///
    /// Returns `None` for anything that is not reference-shaped. In
    /// particular an object with its own `id` but no `path` (a tag embedded
    /// by value) is not a reference.
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse_path(s),
            Value::Object(map) => Self::parse_object(map),
            _ => None,
        }
    }

    fn parse_object(map: &Map<String, Value>) -> Option<Self> {
        let path = map.get("path")?.as_str()?;
        let id = map.get("id")?.as_str()?;
        if path.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(path, id))
    }

    fn parse_path(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.split('/').collect();
        // Document paths alternate collection/document, so a valid one has
        // an even, nonzero segment count with no empty segments.
        if segments.len() < 2
            || segments.len() % 2 != 0
            || segments.iter().any(|s| s.is_empty())
        {
            return None;
        }
        let id = segments[segments.len() - 1];
        let collection_path = segments[..segments.len() - 1].join("/");
        Some(Self::new(collection_path, id))
    }

    /// Serialize to the structured pointer encoding.
    pub fn to_value(&self) -> Value {
        json!({
            "path": self.collection_path,
            "id": self.id,
        })
    }

    /// Full document path, `{collection_path}/{id}`.
    pub fn document_path(&self) -> String {
        format!("{}/{}", self.collection_path, self.id)
    }

    /// Last segment of the collection path, e.g. `tags` for
    /// `teams/t1/tags`.
    pub fn collection_name(&self) -> &str {
        self.collection_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.collection_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_object() {
        let value = json!({"path": "teams/t1/tags", "id": "tg1"});
        let reference = Reference::parse(&value).unwrap();
        assert_eq!(reference.collection_path, "teams/t1/tags");
        assert_eq!(reference.id, "tg1");
        assert_eq!(reference.collection_name(), "tags");
    }

    #[test]
    fn test_parse_path_string() {
        let reference = Reference::parse(&json!("teams/t1/tags/tg1")).unwrap();
        assert_eq!(reference.collection_path, "teams/t1/tags");
        assert_eq!(reference.id, "tg1");
    }

    #[test]
    fn test_both_encodings_normalize_identically() {
        let from_string = Reference::parse(&json!("teams/t1/tags/tg1")).unwrap();
        let from_object = Reference::parse(&json!({"path": "teams/t1/tags", "id": "tg1"})).unwrap();
        assert_eq!(from_string, from_object);
    }

    #[test]
    fn test_tag_shaped_object_is_not_a_reference() {
        // An embedded tag has its own id but no path.
        let value = json!({"id": "tg1", "name": "Endurance", "color": "#ff0000"});
        assert!(Reference::parse(&value).is_none());
    }

    #[test]
    fn test_odd_segment_strings_are_not_references() {
        assert!(Reference::parse(&json!("Morning Run")).is_none());
        assert!(Reference::parse(&json!("teams/t1/tags")).is_none());
        assert!(Reference::parse(&json!("a//b/c")).is_none());
    }

    #[test]
    fn test_round_trip_through_structured_encoding() {
        let reference = Reference::new("users", "new-1");
        assert_eq!(Reference::parse(&reference.to_value()), Some(reference));
    }

    #[test]
    fn test_document_path() {
        assert_eq!(
            Reference::new("teams/t1/tags", "tg1").document_path(),
            "teams/t1/tags/tg1"
        );
    }
}
