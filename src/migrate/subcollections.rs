// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subcollection copier: moves one named collection under a legacy team
//! into the corresponding collection under the new team.
//!
//! Per document: reference rewrite, identity-string remaps, derived
//! human-readable dates, `ref` strip, then a write at the same document
//! id (ids are stable across stores; only the store root changes).

use crate::error::Result;
use crate::migrate::refs::rewrite_references;
use crate::migrate::IdentityMap;
use crate::store::{paths, DocumentStore, WriteMode};
use crate::time_utils;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Fields holding plain author-identity strings (not structured
/// references); remapped through the identity map.
const IDENTITY_FIELDS: &[&str] = &["uid", "userId", "uploadedBy", "createdBy"];

/// Millisecond-epoch fields that get a derived RFC3339 sibling.
const EPOCH_FIELDS: &[(&str, &str)] = &[("created", "createdDate"), ("modified", "modifiedDate")];

/// Copies team subcollections between stores.
pub struct SubcollectionCopier {
    legacy: Arc<dyn DocumentStore>,
    target: Arc<dyn DocumentStore>,
}

impl SubcollectionCopier {
    pub fn new(legacy: Arc<dyn DocumentStore>, target: Arc<dyn DocumentStore>) -> Self {
        Self { legacy, target }
    }

    /// Copy one subcollection. Returns the number of documents written.
    pub async fn copy(
        &self,
        team_id: &str,
        collection: &str,
        ids: &IdentityMap,
        mode: WriteMode,
    ) -> Result<usize> {
        let docs = self
            .legacy
            .list_collection(&paths::team_subcollection(team_id, collection))
            .await?;

        let mut copied = 0;
        for doc in &docs {
            let fields = transform_document(&doc.fields, team_id, ids);
            self.target
                .set_document(
                    &paths::team_subdoc(team_id, collection, &doc.id),
                    &fields,
                    mode,
                )
                .await?;
            copied += 1;
        }

        tracing::debug!(team_id, collection, copied, "Copied subcollection");
        Ok(copied)
    }
}

/// Apply the full per-document transform: reference rewrite plus the
/// collection-agnostic field remaps.
pub fn transform_document(
    fields: &Map<String, Value>,
    team_id: &str,
    ids: &IdentityMap,
) -> Map<String, Value> {
    let mut out = rewrite_references(fields, team_id);

    // Author-identity strings remap through the identity map; unknown
    // identities stay as-is and self-heal on a later run.
    for field in IDENTITY_FIELDS {
        let remapped = out
            .get(*field)
            .and_then(Value::as_str)
            .and_then(|old| ids.get(old))
            .map(str::to_string);
        if let Some(new_uid) = remapped {
            out.insert((*field).to_string(), Value::String(new_uid));
        }
    }

    if let Some(Value::Array(readers)) = out.get("readBy") {
        let remapped: Vec<Value> = readers
            .iter()
            .map(|reader| match reader.as_str().and_then(|old| ids.get(old)) {
                Some(new_uid) => Value::String(new_uid.to_string()),
                None => reader.clone(),
            })
            .collect();
        out.insert("readBy".to_string(), Value::Array(remapped));
    }

    for (source, derived) in EPOCH_FIELDS {
        let formatted = out
            .get(*source)
            .and_then(Value::as_i64)
            .and_then(time_utils::format_epoch_millis);
        if let Some(date) = formatted {
            out.insert((*derived).to_string(), Value::String(date));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_identity_fields_remapped() {
        let ids = IdentityMap::seeded("old-1", "new-1");
        let doc = fields(json!({
            "uploadedBy": "old-1",
            "createdBy": "old-2",
        }));
        let out = transform_document(&doc, "t1", &ids);
        assert_eq!(out.get("uploadedBy"), Some(&json!("new-1")));
        // Unknown identity stays put until that teammate migrates.
        assert_eq!(out.get("createdBy"), Some(&json!("old-2")));
    }

    #[test]
    fn test_read_by_array_remapped_per_entry() {
        let mut ids = IdentityMap::seeded("old-1", "new-1");
        ids.put("old-2", "new-2");
        let doc = fields(json!({"readBy": ["old-1", "old-2", "old-3"]}));
        let out = transform_document(&doc, "t1", &ids);
        assert_eq!(out.get("readBy"), Some(&json!(["new-1", "new-2", "old-3"])));
    }

    #[test]
    fn test_derived_dates_added() {
        let ids = IdentityMap::default();
        let doc = fields(json!({"created": 1_700_000_000_000i64}));
        let out = transform_document(&doc, "t1", &ids);
        assert_eq!(out.get("created"), Some(&json!(1_700_000_000_000i64)));
        assert_eq!(out.get("createdDate"), Some(&json!("2023-11-14T22:13:20Z")));
        assert!(!out.contains_key("modifiedDate"));
    }

    #[test]
    fn test_ref_stripped_and_tags_rewritten_together() {
        let ids = IdentityMap::default();
        let doc = fields(json!({
            "ref": "teams/old-t1/plans/p1",
            "tags": ["teams/old-t1/tags/tg1"],
        }));
        let out = transform_document(&doc, "t1", &ids);
        assert!(!out.contains_key("ref"));
        assert_eq!(
            out.get("tags"),
            Some(&json!([{"path": "teams/t1/tags", "id": "tg1"}]))
        );
    }
}
