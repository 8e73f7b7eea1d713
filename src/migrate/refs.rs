// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reference resolver: pure rewrite of reference-shaped fields from
//! legacy-store coordinates to new-store coordinates.
//!
//! Rules, applied independently and order-independent:
//! - tag-shaped objects (own `id`, no `path`) are values, not references;
//!   left untouched
//! - references into a `tags` collection are re-rooted under the new
//!   team's `tags` collection, same document id
//! - arrays of objects (activity lists and the like) get their nested
//!   reference arrays rewritten one level deep
//! - `headCoach` is skipped here; its target identity space differs from
//!   its source space and the coach resolver owns it
//! - `teamRef` is re-pointed at the new team
//! - `ref` is dropped; the store regenerates it on write

use crate::model::Reference;
use crate::store::collections;
use serde_json::{Map, Value};

/// Rewrite all reference-shaped fields of a document for the new store.
pub fn rewrite_references(fields: &Map<String, Value>, team_id: &str) -> Map<String, Value> {
    let mut out = Map::with_capacity(fields.len());
    for (key, value) in fields {
        match key.as_str() {
            // Always regenerated by the store on write, never carried across.
            "ref" => continue,
            // Owned by the coach/user resolver; passed through untouched.
            "headCoach" => {
                out.insert(key.clone(), value.clone());
            }
            "teamRef" => {
                out.insert(
                    key.clone(),
                    Reference::new(collections::TEAMS, team_id).to_value(),
                );
            }
            _ => {
                out.insert(key.clone(), rewrite_value(value, team_id));
            }
        }
    }
    out
}

fn rewrite_value(value: &Value, team_id: &str) -> Value {
    if let Some(reference) = Reference::parse(value) {
        return match rewrite_tag_reference(&reference, team_id) {
            Some(rewritten) => rewritten.to_value(),
            // A reference into some other collection: keep the original
            // encoding, nothing to re-root.
            None => value.clone(),
        };
    }

    if let Value::Array(items) = value {
        let rewritten: Vec<Value> = items
            .iter()
            .map(|item| match item {
                // Nested objects (e.g. activities) carry their own
                // reference arrays one level down.
                Value::Object(map) => Value::Object(
                    map.iter()
                        .map(|(k, v)| (k.clone(), rewrite_value(v, team_id)))
                        .collect(),
                ),
                other => rewrite_value(other, team_id),
            })
            .collect();
        return Value::Array(rewritten);
    }

    value.clone()
}

/// Re-root a tag reference under the new team. Tag documents are copied
/// with identity-preserving ids, so only the store root changes.
fn rewrite_tag_reference(reference: &Reference, team_id: &str) -> Option<Reference> {
    if reference.collection_name() != collections::TAGS {
        return None;
    }
    Some(Reference::new(
        format!(
            "{}/{}/{}",
            collections::TEAMS,
            team_id,
            collections::TAGS
        ),
        reference.id.clone(),
    ))
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
    fn test_tag_reference_structured_encoding() {
        let doc = fields(json!({
            "tags": [{"path": "teams/old-t1/tags", "id": "tg1"}],
        }));
        let out = rewrite_references(&doc, "t1");
        assert_eq!(
            out.get("tags"),
            Some(&json!([{"path": "teams/t1/tags", "id": "tg1"}]))
        );
    }

    #[test]
    fn test_tag_reference_string_encoding() {
        let doc = fields(json!({"tag": "teams/old-t1/tags/tg1"}));
        let out = rewrite_references(&doc, "t1");
        assert_eq!(out.get("tag"), Some(&json!({"path": "teams/t1/tags", "id": "tg1"})));
    }

    #[test]
    fn test_tag_shaped_object_left_untouched() {
        let doc = fields(json!({
            "tag": {"id": "tg1", "name": "Endurance"},
        }));
        let out = rewrite_references(&doc, "t1");
        assert_eq!(out.get("tag"), Some(&json!({"id": "tg1", "name": "Endurance"})));
    }

    #[test]
    fn test_nested_activities_tags_rewritten() {
        let doc = fields(json!({
            "activities": [
                {
                    "name": "Warmup",
                    "tags": [{"path": "teams/old-t1/tags", "id": "tg1"}],
                },
                {"name": "Main set", "tags": []},
            ],
        }));
        let out = rewrite_references(&doc, "t1");
        assert_eq!(
            out.get("activities"),
            Some(&json!([
                {
                    "name": "Warmup",
                    "tags": [{"path": "teams/t1/tags", "id": "tg1"}],
                },
                {"name": "Main set", "tags": []},
            ]))
        );
    }

    #[test]
    fn test_head_coach_not_rewritten() {
        let doc = fields(json!({
            "headCoach": {"path": "teams/old-t1/coaches", "id": "c1"},
        }));
        let out = rewrite_references(&doc, "t1");
        assert_eq!(
            out.get("headCoach"),
            Some(&json!({"path": "teams/old-t1/coaches", "id": "c1"}))
        );
    }

    #[test]
    fn test_team_ref_rewritten() {
        let doc = fields(json!({
            "teamRef": {"path": "teams", "id": "old-t1"},
        }));
        let out = rewrite_references(&doc, "t1");
        assert_eq!(out.get("teamRef"), Some(&json!({"path": "teams", "id": "t1"})));
    }

    #[test]
    fn test_team_ref_rewritten_from_string() {
        let doc = fields(json!({"teamRef": "teams/old-t1"}));
        let out = rewrite_references(&doc, "t1");
        assert_eq!(out.get("teamRef"), Some(&json!({"path": "teams", "id": "t1"})));
    }

    #[test]
    fn test_ref_field_dropped() {
        let doc = fields(json!({
            "ref": "teams/old-t1/plans/p1",
            "title": "Week 1",
        }));
        let out = rewrite_references(&doc, "t1");
        assert!(!out.contains_key("ref"));
        assert_eq!(out.get("title"), Some(&json!("Week 1")));
    }

    #[test]
    fn test_non_tag_reference_kept_as_is() {
        let doc = fields(json!({"coach": "teams/old-t1/coaches/c1"}));
        let out = rewrite_references(&doc, "t1");
        assert_eq!(out.get("coach"), Some(&json!("teams/old-t1/coaches/c1")));
    }

    #[test]
    fn test_plain_strings_untouched() {
        let doc = fields(json!({"title": "Morning Run", "note": "easy pace"}));
        let out = rewrite_references(&doc, "t1");
        assert_eq!(out.get("title"), Some(&json!("Morning Run")));
        assert_eq!(out.get("note"), Some(&json!("easy pace")));
    }
}
