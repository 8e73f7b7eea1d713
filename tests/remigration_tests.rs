// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Re-migration driver tests: merge semantics, progress reporting, and
//! the reduced scope (no coach resolution, no attachments).

mod common;

use common::{engine, remigration_driver, seed_head_coach_graph};
use serde_json::json;
use teamplan_migrator::store::MemoryStore;
use teamplan_migrator::ProgressEvent;

#[tokio::test]
async fn test_remigration_merges_instead_of_overwriting() {
    let legacy = MemoryStore::new();
    let target = MemoryStore::new();
    seed_head_coach_graph(&legacy);
    legacy.insert_doc("teams/t1/plans/p1", json!({"title": "Base week"}));

    let first = engine(&legacy, &target).migrate_user("old-1", "new-1").await;
    assert!(first.success);

    // The target copy gains a field the legacy source never had, and the
    // legacy source changes afterwards.
    target.insert_doc(
        "teams/t1/plans/p1",
        json!({"title": "Base week", "pinned": true}),
    );
    legacy.insert_doc("teams/t1/plans/p1", json!({"title": "Build week"}));

    let summary = remigration_driver(&legacy, &target)
        .remigrate("old-1", "new-1", &["plans".to_string()], |_| {})
        .await
        .unwrap();

    assert_eq!(summary.subcollections_copied, vec!["plans".to_string()]);
    assert_eq!(summary.documents_copied, 1);

    // Merge write: the new title lands, the target-only field survives.
    let plan = target.doc_fields("teams/t1/plans/p1").unwrap();
    assert_eq!(plan.get("title"), Some(&json!("Build week")));
    assert_eq!(plan.get("pinned"), Some(&json!(true)));
}

#[tokio::test]
async fn test_remigration_emits_one_progress_event_per_subcollection() {
    let legacy = MemoryStore::new();
    let target = MemoryStore::new();
    seed_head_coach_graph(&legacy);
    legacy.insert_doc("teams/t1/plans/p1", json!({"title": "Plan"}));
    legacy.insert_doc("teams/t1/tags/tg1", json!({"name": "Tag"}));

    let mut events: Vec<ProgressEvent> = Vec::new();
    remigration_driver(&legacy, &target)
        .remigrate(
            "old-1",
            "new-1",
            &["plans".to_string(), "tags".to_string()],
            |event| events.push(event),
        )
        .await
        .unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].current, 1);
    assert_eq!(events[0].total, 2);
    assert_eq!(events[0].item_name, "plans");
    assert_eq!(events[1].current, 2);
    assert_eq!(events[1].item_name, "tags");
}

#[tokio::test]
async fn test_remigration_skips_coach_resolution_and_blobs() {
    let legacy = MemoryStore::new();
    let target = MemoryStore::new();
    seed_head_coach_graph(&legacy);
    legacy.insert_blob("teams/t1/a.pdf", b"aaa");
    legacy.insert_doc("teams/t1/tags/tg1", json!({"name": "Tag"}));

    let summary = remigration_driver(&legacy, &target)
        .remigrate("old-1", "new-1", &["tags".to_string()], |_| {})
        .await
        .unwrap();

    assert_eq!(summary.documents_copied, 1);
    // No attachments and no team/coach writes happen on a re-migration.
    assert_eq!(target.blob_bytes("teams/t1/a.pdf"), None);
    assert!(target.doc_fields("teams/t1").is_none());
    assert!(target.doc_fields("teams/t1/coaches/c1").is_none());
}

#[tokio::test]
async fn test_remigration_requires_legacy_user() {
    let legacy = MemoryStore::new();
    let target = MemoryStore::new();

    let err = remigration_driver(&legacy, &target)
        .remigrate("old-9", "new-9", &["plans".to_string()], |_| {})
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Old user document not found");
}

#[tokio::test]
async fn test_remigration_continues_past_failing_subcollection() {
    let legacy = MemoryStore::new();
    let target = MemoryStore::new();
    seed_head_coach_graph(&legacy);
    legacy.insert_doc("teams/t1/plans/p1", json!({"title": "Plan"}));
    legacy.insert_doc("teams/t1/tags/tg1", json!({"name": "Tag"}));
    legacy.fail_collection("teams/t1/plans");

    let summary = remigration_driver(&legacy, &target)
        .remigrate(
            "old-1",
            "new-1",
            &["plans".to_string(), "tags".to_string()],
            |_| {},
        )
        .await
        .unwrap();

    assert_eq!(summary.subcollections_copied, vec!["tags".to_string()]);
    assert!(target.doc_fields("teams/t1/tags/tg1").is_some());
}
