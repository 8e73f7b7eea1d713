// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use serde_json::json;
use std::sync::Arc;
use teamplan_migrator::store::MemoryStore;
use teamplan_migrator::{MigrationEngine, RemigrationDriver};

/// Build an engine over in-memory legacy/new stores. The same store backs
/// both the document and blob contracts.
#[allow(dead_code)]
pub fn engine(legacy: &MemoryStore, target: &MemoryStore) -> MigrationEngine {
    MigrationEngine::new(
        Arc::new(legacy.clone()),
        Arc::new(target.clone()),
        Arc::new(legacy.clone()),
        Arc::new(target.clone()),
    )
}

#[allow(dead_code)]
pub fn remigration_driver(legacy: &MemoryStore, target: &MemoryStore) -> RemigrationDriver {
    RemigrationDriver::new(Arc::new(legacy.clone()), Arc::new(target.clone()))
}

/// Seed the canonical single-coach legacy graph: user `old-1` (a@x.com)
/// owns team `t1`, whose `headCoach` points at coach `c1` with
/// `userId = old-1`.
#[allow(dead_code)]
pub fn seed_head_coach_graph(legacy: &MemoryStore) {
    legacy.insert_doc(
        "users/old-1",
        json!({
            "uid": "old-1",
            "email": "a@x.com",
            "name": "Alex Coach",
            "teamRef": {"path": "teams", "id": "t1"},
        }),
    );
    legacy.insert_doc(
        "teams/t1",
        json!({
            "teamId": "t1",
            "name": "Morning Swimmers",
            "headCoach": {"path": "teams/t1/coaches", "id": "c1"},
        }),
    );
    legacy.insert_doc("teams/t1/coaches/c1", json!({"userId": "old-1"}));
}

/// Add a second coach `c2` (`userId = old-2`, user `b@x.com`) to team `t1`.
#[allow(dead_code)]
pub fn seed_second_coach(legacy: &MemoryStore) {
    legacy.insert_doc(
        "users/old-2",
        json!({
            "uid": "old-2",
            "email": "b@x.com",
            "name": "Billie Assistant",
            "teamRef": {"path": "teams", "id": "t1"},
        }),
    );
    legacy.insert_doc("teams/t1/coaches/c2", json!({"userId": "old-2"}));
}
