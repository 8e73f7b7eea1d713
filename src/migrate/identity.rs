// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-run identity map: legacy user id -> new user id.
//!
//! Legacy and new identities are never directly comparable, so teammates
//! who migrated earlier are discovered by joining the legacy team's coach
//! records against already-migrated new-store users on email.

use crate::error::Result;
use crate::store::{collections, paths, DocumentStore};
use serde_json::Value;
use std::collections::HashMap;

/// Ephemeral mapping of legacy user identity to new user identity,
/// scoped to a single migration run.
#[derive(Debug, Default, Clone)]
pub struct IdentityMap {
    inner: HashMap<String, String>,
}

impl IdentityMap {
    /// A map seeded with the currently-migrating user's pair.
    pub fn seeded(legacy_uid: &str, new_uid: &str) -> Self {
        let mut map = Self::default();
        map.put(legacy_uid, new_uid);
        map
    }

    /// Record a pair. First write wins: once a legacy identity is present
    /// its new-identity value never changes within a run.
    pub fn put(&mut self, legacy_uid: &str, new_uid: &str) {
        self.inner
            .entry(legacy_uid.to_string())
            .or_insert_with(|| new_uid.to_string());
    }

    pub fn get(&self, legacy_uid: &str) -> Option<&str> {
        self.inner.get(legacy_uid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Build the identity map for a team migration.
///
/// Seeds the migrating user's pair, then scans the legacy team's coaches
/// for other `userId` values and matches them against migrated new-store
/// users by email. Legacy users sharing an email are ambiguous: both are
/// logged and skipped, and those teammates self-heal when they migrate
/// themselves.
pub async fn build_team_identity_map(
    legacy: &dyn DocumentStore,
    target: &dyn DocumentStore,
    team_id: &str,
    legacy_uid: &str,
    new_uid: &str,
) -> Result<IdentityMap> {
    let mut map = IdentityMap::seeded(legacy_uid, new_uid);

    let coaches = legacy
        .list_collection(&paths::team_subcollection(team_id, collections::COACHES))
        .await?;

    // Legacy user ids referenced by this team's coaches, minus the seed.
    let mut pending: Vec<String> = coaches
        .iter()
        .filter_map(|coach| coach.fields.get("userId").and_then(Value::as_str))
        .filter(|uid| *uid != legacy_uid)
        .map(str::to_string)
        .collect();
    pending.sort();
    pending.dedup();

    if pending.is_empty() {
        return Ok(map);
    }

    // Email -> new uid for users that already completed migration.
    let migrated_users = target.list_collection(collections::USERS).await?;
    let mut email_to_new_uid: HashMap<String, String> = HashMap::new();
    for user in &migrated_users {
        if user.fields.get("dataMigrated").and_then(Value::as_bool) != Some(true) {
            continue;
        }
        let Some(email) = user.fields.get("email").and_then(Value::as_str) else {
            continue;
        };
        email_to_new_uid.insert(email.to_lowercase(), user.id.clone());
    }

    // Look up each pending legacy uid's email, then map only the ones
    // whose email is unique among legacy users. Duplicates are ambiguous
    // and refused outright rather than silently mismapped.
    let mut claims: Vec<(String, String)> = Vec::new();
    let mut email_counts: HashMap<String, usize> = HashMap::new();
    for old_uid in pending {
        let Some(old_user) = legacy.get_document(&paths::user_doc(&old_uid)).await? else {
            tracing::debug!(%old_uid, "Legacy coach references a missing user, skipping");
            continue;
        };
        let Some(email) = old_user.fields.get("email").and_then(Value::as_str) else {
            continue;
        };
        let email = email.to_lowercase();
        *email_counts.entry(email.clone()).or_default() += 1;
        claims.push((old_uid, email));
    }

    for (old_uid, email) in claims {
        if email_counts[&email] > 1 {
            tracing::warn!(
                email = %email,
                legacy_uid = %old_uid,
                "Duplicate email across legacy users, refusing ambiguous identity mapping"
            );
            continue;
        }
        if let Some(new_id) = email_to_new_uid.get(&email) {
            map.put(&old_uid, new_id);
        }
    }

    tracing::debug!(
        team_id,
        resolved = map.len(),
        "Built identity map for team migration"
    );

    Ok(map)
}
