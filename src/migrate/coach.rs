// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coach/user resolver: maps a team's `headCoach` back-reference to the
//! correct user identity in the new store.
//!
//! The legacy schema stores `headCoach` as a pointer into the team-scoped
//! `coaches` subcollection, not at a user, and a coach's new user id is
//! only known once that user has migrated. Resolution is an explicit
//! two-phase protocol:
//!
//! - Phase A copies the `coaches` subcollection first, remapping each
//!   coach's `userId` where the identity map allows, and building a
//!   `coachId -> newUserId` map as a byproduct. Coaches whose user has
//!   not migrated keep their legacy `userId` and self-heal later.
//! - Phase B looks the legacy team's `headCoach` coach id up in that map
//!   and produces a reference into the new store's `users` collection, or
//!   nothing at all when the head coach has not migrated yet. Omitting
//!   the field beats writing an incorrect pointer.

use crate::error::Result;
use crate::migrate::subcollections::transform_document;
use crate::migrate::IdentityMap;
use crate::model::Reference;
use crate::store::{collections, paths, Document, DocumentStore, WriteMode};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Outcome of Phase A: documents copied plus the coach-to-user mapping.
#[derive(Debug, Default)]
pub struct CoachMigration {
    /// Legacy coach document id -> new user id, for coaches whose user
    /// identity is already known.
    pub coach_to_user: HashMap<String, String>,
    /// Number of coach documents written to the new store.
    pub copied: usize,
}

/// Phase A: copy the legacy team's coaches into the new store.
pub async fn migrate_coaches(
    legacy: &dyn DocumentStore,
    target: &dyn DocumentStore,
    team_id: &str,
    ids: &IdentityMap,
) -> Result<CoachMigration> {
    let coaches = legacy
        .list_collection(&paths::team_subcollection(team_id, collections::COACHES))
        .await?;

    let mut outcome = CoachMigration::default();
    for coach in &coaches {
        if let Some(new_uid) = coach
            .fields
            .get("userId")
            .and_then(Value::as_str)
            .and_then(|old| ids.get(old))
        {
            outcome
                .coach_to_user
                .insert(coach.id.clone(), new_uid.to_string());
        }

        // transform_document remaps userId through the same identity map,
        // so resolved coaches land with their new identity and unresolved
        // ones keep the legacy value for a later run to fix.
        let fields = transform_document(&coach.fields, team_id, ids);
        target
            .set_document(
                &paths::team_subdoc(team_id, collections::COACHES, &coach.id),
                &fields,
                WriteMode::Overwrite,
            )
            .await?;
        outcome.copied += 1;
    }

    tracing::debug!(
        team_id,
        copied = outcome.copied,
        resolved = outcome.coach_to_user.len(),
        "Migrated coaches subcollection"
    );

    Ok(outcome)
}

/// Phase B: resolve the legacy team's `headCoach` into a new-store user
/// reference, or `None` when the head coach has not migrated yet.
pub fn resolve_head_coach(
    legacy_team_fields: &Map<String, Value>,
    coach_to_user: &HashMap<String, String>,
) -> Option<Reference> {
    let head_coach = Reference::parse(legacy_team_fields.get("headCoach")?)?;
    let new_uid = coach_to_user.get(&head_coach.id)?;
    Some(Reference::new(collections::USERS, new_uid.clone()))
}

/// Whether the given legacy user is the legacy team's head coach.
///
/// Follows the team's `headCoach` pointer into the coaches subcollection
/// and compares that coach's `userId`.
pub async fn is_legacy_head_coach(
    legacy: &dyn DocumentStore,
    team_fields: &Map<String, Value>,
    team_id: &str,
    legacy_uid: &str,
) -> Result<bool> {
    let Some(head_coach) = team_fields.get("headCoach").and_then(Reference::parse) else {
        return Ok(false);
    };

    let Some(coach) = legacy
        .get_document(&paths::team_subdoc(
            team_id,
            collections::COACHES,
            &head_coach.id,
        ))
        .await?
    else {
        return Ok(false);
    };

    Ok(coach.fields.get("userId").and_then(Value::as_str) == Some(legacy_uid))
}

/// Find the migrating user's coach document in a collection of coaches by
/// matching its legacy `userId`.
pub fn find_coach_for_user<'a>(coaches: &'a [Document], legacy_uid: &str) -> Option<&'a Document> {
    coaches
        .iter()
        .find(|coach| coach.fields.get("userId").and_then(Value::as_str) == Some(legacy_uid))
}
