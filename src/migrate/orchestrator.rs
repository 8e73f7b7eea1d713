// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Migration orchestrator: drives a single user's migration to completion.
//!
//! State machine:
//! `LoadLegacyUser -> ResolveTeam -> {CreateTeamAndSubcollections |
//! PatchCoachAndHeadCoach} -> UpsertUser -> Done | Failed`.
//!
//! The first teammate to migrate creates the team and copies everything it
//! owns; later teammates only patch identity references into the existing
//! team (the self-healing cases). Subcollection and attachment failures
//! degrade the run but never abort it; only the four named fatal
//! conditions produce `success: false`.

use crate::error::{MigrateError, Result};
use crate::migrate::blobs::BlobMigrator;
use crate::migrate::coach::{self, CoachMigration};
use crate::migrate::identity::{self, IdentityMap};
use crate::migrate::refs::rewrite_references;
use crate::migrate::subcollections::{transform_document, SubcollectionCopier};
use crate::model::Reference;
use crate::store::{collections, paths, BlobStore, Document, DocumentStore, WriteMode};
use crate::time_utils;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const ERR_OLD_USER_NOT_FOUND: &str = "Old user document not found";
pub const ERR_NO_TEAM_REFERENCE: &str = "User has no team reference";
pub const ERR_TEAM_MIGRATION_FAILED: &str = "Failed to migrate team data";
pub const ERR_USER_MIGRATION_FAILED: &str = "Failed to create user document";

/// Terminal summary of one migration run. Returned to the caller, never
/// persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    pub success: bool,
    pub user_migrated: bool,
    pub team_migrated: bool,
    pub team_already_existed: bool,
    pub subcollections_copied: Vec<String>,
    pub files_copied: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MigrationResult {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            user_migrated: false,
            team_migrated: false,
            team_already_existed: false,
            subcollections_copied: Vec::new(),
            files_copied: 0,
            error: Some(error.into()),
        }
    }
}

/// Drives migrations between a legacy and a new backend project.
pub struct MigrationEngine {
    legacy_docs: Arc<dyn DocumentStore>,
    target_docs: Arc<dyn DocumentStore>,
    legacy_blobs: Arc<dyn BlobStore>,
    target_blobs: Arc<dyn BlobStore>,
}

impl MigrationEngine {
    pub fn new(
        legacy_docs: Arc<dyn DocumentStore>,
        target_docs: Arc<dyn DocumentStore>,
        legacy_blobs: Arc<dyn BlobStore>,
        target_blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            legacy_docs,
            target_docs,
            legacy_blobs,
            target_blobs,
        }
    }

    /// Migrate one user's data graph from the legacy store to the new one.
    ///
    /// Never panics and never returns `Err`; every outcome, fatal errors
    /// included, is folded into the [`MigrationResult`].
    pub async fn migrate_user(&self, legacy_uid: &str, new_uid: &str) -> MigrationResult {
        tracing::info!(legacy_uid, new_uid, "Starting user migration");

        match self.run(legacy_uid, new_uid).await {
            Ok(result) => {
                tracing::info!(
                    legacy_uid,
                    new_uid,
                    team_migrated = result.team_migrated,
                    team_already_existed = result.team_already_existed,
                    subcollections = result.subcollections_copied.len(),
                    files_copied = result.files_copied,
                    "User migration complete"
                );
                result
            }
            Err(e) => {
                tracing::error!(legacy_uid, new_uid, error = %e, "User migration failed");
                MigrationResult::failed(e.to_string())
            }
        }
    }

    async fn run(&self, legacy_uid: &str, new_uid: &str) -> Result<MigrationResult> {
        // State: LoadLegacyUser
        let legacy_user = self
            .legacy_docs
            .get_document(&paths::user_doc(legacy_uid))
            .await?
            .ok_or(MigrateError::Migration(ERR_OLD_USER_NOT_FOUND))?;

        // State: ResolveTeam
        let team_id = legacy_user
            .fields
            .get("teamRef")
            .and_then(Reference::parse)
            .map(|r| r.id)
            .ok_or(MigrateError::Migration(ERR_NO_TEAM_REFERENCE))?;

        tracing::debug!(legacy_uid, %team_id, "Resolved legacy team");

        let ids = identity::build_team_identity_map(
            self.legacy_docs.as_ref(),
            self.target_docs.as_ref(),
            &team_id,
            legacy_uid,
            new_uid,
        )
        .await?;

        let legacy_team = self
            .legacy_docs
            .get_document(&paths::team_doc(&team_id))
            .await?;

        let existing_team = self
            .target_docs
            .get_document(&paths::team_doc(&team_id))
            .await?;

        let mut result = MigrationResult {
            success: true,
            user_migrated: false,
            team_migrated: false,
            team_already_existed: existing_team.is_some(),
            subcollections_copied: Vec::new(),
            files_copied: 0,
            error: None,
        };

        if existing_team.is_none() {
            let legacy_team = legacy_team.ok_or_else(|| {
                tracing::error!(%team_id, "Legacy team document missing");
                MigrateError::Migration(ERR_TEAM_MIGRATION_FAILED)
            })?;
            self.create_team_and_subcollections(&legacy_team, &team_id, &ids, &mut result)
                .await?;
        } else {
            // State: PatchCoachAndHeadCoach
            self.patch_coach_and_head_coach(legacy_team.as_ref(), &team_id, legacy_uid, new_uid)
                .await;
        }

        // State: UpsertUser. Always runs, regardless of branch. The shared
        // transform re-points teamRef and remaps the uid field.
        let mut user_fields = transform_document(&legacy_user.fields, &team_id, &ids);
        user_fields.insert("dataMigrated".to_string(), json!(true));
        user_fields.insert("migratedAt".to_string(), json!(time_utils::now_rfc3339()));

        self.target_docs
            .set_document(&paths::user_doc(new_uid), &user_fields, WriteMode::Merge)
            .await
            .map_err(|e| {
                tracing::error!(new_uid, error = %e, "User document write failed");
                MigrateError::Migration(ERR_USER_MIGRATION_FAILED)
            })?;
        result.user_migrated = true;

        Ok(result)
    }

    /// State: CreateTeamAndSubcollections. First teammate to migrate does
    /// the heavy lifting: coaches first (to populate the identity mapping),
    /// then the remaining subcollections, attachments, and finally the team
    /// document itself. Only the team write is fatal.
    async fn create_team_and_subcollections(
        &self,
        legacy_team: &Document,
        team_id: &str,
        ids: &IdentityMap,
        result: &mut MigrationResult,
    ) -> Result<()> {
        // Phase A of head-coach resolution doubles as the coaches copy.
        let coach_outcome = match coach::migrate_coaches(
            self.legacy_docs.as_ref(),
            self.target_docs.as_ref(),
            team_id,
            ids,
        )
        .await
        {
            Ok(outcome) => {
                result
                    .subcollections_copied
                    .push(collections::COACHES.to_string());
                outcome
            }
            Err(e) => {
                tracing::warn!(team_id, error = %e, "Coaches subcollection failed to copy");
                CoachMigration::default()
            }
        };

        let copier =
            SubcollectionCopier::new(self.legacy_docs.clone(), self.target_docs.clone());
        for collection in collections::TEAM_SUBCOLLECTIONS {
            if *collection == collections::COACHES {
                continue;
            }
            match copier
                .copy(team_id, collection, ids, WriteMode::Overwrite)
                .await
            {
                Ok(_) => result.subcollections_copied.push((*collection).to_string()),
                Err(e) => {
                    tracing::warn!(
                        team_id,
                        collection,
                        error = %e,
                        "Subcollection failed to copy"
                    );
                }
            }
        }

        let blob_migrator = BlobMigrator::new(self.legacy_blobs.clone(), self.target_blobs.clone());
        result.files_copied = match blob_migrator.migrate(team_id).await {
            Ok(copied) => copied,
            Err(e) => {
                tracing::warn!(team_id, error = %e, "Attachment migration failed");
                0
            }
        };

        // Phase B: resolve headCoach into the users collection, or omit it
        // entirely until the head coach migrates.
        let mut team_fields = rewrite_references(&legacy_team.fields, team_id);
        team_fields.remove("headCoach");
        match coach::resolve_head_coach(&legacy_team.fields, &coach_outcome.coach_to_user) {
            Some(head_coach) => {
                team_fields.insert("headCoach".to_string(), head_coach.to_value());
            }
            None => {
                tracing::info!(
                    team_id,
                    "Head coach not migrated yet, leaving headCoach unset"
                );
            }
        }
        team_fields.insert("migratedAt".to_string(), json!(time_utils::now_rfc3339()));

        self.target_docs
            .set_document(
                &paths::team_doc(team_id),
                &team_fields,
                WriteMode::Overwrite,
            )
            .await
            .map_err(|e| {
                tracing::error!(team_id, error = %e, "Team document write failed");
                MigrateError::Migration(ERR_TEAM_MIGRATION_FAILED)
            })?;
        result.team_migrated = true;

        Ok(())
    }

    /// State: PatchCoachAndHeadCoach. The team already exists in the new
    /// store, so this run only patches the migrating user's identity into
    /// it: the matching coach document's `userId`, and `headCoach` if this
    /// user was the legacy head coach. Both are targeted merge patches,
    /// idempotent under concurrent teammate migrations; failures degrade
    /// rather than abort.
    async fn patch_coach_and_head_coach(
        &self,
        legacy_team: Option<&Document>,
        team_id: &str,
        legacy_uid: &str,
        new_uid: &str,
    ) {
        let coaches_path = paths::team_subcollection(team_id, collections::COACHES);
        match self.target_docs.list_collection(&coaches_path).await {
            Ok(coaches) => match coach::find_coach_for_user(&coaches, legacy_uid) {
                Some(coach_doc) => {
                    let mut patch = Map::new();
                    patch.insert("userId".to_string(), Value::String(new_uid.to_string()));
                    let path =
                        paths::team_subdoc(team_id, collections::COACHES, &coach_doc.id);
                    if let Err(e) = self
                        .target_docs
                        .set_document(&path, &patch, WriteMode::Merge)
                        .await
                    {
                        tracing::warn!(team_id, %path, error = %e, "Coach userId patch failed");
                    } else {
                        tracing::debug!(team_id, coach_id = %coach_doc.id, "Patched coach userId");
                    }
                }
                None => {
                    tracing::debug!(
                        team_id,
                        legacy_uid,
                        "No coach document carries this legacy userId, nothing to patch"
                    );
                }
            },
            Err(e) => {
                tracing::warn!(team_id, error = %e, "Could not list coaches for patching");
            }
        }

        let Some(legacy_team) = legacy_team else {
            return;
        };
        match coach::is_legacy_head_coach(
            self.legacy_docs.as_ref(),
            &legacy_team.fields,
            team_id,
            legacy_uid,
        )
        .await
        {
            Ok(true) => {
                let mut patch = Map::new();
                patch.insert(
                    "headCoach".to_string(),
                    Reference::new(collections::USERS, new_uid).to_value(),
                );
                if let Err(e) = self
                    .target_docs
                    .set_document(&paths::team_doc(team_id), &patch, WriteMode::Merge)
                    .await
                {
                    tracing::warn!(team_id, error = %e, "headCoach patch failed");
                } else {
                    tracing::info!(team_id, new_uid, "Patched team headCoach");
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(team_id, error = %e, "Head coach check failed");
            }
        }
    }
}
