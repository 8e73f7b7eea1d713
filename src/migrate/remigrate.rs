// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Re-migration driver: re-copies a caller-chosen subset of subcollections
//! for a user who has already completed the main migration.
//!
//! Explicitly user-invoked, never part of the sign-in flow. Uses merge
//! writes so fields absent from the source stay untouched on the target,
//! and emits one progress event per subcollection for a caller-rendered
//! indicator. Reuses the identity map and reference resolver; coach
//! resolution and attachment migration are not re-run.

use crate::error::{MigrateError, Result};
use crate::migrate::identity;
use crate::migrate::orchestrator::{ERR_NO_TEAM_REFERENCE, ERR_OLD_USER_NOT_FOUND};
use crate::migrate::subcollections::SubcollectionCopier;
use crate::model::Reference;
use crate::store::{paths, DocumentStore, WriteMode};
use std::sync::Arc;

/// Progress event emitted once per subcollection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub step: &'static str,
    pub current: usize,
    pub total: usize,
    pub item_name: String,
}

/// Summary of a re-migration run.
#[derive(Debug, Clone, Default)]
pub struct RemigrationSummary {
    /// Subcollections that copied successfully.
    pub subcollections_copied: Vec<String>,
    /// Total documents written across all of them.
    pub documents_copied: usize,
}

/// Re-runs subcollection copies against an already-migrated team.
pub struct RemigrationDriver {
    legacy_docs: Arc<dyn DocumentStore>,
    target_docs: Arc<dyn DocumentStore>,
}

impl RemigrationDriver {
    pub fn new(legacy_docs: Arc<dyn DocumentStore>, target_docs: Arc<dyn DocumentStore>) -> Self {
        Self {
            legacy_docs,
            target_docs,
        }
    }

    /// Re-copy the named subcollections with merge semantics, reporting
    /// progress through `on_progress`.
    pub async fn remigrate<F>(
        &self,
        legacy_uid: &str,
        new_uid: &str,
        subcollections: &[String],
        mut on_progress: F,
    ) -> Result<RemigrationSummary>
    where
        F: FnMut(ProgressEvent),
    {
        tracing::info!(
            legacy_uid,
            new_uid,
            subcollections = ?subcollections,
            "Starting re-migration"
        );

        let legacy_user = self
            .legacy_docs
            .get_document(&paths::user_doc(legacy_uid))
            .await?
            .ok_or(MigrateError::Migration(ERR_OLD_USER_NOT_FOUND))?;

        let team_id = legacy_user
            .fields
            .get("teamRef")
            .and_then(Reference::parse)
            .map(|r| r.id)
            .ok_or(MigrateError::Migration(ERR_NO_TEAM_REFERENCE))?;

        let ids = identity::build_team_identity_map(
            self.legacy_docs.as_ref(),
            self.target_docs.as_ref(),
            &team_id,
            legacy_uid,
            new_uid,
        )
        .await?;

        let copier = SubcollectionCopier::new(self.legacy_docs.clone(), self.target_docs.clone());
        let total = subcollections.len();
        let mut summary = RemigrationSummary::default();

        for (index, collection) in subcollections.iter().enumerate() {
            on_progress(ProgressEvent {
                step: "subcollection",
                current: index + 1,
                total,
                item_name: collection.clone(),
            });

            match copier
                .copy(&team_id, collection, &ids, WriteMode::Merge)
                .await
            {
                Ok(copied) => {
                    summary.subcollections_copied.push(collection.clone());
                    summary.documents_copied += copied;
                }
                Err(e) => {
                    tracing::warn!(
                        %team_id,
                        collection = %collection,
                        error = %e,
                        "Subcollection failed to re-copy"
                    );
                }
            }
        }

        tracing::info!(
            legacy_uid,
            new_uid,
            %team_id,
            copied = summary.documents_copied,
            "Re-migration complete"
        );

        Ok(summary)
    }
}
