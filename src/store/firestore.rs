// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore adapter for the [`DocumentStore`] contract.
//!
//! One instance wraps one GCP project; a migration run holds two (legacy
//! source and new target). Documents cross this boundary as schemaless
//! `serde_json` maps since migration only interprets the fields it rewrites.

use crate::error::{MigrateError, Result};
use crate::store::{Document, DocumentStore, WriteMode};
use serde_json::{Map, Value};

/// Firestore-backed document store for a single project.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

/// A parsed document path: `users/{id}` or `teams/{id}/{sub}/{id}`.
struct DocPath<'a> {
    parent: Option<(&'a str, &'a str)>,
    collection: &'a str,
    id: &'a str,
}

fn split_doc_path(path: &str) -> Result<DocPath<'_>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [col, id] => Ok(DocPath {
            parent: None,
            collection: col,
            id,
        }),
        [pcol, pid, col, id] => Ok(DocPath {
            parent: Some((pcol, pid)),
            collection: col,
            id,
        }),
        _ => Err(MigrateError::InvalidPath(path.to_string())),
    }
}

/// A parsed collection path: `users` or `teams/{id}/{sub}`.
struct ColPath<'a> {
    parent: Option<(&'a str, &'a str)>,
    collection: &'a str,
}

fn split_col_path(path: &str) -> Result<ColPath<'_>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [col] => Ok(ColPath {
            parent: None,
            collection: col,
        }),
        [pcol, pid, col] => Ok(ColPath {
            parent: Some((pcol, pid)),
            collection: col,
        }),
        _ => Err(MigrateError::InvalidPath(path.to_string())),
    }
}

fn doc_id_from_name(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

impl FirestoreStore {
    /// Connect to Firestore for the given project.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| MigrateError::Store(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            MigrateError::Store(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All operations return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| MigrateError::Store("Database not connected (offline mode)".to_string()))
    }
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreStore {
    async fn get_document(&self, path: &str) -> Result<Option<Document>> {
        let client = self.get_client()?;
        let doc_path = split_doc_path(path)?;

        let fields: Option<Map<String, Value>> = match doc_path.parent {
            Some((pcol, pid)) => {
                let parent = client
                    .parent_path(pcol, pid)
                    .map_err(|e| MigrateError::Store(e.to_string()))?;
                client
                    .fluent()
                    .select()
                    .by_id_in(doc_path.collection)
                    .parent(&parent)
                    .obj()
                    .one(doc_path.id)
                    .await
                    .map_err(|e| MigrateError::Store(e.to_string()))?
            }
            None => client
                .fluent()
                .select()
                .by_id_in(doc_path.collection)
                .obj()
                .one(doc_path.id)
                .await
                .map_err(|e| MigrateError::Store(e.to_string()))?,
        };

        Ok(fields.map(|f| Document::new(doc_path.id, f)))
    }

    async fn set_document(
        &self,
        path: &str,
        fields: &Map<String, Value>,
        mode: WriteMode,
    ) -> Result<()> {
        let client = self.get_client()?;
        let doc_path = split_doc_path(path)?;

        // Merge writes patch only the supplied fields via an update mask.
        let mask: Option<Vec<String>> = match mode {
            WriteMode::Overwrite => None,
            WriteMode::Merge => Some(fields.keys().cloned().collect()),
        };

        macro_rules! execute_update {
            ($builder:expr) => {{
                let builder = $builder;
                let _: () = match doc_path.parent {
                    Some((pcol, pid)) => {
                        let parent = client
                            .parent_path(pcol, pid)
                            .map_err(|e| MigrateError::Store(e.to_string()))?;
                        builder
                            .in_col(doc_path.collection)
                            .document_id(doc_path.id)
                            .parent(&parent)
                            .object(fields)
                            .execute()
                            .await
                            .map_err(|e| MigrateError::Store(e.to_string()))?
                    }
                    None => builder
                        .in_col(doc_path.collection)
                        .document_id(doc_path.id)
                        .object(fields)
                        .execute()
                        .await
                        .map_err(|e| MigrateError::Store(e.to_string()))?,
                };
            }};
        }

        match mask {
            Some(mask) => execute_update!(client.fluent().update().fields(mask)),
            None => execute_update!(client.fluent().update()),
        }

        Ok(())
    }

    async fn list_collection(&self, path: &str) -> Result<Vec<Document>> {
        let client = self.get_client()?;
        let col_path = split_col_path(path)?;

        let raw_docs = match col_path.parent {
            Some((pcol, pid)) => {
                let parent = client
                    .parent_path(pcol, pid)
                    .map_err(|e| MigrateError::Store(e.to_string()))?;
                client
                    .fluent()
                    .select()
                    .from(col_path.collection)
                    .parent(&parent)
                    .query()
                    .await
                    .map_err(|e| MigrateError::Store(e.to_string()))?
            }
            None => client
                .fluent()
                .select()
                .from(col_path.collection)
                .query()
                .await
                .map_err(|e| MigrateError::Store(e.to_string()))?,
        };

        let mut docs = Vec::with_capacity(raw_docs.len());
        for raw in &raw_docs {
            let fields: Map<String, Value> = firestore::FirestoreDb::deserialize_doc_to(raw)
                .map_err(|e| MigrateError::Store(e.to_string()))?;
            docs.push(Document::new(doc_id_from_name(&raw.name), fields));
        }

        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_doc_path_root() {
        let parsed = split_doc_path("users/u1").unwrap();
        assert!(parsed.parent.is_none());
        assert_eq!(parsed.collection, "users");
        assert_eq!(parsed.id, "u1");
    }

    #[test]
    fn test_split_doc_path_nested() {
        let parsed = split_doc_path("teams/t1/plans/p1").unwrap();
        assert_eq!(parsed.parent, Some(("teams", "t1")));
        assert_eq!(parsed.collection, "plans");
        assert_eq!(parsed.id, "p1");
    }

    #[test]
    fn test_split_doc_path_rejects_collection_path() {
        assert!(split_doc_path("teams/t1/plans").is_err());
        assert!(split_doc_path("users").is_err());
    }

    #[test]
    fn test_split_col_path() {
        let parsed = split_col_path("teams/t1/plans").unwrap();
        assert_eq!(parsed.parent, Some(("teams", "t1")));
        assert_eq!(parsed.collection, "plans");

        let root = split_col_path("users").unwrap();
        assert!(root.parent.is_none());
        assert_eq!(root.collection, "users");
    }

    #[tokio::test]
    async fn test_offline_mock_errors() {
        let store = FirestoreStore::new_mock();
        let err = store.get_document("users/u1").await.unwrap_err();
        assert!(matches!(err, MigrateError::Store(_)));
    }
}
