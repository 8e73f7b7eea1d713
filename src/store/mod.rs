// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Store layer: abstract document/blob store contracts plus the concrete
//! Firestore and Cloud Storage adapters.
//!
//! The migration engine only ever talks to these traits; the production
//! adapters wrap one GCP project each, so a migration run holds a legacy
//! and a new instance of both.

pub mod firestore;
pub mod gcs;
pub mod memory;

pub use firestore::FirestoreStore;
pub use gcs::GcsBlobStore;
pub use memory::MemoryStore;

use crate::error::Result;
use serde_json::{Map, Value};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const TEAMS: &str = "teams";
    pub const COACHES: &str = "coaches";
    pub const PLANS: &str = "plans";
    pub const TEMPLATES: &str = "templates";
    pub const TAGS: &str = "tags";
    pub const PERIODS: &str = "periods";
    pub const FILES: &str = "files";
    pub const ANNOUNCEMENTS: &str = "announcements";

    /// Team subcollections in migration order. Coaches go first so the
    /// coach-to-user mapping exists before anything that references it.
    pub const TEAM_SUBCOLLECTIONS: &[&str] = &[
        COACHES,
        TAGS,
        PLANS,
        TEMPLATES,
        PERIODS,
        FILES,
        ANNOUNCEMENTS,
    ];
}

/// Document path helpers. Paths are slash-separated, Firestore style:
/// `users/{uid}`, `teams/{teamId}/plans/{planId}`.
pub mod paths {
    use super::collections;

    pub fn user_doc(uid: &str) -> String {
        format!("{}/{}", collections::USERS, uid)
    }

    pub fn team_doc(team_id: &str) -> String {
        format!("{}/{}", collections::TEAMS, team_id)
    }

    pub fn team_subcollection(team_id: &str, name: &str) -> String {
        format!("{}/{}/{}", collections::TEAMS, team_id, name)
    }

    pub fn team_subdoc(team_id: &str, name: &str, doc_id: &str) -> String {
        format!("{}/{}/{}/{}", collections::TEAMS, team_id, name, doc_id)
    }

    /// Storage prefix holding a team's binary attachments.
    pub fn team_blob_prefix(team_id: &str) -> String {
        format!("{}/{}/", collections::TEAMS, team_id)
    }
}

/// A document fetched from or destined for a store: its id plus schemaless
/// fields. The engine only interprets the handful of fields it rewrites.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Write semantics for `set_document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole document with the given fields.
    Overwrite,
    /// Patch only the given fields, leaving others on the target untouched.
    Merge,
}

/// Handle to a binary object in a blob store.
#[derive(Debug, Clone)]
pub struct BlobRef {
    /// Object path within the bucket, e.g. `teams/{teamId}/attachment.pdf`
    pub path: String,
    /// Size in bytes, when the listing reports it
    pub size: Option<u64>,
}

/// Abstract document store: the subset of a document database the migration
/// engine needs (CRUD by path plus collection listing).
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by full path, `None` if absent.
    async fn get_document(&self, path: &str) -> Result<Option<Document>>;

    /// Write a document at the given path.
    async fn set_document(
        &self,
        path: &str,
        fields: &Map<String, Value>,
        mode: WriteMode,
    ) -> Result<()>;

    /// List all documents directly under a collection path.
    async fn list_collection(&self, path: &str) -> Result<Vec<Document>>;
}

/// Abstract blob store: list/get/put of binary objects.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// List all blobs whose path starts with `prefix`.
    async fn list_blobs(&self, prefix: &str) -> Result<Vec<BlobRef>>;

    /// Download a blob's bytes.
    async fn get_blob_bytes(&self, blob: &BlobRef) -> Result<Vec<u8>>;

    /// Upload bytes at the given path.
    async fn put_blob_bytes(&self, path: &str, bytes: &[u8]) -> Result<()>;
}
