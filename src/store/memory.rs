// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store implementing both contracts, for tests and local dry
//! runs. Supports per-path failure injection so partial-failure handling
//! can be exercised without a real backend.

use crate::error::{MigrateError, Result};
use crate::store::{BlobRef, BlobStore, Document, DocumentStore, WriteMode};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// In-memory document + blob store.
#[derive(Default, Clone)]
pub struct MemoryStore {
    docs: Arc<Mutex<BTreeMap<String, Map<String, Value>>>>,
    blobs: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    failing_blob_gets: Arc<Mutex<HashSet<String>>>,
    failing_collections: Arc<Mutex<HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, replacing any existing fields.
    pub fn insert_doc(&self, path: &str, fields: Value) {
        let fields = match fields {
            Value::Object(map) => map,
            other => panic!("document fields must be an object, got {}", other),
        };
        self.docs
            .lock()
            .expect("memory store lock poisoned")
            .insert(path.to_string(), fields);
    }

    /// Seed a blob.
    pub fn insert_blob(&self, path: &str, bytes: &[u8]) {
        self.blobs
            .lock()
            .expect("memory store lock poisoned")
            .insert(path.to_string(), bytes.to_vec());
    }

    /// Make downloads of the given blob path fail.
    pub fn fail_blob_get(&self, path: &str) {
        self.failing_blob_gets
            .lock()
            .expect("memory store lock poisoned")
            .insert(path.to_string());
    }

    /// Make listing of the given collection path fail.
    pub fn fail_collection(&self, path: &str) {
        self.failing_collections
            .lock()
            .expect("memory store lock poisoned")
            .insert(path.to_string());
    }

    /// Snapshot a document's fields, if present.
    pub fn doc_fields(&self, path: &str) -> Option<Map<String, Value>> {
        self.docs
            .lock()
            .expect("memory store lock poisoned")
            .get(path)
            .cloned()
    }

    /// Snapshot a blob's bytes, if present.
    pub fn blob_bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .expect("memory store lock poisoned")
            .get(path)
            .cloned()
    }

    /// Number of documents directly under a collection path.
    pub fn collection_len(&self, path: &str) -> usize {
        let prefix = format!("{}/", path);
        self.docs
            .lock()
            .expect("memory store lock poisoned")
            .keys()
            .filter(|key| {
                key.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.contains('/'))
            })
            .count()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn get_document(&self, path: &str) -> Result<Option<Document>> {
        let docs = self.docs.lock().expect("memory store lock poisoned");
        let id = path.rsplit('/').next().unwrap_or(path);
        Ok(docs.get(path).map(|fields| Document::new(id, fields.clone())))
    }

    async fn set_document(
        &self,
        path: &str,
        fields: &Map<String, Value>,
        mode: WriteMode,
    ) -> Result<()> {
        let mut docs = self.docs.lock().expect("memory store lock poisoned");
        match mode {
            WriteMode::Overwrite => {
                docs.insert(path.to_string(), fields.clone());
            }
            WriteMode::Merge => {
                let target = docs.entry(path.to_string()).or_default();
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    async fn list_collection(&self, path: &str) -> Result<Vec<Document>> {
        if self
            .failing_collections
            .lock()
            .expect("memory store lock poisoned")
            .contains(path)
        {
            return Err(MigrateError::Store(format!(
                "injected failure listing {}",
                path
            )));
        }

        let prefix = format!("{}/", path);
        let docs = self.docs.lock().expect("memory store lock poisoned");
        Ok(docs
            .iter()
            .filter_map(|(key, fields)| {
                let rest = key.strip_prefix(&prefix)?;
                if rest.contains('/') {
                    return None;
                }
                Some(Document::new(rest, fields.clone()))
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryStore {
    async fn list_blobs(&self, prefix: &str) -> Result<Vec<BlobRef>> {
        let blobs = self.blobs.lock().expect("memory store lock poisoned");
        Ok(blobs
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(path, bytes)| BlobRef {
                path: path.clone(),
                size: Some(bytes.len() as u64),
            })
            .collect())
    }

    async fn get_blob_bytes(&self, blob: &BlobRef) -> Result<Vec<u8>> {
        if self
            .failing_blob_gets
            .lock()
            .expect("memory store lock poisoned")
            .contains(&blob.path)
        {
            return Err(MigrateError::Blob(format!(
                "injected failure downloading {}",
                blob.path
            )));
        }

        self.blobs
            .lock()
            .expect("memory store lock poisoned")
            .get(&blob.path)
            .cloned()
            .ok_or_else(|| MigrateError::NotFound(blob.path.clone()))
    }

    async fn put_blob_bytes(&self, path: &str, bytes: &[u8]) -> Result<()> {
        self.blobs
            .lock()
            .expect("memory store lock poisoned")
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}
