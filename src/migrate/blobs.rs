// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Blob migrator: copies a team's binary attachments between blob stores.
//!
//! Each file is downloaded from the legacy bucket and re-uploaded at the
//! identical path in the new bucket. Per-file failures are logged and
//! skipped; a failed file never fails the team migration.

use crate::error::Result;
use crate::store::{paths, BlobRef, BlobStore};
use futures_util::{stream, StreamExt};
use std::sync::Arc;

const MAX_CONCURRENT_COPIES: usize = 8;

/// Copies team attachments from the legacy to the new blob store.
pub struct BlobMigrator {
    legacy: Arc<dyn BlobStore>,
    target: Arc<dyn BlobStore>,
}

impl BlobMigrator {
    pub fn new(legacy: Arc<dyn BlobStore>, target: Arc<dyn BlobStore>) -> Self {
        Self { legacy, target }
    }

    /// Copy every blob under the team's storage prefix. Returns the number
    /// of files successfully copied.
    pub async fn migrate(&self, team_id: &str) -> Result<usize> {
        let prefix = paths::team_blob_prefix(team_id);
        let blobs = self.legacy.list_blobs(&prefix).await?;
        let total = blobs.len();

        let copied = stream::iter(blobs.iter())
            .map(|blob| async move {
                match self.copy_one(blob).await {
                    Ok(()) => 1usize,
                    Err(e) => {
                        tracing::warn!(
                            path = %blob.path,
                            error = %e,
                            "Skipping attachment that failed to copy"
                        );
                        0
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_COPIES)
            .fold(0usize, |acc, n| async move { acc + n })
            .await;

        tracing::info!(team_id, copied, total, "Migrated team attachments");
        Ok(copied)
    }

    async fn copy_one(&self, blob: &BlobRef) -> Result<()> {
        let bytes = self.legacy.get_blob_bytes(blob).await?;
        self.target.put_blob_bytes(&blob.path, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_copies_all_blobs_under_prefix() {
        let legacy = MemoryStore::new();
        let target = MemoryStore::new();
        legacy.insert_blob("teams/t1/a.pdf", b"aaa");
        legacy.insert_blob("teams/t1/b.png", b"bbb");
        legacy.insert_blob("teams/t2/c.pdf", b"ccc");

        let migrator = BlobMigrator::new(Arc::new(legacy), Arc::new(target.clone()));
        let copied = migrator.migrate("t1").await.unwrap();

        assert_eq!(copied, 2);
        assert_eq!(target.blob_bytes("teams/t1/a.pdf").as_deref(), Some(&b"aaa"[..]));
        assert_eq!(target.blob_bytes("teams/t1/b.png").as_deref(), Some(&b"bbb"[..]));
        assert_eq!(target.blob_bytes("teams/t2/c.pdf"), None);
    }

    #[tokio::test]
    async fn test_failed_file_is_skipped_not_fatal() {
        let legacy = MemoryStore::new();
        let target = MemoryStore::new();
        legacy.insert_blob("teams/t1/a.pdf", b"aaa");
        legacy.insert_blob("teams/t1/b.png", b"bbb");
        legacy.fail_blob_get("teams/t1/a.pdf");

        let migrator = BlobMigrator::new(Arc::new(legacy), Arc::new(target.clone()));
        let copied = migrator.migrate("t1").await.unwrap();

        assert_eq!(copied, 1);
        assert_eq!(target.blob_bytes("teams/t1/a.pdf"), None);
        assert_eq!(target.blob_bytes("teams/t1/b.png").as_deref(), Some(&b"bbb"[..]));
    }
}
