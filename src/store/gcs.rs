// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Storage adapter for the [`BlobStore`] contract.
//!
//! Talks to the GCS JSON API directly over reqwest, authenticated with a
//! gcloud-sdk token source. One instance wraps one bucket.

use crate::error::{MigrateError, Result};
use crate::store::{BlobRef, BlobStore};
use serde::Deserialize;

const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";

/// Cloud Storage blob store for a single bucket.
pub struct GcsBlobStore {
    bucket: String,
    http: reqwest::Client,
    token_gen: Option<gcloud_sdk::GoogleAuthTokenGenerator>,
}

/// Response shape of `GET /storage/v1/b/{bucket}/o`.
#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<ObjectResource>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ObjectResource {
    name: String,
    size: Option<String>,
}

impl GcsBlobStore {
    /// Create a blob store for the given bucket, authenticating via the
    /// default GCP credential chain.
    pub async fn new(bucket: &str) -> Result<Self> {
        let token_gen = gcloud_sdk::GoogleAuthTokenGenerator::new(
            gcloud_sdk::TokenSourceType::Default,
            vec![STORAGE_SCOPE.to_string()],
        )
        .await
        .map_err(|e| MigrateError::Blob(format!("Failed to initialize GCS auth: {}", e)))?;

        tracing::info!(bucket, "Cloud Storage client initialized");

        Ok(Self {
            bucket: bucket.to_string(),
            http: reqwest::Client::new(),
            token_gen: Some(token_gen),
        })
    }

    /// Create a mock blob store for testing (offline mode).
    ///
    /// All operations return an error if called.
    pub fn new_mock(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            http: reqwest::Client::new(),
            token_gen: None,
        }
    }

    async fn auth_header(&self) -> Result<String> {
        let token_gen = self.token_gen.as_ref().ok_or_else(|| {
            MigrateError::Blob("Blob store not connected (offline mode)".to_string())
        })?;
        let token = token_gen
            .create_token()
            .await
            .map_err(|e| MigrateError::Blob(format!("Failed to obtain GCS token: {}", e)))?;
        Ok(token.header_value())
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "https://storage.googleapis.com/storage/v1/b/{}/o/{}",
            self.bucket,
            urlencoding::encode(path)
        )
    }
}

#[async_trait::async_trait]
impl BlobStore for GcsBlobStore {
    async fn list_blobs(&self, prefix: &str) -> Result<Vec<BlobRef>> {
        let auth = self.auth_header().await?;
        let base_url = format!(
            "https://storage.googleapis.com/storage/v1/b/{}/o",
            self.bucket
        );

        let mut blobs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .http
                .get(&base_url)
                .header(reqwest::header::AUTHORIZATION, &auth)
                .query(&[("prefix", prefix)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response: ListResponse = request
                .send()
                .await
                .map_err(|e| MigrateError::Blob(format!("GCS list failed: {}", e)))?
                .error_for_status()
                .map_err(|e| MigrateError::Blob(format!("GCS list failed: {}", e)))?
                .json()
                .await
                .map_err(|e| MigrateError::Blob(format!("GCS list decode failed: {}", e)))?;

            blobs.extend(response.items.into_iter().map(|obj| BlobRef {
                path: obj.name,
                size: obj.size.and_then(|s| s.parse().ok()),
            }));

            match response.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(blobs)
    }

    async fn get_blob_bytes(&self, blob: &BlobRef) -> Result<Vec<u8>> {
        let auth = self.auth_header().await?;
        let url = format!("{}?alt=media", self.object_url(&blob.path));

        let bytes = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, &auth)
            .send()
            .await
            .map_err(|e| MigrateError::Blob(format!("GCS download failed: {}", e)))?
            .error_for_status()
            .map_err(|e| MigrateError::Blob(format!("GCS download failed: {}", e)))?
            .bytes()
            .await
            .map_err(|e| MigrateError::Blob(format!("GCS download failed: {}", e)))?;

        Ok(bytes.to_vec())
    }

    async fn put_blob_bytes(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let auth = self.auth_header().await?;
        let url = format!(
            "https://storage.googleapis.com/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.bucket,
            urlencoding::encode(path)
        );

        self.http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, &auth)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| MigrateError::Blob(format!("GCS upload failed: {}", e)))?
            .error_for_status()
            .map_err(|e| MigrateError::Blob(format!("GCS upload failed: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_mock_errors() {
        let store = GcsBlobStore::new_mock("test-bucket");
        let err = store.list_blobs("teams/t1/").await.unwrap_err();
        assert!(matches!(err, MigrateError::Blob(_)));
    }

    #[test]
    fn test_object_url_encodes_path() {
        let store = GcsBlobStore::new_mock("b");
        assert_eq!(
            store.object_url("teams/t1/file.pdf"),
            "https://storage.googleapis.com/storage/v1/b/b/o/teams%2Ft1%2Ffile.pdf"
        );
    }
}
