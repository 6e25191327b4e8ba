use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use film_blob::{BlobKeyStrategy, BlobStore, DefaultKeyStrategy};
use film_docs::{DocumentStore, Fields};

use crate::types::fields;
use crate::{PhotoId, SyncConfig, SyncError, SyncResult};

/// Persists one image against the remote stores with bounded retry
///
/// One logical upload is: derive a fresh storage key, write the blob,
/// issue its download URL, then create the metadata record. A failure at
/// any step abandons the attempt and starts over from the key derivation;
/// blobs written by failed attempts are left behind as bounded
/// orphaned-blob garbage rather than rolled back.
#[derive(Clone)]
pub struct PhotoUploader {
    store: Arc<dyn BlobStore>,
    docs: Arc<dyn DocumentStore>,
    keys: Arc<dyn BlobKeyStrategy>,
    config: SyncConfig,
}

impl PhotoUploader {
    /// Create a new uploader with the default key layout
    pub fn new(store: Arc<dyn BlobStore>, docs: Arc<dyn DocumentStore>, config: SyncConfig) -> Self {
        Self {
            store,
            docs,
            keys: Arc::new(DefaultKeyStrategy),
            config,
        }
    }

    /// Replace the key strategy
    pub fn with_key_strategy<K: BlobKeyStrategy + 'static>(mut self, keys: K) -> Self {
        self.keys = Arc::new(keys);
        self
    }

    /// Get configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Persist one image, retrying transient failures up to the attempt
    /// budget; returns the id of the created photo record
    #[instrument(skip(self, bytes))]
    pub async fn upload(
        &self,
        owner_id: &str,
        bytes: Bytes,
        is_verification: bool,
    ) -> SyncResult<PhotoId> {
        if bytes.len() as u64 > self.config.max_photo_bytes {
            return Err(SyncError::invalid_photo(format!(
                "payload of {} bytes exceeds maximum {}",
                bytes.len(),
                self.config.max_photo_bytes
            )));
        }

        let attempts = self.config.max_attempts.max(1);
        let mut last_error: Option<SyncError> = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.config.retry_delay).await;
            }
            debug!(attempt, "starting upload attempt");

            match self.attempt_upload(owner_id, &bytes, is_verification).await {
                Ok(photo_id) => {
                    info!(%photo_id, attempt, "photo persisted");
                    return Ok(photo_id);
                }
                Err(error) => {
                    warn!(%error, attempt, "upload attempt failed");
                    last_error = Some(error);
                }
            }
        }

        let source =
            last_error.unwrap_or_else(|| SyncError::invalid_photo("no attempts executed"));
        Err(SyncError::upload_failed(attempts, source))
    }

    /// One full attempt: key -> blob -> URL -> metadata record
    async fn attempt_upload(
        &self,
        owner_id: &str,
        bytes: &Bytes,
        is_verification: bool,
    ) -> SyncResult<PhotoId> {
        let key = self.keys.object_key(owner_id, Utc::now().timestamp_millis());

        self.store.put(&key, bytes.clone()).await?;
        let url = self.store.url_for(&key).await?;

        let record_fields = Fields::new()
            .set(fields::AUTHOR_UID, owner_id)
            .set(fields::EMBEDDINGS, Vec::<f64>::new()) // populated by the enrichment stage
            .set(fields::FILEPATH, &url)
            .set(fields::STORAGE_PATH, &key)
            .set(fields::IS_VERIFICATION_PHOTO, is_verification)
            .set_server_timestamp(fields::CREATED_AT);

        let photo_id = self
            .docs
            .create(&self.config.photos_collection, record_fields)
            .await?;

        Ok(photo_id)
    }
}
