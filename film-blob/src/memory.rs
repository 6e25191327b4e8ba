use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{BlobConfig, BlobError, BlobInfo, BlobResult, BlobStore, PutResult};

/// In-memory backend for testing and development
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, StoredBlob>>,
    config: BlobConfig,
}

struct StoredBlob {
    bytes: Bytes,
    uploaded_at: DateTime<Utc>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::with_config(BlobConfig::default())
    }

    pub fn with_config(config: BlobConfig) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Number of stored objects
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Check whether a key currently holds an object
    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    fn url(&self, key: &str) -> String {
        format!("{}{}", self.config.url_base, key)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Bytes) -> BlobResult<PutResult> {
        let size_bytes = bytes.len() as u64;
        if size_bytes > self.config.max_blob_bytes {
            return Err(BlobError::invalid(format!(
                "Blob size {} exceeds maximum {}",
                size_bytes, self.config.max_blob_bytes
            )));
        }

        let stored = StoredBlob {
            bytes,
            uploaded_at: Utc::now(),
        };
        self.objects.write().await.insert(key.to_string(), stored);

        Ok(PutResult { size_bytes })
    }

    async fn url_for(&self, key: &str) -> BlobResult<String> {
        let objects = self.objects.read().await;
        if !objects.contains_key(key) {
            return Err(BlobError::not_found(key));
        }
        Ok(self.url(key))
    }

    async fn delete(&self, key: &str) -> BlobResult<()> {
        let mut objects = self.objects.write().await;
        objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BlobError::not_found(key))
    }

    async fn head(&self, key: &str) -> BlobResult<Option<BlobInfo>> {
        let objects = self.objects.read().await;
        Ok(objects.get(key).map(|stored| BlobInfo {
            size_bytes: stored.bytes.len() as u64,
            uploaded_at: stored.uploaded_at,
        }))
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}
