use async_trait::async_trait;
use bytes::Bytes;

use crate::BlobResult;

/// Core blob storage operations - must be implemented by all storage backends
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob under the given key, overwriting any existing object
    async fn put(&self, key: &str, bytes: Bytes) -> BlobResult<PutResult>;

    /// Issue a durable, externally fetchable URL for a stored blob
    async fn url_for(&self, key: &str) -> BlobResult<String>;

    /// Delete a blob
    async fn delete(&self, key: &str) -> BlobResult<()>;

    /// Get blob metadata without content, or `None` if the key is absent
    async fn head(&self, key: &str) -> BlobResult<Option<BlobInfo>>;
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutResult {
    pub size_bytes: u64,
}

/// Metadata about a stored blob
#[derive(Debug, Clone)]
pub struct BlobInfo {
    pub size_bytes: u64,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

/// Strategy for generating photo object keys
pub trait BlobKeyStrategy: Send + Sync {
    /// Generate the key for an owner's photo, stamped with capture time
    fn object_key(&self, owner_id: &str, stamp_millis: i64) -> String;
}

/// Default key strategy: users/{owner}/photos/{millis}.jpg
///
/// The millisecond stamp is unique in practice because the pipeline never
/// runs two uploads concurrently on one device.
#[derive(Debug, Clone)]
pub struct DefaultKeyStrategy;

impl BlobKeyStrategy for DefaultKeyStrategy {
    fn object_key(&self, owner_id: &str, stamp_millis: i64) -> String {
        format!("users/{}/photos/{}.jpg", owner_id, stamp_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_key_layout() {
        let key = DefaultKeyStrategy.object_key("user-1", 1_700_000_000_000);
        assert_eq!(key, "users/user-1/photos/1700000000000.jpg");
    }
}
