use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use film_docs::{DocId, Document};

use crate::{SyncError, SyncResult};

/// A photo's identity is the document id assigned by the metadata store,
/// not its blob path.
pub type PhotoId = DocId;

/// Wire field names of the photo record and aggregate documents
pub mod fields {
    pub const AUTHOR_UID: &str = "author_uid";
    pub const EMBEDDINGS: &str = "embeddings";
    pub const FILEPATH: &str = "filepath";
    pub const STORAGE_PATH: &str = "storage_path";
    pub const IS_VERIFICATION_PHOTO: &str = "is_verification_photo";
    pub const CREATED_AT: &str = "created_at";
    pub const PHOTO_IDS: &str = "photo_ids";
}

/// Unique identifier for an enqueued upload task
///
/// Lets observers correlate lifecycle events with the enqueue call that
/// produced them; distinct from [`PhotoId`], which only exists once the
/// record has been created remotely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a new unique task ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a task ID from a string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A pending image upload, owned by the queue until it reaches a terminal
/// outcome
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub task_id: TaskId,
    pub owner_id: String,
    pub bytes: Bytes,
    pub is_verification_photo: bool,
    pub enqueued_at: DateTime<Utc>,
}

impl UploadTask {
    /// Create a new task stamped with the current time
    pub fn new<S: Into<String>>(owner_id: S, bytes: Bytes, is_verification_photo: bool) -> Self {
        Self {
            task_id: TaskId::new(),
            owner_id: owner_id.into(),
            bytes,
            is_verification_photo,
            enqueued_at: Utc::now(),
        }
    }
}

/// The canonical, server-assigned representation of a stored photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: PhotoId,
    pub owner_id: String,
    /// Externally fetchable download URL
    pub blob_url: String,
    /// Blob store key, kept so deletion can address the object directly.
    /// Absent on records written before the key was persisted.
    pub storage_key: Option<String>,
    pub is_verification_photo: bool,
    pub created_at: DateTime<Utc>,
}

impl PhotoRecord {
    /// Parse a photo record out of its stored document
    pub fn from_document(doc: &Document) -> SyncResult<Self> {
        let owner_id = doc
            .str_field(fields::AUTHOR_UID)
            .ok_or_else(|| SyncError::invalid_photo("missing author_uid"))?
            .to_string();
        let blob_url = doc
            .str_field(fields::FILEPATH)
            .ok_or_else(|| SyncError::invalid_photo("missing filepath"))?
            .to_string();
        let storage_key = doc.str_field(fields::STORAGE_PATH).map(str::to_string);
        let is_verification_photo = doc.bool_field(fields::IS_VERIFICATION_PHOTO).unwrap_or(false);
        let created_at = doc
            .get(fields::CREATED_AT)
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .ok_or_else(|| SyncError::invalid_photo("missing or malformed created_at"))?;

        Ok(Self {
            id: doc.id.clone(),
            owner_id,
            blob_url,
            storage_key,
            is_verification_photo,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn photo_document(fields_json: serde_json::Value) -> Document {
        Document {
            id: DocId::from("photo-1"),
            fields: fields_json.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_record_parses_from_document() {
        let doc = photo_document(json!({
            "author_uid": "u1",
            "embeddings": [],
            "filepath": "memory://users/u1/photos/1.jpg",
            "storage_path": "users/u1/photos/1.jpg",
            "is_verification_photo": false,
            "created_at": Utc::now(),
        }));

        let record = PhotoRecord::from_document(&doc).unwrap();
        assert_eq!(record.id.as_str(), "photo-1");
        assert_eq!(record.owner_id, "u1");
        assert_eq!(record.storage_key.as_deref(), Some("users/u1/photos/1.jpg"));
        assert!(!record.is_verification_photo);
    }

    #[test]
    fn test_record_requires_owner_and_url() {
        let doc = photo_document(json!({ "created_at": Utc::now() }));
        let result = PhotoRecord::from_document(&doc);
        assert!(matches!(result, Err(SyncError::InvalidPhoto { .. })));
    }

    #[test]
    fn test_storage_key_is_optional() {
        let doc = photo_document(json!({
            "author_uid": "u1",
            "filepath": "memory://a.jpg",
            "is_verification_photo": true,
            "created_at": Utc::now(),
        }));

        let record = PhotoRecord::from_document(&doc).unwrap();
        assert!(record.storage_key.is_none());
        assert!(record.is_verification_photo);
    }
}
