use thiserror::Error;

use film_blob::BlobError;
use film_docs::DocError;

use crate::PhotoId;

/// Result type for pipeline operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by the upload/deletion pipeline
///
/// Transient storage hiccups never appear here directly: they are retried
/// inside the uploader and only ever surface as the `UploadFailed` cause
/// once the attempt budget is exhausted.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Upload failed after {attempts} attempts: {source}")]
    UploadFailed {
        attempts: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Deletion failed for photo {id}: {source}")]
    DeletionFailed {
        id: PhotoId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Photo not found: {id}")]
    NotFound { id: PhotoId },

    #[error("Invalid photo: {message}")]
    InvalidPhoto { message: String },

    #[error("Blob storage error: {0}")]
    Storage(#[from] BlobError),

    #[error("Document store error: {0}")]
    Documents(#[from] DocError),
}

impl SyncError {
    /// Create a terminal upload failure carrying the last underlying cause
    pub fn upload_failed<E>(attempts: u32, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::UploadFailed {
            attempts,
            source: Box::new(source),
        }
    }

    /// Create a deletion failure carrying the underlying cause
    pub fn deletion_failed<E>(id: PhotoId, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::DeletionFailed {
            id,
            source: Box::new(source),
        }
    }

    /// Create an invalid photo error
    pub fn invalid_photo<S: Into<String>>(message: S) -> Self {
        Self::InvalidPhoto {
            message: message.into(),
        }
    }
}
