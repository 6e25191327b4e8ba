use std::sync::Arc;

use tracing::{debug, instrument, warn};

use film_docs::{DocumentStore, Filter};

use crate::types::fields;
use crate::{PhotoRecord, SyncConfig, SyncResult};

/// Re-derives the displayed photo library from canonical remote state
///
/// The contract is replace, not merge: callers throw away their in-memory
/// list and take the returned one wholesale. Local patching after a
/// mutation would drift from truth as soon as another session touches the
/// owner's photo set; a full pull keeps the visible list a subset of the
/// canonical record set as of the most recent refresh.
#[derive(Clone)]
pub struct LibraryRefresher {
    docs: Arc<dyn DocumentStore>,
    config: SyncConfig,
}

impl LibraryRefresher {
    pub fn new(docs: Arc<dyn DocumentStore>, config: SyncConfig) -> Self {
        Self { docs, config }
    }

    /// Fetch every photo record owned by `owner_id`, in canonical order
    #[instrument(skip(self))]
    pub async fn refresh(&self, owner_id: &str) -> SyncResult<Vec<PhotoRecord>> {
        let documents = self
            .docs
            .query(
                &self.config.photos_collection,
                Filter::field_eq(fields::AUTHOR_UID, owner_id),
            )
            .await?;

        let mut photos = Vec::with_capacity(documents.len());
        for document in &documents {
            match PhotoRecord::from_document(document) {
                Ok(record) => photos.push(record),
                Err(error) => {
                    warn!(id = %document.id, %error, "skipping unreadable photo document");
                }
            }
        }

        debug!(count = photos.len(), "library refreshed");
        Ok(photos)
    }

    /// Whether the owner has at least one verification photo on record
    #[instrument(skip(self))]
    pub async fn has_verification_photo(&self, owner_id: &str) -> SyncResult<bool> {
        let matches = self
            .docs
            .query(
                &self.config.photos_collection,
                Filter::and(vec![
                    Filter::field_eq(fields::AUTHOR_UID, owner_id),
                    Filter::field_eq(fields::IS_VERIFICATION_PHOTO, true),
                ]),
            )
            .await?;

        Ok(!matches.is_empty())
    }
}
