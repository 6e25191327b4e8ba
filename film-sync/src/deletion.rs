use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use film_blob::BlobStore;
use film_docs::{DocumentStore, Fields, Filter, WriteBatch};

use crate::types::fields;
use crate::{PhotoId, SyncConfig, SyncError, SyncResult};

/// Removes a photo record, every aggregate reference to it, and finally
/// its backing blob
///
/// Ordering is mandatory: the record deletion and every reference rewrite
/// commit in one atomic batch *before* the blob is touched, so a crash
/// between the two steps can only ever leave an unreachable orphaned blob,
/// never a live reference to a missing object.
#[derive(Clone)]
pub struct DeletionCoordinator {
    store: Arc<dyn BlobStore>,
    docs: Arc<dyn DocumentStore>,
    config: SyncConfig,
}

impl DeletionCoordinator {
    pub fn new(
        store: Arc<dyn BlobStore>,
        docs: Arc<dyn DocumentStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            docs,
            config,
        }
    }

    /// Delete a photo and all references to it
    ///
    /// Deleting an already-absent photo is a no-op success. A blob-removal
    /// failure after the batch commits is logged and swallowed: no
    /// reachable reference survives at that point, so the object is merely
    /// unreachable garbage for offline reclamation.
    #[instrument(skip(self))]
    pub async fn delete(&self, photo_id: &PhotoId) -> SyncResult<()> {
        let Some(document) = self
            .docs
            .get(&self.config.photos_collection, photo_id)
            .await?
        else {
            warn!("photo does not exist; treating delete as already applied");
            return Ok(());
        };

        let storage_key = document.str_field(fields::STORAGE_PATH).map(str::to_string);

        let mut batch = WriteBatch::new();
        batch.delete(self.config.photos_collection.as_str(), photo_id.clone());

        let referencing = self
            .docs
            .query(
                &self.config.aggregates_collection,
                Filter::array_contains(fields::PHOTO_IDS, photo_id.as_str()),
            )
            .await?;

        let reference_count = referencing.len();
        for aggregate in referencing {
            let remaining: Vec<Value> = aggregate
                .array_field(fields::PHOTO_IDS)
                .map(|ids| {
                    ids.iter()
                        .filter(|id| id.as_str() != Some(photo_id.as_str()))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();

            batch.update(
                self.config.aggregates_collection.as_str(),
                aggregate.id,
                Fields::new().set(fields::PHOTO_IDS, remaining),
            );
        }

        self.docs
            .commit(batch)
            .await
            .map_err(|error| SyncError::deletion_failed(photo_id.clone(), error))?;

        info!(references = reference_count, "photo record and references removed");

        match storage_key {
            Some(key) => {
                if let Err(error) = self.store.delete(&key).await {
                    warn!(%error, %key, "blob removal failed; leaving orphaned object");
                }
            }
            None => {
                warn!("photo document had no storage path; skipping blob removal");
            }
        }

        Ok(())
    }
}
