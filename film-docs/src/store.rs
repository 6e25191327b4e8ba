use async_trait::async_trait;

use crate::{DocId, DocResult, Document, Fields, Filter, WriteBatch};

/// Core document store operations - must be implemented by all backends
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document with a store-assigned id
    async fn create(&self, collection: &str, fields: Fields) -> DocResult<DocId>;

    /// Fetch a single document, or `None` if it does not exist
    async fn get(&self, collection: &str, id: &DocId) -> DocResult<Option<Document>>;

    /// Query a collection; results are ordered by creation sequence
    async fn query(&self, collection: &str, filter: Filter) -> DocResult<Vec<Document>>;

    /// Commit a write batch atomically - every operation applies or none do
    async fn commit(&self, batch: WriteBatch) -> DocResult<()>;
}
