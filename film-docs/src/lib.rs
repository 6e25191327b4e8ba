//! # film-docs: the queryable metadata index behind the Film pipeline
//!
//! A minimal document-database abstraction: collections of JSON documents
//! with store-assigned ids, equality/array-membership queries in stable
//! creation order, server-assigned timestamps, and all-or-nothing write
//! batches.
//!
//! The pipeline needs exactly this surface and nothing more - single
//! document creates and reads, filtered queries, and one atomic batch
//! shape (delete a record + rewrite every aggregate that references it).
//! Hosted document databases implement [`DocumentStore`] behind the same
//! trait; [`MemoryDocumentStore`] is the reference backend and defines the
//! batch atomicity semantics the pipeline's consistency argument rests on.
//!
//! ```rust
//! use film_docs::{DocumentStore, Fields, Filter, MemoryDocumentStore};
//!
//! # #[tokio::main]
//! # async fn main() -> film_docs::DocResult<()> {
//! let store = MemoryDocumentStore::new();
//!
//! let id = store
//!     .create(
//!         "photos",
//!         Fields::new()
//!             .set("author_uid", "user-123")
//!             .set_server_timestamp("created_at"),
//!     )
//!     .await?;
//!
//! let mine = store
//!     .query("photos", Filter::field_eq("author_uid", "user-123"))
//!     .await?;
//! assert_eq!(mine[0].id, id);
//! # Ok(())
//! # }
//! ```

mod batch;
mod error;
mod memory;
pub mod store;
mod types;

pub use batch::{WriteBatch, WriteOp};
pub use error::{DocError, DocResult};
pub use memory::MemoryDocumentStore;
pub use store::DocumentStore;
pub use types::{DocId, Document, FieldValue, Fields, Filter};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        DocError, DocId, DocResult, Document, DocumentStore, Fields, Filter, MemoryDocumentStore,
        WriteBatch,
    };
}
