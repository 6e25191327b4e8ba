//! # film-blob: key-addressed blob storage for the Film pipeline
//!
//! `film-blob` provides the storage-side primitives the upload/deletion
//! pipeline is built on: a small [`BlobStore`] trait (put, URL issuance,
//! delete, head), a deterministic key layout for photo objects, and an
//! in-memory reference backend.
//!
//! The trait is deliberately narrow. Photos enter the pipeline as whole,
//! pre-compressed images, so `put` takes [`bytes::Bytes`] rather than a
//! stream, and there is no multipart or range machinery. Real backends
//! (S3-compatible stores, hosted object storage) implement the same four
//! operations; [`MemoryBlobStore`] defines the reference semantics and is
//! what the pipeline's tests run against.
//!
//! ```rust
//! use bytes::Bytes;
//! use film_blob::{BlobStore, MemoryBlobStore, BlobKeyStrategy, DefaultKeyStrategy};
//!
//! # #[tokio::main]
//! # async fn main() -> film_blob::BlobResult<()> {
//! let store = MemoryBlobStore::new();
//! let key = DefaultKeyStrategy.object_key("user-123", 1_700_000_000_000);
//!
//! store.put(&key, Bytes::from_static(b"...jpeg bytes...")).await?;
//! let url = store.url_for(&key).await?;
//! assert!(url.ends_with(".jpg"));
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod memory;
pub mod store;

pub use config::BlobConfig;
pub use error::{BlobError, BlobResult};
pub use memory::MemoryBlobStore;
pub use store::{BlobInfo, BlobKeyStrategy, BlobStore, DefaultKeyStrategy, PutResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{BlobConfig, BlobError, BlobResult, BlobStore, MemoryBlobStore};
}
