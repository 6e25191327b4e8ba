//! # film-sync: the upload/deletion pipeline
//!
//! The stateful heart of the Film client: accepts locally captured images,
//! persists them durably to blob storage plus the metadata index, and
//! keeps the local library view synchronized with canonical remote state.
//!
//! ## Components
//!
//! - [`UploadQueue`] - admits tasks in arrival order and guarantees
//!   sequential, non-overlapping execution: at most one upload is in
//!   flight against the remote stores at any time, strictly FIFO, and a
//!   failed task never blocks the ones behind it.
//! - [`PhotoUploader`] - one logical "persist this image" operation
//!   (blob write, URL issuance, record creation) with bounded retry.
//! - [`LibraryRefresher`] - re-derives the displayed photo list from a
//!   fresh canonical query after every successful mutation, replacing
//!   rather than patching the caller's in-memory state.
//! - [`DeletionCoordinator`] - removes a photo's record and every
//!   aggregate reference to it in one atomic batch, then best-effort
//!   removes the blob, so no surviving reference ever points at a deleted
//!   object.
//!
//! ## Control flow
//!
//! ```text
//! caller ──enqueue──▶ UploadQueue ──FIFO──▶ PhotoUploader ──▶ BlobStore
//!                         │                      │             DocumentStore
//!                         │ on success           ▼
//!                         └──────────▶ LibraryRefresher ──▶ caller renders
//! ```
//!
//! Deletion flows directly through [`DeletionCoordinator`], independent of
//! the queue. Progress is observable through the queue's broadcast
//! [`UploadEvent`] stream.

mod config;
mod deletion;
mod error;
mod events;
mod queue;
mod refresher;
pub mod types;
mod uploader;

pub use config::SyncConfig;
pub use deletion::DeletionCoordinator;
pub use error::{SyncError, SyncResult};
pub use events::UploadEvent;
pub use queue::UploadQueue;
pub use refresher::LibraryRefresher;
pub use types::{PhotoId, PhotoRecord, TaskId, UploadTask};
pub use uploader::PhotoUploader;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        DeletionCoordinator, LibraryRefresher, PhotoId, PhotoRecord, PhotoUploader, SyncConfig,
        SyncError, SyncResult, TaskId, UploadEvent, UploadQueue,
    };
}
