use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PhotoId, PhotoRecord, TaskId};

/// Lifecycle events emitted by the upload queue
///
/// The observable form of a task's state machine: enqueued, picked up by
/// the drain worker, then exactly one terminal outcome. A refresh event
/// follows every successful upload with the re-fetched canonical library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UploadEvent {
    /// Task was appended to the pending list
    Enqueued {
        task_id: TaskId,
        owner_id: String,
        at: DateTime<Utc>,
    },

    /// The drain worker started executing the task
    Started { task_id: TaskId, at: DateTime<Utc> },

    /// Task completed; the canonical record now exists
    Succeeded {
        task_id: TaskId,
        photo_id: PhotoId,
        at: DateTime<Utc>,
    },

    /// Task exhausted its attempt budget
    Failed {
        task_id: TaskId,
        error: String,
        at: DateTime<Utc>,
    },

    /// The owner's library was re-derived from canonical remote state
    LibraryRefreshed {
        owner_id: String,
        photos: Vec<PhotoRecord>,
        at: DateTime<Utc>,
    },
}

impl UploadEvent {
    /// Get event type name as string
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Enqueued { .. } => "enqueued",
            Self::Started { .. } => "started",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
            Self::LibraryRefreshed { .. } => "library_refreshed",
        }
    }

    /// Get the task ID, for events tied to a single task
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::Enqueued { task_id, .. }
            | Self::Started { task_id, .. }
            | Self::Succeeded { task_id, .. }
            | Self::Failed { task_id, .. } => Some(task_id),
            Self::LibraryRefreshed { .. } => None,
        }
    }

    /// Whether this event is a terminal task outcome
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}
