use std::time::Duration;

/// Configuration for the upload/deletion pipeline
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Total attempts per upload task, first try included
    pub max_attempts: u32,

    /// Fixed delay between upload attempts
    pub retry_delay: Duration,

    /// Payloads above this size fail fast without burning remote attempts
    pub max_photo_bytes: u64,

    /// Collection holding the canonical photo records
    pub photos_collection: String,

    /// Collection holding per-owner photo id aggregates
    pub aggregates_collection: String,

    /// Capacity of the lifecycle event channel
    pub event_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            max_photo_bytes: 32 * 1024 * 1024, // 32MB - caller pre-compresses
            photos_collection: "photos".to_string(),
            aggregates_collection: "user_photos".to_string(),
            event_capacity: 256,
        }
    }
}

impl SyncConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-task attempt budget
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the fixed delay between attempts
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the payload size guard
    pub fn with_max_photo_bytes(mut self, bytes: u64) -> Self {
        self.max_photo_bytes = bytes;
        self
    }

    /// Set the photo records collection name
    pub fn with_photos_collection<S: Into<String>>(mut self, collection: S) -> Self {
        self.photos_collection = collection.into();
        self
    }

    /// Set the aggregates collection name
    pub fn with_aggregates_collection<S: Into<String>>(mut self, collection: S) -> Self {
        self.aggregates_collection = collection.into();
        self
    }

    /// Set the event channel capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}
