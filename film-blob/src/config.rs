/// Configuration for blob storage backends
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Absolute max size allowed for a single blob (safety guard)
    pub max_blob_bytes: u64,

    /// Base used when issuing download URLs for stored objects
    pub url_base: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            max_blob_bytes: 32 * 1024 * 1024, // 32MB - images arrive pre-compressed
            url_base: "memory://".to_string(),
        }
    }
}

impl BlobConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max blob size
    pub fn with_max_blob_bytes(mut self, bytes: u64) -> Self {
        self.max_blob_bytes = bytes;
        self
    }

    /// Set the URL base used for issued download URLs
    pub fn with_url_base<S: Into<String>>(mut self, base: S) -> Self {
        self.url_base = base.into();
        self
    }
}
