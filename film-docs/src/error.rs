use thiserror::Error;

/// Result type for document store operations
pub type DocResult<T> = Result<T, DocError>;

/// Errors that can occur during document store operations
#[derive(Error, Debug)]
pub enum DocError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl DocError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<C: Into<String>, I: Into<String>>(collection: C, id: I) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }
}
