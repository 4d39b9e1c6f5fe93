use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from embedding, indexing or persistence
#[derive(Error, Debug)]
pub enum StoreError {
    /// The embeddings backend failed or answered with the wrong shape
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Network-level failure talking to the embeddings API
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A vector's length does not match the index dimension
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// Unrecognized embeddings mode in configuration
    #[error("unsupported embeddings mode '{0}' (expected 'api' or 'stub')")]
    UnknownMode(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failure
    #[error("snapshot error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }
}
