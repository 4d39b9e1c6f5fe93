use thiserror::Error;

/// Result type for chunking operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur while splitting documents
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// Invalid configuration
    #[error("invalid chunker configuration: {0}")]
    InvalidConfig(String),

    /// Empty content
    #[error("empty document provided")]
    EmptyContent,
}

impl ChunkerError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
