use thiserror::Error;

/// Result type for model-call operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Transport and protocol failures from the hosted model call
#[derive(Error, Debug)]
pub enum LlmError {
    /// No API key was supplied
    #[error("missing API key")]
    MissingApiKey,

    /// Network-level failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("provider returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Serialization failure
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The provider's payload did not match the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
