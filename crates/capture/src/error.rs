use thiserror::Error;

/// Result type for capture parsing operations
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Errors raised while reading a session capture
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The file is not well-formed markup
    #[error("malformed capture file: {0}")]
    Malformed(String),

    /// A transaction is missing a required child or attribute
    #[error("transaction {index} is missing required field '{field}'")]
    MissingField { index: usize, field: &'static str },

    /// A field flagged base64 failed to decode to UTF-8 text
    #[error("transaction {index}: field '{field}' is not valid base64 text")]
    Decode { index: usize, field: &'static str },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// True when the error affects a single transaction and a batch
    /// consumer may skip the record and continue.
    pub fn is_record_scoped(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
