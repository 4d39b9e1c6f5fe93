use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

/// Default window size, matching the session loaders' splitter settings.
pub const DEFAULT_MAX_CHARS: usize = 8_000;
/// Default overlap between consecutive windows.
pub const DEFAULT_OVERLAP: usize = 100;

/// Configuration for the text chunker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Upper bound on a chunk's length, in chars
    pub max_chars: usize,

    /// Trailing chars of a chunk repeated at the start of its successor
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkerConfig {
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self> {
        let config = Self { max_chars, overlap };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants: a window must be non-empty and the overlap must
    /// leave room for forward progress.
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(ChunkerError::invalid_config("max_chars must be positive"));
        }
        if self.overlap >= self.max_chars {
            return Err(ChunkerError::invalid_config(format!(
                "overlap {} must be smaller than max_chars {}",
                self.overlap, self.max_chars
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ChunkerConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_window() {
        assert!(ChunkerConfig::new(100, 100).is_err());
        assert!(ChunkerConfig::new(0, 0).is_err());
        assert!(ChunkerConfig::new(100, 99).is_ok());
    }
}
