//! # Triage Chunker
//!
//! Splits normalized documents into bounded, overlapping text windows for
//! embedding. Cut points prefer paragraph breaks, then sentence ends, then
//! hard character cutoffs; consecutive windows from one document share a
//! configured overlap so retrieval does not lose context at the seams.

mod chunker;
mod config;
mod error;
mod types;

pub use chunker::TextChunker;
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
pub use types::Chunk;
