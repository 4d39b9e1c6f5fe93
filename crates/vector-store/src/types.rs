use serde::{Deserialize, Serialize};
use triage_chunker::Chunk;

/// A chunk plus its embedding, as persisted in the snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
    pub id: String,
}

/// One retrieval hit
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
    pub id: String,
}
