//! # Triage Vector Store
//!
//! Embedding, similarity search and persistence for review chunks.
//!
//! Chunks are embedded through an [`EmbeddingClient`] — either the hosted
//! embeddings API or a deterministic offline stub — and held in a
//! brute-force cosine [`VectorIndex`]. The [`VectorStore`] ties both
//! together and persists itself as a single JSON snapshot, overwritten
//! whole on save and rebuilt into an index on load.
//!
//! ## Example
//!
//! ```no_run
//! use triage_vector_store::{EmbeddingClient, EmbeddingConfig, VectorStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), triage_vector_store::StoreError> {
//!     let embedder = EmbeddingClient::new(EmbeddingConfig::default())?;
//!     let mut store = VectorStore::new("stores/session.json", embedder);
//!     store.add_chunks(vec![/* chunks */]).await?;
//!     for hit in store.search("user-controlled parameters", 8).await? {
//!         println!("{} (score {:.3})", hit.chunk.meta.url, hit.score);
//!     }
//!     store.save().await?;
//!     Ok(())
//! }
//! ```

mod embeddings;
mod error;
mod index;
mod store;
mod types;

pub use embeddings::{EmbeddingClient, EmbeddingConfig, EmbeddingMode};
pub use error::{Result, StoreError};
pub use index::VectorIndex;
pub use store::VectorStore;
pub use types::{SearchResult, StoredChunk};
