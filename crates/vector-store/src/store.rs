use crate::embeddings::EmbeddingClient;
use crate::error::Result;
use crate::index::VectorIndex;
use crate::types::{SearchResult, StoredChunk};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use triage_chunker::Chunk;

/// Chunk storage with similarity search and a whole-file JSON snapshot.
pub struct VectorStore {
    chunks: HashMap<String, StoredChunk>,
    ids: HashMap<usize, String>,
    index: VectorIndex,
    embedder: EmbeddingClient,
    path: PathBuf,
    next_id: usize,
}

impl VectorStore {
    /// Fresh, empty store that will persist at `path`.
    pub fn new(path: impl AsRef<Path>, embedder: EmbeddingClient) -> Self {
        let dimension = embedder.dimension();
        Self {
            chunks: HashMap::new(),
            ids: HashMap::new(),
            index: VectorIndex::new(dimension),
            embedder,
            path: path.as_ref().to_path_buf(),
            next_id: 0,
        }
    }

    /// Embed and insert a batch. Re-adding a chunk with the same identity
    /// replaces its previous entry.
    pub async fn add_chunks(&mut self, chunks: Vec<Chunk>) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        log::info!("embedding {} chunks", chunks.len());
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let vectors = self.embedder.embed_batch(&contents).await?;

        for (chunk, vector) in chunks.into_iter().zip(vectors.into_iter()) {
            let id = chunk.id();
            let numeric_id = self.next_id;
            self.next_id += 1;

            self.index.add(numeric_id, &vector)?;
            self.ids.insert(numeric_id, id.clone());
            self.chunks.insert(
                id.clone(),
                StoredChunk {
                    chunk,
                    vector,
                    id,
                },
            );
        }

        log::info!("store now holds {} chunks", self.chunks.len());
        Ok(())
    }

    /// Embed the query and return the k most similar chunks.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        log::debug!("searching for '{query}' (k={k})");
        let query_vector = self.embedder.embed(query).await?;
        let neighbors = self.index.search(&query_vector, k)?;

        let mut results = Vec::with_capacity(neighbors.len());
        for (numeric_id, score) in neighbors {
            let Some(id) = self.ids.get(&numeric_id) else {
                continue;
            };
            if let Some(stored) = self.chunks.get(id) {
                results.push(SearchResult {
                    chunk: stored.chunk.clone(),
                    score,
                    id: stored.id.clone(),
                });
            }
        }
        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the snapshot in one write.
    pub async fn save(&self) -> Result<()> {
        log::info!("saving store to {}", self.path.display());
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let data = serde_json::to_string_pretty(&self.chunks)?;
        tokio::fs::write(&self.path, data).await?;
        Ok(())
    }

    /// Load a snapshot and rebuild the index with the given embedder.
    pub async fn load(path: impl AsRef<Path>, embedder: EmbeddingClient) -> Result<Self> {
        let path = path.as_ref();
        log::info!("loading store from {}", path.display());
        let data = tokio::fs::read_to_string(path).await?;
        let chunks: HashMap<String, StoredChunk> = serde_json::from_str(&data)?;

        let dimension = embedder.dimension();
        let mut index = VectorIndex::new(dimension);
        let mut ids = HashMap::new();
        let mut next_id = 0usize;
        for stored in chunks.values() {
            index.add(next_id, &stored.vector)?;
            ids.insert(next_id, stored.id.clone());
            next_id += 1;
        }

        log::info!("loaded {} chunks", chunks.len());
        Ok(Self {
            chunks,
            ids,
            index,
            embedder,
            path: path.to_path_buf(),
            next_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{EmbeddingConfig, EmbeddingMode};
    use tempfile::TempDir;
    use triage_capture::DocMeta;

    fn stub_embedder() -> EmbeddingClient {
        EmbeddingClient::new(EmbeddingConfig {
            mode: EmbeddingMode::Stub,
            ..Default::default()
        })
        .unwrap()
    }

    fn chunk(url: &str, content: &str) -> Chunk {
        Chunk {
            content: content.to_string(),
            meta: DocMeta {
                index: 1,
                method: "GET".to_string(),
                url: url.to_string(),
            },
            part: 1,
            of: 1,
        }
    }

    #[tokio::test]
    async fn add_then_search_returns_the_relevant_chunk() {
        let temp = TempDir::new().unwrap();
        let mut store = VectorStore::new(temp.path().join("store.json"), stub_embedder());

        store
            .add_chunks(vec![
                chunk(
                    "http://vtm.example/search",
                    "GET /search?q=1' OR '1'='1' HTTP/1.1",
                ),
                chunk("http://vtm.example/about", "GET /about HTTP/1.1 static page"),
            ])
            .await
            .unwrap();

        let results = store.search("search q OR injection", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.meta.url, "http://vtm.example/search");
    }

    #[tokio::test]
    async fn save_and_load_round_trip_preserves_search() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stores").join("session.json");

        let mut store = VectorStore::new(&path, stub_embedder());
        store
            .add_chunks(vec![chunk(
                "http://vtm.example/login",
                "POST /login username password csrfmiddlewaretoken",
            )])
            .await
            .unwrap();
        store.save().await.unwrap();

        let reloaded = VectorStore::load(&path, stub_embedder()).await.unwrap();
        assert_eq!(reloaded.len(), 1);
        let results = reloaded.search("login password", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.meta.url, "http://vtm.example/login");
    }

    #[tokio::test]
    async fn loading_a_missing_snapshot_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("absent.json");
        assert!(VectorStore::load(&missing, stub_embedder()).await.is_err());
    }

    #[tokio::test]
    async fn re_adding_a_chunk_replaces_it() {
        let temp = TempDir::new().unwrap();
        let mut store = VectorStore::new(temp.path().join("store.json"), stub_embedder());

        store
            .add_chunks(vec![chunk("http://vtm.example/", "first version")])
            .await
            .unwrap();
        store
            .add_chunks(vec![chunk("http://vtm.example/", "second version")])
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
        let results = store.search("version", 1).await.unwrap();
        assert_eq!(results[0].chunk.content, "second version");
    }
}
