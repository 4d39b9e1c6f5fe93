use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

const STUB_DIMENSION: usize = 256;
const MAX_RETRIES: usize = 3;

/// Which embeddings backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingMode {
    /// Hosted embeddings API
    Api,
    /// Deterministic offline vectors (tests, air-gapped runs)
    Stub,
}

impl EmbeddingMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "stub" => Ok(Self::Stub),
            other => Err(StoreError::UnknownMode(other.to_string())),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Stub => "stub",
        }
    }
}

/// Settings for the embeddings backend.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub dimension: usize,
    pub batch_size: usize,
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Stub,
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            dimension: STUB_DIMENSION,
            batch_size: 64,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Embeds text through the configured backend.
pub struct EmbeddingClient {
    backend: Backend,
}

enum Backend {
    Api(ApiBackend),
    Stub(StubBackend),
}

impl EmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        if config.dimension == 0 {
            return Err(StoreError::embedding("dimension must be positive"));
        }
        let backend = match config.mode {
            EmbeddingMode::Api => Backend::Api(ApiBackend::new(config)?),
            EmbeddingMode::Stub => Backend::Stub(StubBackend {
                dimension: config.dimension,
            }),
        };
        Ok(Self { backend })
    }

    pub fn dimension(&self) -> usize {
        match &self.backend {
            Backend::Api(api) => api.dimension,
            Backend::Stub(stub) => stub.dimension,
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| StoreError::embedding("backend returned no vector"))
    }

    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        match &self.backend {
            Backend::Api(api) => api.embed_batch(texts).await,
            Backend::Stub(stub) => Ok(texts.iter().map(|t| stub.embed(t)).collect()),
        }
    }

    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

/// Hosted embeddings endpoint (OpenAI-compatible wire shape).
struct ApiBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimension: usize,
    batch_size: usize,
}

impl ApiBackend {
    fn new(config: EmbeddingConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(StoreError::embedding("missing embeddings API key"));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_str(&auth)
                .map_err(|_| StoreError::embedding("invalid embeddings API key"))?,
        );
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.api_base.trim_end_matches('/')),
            model: config.model,
            dimension: config.dimension,
            batch_size: config.batch_size.max(1),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for window in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_window(window).await?);
        }
        Ok(vectors)
    }

    async fn embed_window(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let mut attempt = 0usize;
        loop {
            let outcome = self.client.post(&self.endpoint).json(&request).send().await;
            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let mut parsed: EmbeddingResponse = response.json().await?;
                        parsed.data.sort_by_key(|entry| entry.index);
                        if parsed.data.len() != inputs.len() {
                            return Err(StoreError::embedding(format!(
                                "backend returned {} vectors for {} inputs",
                                parsed.data.len(),
                                inputs.len()
                            )));
                        }
                        for entry in &parsed.data {
                            if entry.embedding.len() != self.dimension {
                                return Err(StoreError::InvalidDimension {
                                    expected: self.dimension,
                                    actual: entry.embedding.len(),
                                });
                            }
                        }
                        return Ok(parsed.data.into_iter().map(|e| e.embedding).collect());
                    }

                    let retryable =
                        status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    let body = response.text().await.unwrap_or_default();
                    if retryable && attempt + 1 < MAX_RETRIES {
                        attempt += 1;
                        let delay = Duration::from_millis(500 * (1 << attempt.min(5)));
                        log::warn!("embeddings request returned {status}, retrying in {delay:?}");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(StoreError::embedding(format!(
                        "embeddings request failed ({status}): {body}"
                    )));
                }
                Err(error) => {
                    let retryable = error.is_timeout() || error.is_connect() || error.is_request();
                    if retryable && attempt + 1 < MAX_RETRIES {
                        attempt += 1;
                        tokio::time::sleep(Duration::from_millis(500 * (1 << attempt.min(5))))
                            .await;
                        continue;
                    }
                    return Err(error.into());
                }
            }
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    embedding: Vec<f32>,
    index: usize,
}

/// Deterministic bag-of-tokens vectors: every token hashes to one axis.
/// Not semantically meaningful, but stable and cheap, which is exactly
/// what offline runs and tests need.
struct StubBackend {
    dimension: usize,
}

impl StubBackend {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let axis = Self::token_axis(&token.to_lowercase(), self.dimension);
            vector[axis] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }

    fn token_axis(token: &str, dimension: usize) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(raw) % dimension as u64) as usize
    }
}
