use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use triage_chunker::ChunkerConfig;
use triage_llm::{AnthropicClient, AnthropicConfig, LlmClient};
use triage_vector_store::{EmbeddingClient, EmbeddingConfig, EmbeddingMode};

const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_RETRIEVAL_K: usize = 8;

/// Everything a run needs, resolved once in `main` and passed by
/// reference. Secrets come from the environment only; `triage.toml`
/// carries the non-secret knobs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub model: String,
    pub llm_api_base: Option<String>,
    pub temperature: f32,
    pub agent_temperature: f32,
    pub agent_max_iterations: usize,
    pub max_tokens: Option<u32>,
    pub embeddings_mode: EmbeddingMode,
    pub embeddings_api_base: Option<String>,
    pub embeddings_model: String,
    pub embeddings_dimension: Option<usize>,
    pub chunk_max_chars: usize,
    pub chunk_overlap: usize,
    pub retrieval_k: usize,
}

/// Optional `triage.toml` overrides. Deliberately has no key fields:
/// credentials never live in the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    model: Option<String>,
    llm_api_base: Option<String>,
    temperature: Option<f32>,
    agent_temperature: Option<f32>,
    agent_max_iterations: Option<usize>,
    max_tokens: Option<u32>,
    embeddings_mode: Option<String>,
    embeddings_api_base: Option<String>,
    embeddings_model: Option<String>,
    embeddings_dimension: Option<usize>,
    chunk_max_chars: Option<usize>,
    chunk_overlap: Option<usize>,
    retrieval_k: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            llm_api_base: None,
            temperature: 0.2,
            agent_temperature: 0.6,
            agent_max_iterations: 15,
            max_tokens: None,
            embeddings_mode: EmbeddingMode::Api,
            embeddings_api_base: None,
            embeddings_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embeddings_dimension: None,
            chunk_max_chars: ChunkerConfig::default().max_chars,
            chunk_overlap: ChunkerConfig::default().overlap,
            retrieval_k: DEFAULT_RETRIEVAL_K,
        }
    }
}

impl RunConfig {
    /// Resolve defaults, then the config file, then environment overrides.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let file = match config_path {
            Some(path) => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?,
            ),
            None => std::fs::read_to_string("triage.toml").ok(),
        };
        if let Some(raw) = file {
            let parsed: FileConfig = toml::from_str(&raw).context("invalid triage.toml")?;
            config.apply_file(parsed)?;
        }

        config.apply_env()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) -> Result<()> {
        if let Some(model) = file.model {
            self.model = model;
        }
        if let Some(base) = file.llm_api_base {
            self.llm_api_base = Some(base);
        }
        if let Some(t) = file.temperature {
            self.temperature = t;
        }
        if let Some(t) = file.agent_temperature {
            self.agent_temperature = t;
        }
        if let Some(n) = file.agent_max_iterations {
            self.agent_max_iterations = n;
        }
        if let Some(n) = file.max_tokens {
            self.max_tokens = Some(n);
        }
        if let Some(mode) = file.embeddings_mode {
            self.embeddings_mode = EmbeddingMode::parse(&mode)?;
        }
        if let Some(base) = file.embeddings_api_base {
            self.embeddings_api_base = Some(base);
        }
        if let Some(model) = file.embeddings_model {
            self.embeddings_model = model;
        }
        if let Some(dim) = file.embeddings_dimension {
            self.embeddings_dimension = Some(dim);
        }
        if let Some(n) = file.chunk_max_chars {
            self.chunk_max_chars = n;
        }
        if let Some(n) = file.chunk_overlap {
            self.chunk_overlap = n;
        }
        if let Some(k) = file.retrieval_k {
            self.retrieval_k = k;
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(model) = env::var("TRIAGE_MODEL") {
            self.model = model;
        }
        if let Ok(base) = env::var("TRIAGE_LLM_API_BASE") {
            self.llm_api_base = Some(base);
        }
        if let Ok(mode) = env::var("TRIAGE_EMBEDDINGS_MODE") {
            self.embeddings_mode = EmbeddingMode::parse(&mode)?;
        }
        if let Ok(base) = env::var("TRIAGE_EMBEDDINGS_API_BASE") {
            self.embeddings_api_base = Some(base);
        }
        if let Ok(model) = env::var("TRIAGE_EMBEDDINGS_MODEL") {
            self.embeddings_model = model;
        }
        if let Ok(dim) = env::var("TRIAGE_EMBEDDINGS_DIMENSION") {
            self.embeddings_dimension =
                Some(dim.parse().context("TRIAGE_EMBEDDINGS_DIMENSION must be a number")?);
        }
        Ok(())
    }

    pub fn chunker_config(&self) -> ChunkerConfig {
        ChunkerConfig {
            max_chars: self.chunk_max_chars,
            overlap: self.chunk_overlap,
        }
    }

    /// Build the chat client. The key is read here, once, from the
    /// environment.
    pub fn llm_client(&self) -> Result<Arc<dyn LlmClient>> {
        let api_key = env::var("TRIAGE_API_KEY")
            .or_else(|_| env::var("ANTHROPIC_API_KEY"))
            .unwrap_or_default();
        let mut llm_config = AnthropicConfig {
            api_key,
            ..Default::default()
        };
        if let Some(base) = &self.llm_api_base {
            llm_config.api_base = base.clone();
        }
        let client = AnthropicClient::new(llm_config)
            .context("set TRIAGE_API_KEY (or ANTHROPIC_API_KEY) to call the model")?;
        Ok(Arc::new(client))
    }

    /// Build the embeddings client for the configured mode.
    pub fn embedder(&self) -> Result<EmbeddingClient> {
        let dimension = self.embeddings_dimension.unwrap_or(match self.embeddings_mode {
            EmbeddingMode::Api => 1_536,
            EmbeddingMode::Stub => 256,
        });
        let mut embed_config = EmbeddingConfig {
            mode: self.embeddings_mode,
            model: self.embeddings_model.clone(),
            dimension,
            api_key: env::var("TRIAGE_EMBEDDINGS_API_KEY")
                .or_else(|_| env::var("OPENAI_API_KEY"))
                .unwrap_or_default(),
            timeout: Duration::from_secs(60),
            ..Default::default()
        };
        if let Some(base) = &self.embeddings_api_base {
            embed_config.api_base = base.clone();
        }
        EmbeddingClient::new(embed_config)
            .context("set TRIAGE_EMBEDDINGS_API_KEY (or OPENAI_API_KEY), or use embeddings mode 'stub'")
    }
}
