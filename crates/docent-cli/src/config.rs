//! Settings and path resolution for the CLI.
//!
//! Everything is driven by environment variables with the defaults the
//! service ships with; the data directory falls back to the platform
//! standard location.

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use docent_core::config::{GenerationOptions, RetrievalConfig, SimilarityMetric};
use std::path::PathBuf;
use std::time::Duration;

/// Index artifact file name inside the data directory.
const INDEX_FILENAME: &str = "index.docent";

/// Directory for retained raw source files inside the data directory.
const SOURCES_DIRNAME: &str = "sources";

/// Resolved CLI settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root data directory (index artifact + retained sources).
    pub data_dir: PathBuf,
    /// OpenAI API key for embeddings.
    pub openai_api_key: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Optional override for the embeddings endpoint.
    pub embedding_endpoint: Option<String>,
    /// Hugging Face token for generation.
    pub hf_api_token: String,
    /// Generation model repo id.
    pub llm_repo_id: String,
    /// Optional override for the generation endpoint.
    pub llm_endpoint: Option<String>,
    /// Core retrieval configuration.
    pub retrieval: RetrievalConfig,
    /// Generation parameters.
    pub generation: GenerationOptions,
}

impl Settings {
    /// Loads settings from the environment.
    ///
    /// Recognized variables: `DOCENT_DATA_DIR`, `OPENAI_API_KEY`,
    /// `EMBEDDING_MODEL`, `EMBEDDING_DIMENSIONS`, `EMBEDDING_ENDPOINT`,
    /// `HF_API_TOKEN`, `LLM_REPO_ID`, `LLM_ENDPOINT`,
    /// `LLM_MAX_OUTPUT_TOKENS`, `LLM_TEMPERATURE`, `CHUNK_SIZE`,
    /// `CHUNK_OVERLAP`, `SEARCH_K`, `MAX_CONTEXT_CHARS`,
    /// `SIMILARITY_METRIC` (`ip` or `cosine`), `PROVIDER_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let data_dir = match std::env::var_os("DOCENT_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let defaults = RetrievalConfig::default();
        let similarity_metric = match std::env::var("SIMILARITY_METRIC") {
            Ok(value) => SimilarityMetric::parse(&value)
                .ok_or_else(|| anyhow!("unknown SIMILARITY_METRIC {value:?} (use ip or cosine)"))?,
            Err(_) => defaults.similarity_metric,
        };

        let retrieval = RetrievalConfig {
            chunk_size: env_usize("CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: env_usize("CHUNK_OVERLAP", defaults.chunk_overlap)?,
            search_k: env_usize("SEARCH_K", defaults.search_k)?,
            max_context_chars: env_usize("MAX_CONTEXT_CHARS", defaults.max_context_chars)?,
            similarity_metric,
            embedding_dimension: env_usize("EMBEDDING_DIMENSIONS", defaults.embedding_dimension)?,
            provider_timeout: Duration::from_secs(env_u64(
                "PROVIDER_TIMEOUT_SECS",
                defaults.provider_timeout.as_secs(),
            )?),
        };
        retrieval
            .validate()
            .context("invalid retrieval configuration")?;

        let generation_defaults = GenerationOptions::default();
        let generation = GenerationOptions {
            max_tokens: env_u64("LLM_MAX_OUTPUT_TOKENS", generation_defaults.max_tokens as u64)?
                as u32,
            temperature: env_f32("LLM_TEMPERATURE", generation_defaults.temperature)?,
        };

        Ok(Self {
            data_dir,
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embedding_endpoint: std::env::var("EMBEDDING_ENDPOINT").ok(),
            hf_api_token: std::env::var("HF_API_TOKEN").unwrap_or_default(),
            llm_repo_id: std::env::var("LLM_REPO_ID")
                .unwrap_or_else(|_| "meta-llama/Meta-Llama-3-8B-Instruct".to_string()),
            llm_endpoint: std::env::var("LLM_ENDPOINT").ok(),
            retrieval,
            generation,
        })
    }

    /// Path of the index artifact.
    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(INDEX_FILENAME)
    }

    /// Directory where raw source files are retained.
    pub fn sources_dir(&self) -> PathBuf {
        self.data_dir.join(SOURCES_DIRNAME)
    }
}

/// Platform-idiomatic default data directory.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("dev", "docent", "Docent")
        .ok_or_else(|| anyhow!("failed to determine application data directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}

fn env_usize(name: &str, default: usize) -> Result<usize> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be an integer, got {value:?}")),
        Err(_) => Ok(default),
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be an integer, got {value:?}")),
        Err(_) => Ok(default),
    }
}

fn env_f32(name: &str, default: f32) -> Result<f32> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be a number, got {value:?}")),
        Err(_) => Ok(default),
    }
}
