//! Retrieval and generation configuration.
//!
//! All knobs the core recognizes live here: chunking geometry, retrieval
//! depth, the context budget, the similarity metric, and the embedding
//! dimension. The CLI populates this from the environment; tests construct
//! it directly.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 120;

/// Default number of chunks retrieved per question.
pub const DEFAULT_SEARCH_K: usize = 5;

/// Default context budget in characters for prompt packing.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 4000;

/// Default embedding dimension (text-embedding-3-small).
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

/// Default timeout applied to each embedding or generation HTTP call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(120);

/// Similarity metric used to score vectors against a query.
///
/// With `Cosine`, vectors must be L2-normalized at embedding time; the
/// index scores both metrics as a plain dot product and never normalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Raw inner product.
    InnerProduct,
    /// Cosine similarity; requires unit vectors from the embedder.
    Cosine,
}

impl SimilarityMetric {
    /// Parses a metric name. Accepts the short form `ip` used by the
    /// index artifact and environment configuration.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ip" | "inner_product" => Some(Self::InnerProduct),
            "cosine" => Some(Self::Cosine),
            _ => None,
        }
    }

    /// Short stable name, persisted in the index artifact manifest.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InnerProduct => "inner_product",
            Self::Cosine => "cosine",
        }
    }
}

/// Configuration for the ingestion-and-retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Target chunk length in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters. Must be less
    /// than `chunk_size`.
    pub chunk_overlap: usize,
    /// Default number of chunks retrieved per question.
    pub search_k: usize,
    /// Maximum characters of retrieved text packed into the prompt.
    pub max_context_chars: usize,
    /// Similarity metric for retrieval scoring.
    pub similarity_metric: SimilarityMetric,
    /// Embedding vector dimension. Must match the configured embedder.
    pub embedding_dimension: usize,
    /// Timeout per provider HTTP call (embedding and generation).
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout: Duration,
}

fn default_provider_timeout() -> Duration {
    DEFAULT_PROVIDER_TIMEOUT
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            search_k: DEFAULT_SEARCH_K,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            similarity_metric: SimilarityMetric::InnerProduct,
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

impl RetrievalConfig {
    /// Validates the configuration.
    ///
    /// Rejects geometries the chunker cannot satisfy (overlap >= size,
    /// zero sizes) and degenerate retrieval parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be > 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.search_k == 0 {
            return Err(ConfigError::Invalid("search_k must be > 0".to_string()));
        }
        if self.embedding_dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedding_dimension must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parameters forwarded to the generation collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Maximum tokens the model may produce.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 400,
            temperature: 0.1,
        }
    }
}
