//! In-memory vector index with exact top-k retrieval.
//!
//! A [`VectorIndex`] is an immutable snapshot built from embedded chunks:
//! parallel chunk/vector arrays tagged with the embedder identity, the
//! similarity metric, and the vector dimension. Queries are an exact scan
//! (the corpus is a single document's chunks), scored by dot product —
//! with cosine retrieval the embedder normalizes vectors, making the dot
//! product the cosine similarity. Ties are broken by insertion order, so
//! results are fully deterministic and stable across save/load.

mod artifact;

use crate::chunking::DocumentChunk;
use crate::config::SimilarityMetric;
use crate::error::IndexError;
use std::cmp::Ordering;
use tracing::debug;

/// A chunk paired with its embedding vector.
///
/// Lives only for the duration of one ingestion run before being
/// absorbed into a [`VectorIndex`].
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    /// The source chunk.
    pub chunk: DocumentChunk,
    /// Embedding vector; length must equal the index dimension.
    pub vector: Vec<f32>,
}

/// A retrieval hit: a chunk reference with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk<'a> {
    /// The matched chunk.
    pub chunk: &'a DocumentChunk,
    /// Similarity score under the index metric (higher is better).
    pub score: f32,
}

/// Immutable similarity index over one corpus.
///
/// Built once by the ingestion pipeline, persisted as a single on-disk
/// artifact, and shared read-only behind an `Arc` after publication.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    embedder_id: String,
    metric: SimilarityMetric,
    dimension: usize,
    chunks: Vec<DocumentChunk>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    /// Builds an index from embedded chunks.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DimensionMismatch`] if any vector's length
    /// differs from `dimension` — mixing embedder outputs in one index is
    /// a corruption bug and is rejected at construction.
    pub fn build(
        embedder_id: impl Into<String>,
        metric: SimilarityMetric,
        dimension: usize,
        embedded: Vec<EmbeddedChunk>,
    ) -> Result<Self, IndexError> {
        let mut chunks = Vec::with_capacity(embedded.len());
        let mut vectors = Vec::with_capacity(embedded.len());
        for item in embedded {
            if item.vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: item.vector.len(),
                });
            }
            chunks.push(item.chunk);
            vectors.push(item.vector);
        }
        debug!(chunks = chunks.len(), dimension, "built vector index");
        Ok(Self {
            embedder_id: embedder_id.into(),
            metric,
            dimension,
            chunks,
            vectors,
        })
    }

    /// Finds the `k` most similar chunks to `query`.
    ///
    /// Results are ordered by descending score; equal scores keep the
    /// chunks' insertion order. Returns fewer than `k` results when the
    /// index holds fewer chunks, and an empty vector for an empty index.
    ///
    /// # Errors
    ///
    /// * [`IndexError::InvalidQuery`] — `k == 0` is invalid input.
    /// * [`IndexError::DimensionMismatch`] — the query vector's dimension
    ///   differs from the index dimension. This is a fatal configuration
    ///   error, never a silent wrong answer.
    pub fn query(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk<'_>>, IndexError> {
        if k == 0 {
            return Err(IndexError::InvalidQuery("k must be > 0".to_string()));
        }
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .map(|v| dot(query, v))
            .enumerate()
            .collect();
        // Descending score; insertion order breaks ties (stable).
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: &self.chunks[i],
                score,
            })
            .collect())
    }

    /// Identity tag of the embedder this index was built with.
    pub fn embedder_id(&self) -> &str {
        &self.embedder_id
    }

    /// Similarity metric this index scores with.
    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// Vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True if the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Checks that this index matches the running configuration.
    ///
    /// Used after [`load`](VectorIndex::load) to reject artifacts written
    /// by a different embedder, metric, or dimension.
    pub fn is_compatible_with(
        &self,
        embedder_id: &str,
        metric: SimilarityMetric,
        dimension: usize,
    ) -> bool {
        self.embedder_id == embedder_id && self.metric == metric && self.dimension == dimension
    }
}

/// Dot product of two equal-length vectors.
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
