//! Embedding provider abstractions and implementations.
//!
//! An [`Embedder`] maps text to fixed-dimension vectors. The trait seam
//! lets the remote provider be swapped for a deterministic fake in tests
//! without changing the pipeline or retrieval service.
//!
//! All vectors in one index must come from the same embedder
//! configuration; [`Embedder::identity`] tags the index artifact so
//! mismatched loads are rejected structurally rather than producing
//! silently wrong similarity scores.

mod openai;

pub use openai::OpenAiEmbedder;

use crate::error::EmbeddingError;
use async_trait::async_trait;

/// Text-to-vector embedding provider.
///
/// Implementations must be order-preserving (one output vector per input
/// text, same order) and dimension-stable: every vector has
/// [`dimension`](Embedder::dimension) components for the lifetime of the
/// instance.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a batch of texts.
    ///
    /// Treated as a fallible remote call; failures map to
    /// [`EmbeddingError`] subtypes so the pipeline can distinguish
    /// misconfigured credentials from transient provider trouble.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embeds a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(std::slice::from_ref(&text.to_string())).await?;
        vectors.pop().ok_or_else(|| {
            EmbeddingError::InvalidResponse("provider returned no vectors".to_string())
        })
    }

    /// Embedding vector dimension, constant for this configuration.
    fn dimension(&self) -> usize;

    /// Stable identity tag (model id and variant) recorded in the index
    /// artifact. Two embedders with different identities never share an
    /// index.
    fn identity(&self) -> &str;
}

/// L2-normalizes a vector in place. Zero vectors are left untouched.
///
/// Applied at embedding time when the configured metric is cosine; the
/// index itself never normalizes (configuration invariant).
pub(crate) fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}
