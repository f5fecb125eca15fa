//! Ingestion pipeline: load → chunk → embed → index build.
//!
//! One run produces one [`VectorIndex`] snapshot for one corpus. Every
//! step failure aborts the whole run; persistence is left to the caller
//! (the swap coordinator) so a failed run can never leave partial state
//! on disk or in the active index.

use crate::chunking::{Chunker, SourceDocument};
use crate::config::RetrievalConfig;
use crate::embedding::Embedder;
use crate::error::IngestError;
use crate::index::{EmbeddedChunk, VectorIndex};
use std::sync::Arc;
use tracing::info;

/// Number of chunk texts sent per embedding request.
const EMBED_BATCH_SIZE: usize = 32;

/// Orchestrates one corpus ingestion.
///
/// Repeated runs on identical input with a deterministic embedder produce
/// snapshots with identical query behavior; remote embeddings may differ
/// bit-for-bit between calls, so determinism tests use a fixed fake.
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    config: RetrievalConfig,
}

impl IngestionPipeline {
    /// Creates a pipeline over the given embedder and configuration.
    pub fn new(embedder: Arc<dyn Embedder>, config: RetrievalConfig) -> Self {
        Self { embedder, config }
    }

    /// Returns the embedder this pipeline embeds with.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Returns the pipeline configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Runs the full pipeline over the given source documents.
    ///
    /// # Errors
    ///
    /// * [`IngestError::NoDocuments`] — no document contains extractable
    ///   text (at least one non-empty source is a precondition).
    /// * [`IngestError::Embedding`] — any embedding batch failed; the
    ///   whole run aborts, nothing is kept.
    /// * [`IngestError::Index`] — index construction rejected a vector.
    pub async fn run(&self, documents: &[SourceDocument]) -> Result<VectorIndex, IngestError> {
        let usable: Vec<&SourceDocument> = documents.iter().filter(|d| !d.is_empty()).collect();
        if usable.is_empty() {
            return Err(IngestError::NoDocuments);
        }

        let chunker = Chunker::new(self.config.chunk_size, self.config.chunk_overlap);
        let mut chunks = Vec::new();
        for document in &usable {
            chunks.extend(chunker.chunk_document(document));
        }
        if chunks.is_empty() {
            return Err(IngestError::NoDocuments);
        }
        info!(
            documents = usable.len(),
            chunks = chunks.len(),
            "chunked corpus"
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH_SIZE) {
            let batch_vectors = self.embedder.embed(batch).await?;
            vectors.extend(batch_vectors);
        }

        let embedded: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
            .collect();

        let index = VectorIndex::build(
            self.embedder.identity(),
            self.config.similarity_metric,
            self.config.embedding_dimension,
            embedded,
        )?;
        info!(chunks = index.len(), "built index snapshot");
        Ok(index)
    }
}
