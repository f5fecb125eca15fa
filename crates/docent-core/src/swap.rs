//! Corpus replacement coordination.
//!
//! [`IndexSwapCoordinator`] is the only unit that mutates which snapshot
//! is active and the only writer of the on-disk artifact. Replacements
//! are serialized by an async mutex and follow a strict order:
//! ingest → persist → publish → cleanup. A failure at any step leaves the
//! previously active index and artifact untouched, and raw-source
//! cleanup runs only after the new snapshot is confirmed on disk, so a
//! crash mid-replacement never strands the system with neither old nor
//! new material.

use crate::chunking::SourceDocument;
use crate::embedding::Embedder as _;
use crate::error::{IndexError, IngestError};
use crate::index::VectorIndex;
use crate::ingest::IngestionPipeline;
use crate::retrieval::RetrievalService;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Summary of a completed corpus replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Source documents ingested.
    pub documents: usize,
    /// Chunks in the new index.
    pub chunks: usize,
}

/// Callback invoked after a replacement is persisted and published.
pub type CleanupHook = Box<dyn Fn() + Send + Sync>;

/// Serializes corpus replacements and publishes snapshots atomically.
pub struct IndexSwapCoordinator {
    pipeline: IngestionPipeline,
    service: Arc<RetrievalService>,
    artifact_path: PathBuf,
    replace_lock: Mutex<()>,
    on_replaced: Option<CleanupHook>,
}

impl IndexSwapCoordinator {
    /// Creates a coordinator that publishes to `service` and persists
    /// snapshots at `artifact_path`.
    pub fn new(
        pipeline: IngestionPipeline,
        service: Arc<RetrievalService>,
        artifact_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pipeline,
            service,
            artifact_path: artifact_path.into(),
            replace_lock: Mutex::new(()),
            on_replaced: None,
        }
    }

    /// Registers a hook run strictly after each successful replacement
    /// (typically: discard the previous corpus's raw source files).
    pub fn with_cleanup(mut self, hook: CleanupHook) -> Self {
        self.on_replaced = Some(hook);
        self
    }

    /// Path of the on-disk artifact this coordinator writes.
    pub fn artifact_path(&self) -> &PathBuf {
        &self.artifact_path
    }

    /// Replaces the live corpus with the given documents.
    ///
    /// At most one replacement proceeds at a time; concurrent callers
    /// queue on the internal lock. On success the new snapshot has been
    /// persisted, published, and the cleanup hook (if any) has run. On
    /// failure the previous snapshot and artifact are untouched and a
    /// single error is surfaced — the corpus is never half-replaced.
    pub async fn replace_corpus(
        &self,
        documents: &[SourceDocument],
    ) -> Result<ReplaceOutcome, IngestError> {
        let _guard = self.replace_lock.lock().await;
        info!(documents = documents.len(), "replacing corpus");

        let index = self.pipeline.run(documents).await?;
        index.save(&self.artifact_path)?;

        let outcome = ReplaceOutcome {
            documents: documents.len(),
            chunks: index.len(),
        };
        self.service.publish(Arc::new(index));

        if let Some(hook) = &self.on_replaced {
            hook();
        }
        info!(chunks = outcome.chunks, "corpus replaced");
        Ok(outcome)
    }

    /// Loads a previously persisted artifact and publishes it.
    ///
    /// Called once at startup, before any replacement can be in flight.
    /// Returns `Ok(false)` when no artifact exists — the valid "no corpus
    /// ingested yet" state. An artifact written by a different embedder,
    /// metric, or dimension is rejected as corrupt rather than silently
    /// producing wrong similarity scores.
    pub async fn restore(&self) -> Result<bool, IndexError> {
        let _guard = self.replace_lock.lock().await;
        let index = match VectorIndex::load(&self.artifact_path) {
            Ok(index) => index,
            Err(IndexError::NotFound) => {
                info!("no index artifact; starting with an empty corpus");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let embedder = self.pipeline.embedder();
        let expected_metric = self.pipeline.config().similarity_metric;
        if !index.is_compatible_with(embedder.identity(), expected_metric, embedder.dimension()) {
            warn!(
                artifact_embedder = index.embedder_id(),
                expected_embedder = embedder.identity(),
                "index artifact does not match the running configuration"
            );
            return Err(IndexError::Corrupt(format!(
                "artifact built with embedder {:?} ({} dims, {} metric); \
                 configured embedder is {:?} ({} dims, {} metric)",
                index.embedder_id(),
                index.dimension(),
                index.metric().as_str(),
                embedder.identity(),
                embedder.dimension(),
                expected_metric.as_str(),
            )));
        }

        self.service.publish(Arc::new(index));
        Ok(true)
    }
}
