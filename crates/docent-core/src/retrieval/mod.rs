//! Question answering over the active index.
//!
//! [`RetrievalService`] holds the currently active [`VectorIndex`] behind
//! an atomically swappable reference. Answer calls capture the reference
//! once and work against that snapshot for their whole lifetime, so they
//! are safe to run concurrently with each other and with an in-flight
//! corpus replacement: each request observes either the fully-old or the
//! fully-new index, never a partially built one.

mod context;

pub use context::{compose_user_prompt, pack_context, SYSTEM_PROMPT};

use crate::config::{GenerationOptions, RetrievalConfig};
use crate::embedding::Embedder;
use crate::error::AnswerError;
use crate::generation::Generator;
use crate::index::VectorIndex;
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tracing::{debug, info};

/// Fixed reply returned before any corpus has been ingested.
pub const NOT_READY_ANSWER: &str =
    "The document has not been processed yet. Please upload a document first.";

/// One retrieved source with provenance, in rank order.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedSource {
    /// Chunk text as retrieved (never truncated by the context budget).
    pub content: String,
    /// Identifier of the source document.
    pub source_id: String,
    /// 1-based page number within the source document.
    pub page: usize,
    /// Similarity score under the index metric.
    pub score: f32,
}

/// Result of one answer call: the generated text plus the ranked sources
/// it was conditioned on.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    /// Generated answer (or the fixed not-ready reply).
    pub answer: String,
    /// Retrieved chunks, most relevant first; not deduplicated.
    pub sources: Vec<RetrievedSource>,
}

/// Answers questions against the currently active index.
pub struct RetrievalService {
    active: ArcSwapOption<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    config: RetrievalConfig,
    options: GenerationOptions,
}

impl RetrievalService {
    /// Creates a service with no active index (uninitialized state).
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: RetrievalConfig,
        options: GenerationOptions,
    ) -> Self {
        Self {
            active: ArcSwapOption::empty(),
            embedder,
            generator,
            config,
            options,
        }
    }

    /// Returns the embedder the service embeds questions with.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// True once an index has been published.
    pub fn is_ready(&self) -> bool {
        self.active.load().is_some()
    }

    /// Number of chunks in the active index, if any.
    pub fn active_chunks(&self) -> Option<usize> {
        self.active.load().as_ref().map(|index| index.len())
    }

    /// Publishes a new snapshot as the active index.
    ///
    /// Single atomic pointer swap; in-flight answer calls keep their
    /// captured snapshot. Only the swap coordinator calls this — the
    /// service itself never transitions back to uninitialized.
    pub(crate) fn publish(&self, index: Arc<VectorIndex>) {
        info!(chunks = index.len(), "publishing index snapshot");
        self.active.store(Some(index));
    }

    /// Answers a question using the active index.
    ///
    /// Before any corpus has been ingested this returns the fixed
    /// not-ready reply with empty sources — a valid response, not an
    /// error. With an index present: embed the question, retrieve the
    /// top `top_k` chunks (config default when the caller passes `None`),
    /// pack them into the bounded context, and forward the composed
    /// prompt to the generation collaborator.
    ///
    /// # Errors
    ///
    /// * [`AnswerError::InvalidRequest`] — blank question or
    ///   `top_k == Some(0)`.
    /// * Provider and index failures are surfaced per-request; they never
    ///   invalidate the active index.
    pub async fn answer(
        &self,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<RetrievalResult, AnswerError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnswerError::InvalidRequest(
                "question must not be empty".to_string(),
            ));
        }
        let k = match top_k {
            Some(0) => {
                return Err(AnswerError::InvalidRequest(
                    "top_k must be > 0".to_string(),
                ))
            }
            Some(k) => k,
            None => self.config.search_k,
        };

        // Capture the snapshot once; the shared slot is never re-read
        // during this request.
        let Some(index) = self.active.load_full() else {
            debug!("answer requested before any corpus was ingested");
            return Ok(RetrievalResult {
                answer: NOT_READY_ANSWER.to_string(),
                sources: Vec::new(),
            });
        };

        info!(k, "answering question");
        let query_vector = self.embedder.embed_query(question).await?;
        let results = index.query(&query_vector, k)?;

        let context = pack_context(&results, self.config.max_context_chars);
        let user_prompt = compose_user_prompt(&context, question);
        let answer = self
            .generator
            .generate(
                SYSTEM_PROMPT,
                &user_prompt,
                self.options.max_tokens,
                self.options.temperature,
            )
            .await?;

        let sources = results
            .iter()
            .map(|r| RetrievedSource {
                content: r.chunk.text.clone(),
                source_id: r.chunk.source_id.clone(),
                page: r.chunk.page,
                score: r.score,
            })
            .collect();

        Ok(RetrievalResult {
            answer: answer.trim().to_string(),
            sources,
        })
    }
}
