//! Error types for docent-core.
//!
//! This module defines error types used across the core library. Provider
//! errors (HTTP status codes, vendor response shapes) are mapped into these
//! enums at the client boundary; nothing above the providers ever sees a
//! vendor error shape.

use thiserror::Error;

/// Errors from the embedding provider.
///
/// The ingestion pipeline's abort policy depends on distinguishing
/// credential problems (fatal, never retried) from transient provider
/// failures, so the subtypes are explicit rather than a single string.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// No API credentials were configured for the provider.
    #[error("Embedding credentials missing: {0}")]
    MissingCredentials(String),
    /// The provider rejected the configured credentials (HTTP 401/403).
    #[error("Embedding provider rejected credentials: {0}")]
    Unauthorized(String),
    /// The provider throttled the request (HTTP 429).
    #[error("Embedding provider rate limited: {0}")]
    RateLimited(String),
    /// The request exceeded the configured provider timeout.
    #[error("Embedding request timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// Network failure or a retryable provider-side error.
    #[error("Embedding provider error: {0}")]
    Transient(String),
    /// The provider responded, but not with what was asked for
    /// (wrong vector count, wrong dimension, unparseable body).
    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Errors from the generation collaborator.
///
/// Mirrors [`EmbeddingError`]: unauthorized, forbidden, rate-limited, and
/// timeout cases are distinct so callers can report them precisely.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Missing or rejected credentials (HTTP 401).
    #[error("Generation provider unauthorized: {0}")]
    Unauthorized(String),
    /// Credentials valid but access denied (HTTP 403), e.g. a gated model
    /// whose license has not been accepted.
    #[error("Generation provider forbidden: {0}")]
    Forbidden(String),
    /// The provider throttled the request (HTTP 429).
    #[error("Generation provider rate limited: {0}")]
    RateLimited(String),
    /// The request exceeded the configured provider timeout.
    #[error("Generation request timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// Any other provider failure.
    #[error("Generation provider error: {0}")]
    Other(String),
}

/// Errors from the vector index: queries and artifact persistence.
#[derive(Debug, Error)]
pub enum IndexError {
    /// No artifact exists at the given path. This is the normal
    /// "no corpus ingested yet" state, not a failure; startup treats it
    /// as an empty index.
    #[error("No index artifact found")]
    NotFound,
    /// The artifact exists but is unreadable or incompatible with the
    /// running configuration (bad magic, schema mismatch, wrong embedder
    /// identity, wrong metric, wrong dimension).
    #[error("Index artifact corrupt or incompatible: {0}")]
    Corrupt(String),
    /// A vector's dimension does not match the index dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Index dimension.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },
    /// The query parameters are invalid (e.g. `k == 0`).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// Filesystem failure while saving or loading the artifact.
    #[error("Index I/O error: {0}")]
    Io(String),
}

/// Errors that abort an ingestion run.
///
/// Any failure in load → chunk → embed → build fails the whole run; no
/// partial state is ever persisted.
#[derive(Debug, Error)]
pub enum IngestError {
    /// No source document contained any extractable text.
    #[error("No loadable documents provided")]
    NoDocuments,
    /// The embedding step failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    /// Index construction or persistence failed.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Per-request errors from [`answer`](crate::retrieval::RetrievalService::answer).
///
/// These never invalidate the active index; subsequent requests proceed
/// against the same snapshot.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// The request itself is malformed (blank question, `top_k == 0`).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Embedding the question failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    /// Querying the snapshot failed.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// The generation collaborator failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Invalid [`RetrievalConfig`](crate::config::RetrievalConfig) values.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_distinct_from_corrupt() {
        // Callers branch on these variants: NotFound is the benign empty
        // state, Corrupt is fatal.
        let not_found = IndexError::NotFound;
        let corrupt = IndexError::Corrupt("bad magic".to_string());
        assert!(matches!(not_found, IndexError::NotFound));
        assert!(matches!(corrupt, IndexError::Corrupt(_)));
    }

    #[test]
    fn test_embedding_error_propagates_into_ingest() {
        let err: IngestError = EmbeddingError::Unauthorized("401".to_string()).into();
        assert!(matches!(
            err,
            IngestError::Embedding(EmbeddingError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = IndexError::DimensionMismatch {
            expected: 1536,
            actual: 512,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 1536, got 512");
    }
}
