//! OpenAI embeddings client.
//!
//! Calls the `/embeddings` endpoint (or any OpenAI-compatible server).
//! Provider HTTP status codes are mapped to [`EmbeddingError`] subtypes
//! at this boundary; nothing above it sees a vendor error shape.

use super::{normalize, Embedder};
use crate::error::EmbeddingError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Remote embedding provider using the OpenAI embeddings API.
///
/// Supports dimension down-projection for the v3 models via the
/// `dimensions` request field. When `normalize_vectors` is set (required
/// for cosine retrieval), every returned vector is L2-normalized before
/// leaving this client.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimension: usize,
    normalize_vectors: bool,
    identity: String,
    timeout: Duration,
}

impl OpenAiEmbedder {
    /// Creates a new embedder.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::MissingCredentials`] when `api_key` is
    /// empty — credentials misconfiguration is fatal and detected before
    /// any request is made.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
        endpoint: Option<String>,
        timeout: Duration,
        normalize_vectors: bool,
    ) -> Result<Self, EmbeddingError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(EmbeddingError::MissingCredentials(
                "OPENAI_API_KEY is not set".to_string(),
            ));
        }
        let model = model.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbeddingError::Transient(e.to_string()))?;
        let identity = format!("openai/{model}@{dimension}");
        Ok(Self {
            client,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            api_key,
            model,
            dimension,
            normalize_vectors,
            identity,
            timeout,
        })
    }

    fn map_status(status: reqwest::StatusCode, body: String) -> EmbeddingError {
        match status.as_u16() {
            401 | 403 => EmbeddingError::Unauthorized(format!("{status}: {body}")),
            429 => EmbeddingError::RateLimited(body),
            _ => EmbeddingError::Transient(format!("{status}: {body}")),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/embeddings", self.endpoint);
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: Some(self.dimension),
        };

        debug!(batch = texts.len(), model = %self.model, "embedding batch");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout(self.timeout)
                } else {
                    EmbeddingError::Transient(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        let mut vectors = Vec::with_capacity(parsed.data.len());
        for data in parsed.data {
            let mut vector = data.embedding;
            if vector.len() != self.dimension {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "expected dimension {}, got {}",
                    self.dimension,
                    vector.len()
                )));
            }
            if self.normalize_vectors {
                normalize(&mut vector);
            }
            vectors.push(vector);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn identity(&self) -> &str {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_fatal() {
        let result = OpenAiEmbedder::new(
            "",
            "text-embedding-3-small",
            1536,
            None,
            Duration::from_secs(10),
            false,
        );
        assert!(matches!(
            result,
            Err(EmbeddingError::MissingCredentials(_))
        ));
    }

    #[test]
    fn test_identity_encodes_model_and_dimension() {
        let embedder = OpenAiEmbedder::new(
            "sk-test",
            "text-embedding-3-small",
            256,
            None,
            Duration::from_secs(10),
            false,
        )
        .unwrap();
        assert_eq!(embedder.identity(), "openai/text-embedding-3-small@256");
        assert_eq!(embedder.dimension(), 256);
    }

    #[test]
    fn test_status_mapping() {
        use reqwest::StatusCode;
        assert!(matches!(
            OpenAiEmbedder::map_status(StatusCode::UNAUTHORIZED, String::new()),
            EmbeddingError::Unauthorized(_)
        ));
        assert!(matches!(
            OpenAiEmbedder::map_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            EmbeddingError::RateLimited(_)
        ));
        assert!(matches!(
            OpenAiEmbedder::map_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            EmbeddingError::Transient(_)
        ));
    }
}
