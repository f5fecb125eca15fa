//! Hugging Face Inference Providers chat-completions client.
//!
//! Uses the OpenAI-compatible chat API exposed by the HF router. Status
//! codes are mapped to [`GenerationError`] variants here: 403 in
//! particular means the token lacks Providers permission or the model's
//! gated license has not been accepted, which deserves a distinct error
//! from a plain bad token.

use super::Generator;
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://router.huggingface.co/v1";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat-completions generator backed by Hugging Face Inference Providers.
pub struct HfChatGenerator {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    model: String,
    timeout: Duration,
}

impl HfChatGenerator {
    /// Creates a new generator for the given model repo id
    /// (e.g. `meta-llama/Meta-Llama-3-8B-Instruct`).
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Unauthorized`] when `token` is empty —
    /// a missing token always fails, so it is rejected up front.
    pub fn new(
        token: impl Into<String>,
        model: impl Into<String>,
        endpoint: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let token = token.into();
        if token.is_empty() {
            return Err(GenerationError::Unauthorized(
                "HF_API_TOKEN is not set".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Other(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            token,
            model: model.into(),
            timeout,
        })
    }

    fn map_status(status: reqwest::StatusCode, body: String) -> GenerationError {
        match status.as_u16() {
            401 => GenerationError::Unauthorized(format!("{status}: {body}")),
            403 => GenerationError::Forbidden(format!(
                "{status}: token lacks Providers permission or the model is gated: {body}"
            )),
            429 => GenerationError::RateLimited(body),
            _ => GenerationError::Other(format!("{status}: {body}")),
        }
    }
}

#[async_trait]
impl Generator for HfChatGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens,
            temperature,
        };

        debug!(model = %self.model, max_tokens, "generation request");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.timeout)
                } else {
                    GenerationError::Other(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Other(format!("malformed response: {e}")))?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(answer.trim().to_string())
    }
}
