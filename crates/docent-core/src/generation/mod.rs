//! Text-generation collaborator abstraction.
//!
//! The retrieval service treats generation as an opaque text-producing
//! function behind the [`Generator`] trait. The bundled implementation
//! talks to the Hugging Face Inference Providers chat-completions
//! endpoint; tests substitute a canned generator.

mod hf;

pub use hf::HfChatGenerator;

use crate::error::GenerationError;
use async_trait::async_trait;

/// External language-model generation call.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produces a completion for the composed prompt.
    ///
    /// Provider failures surface as [`GenerationError`] variants
    /// (unauthorized / forbidden / rate-limited / timeout / other);
    /// vendor error shapes never leak through this trait.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError>;
}
