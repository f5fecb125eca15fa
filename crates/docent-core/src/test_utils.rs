//! Deterministic fakes for tests.
//!
//! The pipeline and retrieval tests need providers with reproducible
//! output: [`SeededEmbedder`] derives a unit vector from a hash of the
//! input text, and [`CannedGenerator`] returns a fixed answer while
//! recording every prompt it was given.

use crate::embedding::{normalize, Embedder};
use crate::error::{EmbeddingError, GenerationError};
use crate::generation::Generator;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Deterministic embedder: the vector for a text depends only on the
/// text and the configured dimension.
///
/// Texts sharing 4-grams produce correlated vectors, so semantically
/// overlapping strings (a question and the chunk answering it) score
/// higher against each other than against unrelated text — enough
/// structure for retrieval tests without a model.
#[derive(Clone)]
pub struct SeededEmbedder {
    dimension: usize,
    identity: String,
    /// Calls remaining before embed() starts failing; usize::MAX means
    /// never fail.
    fail_after: Arc<AtomicUsize>,
}

impl SeededEmbedder {
    /// Creates an embedder producing `dimension`-sized unit vectors.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            identity: format!("seeded@{dimension}"),
            fail_after: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }

    /// Makes `embed` fail with a transient error after `calls` successful
    /// batch calls (0 = fail immediately).
    pub fn failing_after(self, calls: usize) -> Self {
        self.fail_after.store(calls, Ordering::SeqCst);
        self
    }

    /// Disarms a previously scheduled failure. Affects all clones of
    /// this embedder (the counter is shared).
    pub fn clear_failures(&self) {
        self.fail_after.store(usize::MAX, Ordering::SeqCst);
    }

    /// The vector this embedder produces for `text`.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        // Accumulate hashed character 4-grams into the vector so shared
        // substrings move texts toward each other.
        let chars: Vec<char> = text.to_lowercase().chars().collect();
        for window in chars.windows(4) {
            let mut hash = 0xcbf2_9ce4_8422_2325u64;
            for &c in window {
                hash ^= c as u64;
                hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            }
            let slot = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl Embedder for SeededEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let remaining = self.fail_after.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(EmbeddingError::Transient(
                "injected embedding failure".to_string(),
            ));
        }
        if remaining != usize::MAX {
            self.fail_after.store(remaining - 1, Ordering::SeqCst);
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn identity(&self) -> &str {
        &self.identity
    }
}

/// Generator returning a fixed answer and recording every user prompt.
#[derive(Clone)]
pub struct CannedGenerator {
    answer: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl CannedGenerator {
    /// Creates a generator that always answers with `answer`.
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// User prompts received so far, in call order.
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt lock poisoned").clone()
    }
}

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .expect("prompt lock poisoned")
            .push(user_prompt.to_string());
        Ok(self.answer.clone())
    }
}
