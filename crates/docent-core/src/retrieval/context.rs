//! Context packing and prompt composition.

use crate::index::ScoredChunk;

/// System instruction sent with every generation request.
pub const SYSTEM_PROMPT: &str = "Answer using the CONTEXT first and keep it friendly and concise. \
     If the CONTEXT doesn't cover something, say so and give a quick pointer instead of guessing. \
     Citations like [1] are optional when chunks are numbered. \
     No step-by-step reasoning in the reply.";

/// Packs retrieved chunk texts into a bounded context string.
///
/// Chunks are concatenated in rank order, joined by a blank line. The
/// running budget counts each chunk's trimmed length plus two separator
/// characters; packing **stops at the first chunk that would overflow**
/// `max_chars` — a chunk is never truncated mid-text, and later (smaller)
/// chunks are not considered once one has been refused.
pub fn pack_context(results: &[ScoredChunk<'_>], max_chars: usize) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut used = 0usize;
    for result in results {
        let text = result.chunk.text.trim();
        if used + text.len() + 2 > max_chars {
            break;
        }
        parts.push(text);
        used += text.len() + 2;
    }
    parts.join("\n\n")
}

/// Composes the user prompt from the packed context and the question.
pub fn compose_user_prompt(context: &str, question: &str) -> String {
    format!(
        "Use the following context to answer the question.\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n"
    )
}
