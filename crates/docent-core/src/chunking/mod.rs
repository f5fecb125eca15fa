//! Overlapping fixed-size text chunking with provenance.
//!
//! Splits page-ordered source text into chunks of a target character
//! length with a configured overlap between consecutive chunks. Chunk
//! boundaries prefer natural breaks (paragraph, line, sentence, word)
//! before falling back to a hard cut at the size limit; the policy is
//! deterministic, and trailing content shorter than the target length is
//! always kept.

mod types;

pub use types::{DocumentChunk, SourceDocument, SourcePage};

use tracing::debug;

/// Boundary separators tried in order of preference. The cut lands just
/// after the separator, so paragraph and line breaks stay with the chunk
/// they terminate.
const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

/// Splits raw text into overlapping chunks.
///
/// Geometry is validated by [`RetrievalConfig::validate`]; the chunker
/// assumes `chunk_overlap < chunk_size` and `chunk_size > 0`.
///
/// [`RetrievalConfig::validate`]: crate::config::RetrievalConfig::validate
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Creates a chunker with the given target size and overlap, both in
    /// characters.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Chunks one source document, page by page.
    ///
    /// Chunk indices are 0-based and run across the whole document.
    /// Pages with no non-whitespace text produce no chunks; an entirely
    /// empty document produces an empty vector, not an error.
    pub fn chunk_document(&self, document: &SourceDocument) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        for page in &document.pages {
            for range in self.split_ranges(&page.text) {
                let text = page.text[range.0..range.1].trim();
                if text.is_empty() {
                    continue;
                }
                chunks.push(DocumentChunk {
                    text: text.to_string(),
                    source_id: document.source_id.clone(),
                    page: page.page_number,
                    chunk_index: chunks.len(),
                });
            }
        }
        debug!(
            source_id = %document.source_id,
            pages = document.pages.len(),
            chunks = chunks.len(),
            "chunked document"
        );
        chunks
    }

    /// Computes the byte ranges of chunks within `text`.
    ///
    /// Ranges are in ascending order; each range after the first starts
    /// `chunk_overlap` characters before the previous range's end (or at
    /// the previous end, when the overlap would fail to advance). The
    /// union of ranges covers the whole trimmed text: no gaps, and the
    /// final range always reaches the end regardless of its length.
    fn split_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        // Byte offset of the trimmed region within the original text.
        let base = text.len() - text.trim_start().len();
        let mut ranges = Vec::new();
        let mut start = 0usize;
        loop {
            let window_end = advance_chars(trimmed, start, self.chunk_size);
            if window_end >= trimmed.len() {
                ranges.push((base + start, base + trimmed.len()));
                break;
            }
            let cut = find_break(&trimmed[start..window_end])
                .map(|rel| start + rel)
                .unwrap_or(window_end);
            ranges.push((base + start, base + cut));
            let back = retreat_chars(trimmed, cut, self.chunk_overlap);
            // The next window must advance past the previous start even
            // when the overlap reaches back to it.
            start = if back > start { back } else { cut };
        }
        ranges
    }
}

/// Finds the preferred break position within a full-size window.
///
/// Tries each separator level and takes the last occurrence, keeping the
/// separator with the left chunk. A boundary in the first half of the
/// window is rejected in favor of the next level down, so natural breaks
/// never produce chunks far below the target size.
fn find_break(window: &str) -> Option<usize> {
    let min_cut = window.len() / 2;
    for sep in SEPARATORS {
        if let Some(pos) = window.rfind(sep) {
            let cut = pos + sep.len();
            if cut > min_cut {
                return Some(cut);
            }
        }
    }
    None
}

/// Returns the byte index `n` characters past `from`, clamped to the end
/// of the string.
fn advance_chars(s: &str, from: usize, n: usize) -> usize {
    s[from..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| from + i)
        .unwrap_or(s.len())
}

/// Returns the byte index `n` characters before `to`.
fn retreat_chars(s: &str, to: usize, n: usize) -> usize {
    if n == 0 {
        return to;
    }
    s[..to]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}
