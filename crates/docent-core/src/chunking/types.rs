//! Types for source documents and text chunks.

use serde::{Deserialize, Serialize};

/// One page of extractable text from a source document.
///
/// Pages arrive in document order from the upload boundary; the page
/// number is carried through to retrieval results as provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePage {
    /// 1-based page number within the source document.
    pub page_number: usize,
    /// Extracted text of this page.
    pub text: String,
}

/// A source document as delivered by the upload boundary: an identifier
/// plus page-ordered text units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Stable identifier for the source (filename or path).
    pub source_id: String,
    /// Pages in document order.
    pub pages: Vec<SourcePage>,
}

impl SourceDocument {
    /// Builds a single-page document from raw text.
    pub fn from_text(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            pages: vec![SourcePage {
                page_number: 1,
                text: text.into(),
            }],
        }
    }

    /// True if no page contains non-whitespace text.
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }
}

/// A bounded slice of document text with provenance metadata.
///
/// Immutable once created: produced by the chunker, embedded during
/// ingestion, and carried through to retrieval results unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// The chunk text.
    pub text: String,
    /// Identifier of the source document this chunk came from.
    pub source_id: String,
    /// 1-based page number the chunk starts on.
    pub page: usize,
    /// Index of this chunk within its source document (0-based).
    pub chunk_index: usize,
}
