//! Source-document loading at the upload boundary.
//!
//! The core only requires "a readable source document with extractable
//! page-ordered text"; this loader handles plain-text and markdown
//! files, treating form feeds as page separators. File-type validation
//! beyond readable UTF-8 stays out here at the boundary, as does any
//! richer extraction (PDF parsing would slot in at this seam).

use anyhow::{bail, Context, Result};
use docent_core::chunking::{SourceDocument, SourcePage};
use std::path::Path;

/// Reads a text document from disk as page-ordered source material.
///
/// Pages are split on form-feed characters (`\f`); documents without
/// form feeds load as a single page. An empty or whitespace-only file
/// is rejected before the core is ever invoked.
pub fn load_source_document(path: &Path) -> Result<SourceDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if raw.trim().is_empty() {
        bail!("{} contains no extractable text", path.display());
    }

    let source_id = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let pages = raw
        .split('\u{000C}')
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| SourcePage {
            page_number: i + 1,
            text: text.to_string(),
        })
        .collect();

    Ok(SourceDocument { source_id, pages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_single_page_document() {
        let file = write_temp("Paris is the capital of France.");
        let doc = load_source_document(file.path()).unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].page_number, 1);
    }

    #[test]
    fn test_form_feed_separates_pages() {
        let file = write_temp("First page.\x0cSecond page.\x0cThird page.");
        let doc = load_source_document(file.path()).unwrap();
        assert_eq!(doc.pages.len(), 3);
        assert_eq!(doc.pages[2].page_number, 3);
        assert_eq!(doc.pages[1].text, "Second page.");
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let file = write_temp("   \n  ");
        assert!(load_source_document(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_source_document(Path::new("/nonexistent/file.txt")).is_err());
    }
}
