//! On-disk index artifact: a single self-describing file.
//!
//! Layout, in order:
//!
//! 1. 8-byte magic `DOCENTIX`
//! 2. u32 LE manifest length, then the manifest as JSON (schema version,
//!    embedder identity, metric, dimension, chunk count)
//! 3. u32 LE chunks length, then all [`DocumentChunk`]s as JSON
//! 4. `chunk_count * dimension` embedding values as little-endian f32
//!
//! Writes go to a named temp file in the destination directory followed
//! by a rename, so a reader never observes a half-written artifact and a
//! failed save leaves any existing artifact untouched.

use super::VectorIndex;
use crate::chunking::DocumentChunk;
use crate::config::SimilarityMetric;
use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use tracing::info;

const MAGIC: &[u8; 8] = b"DOCENTIX";

/// Current schema version of the artifact format.
///
/// - v1: framed magic + manifest JSON + chunks JSON + LE f32 embeddings
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Artifact header describing what the embeddings were produced with.
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactManifest {
    schema_version: u32,
    embedder_id: String,
    metric: String,
    dimension: usize,
    chunk_count: usize,
}

impl VectorIndex {
    /// Serializes the index and atomically writes it to `path`.
    ///
    /// Only the swap coordinator calls this; the artifact path has a
    /// single writer by design.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let bytes = self.to_bytes()?;

        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = parent {
            std::fs::create_dir_all(dir).map_err(|e| IndexError::Io(e.to_string()))?;
        }
        let dir = parent.unwrap_or_else(|| Path::new("."));
        let temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| IndexError::Io(e.to_string()))?;
        std::fs::write(temp.path(), &bytes).map_err(|e| IndexError::Io(e.to_string()))?;
        temp.persist(path)
            .map_err(|e| IndexError::Io(e.to_string()))?;

        info!(
            path = %path.display(),
            chunks = self.len(),
            bytes = bytes.len(),
            "saved index artifact"
        );
        Ok(())
    }

    /// Loads an index artifact from `path`.
    ///
    /// # Errors
    ///
    /// * [`IndexError::NotFound`] — no artifact at `path`. Callers treat
    ///   this as "no corpus ingested yet", a normal state.
    /// * [`IndexError::Corrupt`] — the artifact exists but cannot be read
    ///   back (bad magic, unsupported schema, malformed JSON, truncated
    ///   embedding block).
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => IndexError::NotFound,
            _ => IndexError::Io(e.to_string()),
        })?;
        let index = Self::from_bytes(&bytes)?;
        info!(path = %path.display(), chunks = index.len(), "loaded index artifact");
        Ok(index)
    }

    fn to_bytes(&self) -> Result<Vec<u8>, IndexError> {
        let manifest = ArtifactManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            embedder_id: self.embedder_id.clone(),
            metric: self.metric.as_str().to_string(),
            dimension: self.dimension,
            chunk_count: self.chunks.len(),
        };
        let manifest_json =
            serde_json::to_vec(&manifest).map_err(|e| IndexError::Io(e.to_string()))?;
        let chunks_json =
            serde_json::to_vec(&self.chunks).map_err(|e| IndexError::Io(e.to_string()))?;

        let embedding_bytes = self.chunks.len() * self.dimension * 4;
        let mut bytes =
            Vec::with_capacity(16 + manifest_json.len() + chunks_json.len() + embedding_bytes);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&(manifest_json.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&manifest_json);
        bytes.extend_from_slice(&(chunks_json.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&chunks_json);
        for vector in &self.vectors {
            for &value in vector {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        Ok(bytes)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, IndexError> {
        let mut cursor = Reader::new(bytes);

        let magic = cursor.take(MAGIC.len())?;
        if magic != MAGIC {
            return Err(IndexError::Corrupt("bad magic".to_string()));
        }

        let manifest_len = cursor.take_u32()? as usize;
        let manifest: ArtifactManifest = serde_json::from_slice(cursor.take(manifest_len)?)
            .map_err(|e| IndexError::Corrupt(format!("manifest: {e}")))?;
        if manifest.schema_version != CURRENT_SCHEMA_VERSION {
            return Err(IndexError::Corrupt(format!(
                "unsupported schema version {}",
                manifest.schema_version
            )));
        }
        let metric = SimilarityMetric::parse(&manifest.metric).ok_or_else(|| {
            IndexError::Corrupt(format!("unknown metric {:?}", manifest.metric))
        })?;

        let chunks_len = cursor.take_u32()? as usize;
        let chunks: Vec<DocumentChunk> = serde_json::from_slice(cursor.take(chunks_len)?)
            .map_err(|e| IndexError::Corrupt(format!("chunks: {e}")))?;
        if chunks.len() != manifest.chunk_count {
            return Err(IndexError::Corrupt(format!(
                "manifest says {} chunks, found {}",
                manifest.chunk_count,
                chunks.len()
            )));
        }

        let mut vectors = Vec::with_capacity(manifest.chunk_count);
        for _ in 0..manifest.chunk_count {
            let mut vector = Vec::with_capacity(manifest.dimension);
            for _ in 0..manifest.dimension {
                let raw = cursor.take(4)?;
                vector.push(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]));
            }
            vectors.push(vector);
        }
        if !cursor.is_exhausted() {
            return Err(IndexError::Corrupt("trailing bytes".to_string()));
        }

        Ok(Self {
            embedder_id: manifest.embedder_id,
            metric,
            dimension: manifest.dimension,
            chunks,
            vectors,
        })
    }
}

/// Bounds-checked byte reader; every short read is a corruption error.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], IndexError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| IndexError::Corrupt("truncated artifact".to_string()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_u32(&mut self) -> Result<u32, IndexError> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.bytes.len()
    }
}
