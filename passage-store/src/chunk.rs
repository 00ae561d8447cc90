//! The atomic retrieval unit: a bounded span of source text.

use serde::{Deserialize, Serialize};

/// A chunk of corpus text with its provenance.
///
/// Chunks are immutable after ingestion and owned by the passage index;
/// retrieval results borrow them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier within the corpus.
    pub id: u64,

    /// The chunk text.
    pub text: String,

    /// Source metadata, opaque to the store. By convention carries
    /// `filename` and `page` keys used for citation markers.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Chunk {
    /// Create a chunk with empty metadata.
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Attach source metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Render a citation marker for this chunk.
    ///
    /// Uses the conventional `filename`/`page` metadata keys when present,
    /// e.g. `[NIST.SP.800-207.pdf, Page 4]`, falling back to the chunk id.
    pub fn citation(&self) -> String {
        let filename = self.metadata.get("filename").and_then(|v| v.as_str());
        let page = self.metadata.get("page").and_then(|v| v.as_u64());

        match (filename, page) {
            (Some(filename), Some(page)) => format!("[{filename}, Page {page}]"),
            (Some(filename), None) => format!("[{filename}]"),
            _ => format!("[chunk {}]", self.id),
        }
    }
}
