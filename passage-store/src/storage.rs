//! Corpus persistence.
//!
//! The corpus is a single JSON file of records, one per chunk, written at
//! build time and loaded read-only at startup. Loading revalidates through
//! [`PassageIndex::build`], so a corpus produced by a different embedding
//! model version fails loudly instead of returning meaningless neighbors.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use secqa_embeddings::Embedding;

use crate::chunk::Chunk;
use crate::error::Result;
use crate::index::PassageIndex;

/// One persisted corpus entry.
#[derive(Debug, Serialize, Deserialize)]
struct PassageRecord {
    id: u64,
    text: String,
    #[serde(default)]
    metadata: serde_json::Value,
    embedding: Embedding,
}

impl PassageIndex {
    /// Write the corpus to `path` as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let records: Vec<PassageRecord> = self
            .chunks()
            .iter()
            .zip(self.embeddings().iter())
            .map(|(chunk, embedding)| PassageRecord {
                id: chunk.id,
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                embedding: embedding.clone(),
            })
            .collect();

        let json = serde_json::to_string(&records)?;
        fs::write(path.as_ref(), json)?;

        info!(
            "Saved corpus with {} chunks to {}",
            records.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Load a corpus from `path` and rebuild the index over it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let records: Vec<PassageRecord> = serde_json::from_str(&json)?;

        let mut chunks = Vec::with_capacity(records.len());
        let mut embeddings = Vec::with_capacity(records.len());
        for record in records {
            chunks.push(Chunk {
                id: record.id,
                text: record.text,
                metadata: record.metadata,
            });
            embeddings.push(record.embedding);
        }

        let index = Self::build(chunks, embeddings)?;
        info!(
            "Loaded corpus with {} chunks from {}",
            index.len(),
            path.as_ref().display()
        );
        Ok(index)
    }
}
