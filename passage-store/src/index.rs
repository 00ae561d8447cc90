//! Exact nearest-neighbor index over the corpus.

use ordered_float::OrderedFloat;
use tracing::{debug, info};

use secqa_embeddings::{Embedding, distance::squared_l2_distance};

use crate::chunk::Chunk;
use crate::error::{PassageStoreError, Result};

/// A scored retrieval hit. Borrows its chunk from the index.
#[derive(Debug, Clone, Copy)]
pub struct ScoredPassage<'a> {
    /// The matched chunk.
    pub chunk: &'a Chunk,

    /// Squared-L2 distance from the query; lower is closer.
    pub distance: f32,
}

/// An immutable nearest-neighbor index over all corpus chunks.
///
/// `build` is the only constructor. The index is read-only afterwards and
/// safe to share across concurrent queries without locking.
#[derive(Debug)]
pub struct PassageIndex {
    chunks: Vec<Chunk>,
    embeddings: Vec<Embedding>,
    dimension: usize,
}

impl PassageIndex {
    /// Build an index from parallel chunk and embedding sequences.
    ///
    /// Requires equal lengths, a non-empty corpus, and a uniform embedding
    /// dimension across the whole set.
    pub fn build(chunks: Vec<Chunk>, embeddings: Vec<Embedding>) -> Result<Self> {
        if chunks.len() != embeddings.len() {
            return Err(PassageStoreError::CountMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        let dimension = match embeddings.first() {
            Some(first) => first.len(),
            None => return Err(PassageStoreError::EmptyIndex),
        };

        for embedding in &embeddings {
            if embedding.len() != dimension {
                return Err(PassageStoreError::DimensionMismatch {
                    expected: dimension,
                    actual: embedding.len(),
                });
            }
        }

        info!(
            "Built passage index: {} chunks, dimension {dimension}",
            chunks.len()
        );

        Ok(Self {
            chunks,
            embeddings,
            dimension,
        })
    }

    /// Number of chunks in the index.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds zero chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Embedding dimension the index was built with.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// All chunks, in build order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Embeddings parallel to [`Self::chunks`].
    pub(crate) fn embeddings(&self) -> &[Embedding] {
        &self.embeddings
    }

    /// Find the `k` chunks closest to `query` under squared-L2 distance.
    ///
    /// Returns `min(k, len)` results sorted by non-decreasing distance;
    /// equal distances are broken by ascending chunk id. A query with the
    /// wrong dimension is an error, never silently padded.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredPassage<'_>>> {
        if self.chunks.is_empty() {
            return Err(PassageStoreError::EmptyIndex);
        }

        if query.len() != self.dimension {
            return Err(PassageStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(OrderedFloat<f32>, u64, usize)> =
            Vec::with_capacity(self.chunks.len());

        for (position, (chunk, embedding)) in
            self.chunks.iter().zip(self.embeddings.iter()).enumerate()
        {
            // Dimensions were validated at build time, so this cannot fail.
            let distance = squared_l2_distance(query, embedding).map_err(|_| {
                PassageStoreError::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                }
            })?;
            scored.push((OrderedFloat(distance), chunk.id, position));
        }

        scored.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let results: Vec<ScoredPassage<'_>> = scored
            .into_iter()
            .take(k)
            .map(|(distance, _, position)| ScoredPassage {
                chunk: &self.chunks[position],
                distance: distance.0,
            })
            .collect();

        debug!("Search returned {} of {k} requested results", results.len());

        Ok(results)
    }
}
