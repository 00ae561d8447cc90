//! Error types for the passage store.

use thiserror::Error;

/// Result type alias for passage store operations.
pub type Result<T> = std::result::Result<T, PassageStoreError>;

/// Errors that can occur in the passage store.
#[derive(Error, Debug)]
pub enum PassageStoreError {
    /// Chunk and embedding counts differ.
    #[error("count mismatch: {chunks} chunks, {embeddings} embeddings")]
    CountMismatch { chunks: usize, embeddings: usize },

    /// An embedding has the wrong dimension. The corpus must be rebuilt
    /// with the running embedding model; vectors are never truncated or
    /// padded to fit.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The corpus holds zero chunks.
    #[error("passage index is empty, build the corpus first")]
    EmptyIndex,

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
