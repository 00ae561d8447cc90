//! Error types for the agent orchestrator.

use thiserror::Error;

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur while orchestrating a turn.
///
/// All variants wrap upstream failures; exhausting the tool-round budget
/// is internal control flow (the degraded-answer path), not an error.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Embedding gateway failure.
    #[error("embedding error: {0}")]
    Embedding(#[from] secqa_embeddings::EmbeddingError),

    /// Completion gateway failure.
    #[error("completion error: {0}")]
    Completion(#[from] secqa_completions::CompletionError),

    /// Passage store failure.
    #[error("passage store error: {0}")]
    PassageStore(#[from] secqa_passage_store::PassageStoreError),
}
