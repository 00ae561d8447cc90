//! # Embeddings
//!
//! This crate is the embedding gateway for secqa: it turns text into
//! fixed-length vectors via an external API and provides the vector math
//! the passage index is built on.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Embedding Gateway                      │
//! ├─────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding (Vec<f32>)             │
//! │       │                      │                          │
//! │       ▼                      ▼                          │
//! │  AzureEmbeddingClient   distance functions              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! One network call per `embed` invocation; no caching. Vectors are not
//! portable across embedding-model versions, so a corpus must be rebuilt
//! whenever the backing model changes.

pub mod distance;
pub mod error;
pub mod provider;

pub use distance::{cosine_similarity, normalize, squared_l2_distance};
pub use error::{EmbeddingError, Result};
pub use provider::{AzureEmbeddingClient, EmbeddingProvider};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings produced by the default deployment
/// (text-embedding-ada-002).
pub const DEFAULT_DIMENSION: usize = 1536;
