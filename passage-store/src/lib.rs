//! # Passage Store
//!
//! This crate holds the retrieval corpus for secqa: text chunks, their
//! embeddings, and an exact nearest-neighbor index over them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   Passage Store                         │
//! ├─────────────────────────────────────────────────────────┤
//! │  TextChunker ──► Chunk ──► PassageIndex::build          │
//! │                               │                         │
//! │                               ▼                         │
//! │  corpus.json ◄──► search(query, k) ──► ScoredPassage    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The index is built wholesale from the full chunk set and is read-only
//! afterwards; a corpus change means a rebuild, never an incremental
//! insert. Search is an exact scan under squared-L2 distance, matching
//! the flat L2 index the corpus was originally served from.

pub mod chunk;
pub mod chunker;
pub mod error;
pub mod index;
pub mod storage;

pub use chunk::Chunk;
pub use chunker::{ChunkerConfig, TextChunker};
pub use error::{PassageStoreError, Result};
pub use index::{PassageIndex, ScoredPassage};
