//! # Agent
//!
//! This crate is the orchestration core of secqa: the per-turn state
//! machine that decides when to search, runs the retrieval round-trip,
//! assembles a grounded prompt, and validates the draft answer with a
//! critic pass before releasing it.
//!
//! ## Turn flow
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                       Agent Orchestrator                       │
//! ├────────────────────────────────────────────────────────────────┤
//! │  user query ──► complete(+tool)                                │
//! │                    │                                           │
//! │       ┌────────────┴─────────────┐                             │
//! │       ▼                          ▼                             │
//! │  ToolInvocation             FinalText (draft)                  │
//! │  embed ► search ► tool turn      │                             │
//! │       │ (≤ max_tool_rounds)      ▼                             │
//! │       └──► complete again    critic pass (no tools)            │
//! │                                  │                             │
//! │                        accepted ─┴─ rejected ► revised answer  │
//! │                                  ▼                             │
//! │                          committed conversation                │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bounds are explicit counters checked before each gateway call: at most
//! `max_tool_rounds` retrievals and at most one critic revision per turn,
//! so a turn always terminates no matter how the model behaves. A turn
//! either commits whole or not at all — the caller's history is never
//! mutated on failure.

pub mod config;
pub mod critic;
pub mod error;
pub mod orchestrator;
pub mod tools;

pub use config::AgentConfig;
pub use critic::CriticVerdict;
pub use error::{AgentError, Result};
pub use orchestrator::{Orchestrator, TurnOutcome};
pub use tools::{RETRIEVAL_TOOL_NAME, SearchRequest, format_context, retrieval_tool_spec};
