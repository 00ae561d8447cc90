//! # Completions
//!
//! This crate is the completion gateway for secqa: it sends a full
//! conversation (plus optional tool definitions) to a chat model and
//! reports what came back as a sum type.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Completion Gateway                      │
//! ├─────────────────────────────────────────────────────────┤
//! │  Conversation + [ToolSpec]                              │
//! │        │                                                │
//! │        ▼                                                │
//! │  CompletionClient ──► CompletionOutcome                 │
//! │        │                FinalText │ ToolInvocation      │
//! │        ▼                                                │
//! │  AzureChatClient                                        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The gateway is stateless between calls; all conversational context is
//! passed explicitly each time.

pub mod client;
pub mod conversation;
pub mod error;
pub mod tool;

pub use client::{AzureChatClient, CompletionClient, CompletionOutcome};
pub use conversation::{Conversation, Message, Role};
pub use error::{CompletionError, Result};
pub use tool::{ToolCallRequest, ToolSpec};
