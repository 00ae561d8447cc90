//! The retrieval tool: its definition, argument handling, and result
//! formatting.

use tracing::debug;

use secqa_completions::{ToolCallRequest, ToolSpec};
use secqa_passage_store::ScoredPassage;

use crate::config::AgentConfig;

/// Name of the single retrieval capability offered to the model.
pub const RETRIEVAL_TOOL_NAME: &str = "search_domain_knowledge";

/// Build the retrieval tool definition.
pub fn retrieval_tool_spec() -> ToolSpec {
    ToolSpec::new(
        RETRIEVAL_TOOL_NAME,
        "Search the NIST cybersecurity publications knowledge base to find relevant \
         information about security frameworks, access control, cryptography, zero \
         trust, PKI, and other cybersecurity topics.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to find relevant NIST publications and guidelines.",
                },
                "top_k": {
                    "type": "integer",
                    "description": "Number of passages to return (default: 5)",
                    "default": 5
                }
            },
            "required": ["query"]
        }),
    )
}

/// A validated retrieval request extracted from a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Query text to embed.
    pub query: String,

    /// Number of passages to fetch.
    pub top_k: usize,
}

impl SearchRequest {
    /// Extract a search request from the model's tool-call arguments.
    ///
    /// A missing or empty `query` falls back to the user's original
    /// question; `top_k` defaults and is clamped to the configured range.
    /// Malformed argument JSON yields a request built entirely from the
    /// fallbacks.
    pub fn from_tool_call(
        call: &ToolCallRequest,
        fallback_query: &str,
        config: &AgentConfig,
    ) -> Self {
        let arguments = call.parsed_arguments().unwrap_or_else(|err| {
            debug!("Malformed tool arguments ({err}), using defaults");
            serde_json::json!({})
        });

        let query = arguments
            .get("query")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(fallback_query)
            .to_string();

        let requested = arguments
            .get("top_k")
            .and_then(|v| v.as_u64())
            .map_or(config.default_top_k, |k| k as usize);
        let top_k = requested.clamp(config.min_top_k, config.max_top_k);
        if top_k != requested {
            debug!("Clamped top_k from {requested} to {top_k}");
        }

        Self { query, top_k }
    }
}

/// Format retrieval hits as a tool-result block with provenance markers.
///
/// Each passage is introduced by `[Source N] [file, Page P]`; entries are
/// separated by `---` so the model can tell passages apart.
pub fn format_context(results: &[ScoredPassage<'_>]) -> String {
    if results.is_empty() {
        return "No relevant information found.".to_string();
    }

    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!(
                "[Source {}] {}\n{}\n",
                i + 1,
                result.chunk.citation(),
                result.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}
