//! Configuration for the agent orchestrator.

/// Configuration for the agent orchestrator.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum retrieval round-trips per turn. Beyond this the
    /// orchestrator answers with whatever context is available.
    pub max_tool_rounds: usize,

    /// `top_k` used when the model omits one.
    pub default_top_k: usize,

    /// Lower clamp for a model-supplied `top_k`.
    pub min_top_k: usize,

    /// Upper clamp for a model-supplied `top_k`.
    pub max_top_k: usize,

    /// System prompt for the answering calls.
    pub answer_system_prompt: String,

    /// System prompt for the critic call.
    pub critic_system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 2,
            default_top_k: 5,
            min_top_k: 1,
            max_top_k: 20,
            answer_system_prompt: ANSWER_SYSTEM_PROMPT.to_string(),
            critic_system_prompt: CRITIC_SYSTEM_PROMPT.to_string(),
        }
    }
}

const ANSWER_SYSTEM_PROMPT: &str = "\
You are a knowledgeable assistant specializing in NIST cybersecurity \
publications and guidelines.

When answering questions:
1. Use the search_domain_knowledge tool to find relevant information from NIST publications
2. Synthesize information from multiple sources when appropriate
3. Always cite your sources using the format [Source Name, Page X]
4. If information is not found, clearly state that

Be accurate, thorough, and cite specific documents when possible.";

const CRITIC_SYSTEM_PROMPT: &str = "\
You are a critic agent that checks a draft answer against the context \
that was retrieved for it.

Judge only whether the draft is supported by the retrieved context. Do \
not search for new information. Respond with a JSON object:
{
    \"accepted\": true | false,
    \"revised_answer\": \"If not accepted, a corrected answer grounded in the context, otherwise null\"
}

Guidelines:
- accepted: every claim in the draft is backed by the context, citations match their sources
- not accepted: the draft contradicts the context, cites sources that are not present, or asserts facts the context does not contain";
