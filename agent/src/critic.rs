//! Critic pass: a closed self-check on the draft answer.
//!
//! The critic is a second, independent completion call with no tool
//! access. It judges the draft strictly against the retrieved context and
//! either accepts it or supplies a revision. An unparseable critic reply
//! accepts the draft unrevised, so a flaky critic can never block an
//! answer.

use serde::Deserialize;
use tracing::{debug, warn};

use secqa_completions::{CompletionClient, CompletionOutcome, Conversation, Message};

use crate::config::AgentConfig;
use crate::error::Result;

/// The critic's judgment on a draft answer.
#[derive(Debug, Clone, Deserialize)]
pub struct CriticVerdict {
    /// Whether the draft may be released as-is.
    pub accepted: bool,

    /// Replacement answer when the draft is rejected.
    #[serde(default)]
    pub revised_answer: Option<String>,
}

impl CriticVerdict {
    fn accept() -> Self {
        Self {
            accepted: true,
            revised_answer: None,
        }
    }
}

/// Run the critic pass over a draft answer.
pub async fn evaluate(
    client: &dyn CompletionClient,
    config: &AgentConfig,
    user_query: &str,
    context: &str,
    draft: &str,
) -> Result<CriticVerdict> {
    let mut conversation = Conversation::new();
    conversation.push(Message::system(&config.critic_system_prompt));
    conversation.push(Message::user(format!(
        "User Query: {user_query}\n\n\
         Retrieved Context:\n{context}\n\n\
         Draft Answer:\n{draft}\n\n\
         Evaluate whether the draft answer is supported by the retrieved \
         context. Respond with JSON only."
    )));

    // No tool definitions: the critic may not issue a second research round.
    let outcome = client.complete(&conversation, &[]).await?;

    let reply = match outcome {
        CompletionOutcome::FinalText(text) => text,
        CompletionOutcome::ToolInvocation(call) => {
            warn!("Critic requested tool '{}' despite having none", call.name);
            return Ok(CriticVerdict::accept());
        }
    };

    match serde_json::from_str::<CriticVerdict>(strip_code_fences(&reply)) {
        Ok(verdict) => {
            debug!(
                "Critic verdict: accepted={}, revision={}",
                verdict.accepted,
                verdict.revised_answer.is_some()
            );
            Ok(verdict)
        }
        Err(err) => {
            warn!("Failed to parse critic reply ({err}), accepting draft");
            warn!("Raw critic reply (first 500 chars): {reply:.500}");
            Ok(CriticVerdict::accept())
        }
    }
}

/// Strip a surrounding markdown code fence, if present.
fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();

    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);

    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
