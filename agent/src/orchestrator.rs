//! The per-turn orchestration state machine.

use std::sync::Arc;

use tracing::{info, warn};

use secqa_completions::{
    CompletionClient, CompletionError, CompletionOutcome, Conversation, Message, ToolCallRequest,
};
use secqa_embeddings::EmbeddingProvider;
use secqa_passage_store::PassageIndex;

use crate::config::AgentConfig;
use crate::critic;
use crate::error::{AgentError, Result};
use crate::tools::{self, RETRIEVAL_TOOL_NAME, SearchRequest};

/// The committed result of one successful turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The released answer.
    pub answer: String,

    /// The caller's history plus everything this turn appended: the user
    /// turn, any tool round-trips, and the final assistant turn.
    pub conversation: Conversation,

    /// Retrieval round-trips actually executed.
    pub tool_rounds: usize,
}

/// Coordinates the gateways and the passage index for one turn at a time.
///
/// The orchestrator holds no per-turn state. It receives the session
/// history by reference, works on a private copy, and returns the
/// committed successor only on success, so a failed turn leaves the
/// caller's history exactly as it was.
pub struct Orchestrator {
    /// Embedding gateway.
    embedder: Arc<dyn EmbeddingProvider>,

    /// Completion gateway.
    completions: Arc<dyn CompletionClient>,

    /// Read-only corpus index, shared across concurrent turns.
    index: Arc<PassageIndex>,

    /// Bounds and prompts.
    config: AgentConfig,
}

impl Orchestrator {
    /// Create an orchestrator with the default configuration.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        completions: Arc<dyn CompletionClient>,
        index: Arc<PassageIndex>,
    ) -> Self {
        Self {
            embedder,
            completions,
            index,
            config: AgentConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one full turn for `user_query` on top of `history`.
    ///
    /// Issues at most `max_tool_rounds` retrieval round-trips and exactly
    /// one critic pass with at most one revision, then returns the answer
    /// together with the committed conversation. Any gateway failure
    /// aborts the whole turn.
    pub async fn answer(&self, history: &Conversation, user_query: &str) -> Result<TurnOutcome> {
        let mut working = history.clone();
        working.push(Message::user(user_query));

        let tool_specs = [tools::retrieval_tool_spec()];
        let mut contexts: Vec<String> = Vec::new();
        let mut tool_rounds = 0;

        let draft = loop {
            let outcome = self
                .completions
                .complete(&self.with_system_prompt(&working), &tool_specs)
                .await?;

            match outcome {
                CompletionOutcome::FinalText(text) => break text,
                CompletionOutcome::ToolInvocation(call) => {
                    if tool_rounds >= self.config.max_tool_rounds {
                        info!(
                            "Tool round limit ({}) reached, answering with available context",
                            self.config.max_tool_rounds
                        );
                        break self
                            .degraded_answer(&mut working, !contexts.is_empty())
                            .await?;
                    }
                    tool_rounds += 1;

                    let result = self.execute_tool(&call, user_query, &mut contexts).await?;
                    working.push(Message::assistant_tool_call(call.clone()));
                    working.push(Message::tool(&call.id, result));
                }
            }
        };

        let retrieved = if contexts.is_empty() {
            "No context was retrieved.".to_string()
        } else {
            contexts.join("\n\n")
        };

        let verdict = critic::evaluate(
            self.completions.as_ref(),
            &self.config,
            user_query,
            &retrieved,
            &draft,
        )
        .await?;

        let answer = if verdict.accepted {
            draft
        } else {
            info!("Critic rejected the draft, applying its revision");
            verdict.revised_answer.unwrap_or(draft)
        };

        working.push(Message::assistant(answer.clone()));

        Ok(TurnOutcome {
            answer,
            conversation: working,
            tool_rounds,
        })
    }

    /// Prepend the answering system prompt to a request.
    fn with_system_prompt(&self, history: &Conversation) -> Conversation {
        let mut request = Conversation::new();
        request.push(Message::system(&self.config.answer_system_prompt));
        for message in history.messages() {
            request.push(message.clone());
        }
        request
    }

    /// Execute one tool call and return the tool-result text.
    ///
    /// Unknown tool names produce an error-text result instead of failing
    /// the turn; the model sees its mistake and can answer anyway.
    async fn execute_tool(
        &self,
        call: &ToolCallRequest,
        user_query: &str,
        contexts: &mut Vec<String>,
    ) -> Result<String> {
        if call.name != RETRIEVAL_TOOL_NAME {
            warn!("Model requested unknown tool '{}'", call.name);
            return Ok(format!("Unknown tool: {}", call.name));
        }

        let request = SearchRequest::from_tool_call(call, user_query, &self.config);
        info!(
            "Searching corpus: '{}' (top_k={})",
            request.query, request.top_k
        );

        let vector = self.embedder.embed(&request.query).await?;
        let hits = self.index.search(&vector, request.top_k)?;
        let context = tools::format_context(&hits);

        contexts.push(context.clone());
        Ok(context)
    }

    /// Produce an answer once the tool-round budget is spent: one final
    /// completion call with no tool definitions.
    async fn degraded_answer(
        &self,
        working: &mut Conversation,
        has_context: bool,
    ) -> Result<String> {
        let instruction = if has_context {
            "Answer the user's question now using only the information already \
             retrieved above. Do not request further searches."
        } else {
            "No search results are available. Answer the user's question from \
             general knowledge and clearly state what could not be verified."
        };
        working.push(Message::user(instruction));

        match self
            .completions
            .complete(&self.with_system_prompt(working), &[])
            .await?
        {
            CompletionOutcome::FinalText(text) => Ok(text),
            CompletionOutcome::ToolInvocation(call) => Err(AgentError::Completion(
                CompletionError::InvalidResponse(format!(
                    "model requested tool '{}' with no tools offered",
                    call.name
                )),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use secqa_completions::{Role, ToolSpec};
    use secqa_embeddings::{Embedding, EmbeddingError};
    use secqa_passage_store::Chunk;

    /// Completion client that replays a fixed script and records what it
    /// was asked.
    struct ScriptedClient {
        script: Mutex<VecDeque<secqa_completions::Result<CompletionOutcome>>>,
        calls: Mutex<Vec<CallRecord>>,
    }

    #[derive(Debug, Clone)]
    struct CallRecord {
        tools_offered: usize,
        tool_turns: usize,
    }

    impl ScriptedClient {
        fn new(script: Vec<secqa_completions::Result<CompletionOutcome>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<CallRecord> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            conversation: &Conversation,
            tools: &[ToolSpec],
        ) -> secqa_completions::Result<CompletionOutcome> {
            self.calls.lock().unwrap().push(CallRecord {
                tools_offered: tools.len(),
                tool_turns: conversation
                    .messages()
                    .iter()
                    .filter(|m| m.role == Role::Tool)
                    .count(),
            });
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("completion script exhausted")
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    /// Embedder that returns a fixed vector and records the texts it saw.
    struct FixedEmbedder {
        vector: Embedding,
        texts: Mutex<Vec<String>>,
    }

    impl FixedEmbedder {
        fn new(vector: Embedding) -> Self {
            Self {
                vector,
                texts: Mutex::new(Vec::new()),
            }
        }

        fn texts(&self) -> Vec<String> {
            self.texts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn name(&self) -> &str {
            "fixed"
        }

        fn dimension(&self) -> usize {
            self.vector.len()
        }

        async fn embed(&self, text: &str) -> secqa_embeddings::Result<Embedding> {
            self.texts.lock().unwrap().push(text.to_string());
            Ok(self.vector.clone())
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn sample_index() -> PassageIndex {
        let chunks = vec![
            Chunk::new(0, "Zero trust replaces implicit trust with continuous verification.")
                .with_metadata(serde_json::json!({ "filename": "NIST.SP.800-207.pdf", "page": 4 })),
            Chunk::new(1, "Access control restricts what subjects can do."),
            Chunk::new(2, "PKI binds public keys to identities."),
        ];
        let embeddings = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        PassageIndex::build(chunks, embeddings).unwrap()
    }

    fn orchestrator_with(
        script: Vec<secqa_completions::Result<CompletionOutcome>>,
    ) -> (Orchestrator, Arc<FixedEmbedder>, Arc<ScriptedClient>) {
        let embedder = Arc::new(FixedEmbedder::new(vec![1.0, 0.0, 0.0]));
        let client = Arc::new(ScriptedClient::new(script));
        let orchestrator = Orchestrator::new(
            embedder.clone(),
            client.clone(),
            Arc::new(sample_index()),
        );
        (orchestrator, embedder, client)
    }

    fn tool_call(arguments: &str) -> CompletionOutcome {
        CompletionOutcome::ToolInvocation(ToolCallRequest::new(
            "call_1",
            RETRIEVAL_TOOL_NAME,
            arguments,
        ))
    }

    fn accepted() -> CompletionOutcome {
        CompletionOutcome::FinalText(r#"{"accepted": true, "revised_answer": null}"#.to_string())
    }

    #[tokio::test]
    async fn test_direct_answer_without_retrieval() {
        let (orchestrator, embedder, client) = orchestrator_with(vec![
            Ok(CompletionOutcome::FinalText("Direct answer.".to_string())),
            Ok(accepted()),
        ]);

        let outcome = orchestrator
            .answer(&Conversation::new(), "What is zero trust?")
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Direct answer.");
        assert_eq!(outcome.tool_rounds, 0);
        assert!(embedder.texts().is_empty());

        // user turn + assistant turn
        assert_eq!(outcome.conversation.len(), 2);
        assert_eq!(outcome.conversation.messages()[1].role, Role::Assistant);

        // answering call offered the tool, critic call did not
        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].tools_offered, 1);
        assert_eq!(calls[1].tools_offered, 0);
    }

    #[tokio::test]
    async fn test_single_retrieval_round_grounds_the_answer() {
        let (orchestrator, embedder, client) = orchestrator_with(vec![
            Ok(tool_call(r#"{"query": "zero trust architecture", "top_k": 2}"#)),
            Ok(CompletionOutcome::FinalText("Grounded answer.".to_string())),
            Ok(accepted()),
        ]);

        let outcome = orchestrator
            .answer(&Conversation::new(), "What is zero trust architecture?")
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Grounded answer.");
        assert_eq!(outcome.tool_rounds, 1);
        assert_eq!(embedder.texts(), vec!["zero trust architecture".to_string()]);

        // user, assistant tool-call, tool result, assistant answer
        assert_eq!(outcome.conversation.len(), 4);
        let tool_turn = &outcome.conversation.messages()[2];
        assert_eq!(tool_turn.role, Role::Tool);
        let tool_text = tool_turn.content.as_deref().unwrap();
        assert!(tool_text.contains("continuous verification"));
        assert!(tool_text.contains("[NIST.SP.800-207.pdf, Page 4]"));

        // The second answering call saw the tool turn.
        let calls = client.calls();
        assert_eq!(calls[1].tool_turns, 1);
    }

    #[tokio::test]
    async fn test_tool_rounds_are_bounded() {
        let (orchestrator, embedder, client) = orchestrator_with(vec![
            Ok(tool_call(r#"{"query": "first"}"#)),
            Ok(tool_call(r#"{"query": "second"}"#)),
            Ok(tool_call(r#"{"query": "third"}"#)),
            Ok(CompletionOutcome::FinalText("Best effort answer.".to_string())),
            Ok(accepted()),
        ]);

        let outcome = orchestrator
            .answer(&Conversation::new(), "adversarial")
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Best effort answer.");
        // Only the first two tool requests were executed.
        assert_eq!(outcome.tool_rounds, 2);
        assert_eq!(embedder.texts(), vec!["first".to_string(), "second".to_string()]);

        // The degraded call and the critic call both offered no tools.
        let calls = client.calls();
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[3].tools_offered, 0);
        assert_eq!(calls[4].tools_offered, 0);
    }

    #[tokio::test]
    async fn test_critic_revision_is_applied_once() {
        let (orchestrator, _, client) = orchestrator_with(vec![
            Ok(CompletionOutcome::FinalText("Sloppy draft.".to_string())),
            Ok(CompletionOutcome::FinalText(
                r#"{"accepted": false, "revised_answer": "Corrected answer."}"#.to_string(),
            )),
        ]);

        let outcome = orchestrator
            .answer(&Conversation::new(), "question")
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Corrected answer.");
        assert_eq!(
            outcome.conversation.last().and_then(|m| m.content.as_deref()),
            Some("Corrected answer.")
        );
        // No second critic pass on the revision.
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_critic_rejection_without_revision_keeps_draft() {
        let (orchestrator, _, _) = orchestrator_with(vec![
            Ok(CompletionOutcome::FinalText("Draft.".to_string())),
            Ok(CompletionOutcome::FinalText(
                r#"{"accepted": false, "revised_answer": null}"#.to_string(),
            )),
        ]);

        let outcome = orchestrator
            .answer(&Conversation::new(), "question")
            .await
            .unwrap();
        assert_eq!(outcome.answer, "Draft.");
    }

    #[tokio::test]
    async fn test_unparseable_critic_reply_accepts_draft() {
        let (orchestrator, _, _) = orchestrator_with(vec![
            Ok(CompletionOutcome::FinalText("Draft.".to_string())),
            Ok(CompletionOutcome::FinalText("I refuse to emit JSON".to_string())),
        ]);

        let outcome = orchestrator
            .answer(&Conversation::new(), "question")
            .await
            .unwrap();
        assert_eq!(outcome.answer, "Draft.");
    }

    #[tokio::test]
    async fn test_critic_failure_aborts_turn_without_history_leak() {
        let (orchestrator, _, _) = orchestrator_with(vec![
            Ok(CompletionOutcome::FinalText("Draft.".to_string())),
            Err(CompletionError::ApiRequest("backend down".to_string())),
        ]);

        let mut history = Conversation::new();
        history.push(Message::user("earlier question"));
        history.push(Message::assistant("earlier answer"));

        let err = orchestrator.answer(&history, "question").await.unwrap_err();
        assert!(matches!(err, AgentError::Completion(_)));

        // The draft never reached the session history.
        assert_eq!(history.len(), 2);
        assert_eq!(
            history.last().and_then(|m| m.content.as_deref()),
            Some("earlier answer")
        );
    }

    #[tokio::test]
    async fn test_missing_query_defaults_to_user_query() {
        let (orchestrator, embedder, _) = orchestrator_with(vec![
            Ok(tool_call("{}")),
            Ok(CompletionOutcome::FinalText("Answer.".to_string())),
            Ok(accepted()),
        ]);

        orchestrator
            .answer(&Conversation::new(), "what is PKI?")
            .await
            .unwrap();

        assert_eq!(embedder.texts(), vec!["what is PKI?".to_string()]);
    }

    #[tokio::test]
    async fn test_top_k_is_clamped() {
        let (orchestrator, _, _) = orchestrator_with(vec![
            Ok(tool_call(r#"{"query": "q", "top_k": 999}"#)),
            Ok(CompletionOutcome::FinalText("Answer.".to_string())),
            Ok(accepted()),
        ]);

        let outcome = orchestrator
            .answer(&Conversation::new(), "question")
            .await
            .unwrap();

        // Clamped to max_top_k (20), corpus has 3 chunks: all three and no
        // more appear in the tool result.
        let tool_text = outcome.conversation.messages()[2]
            .content
            .as_deref()
            .unwrap();
        assert_eq!(tool_text.matches("[Source ").count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_tool_yields_error_text_result() {
        let (orchestrator, embedder, _) = orchestrator_with(vec![
            Ok(CompletionOutcome::ToolInvocation(ToolCallRequest::new(
                "call_9",
                "delete_everything",
                "{}",
            ))),
            Ok(CompletionOutcome::FinalText("Answer.".to_string())),
            Ok(accepted()),
        ]);

        let outcome = orchestrator
            .answer(&Conversation::new(), "question")
            .await
            .unwrap();

        assert!(embedder.texts().is_empty());
        let tool_text = outcome.conversation.messages()[2]
            .content
            .as_deref()
            .unwrap();
        assert_eq!(tool_text, "Unknown tool: delete_everything");
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_turn() {
        let embedder = Arc::new(FailingEmbedder);
        let client = Arc::new(ScriptedClient::new(vec![Ok(tool_call(
            r#"{"query": "q"}"#,
        ))]));
        let orchestrator =
            Orchestrator::new(embedder, client, Arc::new(sample_index()));

        let err = orchestrator
            .answer(&Conversation::new(), "question")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Embedding(_)));
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        fn name(&self) -> &str {
            "failing"
        }

        fn dimension(&self) -> usize {
            3
        }

        async fn embed(&self, _text: &str) -> secqa_embeddings::Result<Embedding> {
            Err(EmbeddingError::ApiRequest("embedding backend down".to_string()))
        }

        fn is_available(&self) -> bool {
            true
        }
    }
}
