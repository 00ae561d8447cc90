//! Completion clients.
//!
//! A client wraps a single external call: conversation in, model reply
//! out. The reply is a sum type — either final text or a request to
//! invoke a tool — so callers branch on the variant instead of probing
//! response shapes.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::conversation::{Conversation, Message, Role};
use crate::error::{CompletionError, Result};
use crate::tool::{ToolCallRequest, ToolSpec};

/// What the model produced for one completion call.
#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    /// The model answered with text.
    FinalText(String),

    /// The model asked to invoke a tool. When the backend returns several
    /// calls in one reply, only the first is surfaced; the caller issues
    /// one retrieval per round.
    ToolInvocation(ToolCallRequest),
}

/// Trait for completion backends.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Get the name of this client.
    fn name(&self) -> &str;

    /// Send the conversation (and optional tool definitions) to the model.
    ///
    /// The gateway holds no state between calls; the full history must be
    /// passed each time. An empty `tools` slice offers the model no tools.
    async fn complete(
        &self,
        conversation: &Conversation,
        tools: &[ToolSpec],
    ) -> Result<CompletionOutcome>;

    /// Check if the client is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// Azure OpenAI chat-completions client.
///
/// Calls `{endpoint}/openai/deployments/{deployment}/chat/completions`
/// with the `api-key` header scheme Azure uses instead of bearer auth.
pub struct AzureChatClient {
    /// API key.
    api_key: Option<String>,

    /// Resource endpoint, e.g. `https://myresource.openai.azure.com`.
    endpoint: String,

    /// Deployment name of the chat model.
    deployment: String,

    /// API version query parameter.
    api_version: String,

    /// HTTP client.
    client: reqwest::Client,
}

impl AzureChatClient {
    /// Create a client from explicit parts.
    pub fn new(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            api_key: None,
            endpoint: endpoint.into(),
            deployment: deployment.into(),
            api_version: api_version.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from the `AZURE_OPENAI_*` / `CHAT_*` environment
    /// variables.
    pub fn from_env() -> Result<Self> {
        let endpoint =
            std::env::var("AZURE_OPENAI_ENDPOINT").map_err(|_| CompletionError::NotConfigured)?;
        let deployment =
            std::env::var("CHAT_DEPLOYMENT").map_err(|_| CompletionError::NotConfigured)?;
        let api_version =
            std::env::var("CHAT_API_VERSION").map_err(|_| CompletionError::NotConfigured)?;

        let mut client = Self::new(endpoint, deployment, api_version);
        client.api_key = std::env::var("AZURE_OPENAI_KEY").ok();
        Ok(client)
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }

    fn wire_messages(conversation: &Conversation) -> Vec<serde_json::Value> {
        conversation
            .messages()
            .iter()
            .map(|message| {
                let mut wire = serde_json::json!({
                    "role": role_str(message.role),
                    "content": message.content,
                });
                if !message.tool_calls.is_empty() {
                    wire["tool_calls"] = message
                        .tool_calls
                        .iter()
                        .map(|call| {
                            serde_json::json!({
                                "id": call.id,
                                "type": "function",
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments,
                                }
                            })
                        })
                        .collect();
                }
                if let Some(tool_call_id) = &message.tool_call_id {
                    wire["tool_call_id"] = serde_json::json!(tool_call_id);
                }
                wire
            })
            .collect()
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

#[async_trait]
impl CompletionClient for AzureChatClient {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn complete(
        &self,
        conversation: &Conversation,
        tools: &[ToolSpec],
    ) -> Result<CompletionOutcome> {
        let api_key = self.api_key.as_ref().ok_or(CompletionError::NotConfigured)?;

        let mut body = serde_json::json!({
            "messages": Self::wire_messages(conversation),
        });
        if !tools.is_empty() {
            body["tools"] = tools.iter().map(ToolSpec::to_wire_format).collect();
            body["tool_choice"] = serde_json::json!("auto");
        }

        debug!(
            "Completing {} turns ({} tools) via {}",
            conversation.len(),
            tools.len(),
            self.deployment
        );

        let response = self
            .client
            .post(self.url())
            .header("api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(CompletionError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CompletionError::ApiRequest(format!(
                "API error: {error_text}"
            )));
        }

        let result: AzureChatResponse = response.json().await?;

        let message = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("no choices in response".to_string()))?
            .message;

        if let Some(call) = message.tool_calls.into_iter().next() {
            debug!("Model requested tool '{}'", call.function.name);
            return Ok(CompletionOutcome::ToolInvocation(ToolCallRequest::new(
                call.id,
                call.function.name,
                call.function.arguments,
            )));
        }

        match message.content {
            Some(content) => Ok(CompletionOutcome::FinalText(content)),
            None => Err(CompletionError::InvalidResponse(
                "message had neither content nor tool calls".to_string(),
            )),
        }
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Azure chat-completions API response format.
#[derive(Debug, Deserialize)]
struct AzureChatResponse {
    choices: Vec<AzureChatChoice>,
}

#[derive(Debug, Deserialize)]
struct AzureChatChoice {
    message: AzureChatMessage,
}

#[derive(Debug, Deserialize)]
struct AzureChatMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<AzureToolCall>,
}

#[derive(Debug, Deserialize)]
struct AzureToolCall {
    id: String,
    function: AzureToolFunction,
}

#[derive(Debug, Deserialize)]
struct AzureToolFunction {
    name: String,
    arguments: String,
}
