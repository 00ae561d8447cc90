//! Embedding providers.
//!
//! A provider wraps a single external call: text in, fixed-length vector
//! out. The only shipped implementation talks to an Azure OpenAI
//! embeddings deployment.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Dimension of the vectors this provider produces.
    fn dimension(&self) -> usize;

    /// Generate an embedding for the given text.
    ///
    /// Issues one network call per invocation. Errors are propagated to
    /// the caller; retry policy lives above this layer.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generate embeddings for multiple texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        // Default implementation: process sequentially
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// Azure OpenAI embedding client.
///
/// Calls `{endpoint}/openai/deployments/{deployment}/embeddings` with the
/// `api-key` header scheme Azure uses instead of bearer auth.
pub struct AzureEmbeddingClient {
    /// API key.
    api_key: Option<String>,

    /// Resource endpoint, e.g. `https://myresource.openai.azure.com`.
    endpoint: String,

    /// Deployment name of the embedding model.
    deployment: String,

    /// API version query parameter.
    api_version: String,

    /// Output dimension of the deployed model.
    dimension: usize,

    /// HTTP client.
    client: reqwest::Client,
}

impl AzureEmbeddingClient {
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
            dimension: crate::DEFAULT_DIMENSION,
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from the `AZURE_OPENAI_*` / `EMBED_*` environment
    /// variables.
    pub fn from_env() -> Result<Self> {
        let endpoint =
            std::env::var("AZURE_OPENAI_ENDPOINT").map_err(|_| EmbeddingError::NotConfigured)?;
        let deployment =
            std::env::var("EMBED_DEPLOYMENT").map_err(|_| EmbeddingError::NotConfigured)?;
        let api_version =
            std::env::var("EMBED_API_VERSION").map_err(|_| EmbeddingError::NotConfigured)?;

        let mut client = Self::new(endpoint, deployment, api_version);
        client.api_key = std::env::var("AZURE_OPENAI_KEY").ok();
        Ok(client)
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the expected output dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

#[async_trait]
impl EmbeddingProvider for AzureEmbeddingClient {
    fn name(&self) -> &str {
        "azure-openai"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let api_key = self.api_key.as_ref().ok_or(EmbeddingError::NotConfigured)?;

        debug!("Embedding {} chars via {}", text.len(), self.deployment);

        let body = serde_json::json!({ "input": text });

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

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "API error: {error_text}"
            )));
        }

        let result: AzureEmbeddingResponse = response.json().await?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding in response".to_string()))?
            .embedding;

        debug!("Received embedding with {} dimensions", embedding.len());

        Ok(embedding)
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Azure embeddings API response format.
#[derive(Debug, Deserialize)]
struct AzureEmbeddingResponse {
    data: Vec<AzureEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct AzureEmbeddingData {
    embedding: Vec<f32>,
}
