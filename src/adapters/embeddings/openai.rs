//! OpenAI embedding provider adapter.
//!
//! Talks to the `/embeddings` endpoint of any OpenAI-compatible API. Requests
//! share the rate limiter and retry policy used by the chat client.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Config;
use crate::domain::ports::EmbeddingProvider;
use crate::infrastructure::llm::client::error_from_response;
use crate::infrastructure::llm::types::{EmbeddingsRequest, EmbeddingsResponse};
use crate::infrastructure::llm::{resolve_api_key, LlmError, RetryPolicy, TokenBucketRateLimiter};

/// Configuration for the OpenAI embedding provider.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    /// API key. Falls back to `OPENAI_API_KEY` env var.
    pub api_key: Option<String>,
    /// Base URL for the API. Default: `https://api.openai.com/v1`.
    pub base_url: String,
    /// Embedding model. Default: `text-embedding-3-small`.
    pub model: String,
    /// Expected embedding dimension. Default: 1536.
    pub dimension: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum texts per single API request.
    pub max_batch_size: usize,
    pub requests_per_second: f64,
    pub burst_size: u32,
    pub retry: RetryPolicy,
}

impl Default for OpenAiEmbeddingConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl OpenAiEmbeddingConfig {
    /// Derive from application config; the key falls back to `llm.api_key`
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config
                .embedding
                .api_key
                .clone()
                .or_else(|| config.llm.api_key.clone()),
            base_url: config.embedding.base_url.clone(),
            model: config.embedding.model.clone(),
            dimension: config.embedding.dimension,
            timeout_secs: config.llm.timeout_secs,
            max_batch_size: config.embedding.batch_size.max(1),
            requests_per_second: config.rate_limit.requests_per_second,
            burst_size: config.rate_limit.burst_size,
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

/// OpenAI embedding provider.
pub struct OpenAiEmbeddingProvider {
    client: ReqwestClient,
    api_key: Option<String>,
    base_url: String,
    model: String,
    dimension: usize,
    max_batch_size: usize,
    rate_limiter: TokenBucketRateLimiter,
    retry_policy: RetryPolicy,
}

impl OpenAiEmbeddingProvider {
    pub fn new(config: OpenAiEmbeddingConfig) -> Result<Self, LlmError> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            api_key: resolve_api_key(config.api_key.as_deref()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            dimension: config.dimension,
            max_batch_size: config.max_batch_size.max(1),
            rate_limiter: TokenBucketRateLimiter::new(
                config.requests_per_second,
                config.burst_size,
            )?,
            retry_policy: config.retry,
        })
    }

    async fn send_request(
        &self,
        api_key: &str,
        body: &EmbeddingsRequest,
    ) -> Result<Vec<Vec<f32>>, LlmError> {
        self.rate_limiter.acquire().await;

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let result: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        if result.data.len() != body.input.len() {
            return Err(LlmError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                body.input.len(),
                result.data.len()
            )));
        }

        // Sort by index to maintain input order
        let mut data = result.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    async fn call_embeddings_api(&self, texts: Vec<String>) -> DomainResult<Vec<Vec<f32>>> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let body = EmbeddingsRequest {
            model: self.model.clone(),
            input: texts,
        };

        let vectors = self
            .retry_policy
            .execute(|| self.send_request(api_key, &body))
            .await?;

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(DomainError::ExecutionFailed(format!(
                "embedding dimension mismatch: expected {}, got {}",
                self.dimension,
                bad.len()
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.call_embeddings_api(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::ExecutionFailed("Empty embedding response".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.max_batch_size) {
            all.extend(self.call_embeddings_api(chunk.to_vec()).await?);
        }
        Ok(all)
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAiEmbeddingConfig::default();
        assert_eq!(config.model, "text-embedding-3-small");
        assert_eq!(config.dimension, 1536);
        assert_eq!(config.max_batch_size, 64);
        assert_eq!(config.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_api_key_falls_back_to_llm_key() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-llm".to_string());
        assert_eq!(
            OpenAiEmbeddingConfig::from_config(&config).api_key.as_deref(),
            Some("sk-llm")
        );

        config.embedding.api_key = Some("sk-embed".to_string());
        assert_eq!(
            OpenAiEmbeddingConfig::from_config(&config).api_key.as_deref(),
            Some("sk-embed")
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        temp_env::async_with_vars([("OPENAI_API_KEY", None::<&str>)], async {
            let provider = OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig {
                api_key: None,
                base_url: "http://127.0.0.1:9".to_string(),
                ..OpenAiEmbeddingConfig::default()
            })
            .unwrap();
            let err = provider.embed("Abstand").await.unwrap_err();
            assert!(matches!(err, DomainError::ExecutionFailed(_)));
        })
        .await;
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let provider = OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig {
            api_key: Some("sk-test".to_string()),
            base_url: "http://127.0.0.1:9".to_string(),
            ..OpenAiEmbeddingConfig::default()
        })
        .unwrap();
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }
}
