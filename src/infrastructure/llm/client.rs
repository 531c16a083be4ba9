//! OpenAI-compatible chat-completion client
//!
//! Features:
//! - Connection pooling via a shared `reqwest::Client`
//! - Token bucket rate limiting (`governor`)
//! - Exponential backoff retry for transient errors (`backoff`)
//! - Error classification (transient vs permanent)

use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient, Response};
use std::time::Duration;
use tracing::{debug, instrument};

use super::errors::LlmError;
use super::rate_limiter::TokenBucketRateLimiter;
use super::retry::RetryPolicy;
use super::types::{error_message, ChatCompletionRequest, ChatCompletionResponse, WireMessage};
use crate::domain::errors::DomainResult;
use crate::domain::models::{ChatRole, Config};
use crate::domain::ports::{CompletionRequest, CompletionResponse, LlmClient, TokenUsage};

/// Environment variable consulted when no key is configured
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Configuration for [`OpenAiChatClient`]
#[derive(Debug, Clone)]
pub struct OpenAiClientConfig {
    /// API key. Falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Default model when a request carries no override
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub requests_per_second: f64,
    pub burst_size: u32,
    pub retry: RetryPolicy,
}

impl Default for OpenAiClientConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl OpenAiClientConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.llm.api_key.clone(),
            base_url: config.llm.base_url.clone(),
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            timeout_secs: config.llm.timeout_secs,
            requests_per_second: config.rate_limit.requests_per_second,
            burst_size: config.rate_limit.burst_size,
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

/// Resolve an API key from configuration or the environment
pub fn resolve_api_key(configured: Option<&str>) -> Option<String> {
    configured
        .map(str::to_string)
        .filter(|k| !k.trim().is_empty())
        .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
}

/// Turn a non-success response into a classified error
pub(crate) async fn error_from_response(response: Response) -> LlmError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read response body".to_string());
    LlmError::from_status(status, error_message(&body), retry_after)
}

/// Chat-completion client for OpenAI-compatible APIs
pub struct OpenAiChatClient {
    http_client: ReqwestClient,
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    rate_limiter: TokenBucketRateLimiter,
    retry_policy: RetryPolicy,
}

impl OpenAiChatClient {
    /// Build a client
    ///
    /// A missing API key is not an error here; requests fail with
    /// `LlmError::MissingApiKey` instead, so the planner can run without one.
    pub fn new(config: OpenAiClientConfig) -> Result<Self, LlmError> {
        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| LlmError::Configuration(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: resolve_api_key(config.api_key.as_deref()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            rate_limiter: TokenBucketRateLimiter::new(
                config.requests_per_second,
                config.burst_size,
            )?,
            retry_policy: config.retry,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_wire(&self, request: CompletionRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system {
            messages.push(WireMessage {
                role: ChatRole::System.as_str().to_string(),
                content: system,
            });
        }
        messages.extend(request.messages.into_iter().map(|turn| WireMessage {
            role: turn.role.as_str().to_string(),
            content: turn.content,
        }));

        ChatCompletionRequest {
            model: request.model.unwrap_or_else(|| self.model.clone()),
            messages,
            max_tokens: Some(request.max_tokens.unwrap_or(self.max_tokens)),
            temperature: Some(request.temperature.unwrap_or(self.temperature)),
        }
    }

    async fn send_request(
        &self,
        api_key: &str,
        body: &ChatCompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.rate_limiter.acquire().await;

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        let usage = parsed.usage.unwrap_or_default();
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content,
            model: parsed.model,
            finish_reason: choice.finish_reason,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
            },
        })
    }

    /// Run a completion, keeping the classified error
    #[instrument(skip(self, request), fields(messages = request.messages.len()), err)]
    pub async fn try_complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let body = self.to_wire(request);

        let response = self
            .retry_policy
            .execute(|| self.send_request(api_key, &body))
            .await?;

        debug!(
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "completion received"
        );
        Ok(response)
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete(&self, request: CompletionRequest) -> DomainResult<CompletionResponse> {
        Ok(self.try_complete(request).await?)
    }
}
