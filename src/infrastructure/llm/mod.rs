//! Language-model API infrastructure
//!
//! HTTP client for OpenAI-compatible chat completions with rate limiting,
//! retry and error classification shared with the embedding adapter.

pub mod client;
pub mod errors;
pub mod rate_limiter;
pub mod retry;
pub mod types;

pub use client::{resolve_api_key, OpenAiChatClient, OpenAiClientConfig, API_KEY_ENV};
pub use errors::LlmError;
pub use rate_limiter::TokenBucketRateLimiter;
pub use retry::RetryPolicy;
