//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces that adapters and infrastructure implement:
//! - SessionStore: keyed session state with expiry
//! - JustificationProvider: explanatory text for a finished path
//! - LlmClient: chat-completion API
//! - EmbeddingProvider: text embeddings for the handbook index

pub mod embedding;
pub mod hashing_embedding;
pub mod justification;
pub mod llm_client;
pub mod session_store;

pub use embedding::EmbeddingProvider;
pub use hashing_embedding::HashingEmbeddingProvider;
pub use justification::JustificationProvider;
pub use llm_client::{CompletionRequest, CompletionResponse, LlmClient, TokenUsage};
pub use session_store::SessionStore;
