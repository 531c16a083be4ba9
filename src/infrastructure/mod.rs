//! Infrastructure layer module
//!
//! - Configuration management (figment)
//! - Logging (tracing)
//! - Chat-completion API client with rate limiting and retry
//! - Text chunking and the in-memory vector index
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod llm;
pub mod logging;
pub mod vector;
