//! Adapters for transports and external systems.

pub mod embeddings;
pub mod http;
pub mod memory_store;

pub use embeddings::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
pub use http::{AppState, CieloHttpServer, HttpServerConfig};
pub use memory_store::InMemorySessionStore;
