//! HTTP transport (axum).

pub mod handlers;
pub mod server;
pub mod types;

pub use server::{shutdown_signal, AppState, CieloHttpServer, HttpServerConfig};
pub use types::{ApiError, ErrorResponse, StepResponse};
