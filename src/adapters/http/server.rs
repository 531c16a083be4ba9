//! HTTP server for the planner and the handbook assistant.

use axum::routing::{delete, get, post};
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::domain::models::Config;
use crate::services::{HandbookAssistant, PlanningService};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable CORS.
    pub enable_cors: bool,
    /// Directory with the browser frontend, served for unmatched paths.
    pub static_dir: Option<PathBuf>,
    /// How often idle sessions are purged.
    pub sweep_interval: Duration,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for HttpServerConfig {
    fn from(config: &Config) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            enable_cors: config.server.enable_cors,
            static_dir: config.server.static_dir.as_ref().map(PathBuf::from),
            sweep_interval: Duration::from_secs(config.sessions.sweep_interval_secs.max(1)),
        }
    }
}

/// Shared state for the handlers.
pub struct AppState {
    pub planning: Arc<PlanningService>,
    /// `None` when the handbook assistant is disabled
    pub assistant: Option<Arc<HandbookAssistant>>,
}

/// Planner HTTP Server.
pub struct CieloHttpServer {
    config: HttpServerConfig,
    state: Arc<AppState>,
}

impl CieloHttpServer {
    pub fn new(state: AppState, config: HttpServerConfig) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Build the router.
    pub fn router(&self) -> Router {
        let mut app = Router::new()
            .route("/start", get(handlers::start_session))
            .route("/respond", post(handlers::submit_scores))
            .route("/question", get(handlers::next_question))
            .route("/answer", post(handlers::submit_answer))
            .route("/advance", post(handlers::advance))
            .route("/progress", get(handlers::progress))
            .route("/sessions/{id}", delete(handlers::end_session))
            .route("/chapters", get(handlers::list_chapters))
            .route("/start-chat", post(handlers::start_chat))
            .route("/chat-message", post(handlers::chat_message))
            .route("/health", get(handlers::health_check))
            .with_state(Arc::clone(&self.state));

        if let Some(dir) = &self.config.static_dir {
            app = app.fallback_service(ServeDir::new(dir));
        }

        if self.config.enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http())
        } else {
            app.layer(TraceLayer::new_for_http())
        }
    }

    /// Periodically purge idle planning and chat sessions
    fn spawn_sweeper(&self) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let period = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match state.planning.purge_expired().await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(purged = n, "expired planning sessions removed"),
                    Err(e) => tracing::warn!(error = %e, "planning session sweep failed"),
                }
                if let Some(assistant) = &state.assistant {
                    match assistant.purge_expired().await {
                        Ok(0) => {}
                        Ok(n) => tracing::info!(purged = n, "expired chat sessions removed"),
                        Err(e) => tracing::warn!(error = %e, "chat session sweep failed"),
                    }
                }
            }
        })
    }

    /// Start the server.
    pub async fn serve(self) -> Result<(), BoxError> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), BoxError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already bound listener
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<(), BoxError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let sweeper = self.spawn_sweeper();

        tracing::info!(
            addr = %listener.local_addr()?,
            policy = %self.state.planning.policy(),
            chat = self.state.assistant.is_some(),
            "HTTP server listening"
        );

        let result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await;
        sweeper.abort();
        result?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert!(config.enable_cors);
        assert!(config.static_dir.is_none());
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }
}
