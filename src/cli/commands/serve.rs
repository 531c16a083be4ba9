//! Implementation of the `cielo serve` command.

use anyhow::{anyhow, Result};
use clap::Args;
use std::path::PathBuf;

use crate::adapters::http::{shutdown_signal, AppState, CieloHttpServer, HttpServerConfig};
use crate::cli::context::AppContext;
use crate::domain::models::PolicyKind;
use crate::services::SelectorPolicy;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bind address (overrides `server.host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port (overrides `server.port`)
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Selection policy (overrides `planner.policy`)
    #[arg(long)]
    pub policy: Option<PolicyKind>,

    /// Directory with the browser frontend
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs, mut ctx: AppContext) -> Result<()> {
    if let Some(policy) = args.policy {
        ctx.config.planner.policy = policy;
    }

    let mut server_config = HttpServerConfig::from(&ctx.config);
    if let Some(host) = args.host {
        server_config.host = host;
    }
    if let Some(port) = args.port {
        server_config.port = port;
    }
    if args.static_dir.is_some() {
        server_config.static_dir = args.static_dir;
    }

    let llm = ctx.llm_client()?;
    let justifier = ctx.justifier(&llm);
    let policy = SelectorPolicy::from_config(&ctx.config.planner);
    let planning = ctx.planning_service(policy, justifier);
    let assistant = ctx.serving_assistant(llm).await?;

    let state = AppState {
        planning: std::sync::Arc::new(planning),
        assistant,
    };

    CieloHttpServer::new(state, server_config)
        .serve_with_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow!("HTTP server failed: {e}"))
}
