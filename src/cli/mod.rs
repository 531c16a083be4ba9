//! Command-line interface.

pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use context::AppContext;

#[derive(Parser, Debug)]
#[command(name = "cielo", version, about = "Adaptive learning paths and handbook chat for a driver-assistance tutorial")]
pub struct Cli {
    /// Configuration file (defaults to .cielo/config.yaml and .cielo/local.yaml)
    #[arg(long, short, global = true, env = "CIELO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(commands::serve::ServeArgs),
    /// Build the handbook index for the chat assistant
    Ingest(commands::ingest::IngestArgs),
    /// Plan a learning path from scores on the terminal
    Plan(commands::plan::PlanArgs),
}

impl Commands {
    /// Whether the command writes results to stdout
    pub const fn prints_output(&self) -> bool {
        !matches!(self, Self::Serve(_))
    }
}

/// Print an error and exit with status 1
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": chain,
        });
        eprintln!("{body}");
    } else {
        eprintln!("{} {err:#}", console::style("error:").red().bold());
    }
    std::process::exit(1);
}
