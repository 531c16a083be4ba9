//! Cielo CLI entry point.

use clap::Parser;

use cielo::cli::{commands, handle_error, AppContext, Cli, Commands};
use cielo::infrastructure::logging::{LogConfig, LogTarget, LoggerImpl};
use cielo::ConfigLoader;

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(&err, json_mode);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ConfigLoader::load_with_override(cli.config.as_deref())?;

    let target = if cli.command.prints_output() {
        LogTarget::Stderr
    } else {
        LogTarget::Stdout
    };
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging).with_target(target))?;

    let ctx = AppContext::new(config)?;
    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, ctx).await,
        Commands::Ingest(args) => commands::ingest::execute(args, ctx, cli.json).await,
        Commands::Plan(args) => commands::plan::execute(args, ctx, cli.json).await,
    }
}
