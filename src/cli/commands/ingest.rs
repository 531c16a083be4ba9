//! Implementation of the `cielo ingest` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::context::AppContext;
use crate::cli::output::progress::{create_progress_bar, ProgressBarExt};
use crate::cli::output::{output, CommandOutput};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Plain-text handbook to index
    #[arg(long)]
    pub handbook: PathBuf,

    /// Where to write the index (defaults to `rag.index_path`)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct IngestOutput {
    pub chunks: usize,
    pub dimension: usize,
    pub model: String,
    pub index_path: PathBuf,
}

impl CommandOutput for IngestOutput {
    fn to_human(&self) -> String {
        format!(
            "Indexed {} chunks ({}-dimensional, {}) into {}",
            self.chunks,
            self.dimension,
            self.model,
            self.index_path.display()
        )
    }
}

pub async fn execute(args: IngestArgs, ctx: AppContext, json_mode: bool) -> Result<()> {
    let text = tokio::fs::read_to_string(&args.handbook)
        .await
        .with_context(|| format!("Failed to read handbook {}", args.handbook.display()))?;
    let index_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&ctx.config.rag.index_path));

    let assistant = ctx.handbook_assistant(ctx.llm_client()?)?;

    let progress = create_progress_bar(0, json_mode);
    progress.set_message("embedding");
    let bar = progress.clone();
    let result = assistant
        .build_index(&text, move |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        })
        .await;

    let index = match result {
        Ok(index) => {
            progress.finish_success("embedded");
            index
        }
        Err(e) => {
            progress.finish_error("embedding failed");
            return Err(e).context("Failed to build handbook index");
        }
    };

    index
        .save(&index_path)
        .with_context(|| format!("Failed to write index {}", index_path.display()))?;
    tracing::info!(chunks = index.len(), path = %index_path.display(), "handbook index written");

    output(
        &IngestOutput {
            chunks: index.len(),
            dimension: index.dimension(),
            model: index.model().to_string(),
            index_path,
        },
        json_mode,
    );
    Ok(())
}
