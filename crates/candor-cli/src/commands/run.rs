//! `candor run` -- classify a table of manager responses.
//!
//! Loads the input table, runs the prefilter + Spark pipeline over it,
//! and writes the classified table (checkpointing along the way).
//!
//! # Example
//!
//! ```text
//! candor run calls.jsonl
//! candor run calls.jsonl --out classified.jsonl --config candor.toml
//! ```

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use candor_core::{table, Pipeline};
use candor_spark::client::SparkClient;
use candor_types::CandorError;

use super::load_config;

/// Arguments for the `candor run` subcommand.
#[derive(Args)]
pub struct RunArgs {
    /// Input table (JSONL, one record per line).
    pub input: PathBuf,

    /// Output path; defaults to `<input>.classified.jsonl` next to the
    /// input.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Config file path.
    #[arg(short, long, default_value = "candor.toml")]
    pub config: PathBuf,

    /// Classify only the first N rows (the rest are carried through
    /// untouched).
    #[arg(long)]
    pub limit: Option<usize>,

    /// Skip the pre-flight smoke test.
    #[arg(long)]
    pub no_smoke: bool,
}

/// Run the classification pipeline end to end.
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config)?;
    let out = args
        .out
        .unwrap_or_else(|| Pipeline::default_out_path(&args.input));

    // Fail before any rows are touched if the credentials are dead.
    if !args.no_smoke {
        SparkClient::new(&config)
            .smoke_test()
            .await
            .map_err(|e| CandorError::SmokeTestFailed {
                reason: e.to_string(),
            })?;
        info!("smoke test passed");
    }

    let mut rows = table::load_records(&args.input).await?;
    let mut tail = Vec::new();
    if let Some(limit) = args.limit {
        if limit < rows.len() {
            tail = rows.split_off(limit);
        }
    }
    info!(input = %args.input.display(), rows = rows.len(), "table loaded");

    let pipeline = Pipeline::new(config);
    let (mut rows, summary) = pipeline.run(rows, &out).await?;

    if !tail.is_empty() {
        rows.extend(tail);
        table::save_records(&out, &rows).await?;
    }

    println!("classified {} rows -> {}", summary.total_rows, out.display());
    println!("  prefilter skipped: {}", summary.skipped_as_zero);
    println!("  spark called:      {}", summary.spark_called);
    println!("  checkpoints:       {}", summary.checkpoints_written);
    Ok(())
}
