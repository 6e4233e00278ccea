//! `candor` -- CLI binary for the earnings-call non-answer classifier.
//!
//! Provides the following subcommands:
//!
//! - `candor run` -- Classify a table of manager responses.
//! - `candor check` -- Validate configuration and run a live smoke test.
//! - `candor prefilter` -- Audit the keyword dictionary offline.

use clap::{Parser, Subcommand};

mod commands;

/// candor earnings-call classifier CLI.
#[derive(Parser)]
#[command(name = "candor", about = "earnings-call non-answer classifier", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Classify a table of manager responses.
    Run(commands::run::RunArgs),

    /// Validate configuration and run a live smoke test.
    Check(commands::check::CheckArgs),

    /// Audit the keyword dictionary against a table, offline.
    Prefilter(commands::prefilter::PrefilterArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match cli.command {
        Commands::Run(args) => commands::run::run(args).await?,
        Commands::Check(args) => commands::check::run(args).await?,
        Commands::Prefilter(args) => commands::prefilter::run(args).await?,
    }

    Ok(())
}
