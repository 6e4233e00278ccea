//! `candor check` -- validate configuration and smoke-test the service.
//!
//! Loads and validates the config, then makes one tiny live chat call
//! to confirm the credentials sign a working handshake before a long
//! run is started.
//!
//! # Example
//!
//! ```text
//! candor check
//! candor check --config /etc/candor/candor.toml --offline
//! ```

use std::path::PathBuf;

use clap::Args;

use candor_spark::client::SparkClient;

use super::load_config;

/// Arguments for the `candor check` subcommand.
#[derive(Args)]
pub struct CheckArgs {
    /// Config file path.
    #[arg(short, long, default_value = "candor.toml")]
    pub config: PathBuf,

    /// Validate the configuration only; skip the live call.
    #[arg(long)]
    pub offline: bool,
}

/// Run the check command.
pub async fn run(args: CheckArgs) -> anyhow::Result<()> {
    let config = load_config(&args.config)?;
    println!("config:   ok ({})", args.config.display());
    println!("endpoint: {}", config.spark.chat_url);
    println!("domain:   {}", config.spark.domain);

    if args.offline {
        println!("smoke:    skipped (--offline)");
        return Ok(());
    }

    let client = SparkClient::new(&config);
    client.smoke_test().await?;
    println!("smoke:    ok");
    Ok(())
}
