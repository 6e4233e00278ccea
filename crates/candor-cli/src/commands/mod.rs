//! CLI command implementations for `candor`.
//!
//! Each subcommand is implemented in its own module:
//!
//! - [`run`] -- Classify a table of manager responses.
//! - [`check`] -- Configuration validation plus a live smoke test.
//! - [`prefilter`] -- Offline keyword-dictionary audit.

pub mod check;
pub mod prefilter;
pub mod run;

use std::path::Path;

use candor_types::Config;

/// Load and validate the run configuration.
///
/// Environment overrides (`CANDOR_APP_ID`, `CANDOR_API_KEY`,
/// `CANDOR_API_SECRET`) are applied before validation, so credentials
/// never have to live in the file.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load(path).map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))
}
