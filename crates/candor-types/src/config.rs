//! Configuration surface for a candor run.
//!
//! Everything tunable lives here, loaded from a TOML file once at
//! process start and passed by reference to the components that need
//! it. Nothing reads ambient global state; secrets can be supplied via
//! environment variables instead of the file (`CANDOR_APP_ID`,
//! `CANDOR_API_KEY`, `CANDOR_API_SECRET`).
//!
//! ```toml
//! [spark]
//! app_id = "eaf7df35"
//! api_key = "..."
//! api_secret = "..."
//!
//! [pipeline]
//! workers = 20
//! start_interval_ms = 80
//! checkpoint_every = 40
//!
//! [chat]
//! temperature = 0.2
//! max_tokens = 1024
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CandorError, Result};

/// Which keyword dictionary the prefilter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DictionaryVariant {
    /// Base non-answer lexicon.
    Base,
    /// Base lexicon plus forward-looking deferral phrases.
    #[default]
    WithFuture,
}

/// Credentials and endpoint for the Spark chat service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparkConfig {
    /// Application identifier sent in every request header.
    #[serde(default)]
    pub app_id: String,

    /// Key identifier embedded in the authorization header.
    #[serde(default)]
    pub api_key: String,

    /// Shared secret used to sign the handshake.
    #[serde(default)]
    pub api_secret: String,

    /// Streaming chat endpoint.
    #[serde(default = "default_chat_url")]
    pub chat_url: String,

    /// Model variant selector sent in the parameter block.
    #[serde(default = "default_domain")]
    pub domain: String,
}

fn default_chat_url() -> String {
    "wss://spark-api.xf-yun.com/v3.5/chat".into()
}

fn default_domain() -> String {
    "generalv3.5".into()
}

impl Default for SparkConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            chat_url: default_chat_url(),
            domain: default_domain(),
        }
    }
}

/// Concurrency, pacing, retry, and checkpoint tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Size of the parallel worker pool.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Minimum interval between request starts, across all workers.
    #[serde(default = "default_start_interval_ms")]
    pub start_interval_ms: u64,

    /// Per-call timeout for the handshake and each streamed message.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Retry attempts after the first failed call (total attempts =
    /// `max_retries + 1`).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff before the first retry.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Linear backoff increment per subsequent attempt.
    #[serde(default = "default_retry_step_ms")]
    pub retry_step_ms: u64,

    /// Persist the full table every this many completed rows.
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,

    /// Which keyword dictionary the prefilter uses.
    #[serde(default)]
    pub dictionary: DictionaryVariant,
}

fn default_workers() -> usize {
    20
}
fn default_start_interval_ms() -> u64 {
    80
}
fn default_call_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    1
}
fn default_retry_base_ms() -> u64 {
    1000
}
fn default_retry_step_ms() -> u64 {
    700
}
fn default_checkpoint_every() -> usize {
    40
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            start_interval_ms: default_start_interval_ms(),
            call_timeout_secs: default_call_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            retry_step_ms: default_retry_step_ms(),
            checkpoint_every: default_checkpoint_every(),
            dictionary: DictionaryVariant::default(),
        }
    }
}

/// Generation parameters for each classification call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum output size in tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f64 {
    0.2
}
fn default_max_tokens() -> u32 {
    1024
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Full configuration for a candor run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Spark service credentials and endpoint.
    #[serde(default)]
    pub spark: SparkConfig,

    /// Concurrency and checkpoint tuning.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Generation parameters.
    #[serde(default)]
    pub chat: ChatConfig,
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CandorError::ConfigInvalid {
            reason: e.to_string(),
        })
    }

    /// Load a configuration file, apply environment overrides, and
    /// validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override credentials from the environment when set.
    ///
    /// Recognized variables: `CANDOR_APP_ID`, `CANDOR_API_KEY`,
    /// `CANDOR_API_SECRET`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CANDOR_APP_ID") {
            self.spark.app_id = v;
        }
        if let Ok(v) = std::env::var("CANDOR_API_KEY") {
            self.spark.api_key = v;
        }
        if let Ok(v) = std::env::var("CANDOR_API_SECRET") {
            self.spark.api_secret = v;
        }
    }

    /// Reject configurations that would fail at runtime.
    ///
    /// Credentials must be non-blank and must not still contain the
    /// sample placeholder text. Pool size and checkpoint cadence must
    /// be at least 1.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("spark.app_id", &self.spark.app_id),
            ("spark.api_key", &self.spark.api_key),
            ("spark.api_secret", &self.spark.api_secret),
        ] {
            let trimmed = value.trim();
            if trimmed.is_empty() || trimmed.to_ascii_lowercase().contains("substitute") {
                return Err(CandorError::ConfigInvalid {
                    reason: format!("{name} is not filled in"),
                });
            }
        }
        if !self.spark.chat_url.starts_with("wss://") && !self.spark.chat_url.starts_with("ws://") {
            return Err(CandorError::ConfigInvalid {
                reason: format!("spark.chat_url is not a websocket URL: {}", self.spark.chat_url),
            });
        }
        if self.pipeline.workers == 0 {
            return Err(CandorError::ConfigInvalid {
                reason: "pipeline.workers must be at least 1".into(),
            });
        }
        if self.pipeline.checkpoint_every == 0 {
            return Err(CandorError::ConfigInvalid {
                reason: "pipeline.checkpoint_every must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Minimum interval between request starts.
    pub fn start_interval(&self) -> Duration {
        Duration::from_millis(self.pipeline.start_interval_ms)
    }

    /// Per-call timeout.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline.call_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> Config {
        let mut c = Config::default();
        c.spark.app_id = "app".into();
        c.spark.api_key = "key".into();
        c.spark.api_secret = "secret".into();
        c
    }

    #[test]
    fn defaults_match_tuning() {
        let c = Config::default();
        assert_eq!(c.pipeline.workers, 20);
        assert_eq!(c.pipeline.start_interval_ms, 80);
        assert_eq!(c.pipeline.call_timeout_secs, 60);
        assert_eq!(c.pipeline.max_retries, 1);
        assert_eq!(c.pipeline.checkpoint_every, 40);
        assert_eq!(c.pipeline.dictionary, DictionaryVariant::WithFuture);
        assert_eq!(c.chat.max_tokens, 1024);
        assert!(c.spark.chat_url.starts_with("wss://"));
    }

    #[test]
    fn parse_minimal_toml() {
        let c = Config::from_toml_str(
            r#"
            [spark]
            app_id = "a"
            api_key = "k"
            api_secret = "s"

            [pipeline]
            workers = 4
            dictionary = "base"
            "#,
        )
        .unwrap();
        assert_eq!(c.pipeline.workers, 4);
        assert_eq!(c.pipeline.dictionary, DictionaryVariant::Base);
        // Unspecified sections fall back to defaults.
        assert_eq!(c.chat.max_tokens, 1024);
        c.validate().unwrap();
    }

    #[test]
    fn parse_rejects_bad_toml() {
        assert!(Config::from_toml_str("not toml [").is_err());
    }

    #[test]
    fn validate_accepts_filled() {
        filled().validate().unwrap();
    }

    #[test]
    fn validate_rejects_blank_credentials() {
        let mut c = filled();
        c.spark.api_key = "   ".into();
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("spark.api_key"));
    }

    #[test]
    fn validate_rejects_placeholder_credentials() {
        let mut c = filled();
        c.spark.api_secret = "please SUBSTITUTE your secret".into();
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_ws_url() {
        let mut c = filled();
        c.spark.chat_url = "https://spark-api.xf-yun.com/v3.5/chat".into();
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut c = filled();
        c.pipeline.workers = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_checkpoint_cadence() {
        let mut c = filled();
        c.pipeline.checkpoint_every = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn duration_accessors() {
        let c = filled();
        assert_eq!(c.start_interval(), Duration::from_millis(80));
        assert_eq!(c.call_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candor.toml");
        std::fs::write(
            &path,
            r#"
            [spark]
            app_id = "a"
            api_key = "k"
            api_secret = "s"
            "#,
        )
        .unwrap();
        let c = Config::load(&path).unwrap();
        assert_eq!(c.spark.app_id, "a");
    }
}
