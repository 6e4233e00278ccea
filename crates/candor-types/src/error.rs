//! Error types for the candor pipeline.
//!
//! Provides [`CandorError`] as the top-level error type. Component-level
//! failures (transport, parse) have their own types in `candor-spark`;
//! they are stringified into per-row result columns rather than bubbled
//! up, so this enum only covers failures that can abort a run.

use thiserror::Error;

/// Top-level error type for the candor pipeline.
///
/// Per-row classification failures never appear here: every submitted
/// row yields a result object with diagnostic text in its error column.
/// These variants cover run-level failures only (bad configuration,
/// unreadable tables, a failed pre-flight connectivity check).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CandorError {
    /// Configuration is malformed or semantically invalid.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The input table could not be read or a row failed to decode.
    #[error("table error: {reason}")]
    Table {
        /// What went wrong, including the offending line number if known.
        reason: String,
    },

    /// The pre-flight connectivity smoke test failed. No rows were
    /// processed; the operator should fix credentials or clock skew
    /// before re-running.
    #[error("smoke test failed: {reason}")]
    SmokeTestFailed {
        /// The underlying handshake or transport failure.
        reason: String,
    },

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenience type alias for candor operations.
pub type Result<T> = std::result::Result<T, CandorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_config_invalid() {
        let err = CandorError::ConfigInvalid {
            reason: "missing api_key".into(),
        };
        assert_eq!(err.to_string(), "invalid config: missing api_key");
    }

    #[test]
    fn display_table_error() {
        let err = CandorError::Table {
            reason: "line 7: expected object".into(),
        };
        assert_eq!(err.to_string(), "table error: line 7: expected object");
    }

    #[test]
    fn display_smoke_test_failed() {
        let err = CandorError::SmokeTestFailed {
            reason: "handshake rejected".into(),
        };
        assert_eq!(err.to_string(), "smoke test failed: handshake rejected");
    }

    #[test]
    fn io_error_from_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CandorError = io.into();
        assert!(err.to_string().starts_with("io error:"));
    }

    #[test]
    fn json_error_from_conversion() {
        let serde_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: CandorError = serde_err.into();
        assert!(err.to_string().starts_with("json error:"));
    }
}
