//! Error types for Spark chat calls.
//!
//! All client operations return [`Result<T>`] which uses [`SparkError`]
//! as the error type. Parse failures on successfully received output
//! are a separate type ([`ParseFailure`](crate::parse::ParseFailure))
//! because they follow a different retry policy.

use thiserror::Error;

/// Errors that can occur during one Spark chat call.
#[derive(Error, Debug)]
pub enum SparkError {
    /// The signed handshake was rejected. Carries the server's reported
    /// `Date` header, when present, so clock skew can be diagnosed.
    #[error("authentication failed: {message}")]
    AuthFailed {
        /// Description of the rejection.
        message: String,
        /// The server's `Date` header from the rejecting response.
        server_date: Option<String>,
    },

    /// The connection could not be established or dropped mid-stream.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The server returned a non-zero status code inside the stream.
    #[error("spark api error code={code}: {message}")]
    Server {
        /// Server-reported status code.
        code: i64,
        /// Server-reported error message.
        message: String,
    },

    /// The handshake or a streamed message exceeded the call timeout.
    #[error("timeout")]
    Timeout,

    /// A WebSocket protocol error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A streamed frame could not be decoded.
    #[error("frame decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured endpoint URL is unusable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl SparkError {
    /// Whether the worker should spend a retry attempt on this error.
    ///
    /// Handshake rejections, transport drops, server-side status codes,
    /// timeouts, and undecodable frames are all assumed transient. A
    /// bad endpoint URL will fail identically every attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            SparkError::AuthFailed { .. }
            | SparkError::ConnectionFailed(_)
            | SparkError::Server { .. }
            | SparkError::Timeout
            | SparkError::WebSocket(_)
            | SparkError::Json(_) => true,
            SparkError::InvalidEndpoint(_) => false,
        }
    }
}

/// A convenience type alias for Spark client operations.
pub type Result<T> = std::result::Result<T, SparkError>;
