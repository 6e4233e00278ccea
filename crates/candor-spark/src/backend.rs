//! The [`ChatBackend`] trait -- the seam between the pipeline and the
//! network client.
//!
//! Workers call the service through this trait so tests can substitute
//! a scripted double for [`SparkClient`].

use async_trait::async_trait;

use crate::client::SparkClient;
use crate::error::Result;

/// A backend that can execute one classification chat call.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one prompt and return the fully reassembled reply text.
    ///
    /// `session_tag` must be unique per call.
    ///
    /// # Errors
    ///
    /// Returns [`SparkError`](crate::error::SparkError) on handshake,
    /// transport, server, or timeout failure. Malformed-but-received
    /// reply text is NOT an error at this level; parsing it is the
    /// caller's concern.
    async fn chat_once(&self, prompt: &str, session_tag: &str) -> Result<String>;
}

#[async_trait]
impl ChatBackend for SparkClient {
    async fn chat_once(&self, prompt: &str, session_tag: &str) -> Result<String> {
        SparkClient::chat_once(self, prompt, session_tag).await
    }
}
