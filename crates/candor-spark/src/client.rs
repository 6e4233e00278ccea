//! One-shot streaming chat client.
//!
//! [`SparkClient`] opens one signed WebSocket connection per call,
//! sends a single request envelope, and reassembles the streamed reply
//! into one text result. The connection is always closed on exit,
//! success or failure. Retry is the caller's responsibility.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};
use uuid::Uuid;

use candor_types::Config;
use candor_types::config::{ChatConfig, SparkConfig};

use crate::auth::{self, SignedUrl};
use crate::error::{Result, SparkError};
use crate::protocol::{ChatRequest, ResponseFrame, STATUS_FINAL};

/// Timeout for the pre-flight smoke test, independent of the
/// configured per-call timeout.
const SMOKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Output budget for the smoke test reply.
const SMOKE_MAX_TOKENS: u32 = 50;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A client for the Spark streaming chat endpoint.
///
/// Holds credentials and generation parameters; each call signs a
/// fresh URL and opens its own connection. Cloneable and cheap to
/// share across workers.
#[derive(Debug, Clone)]
pub struct SparkClient {
    spark: SparkConfig,
    chat: ChatConfig,
    call_timeout: Duration,
}

impl SparkClient {
    /// Build a client from the run configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            spark: config.spark.clone(),
            chat: config.chat.clone(),
            call_timeout: config.call_timeout(),
        }
    }

    /// Send one prompt and block until the full reply is reassembled.
    ///
    /// `session_tag` must be unique per call; it lets the service
    /// distinguish concurrent requests.
    ///
    /// # Errors
    ///
    /// [`SparkError::AuthFailed`] when the handshake is rejected (with
    /// the server's `Date` header for skew diagnosis),
    /// [`SparkError::Server`] on a non-zero mid-stream status code,
    /// [`SparkError::Timeout`] when the handshake or any streamed
    /// message exceeds the call timeout, and transport variants for
    /// everything else.
    pub async fn chat_once(&self, prompt: &str, session_tag: &str) -> Result<String> {
        self.chat_with(prompt, session_tag, &self.chat, self.call_timeout)
            .await
    }

    /// Pre-flight connectivity check: a tiny prompt with a short
    /// timeout and a minimal output budget. A failure here means the
    /// run should abort before any rows are processed.
    pub async fn smoke_test(&self) -> Result<()> {
        let chat = ChatConfig {
            temperature: 0.0,
            max_tokens: SMOKE_MAX_TOKENS,
        };
        let tag = format!("smoke_{}", Uuid::new_v4().simple());
        let reply = self
            .chat_with(
                r#"Reply with exactly one JSON object: {"ok": true}"#,
                &tag,
                &chat,
                SMOKE_TIMEOUT,
            )
            .await?;
        debug!(reply = %reply, "smoke test reply received");
        Ok(())
    }

    async fn chat_with(
        &self,
        prompt: &str,
        session_tag: &str,
        chat: &ChatConfig,
        call_timeout: Duration,
    ) -> Result<String> {
        let signed = auth::sign_url(&self.spark.chat_url, &self.spark.api_key, &self.spark.api_secret)?;
        let mut ws = self.connect(&signed, call_timeout).await?;

        let envelope = ChatRequest::user_message(
            self.spark.app_id.clone(),
            session_tag,
            self.spark.domain.clone(),
            chat.temperature,
            chat.max_tokens,
            prompt,
        );

        // Drive the exchange, then close regardless of outcome.
        let outcome = drive(&mut ws, &envelope, call_timeout).await;
        let _ = ws.close(None).await;

        match &outcome {
            Ok(reply) => debug!(
                uid = session_tag,
                reply_len = reply.len(),
                "chat call completed"
            ),
            Err(e) => debug!(uid = session_tag, error = %e, "chat call failed"),
        }
        outcome
    }

    async fn connect(&self, signed: &SignedUrl, call_timeout: Duration) -> Result<WsStream> {
        let request = handshake_request(signed)?;
        let connected = timeout(call_timeout, connect_async(request))
            .await
            .map_err(|_| SparkError::Timeout)?;

        match connected {
            Ok((ws, _response)) => Ok(ws),
            Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
                Err(handshake_rejected(&response, &signed.date))
            }
            Err(e) => Err(SparkError::WebSocket(e)),
        }
    }
}

/// Build the WebSocket upgrade request for a signed URL.
///
/// The signed timestamp travels byte-for-byte as the `X-Date` header;
/// a regenerated timestamp would invalidate the signature.
fn handshake_request(
    signed: &SignedUrl,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request> {
    let mut request = signed
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| SparkError::InvalidEndpoint(e.to_string()))?;
    let date_value = HeaderValue::from_str(&signed.date)
        .map_err(|e| SparkError::InvalidEndpoint(format!("bad date header: {e}")))?;
    request.headers_mut().insert("X-Date", date_value);
    Ok(request)
}

/// Send the envelope and reassemble the streamed reply.
async fn drive(ws: &mut WsStream, envelope: &ChatRequest, call_timeout: Duration) -> Result<String> {
    let text = serde_json::to_string(envelope)?;
    timeout(call_timeout, ws.send(WsMessage::Text(text)))
        .await
        .map_err(|_| SparkError::Timeout)??;

    let mut reply = String::new();
    loop {
        let message = timeout(call_timeout, ws.next())
            .await
            .map_err(|_| SparkError::Timeout)?
            .ok_or_else(|| {
                SparkError::ConnectionFailed("stream ended before the final chunk".into())
            })??;

        match message {
            WsMessage::Text(raw) => {
                let frame: ResponseFrame = serde_json::from_str(&raw)?;
                if frame.header.code != 0 {
                    return Err(SparkError::Server {
                        code: frame.header.code,
                        message: frame.header.message,
                    });
                }
                if let Some(payload) = frame.payload {
                    for fragment in &payload.choices.text {
                        reply.push_str(&fragment.content);
                    }
                    if payload.choices.status == STATUS_FINAL {
                        break;
                    }
                }
            }
            WsMessage::Ping(data) => {
                timeout(call_timeout, ws.send(WsMessage::Pong(data)))
                    .await
                    .map_err(|_| SparkError::Timeout)??;
            }
            WsMessage::Close(_) => {
                return Err(SparkError::ConnectionFailed(
                    "server closed the connection mid-stream".into(),
                ));
            }
            _ => {}
        }
    }

    Ok(reply.trim().to_string())
}

/// Map an HTTP handshake rejection to [`SparkError::AuthFailed`],
/// surfacing the server's `Date` header and the measured skew.
fn handshake_rejected(
    response: &tokio_tungstenite::tungstenite::http::Response<Option<Vec<u8>>>,
    client_date: &str,
) -> SparkError {
    let server_date = response
        .headers()
        .get("date")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if let Some(server) = &server_date {
        match auth::skew_seconds(client_date, server) {
            Some(skew) => warn!(
                client_date,
                server_date = %server,
                skew_secs = skew,
                "handshake rejected"
            ),
            None => warn!(client_date, server_date = %server, "handshake rejected"),
        }
    } else {
        warn!(client_date, "handshake rejected, no server date reported");
    }

    SparkError::AuthFailed {
        message: format!("handshake rejected with HTTP {}", response.status()),
        server_date,
    }
}
