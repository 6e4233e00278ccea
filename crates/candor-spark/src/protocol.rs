//! Wire types for the Spark streaming chat protocol.
//!
//! One request envelope goes out per connection; the server replies
//! with a sequence of [`ResponseFrame`]s. Each frame carries a status
//! code (non-zero is a fatal server-side error) and a completion
//! marker; text fragments are concatenated in arrival order to
//! reconstruct the full answer.

use serde::{Deserialize, Serialize};

/// `choices.status` value marking the final chunk of a reply.
pub const STATUS_FINAL: i64 = 2;

/// The request envelope sent once per connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// Application identity and per-call session tag.
    pub header: RequestHeader,
    /// Model selector and generation parameters.
    pub parameter: RequestParameter,
    /// The prompt as a single user message.
    pub payload: RequestPayload,
}

/// Application identity block of the request envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestHeader {
    /// Application identifier.
    pub app_id: String,
    /// Per-call unique session tag, used to distinguish concurrent
    /// requests on the service side.
    pub uid: String,
}

/// Parameter block of the request envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestParameter {
    /// Chat-specific parameters.
    pub chat: ChatParameter,
}

/// Generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatParameter {
    /// Model variant selector (e.g. "generalv3.5").
    pub domain: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum output size in tokens.
    pub max_tokens: u32,
}

/// Payload block of the request envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestPayload {
    /// Message container.
    pub message: MessageBlock,
}

/// Message container holding the conversation turns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageBlock {
    /// Conversation turns; this pipeline always sends exactly one.
    pub text: Vec<TextMessage>,
}

/// One conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextMessage {
    /// Message author role.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatRequest {
    /// Build a single-user-message request envelope.
    pub fn user_message(
        app_id: impl Into<String>,
        uid: impl Into<String>,
        domain: impl Into<String>,
        temperature: f64,
        max_tokens: u32,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            header: RequestHeader {
                app_id: app_id.into(),
                uid: uid.into(),
            },
            parameter: RequestParameter {
                chat: ChatParameter {
                    domain: domain.into(),
                    temperature,
                    max_tokens,
                },
            },
            payload: RequestPayload {
                message: MessageBlock {
                    text: vec![TextMessage {
                        role: "user".into(),
                        content: prompt.into(),
                    }],
                },
            },
        }
    }
}

/// One streamed reply frame.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseFrame {
    /// Status header; a missing header decodes to the error code -1.
    #[serde(default)]
    pub header: ResponseHeader,
    /// Reply content; error frames may omit it.
    #[serde(default)]
    pub payload: Option<ResponsePayload>,
}

/// Status header of a reply frame.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseHeader {
    /// Server status code; zero is success, anything else aborts the
    /// stream. Missing codes are treated as errors, not success.
    #[serde(default = "missing_code")]
    pub code: i64,
    /// Server-supplied message accompanying a non-zero code.
    #[serde(default)]
    pub message: String,
    /// Server-side stream identifier.
    #[serde(default)]
    pub sid: Option<String>,
}

fn missing_code() -> i64 {
    -1
}

impl Default for ResponseHeader {
    fn default() -> Self {
        Self {
            code: missing_code(),
            message: String::new(),
            sid: None,
        }
    }
}

/// Content block of a reply frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsePayload {
    /// The streamed choice for this frame.
    #[serde(default)]
    pub choices: Choices,
}

/// Completion marker and text fragments for one frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choices {
    /// Completion marker: [`STATUS_FINAL`] on the last chunk.
    #[serde(default)]
    pub status: i64,
    /// Chunk sequence number.
    #[serde(default)]
    pub seq: Option<i64>,
    /// Zero or more text fragments carried by this frame.
    #[serde(default)]
    pub text: Vec<TextFragment>,
}

/// One text fragment within a frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextFragment {
    /// Fragment text.
    #[serde(default)]
    pub content: String,
    /// Fragment author role.
    #[serde(default)]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_envelope_shape() {
        let req = ChatRequest::user_message("app-1", "tid_7_row_3", "generalv3.5", 0.2, 1024, "hi");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["header"]["app_id"], "app-1");
        assert_eq!(json["header"]["uid"], "tid_7_row_3");
        assert_eq!(json["parameter"]["chat"]["domain"], "generalv3.5");
        assert_eq!(json["parameter"]["chat"]["max_tokens"], 1024);
        assert_eq!(json["payload"]["message"]["text"][0]["role"], "user");
        assert_eq!(json["payload"]["message"]["text"][0]["content"], "hi");
    }

    #[test]
    fn decode_mid_stream_frame() {
        let frame: ResponseFrame = serde_json::from_str(
            r#"{
                "header": {"code": 0, "message": "Success", "sid": "cht001"},
                "payload": {"choices": {"status": 1, "seq": 2,
                    "text": [{"content": "part ", "role": "assistant"}]}}
            }"#,
        )
        .unwrap();
        assert_eq!(frame.header.code, 0);
        let payload = frame.payload.unwrap();
        assert_eq!(payload.choices.status, 1);
        assert_eq!(payload.choices.text[0].content, "part ");
    }

    #[test]
    fn decode_final_frame() {
        let frame: ResponseFrame = serde_json::from_str(
            r#"{
                "header": {"code": 0},
                "payload": {"choices": {"status": 2, "text": [{"content": "done"}]}}
            }"#,
        )
        .unwrap();
        assert_eq!(frame.payload.unwrap().choices.status, STATUS_FINAL);
    }

    #[test]
    fn decode_error_frame_without_payload() {
        let frame: ResponseFrame = serde_json::from_str(
            r#"{"header": {"code": 10013, "message": "input audit failed"}}"#,
        )
        .unwrap();
        assert_eq!(frame.header.code, 10013);
        assert_eq!(frame.header.message, "input audit failed");
        assert!(frame.payload.is_none());
    }

    #[test]
    fn missing_header_code_is_an_error() {
        // A frame with no header at all must not look like success.
        let frame: ResponseFrame = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(frame.header.code, -1);

        let frame: ResponseFrame = serde_json::from_str(r#"{"header": {}}"#).unwrap();
        assert_eq!(frame.header.code, -1);
    }

    #[test]
    fn frame_with_empty_text_list() {
        let frame: ResponseFrame = serde_json::from_str(
            r#"{"header": {"code": 0}, "payload": {"choices": {"status": 1}}}"#,
        )
        .unwrap();
        assert!(frame.payload.unwrap().choices.text.is_empty());
    }
}
