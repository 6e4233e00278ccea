//! One row's classification: rate-limited call, parse, bounded retry.
//!
//! [`classify_row`] never fails -- every invocation produces exactly
//! one [`ClassificationResult`], with diagnostics recorded in its
//! error field when the call or the parse went wrong. Transport,
//! server, and timeout failures consume retry attempts; a
//! malformed-but-received answer is terminal, because a deterministic
//! model would produce much the same text again.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use candor_spark::backend::ChatBackend;
use candor_spark::parse;
use candor_types::{CallRecord, Config};

use crate::limiter::StartRateLimiter;
use crate::prompt::make_prompt;

/// Error prefix distinguishing "the call itself failed" from "the call
/// succeeded but the answer was malformed".
pub const CALL_FAILED_PREFIX: &str = "call_failed: ";

/// One unit of work: a single row to classify. Immutable once built.
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    /// Index of the row in the output table.
    pub row_id: usize,
    /// Transcript identifier, used in the session tag.
    pub transcript_id: String,
    /// Investor question text.
    pub question: String,
    /// Manager response text.
    pub answer: String,
    /// Research-assistant comment fed to the prompt.
    pub comment: String,
}

impl ClassificationRequest {
    /// Derive a request from one source row.
    pub fn from_record(row_id: usize, record: &CallRecord) -> Self {
        Self {
            row_id,
            transcript_id: record.transcriptid.clone(),
            question: record.question.trim().to_string(),
            answer: record.answer.trim().to_string(),
            comment: "N/A".into(),
        }
    }

    /// The per-call session tag sent to the service.
    pub fn session_tag(&self) -> String {
        format!("tid_{}_row_{}", self.transcript_id, self.row_id)
    }
}

/// The outcome of one row's classification, produced exactly once per
/// request.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// Index of the row this result belongs to.
    pub row_id: usize,
    /// Full reassembled response text (empty when every call failed).
    pub raw: String,
    /// The JSON span handed to the parser.
    pub extracted: String,
    /// The model's free-text assessment.
    pub assessment: String,
    /// The coerced 0/1 label; `None` when absent.
    pub label: Option<u8>,
    /// Parse or call diagnostics; empty on success.
    pub error: String,
}

/// Bounded-retry tuning for one worker call.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retry attempts after the first failure (total attempts =
    /// `max_retries + 1`).
    pub max_retries: u32,
    /// Backoff before the first retry.
    pub base_delay: Duration,
    /// Linear backoff increment per subsequent attempt.
    pub step: Duration,
}

impl RetryConfig {
    /// Read the retry tuning out of the run configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.pipeline.max_retries,
            base_delay: Duration::from_millis(config.pipeline.retry_base_ms),
            step: Duration::from_millis(config.pipeline.retry_step_ms),
        }
    }
}

/// Classify one row: wait for a rate-limiter turn, call the service,
/// parse the reply, retrying transient failures up to the bound.
///
/// Attempt `n` (0-indexed) that fails transiently sleeps
/// `base_delay + step * n` before the next attempt. Parse failures
/// return immediately with the failure recorded. When every attempt
/// fails, the result records the last error behind
/// [`CALL_FAILED_PREFIX`] and carries an absent label.
pub async fn classify_row(
    backend: &dyn ChatBackend,
    limiter: &StartRateLimiter,
    request: &ClassificationRequest,
    retry: &RetryConfig,
) -> ClassificationResult {
    let prompt = make_prompt(&request.question, &request.answer, &request.comment);
    let session_tag = request.session_tag();
    let mut last_error: Option<String> = None;

    for attempt in 0..=retry.max_retries {
        limiter.wait_turn().await;

        match backend.chat_once(&prompt, &session_tag).await {
            Ok(raw) => {
                let (extracted, outcome) = parse::verdict(&raw);
                return match outcome {
                    Ok(verdict) => {
                        debug!(row = request.row_id, label = ?verdict.label, "row classified");
                        ClassificationResult {
                            row_id: request.row_id,
                            raw,
                            extracted,
                            assessment: verdict.assessment,
                            label: verdict.label,
                            error: String::new(),
                        }
                    }
                    // Terminal: the answer arrived but was malformed.
                    Err(failure) => {
                        warn!(row = request.row_id, failure = %failure, "unparseable reply");
                        ClassificationResult {
                            row_id: request.row_id,
                            raw,
                            extracted,
                            assessment: String::new(),
                            label: None,
                            error: failure.to_string(),
                        }
                    }
                };
            }
            Err(e) => {
                warn!(
                    row = request.row_id,
                    attempt,
                    error = %e,
                    "chat call failed"
                );
                let retryable = e.is_retryable();
                last_error = Some(e.to_string());
                if !retryable || attempt == retry.max_retries {
                    break;
                }
                sleep(retry.base_delay + retry.step * attempt).await;
            }
        }
    }

    ClassificationResult {
        row_id: request.row_id,
        raw: String::new(),
        extracted: String::new(),
        assessment: String::new(),
        label: None,
        error: format!(
            "{CALL_FAILED_PREFIX}{}",
            last_error.unwrap_or_else(|| "unknown error".into())
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use candor_spark::error::{Result as SparkResult, SparkError};

    /// Scripted backend: fails a configurable number of times before
    /// returning the given reply.
    struct MockBackend {
        calls: AtomicU32,
        failures: u32,
        fail_with: fn() -> SparkError,
        reply: String,
    }

    impl MockBackend {
        fn new(failures: u32, fail_with: fn() -> SparkError, reply: &str) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
                fail_with,
                reply: reply.into(),
            }
        }

        fn succeeding(reply: &str) -> Self {
            Self::new(0, || SparkError::Timeout, reply)
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn chat_once(&self, _prompt: &str, _tag: &str) -> SparkResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err((self.fail_with)());
            }
            Ok(self.reply.clone())
        }
    }

    fn request() -> ClassificationRequest {
        ClassificationRequest {
            row_id: 3,
            transcript_id: "t99".into(),
            question: "What is the margin outlook?".into(),
            answer: "I'd rather not get into the specifics of that".into(),
            comment: "N/A".into(),
        }
    }

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(1),
            step: Duration::from_millis(1),
        }
    }

    fn limiter() -> StartRateLimiter {
        StartRateLimiter::new(Duration::ZERO)
    }

    #[test]
    fn session_tag_combines_transcript_and_row() {
        assert_eq!(request().session_tag(), "tid_t99_row_3");
    }

    #[test]
    fn from_record_trims_and_defaults_comment() {
        let record = CallRecord::new("t1", "  q  ", "  a  ");
        let req = ClassificationRequest::from_record(0, &record);
        assert_eq!(req.question, "q");
        assert_eq!(req.answer, "a");
        assert_eq!(req.comment, "N/A");
    }

    #[tokio::test]
    async fn successful_call_yields_label() {
        let backend = MockBackend::succeeding(
            r#"{"assessment": "declines specifics", "your_classification": 1}"#,
        );
        let result = classify_row(&backend, &limiter(), &request(), &fast_retry(1)).await;
        assert_eq!(result.label, Some(1));
        assert_eq!(result.assessment, "declines specifics");
        assert!(result.error.is_empty());
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_then_succeeds() {
        let backend = MockBackend::new(
            1,
            || SparkError::Timeout,
            r#"{"assessment": "ok", "your_classification": 0}"#,
        );
        let result = classify_row(&backend, &limiter(), &request(), &fast_retry(2)).await;
        assert_eq!(result.label, Some(0));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_record_call_failure() {
        let backend = MockBackend::new(
            u32::MAX,
            || SparkError::ConnectionFailed("reset".into()),
            "never reached",
        );
        let retry = fast_retry(1);
        let result = classify_row(&backend, &limiter(), &request(), &retry).await;

        assert_eq!(result.label, None);
        assert!(result.error.starts_with(CALL_FAILED_PREFIX));
        assert!(result.error.contains("reset"));
        assert!(result.raw.is_empty());
        // Exactly max_retries + 1 attempts, no more.
        assert_eq!(backend.calls(), retry.max_retries + 1);
    }

    #[tokio::test]
    async fn parse_failure_is_terminal_not_retried() {
        let backend = MockBackend::succeeding("the model rambled with no object at all");
        let result = classify_row(&backend, &limiter(), &request(), &fast_retry(5)).await;

        assert_eq!(result.label, None);
        assert_eq!(result.error, "no_json_object_found");
        assert_eq!(result.raw, "the model rambled with no object at all");
        // One call only: malformed output is not retried.
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn empty_reply_records_empty_response() {
        let backend = MockBackend::succeeding("   ");
        let result = classify_row(&backend, &limiter(), &request(), &fast_retry(1)).await;
        assert_eq!(result.error, "empty_response");
        assert_eq!(result.label, None);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn missing_label_field_is_absent_not_error() {
        let backend = MockBackend::succeeding(r#"{"assessment": "answered in full"}"#);
        let result = classify_row(&backend, &limiter(), &request(), &fast_retry(1)).await;
        assert_eq!(result.label, None);
        assert!(result.error.is_empty());
        assert_eq!(result.assessment, "answered in full");
    }

    #[tokio::test]
    async fn non_retryable_failure_stops_early() {
        let backend = MockBackend::new(
            u32::MAX,
            || SparkError::InvalidEndpoint("no host".into()),
            "never reached",
        );
        let result = classify_row(&backend, &limiter(), &request(), &fast_retry(5)).await;
        assert!(result.error.starts_with(CALL_FAILED_PREFIX));
        // A bad endpoint fails identically every attempt; one is enough.
        assert_eq!(backend.calls(), 1);
    }
}
