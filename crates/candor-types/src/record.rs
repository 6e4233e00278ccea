//! The row model for the question/answer table.
//!
//! A [`CallRecord`] is one manager response from an earnings-call
//! transcript, plus every column the pipeline accumulates: keyword
//! prefilter results, whether the remote classifier was invoked, the
//! raw and extracted classifier output, and the final 0/1 non-answer
//! label. Rows travel across the I/O boundary as JSONL, one record per
//! line.
//!
//! Binary columns use `Option<u8>` where `None` means "absent" -- a row
//! that has not been processed yet, or whose classifier output could
//! not be coerced to 0/1. Absent is distinct from 0.

use serde::{Deserialize, Serialize};

/// One row of the input table with all accumulated output columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Transcript identifier (opaque key from the source table).
    pub transcriptid: String,

    /// Investor question text.
    #[serde(default)]
    pub question: String,

    /// Manager response text.
    #[serde(default)]
    pub answer: String,

    /// 1 if the keyword prefilter matched the answer, 0 if not,
    /// absent before the prefilter phase.
    #[serde(default)]
    pub kw_match: Option<u8>,

    /// Semicolon-joined matched terms, sorted and deduplicated.
    #[serde(default)]
    pub kw_matches: String,

    /// 1 if the remote classifier was invoked for this row, 0 if the
    /// prefilter short-circuited it.
    #[serde(default)]
    pub used_spark: Option<u8>,

    /// Final 0/1 non-answer label.
    #[serde(default)]
    pub final_pred_nonanswer: Option<u8>,

    /// Full reassembled classifier response text.
    #[serde(default)]
    pub spark_raw: String,

    /// The JSON span extracted from the response (may equal the full
    /// response when it parsed as-is).
    #[serde(default)]
    pub spark_json_extracted: String,

    /// The classifier's free-text assessment.
    #[serde(default)]
    pub spark_assessment: String,

    /// The classifier's 0/1 label, absent when the output was
    /// malformed or the call failed.
    #[serde(default)]
    pub spark_pred_nonanswer: Option<u8>,

    /// Diagnostic text when parsing or the call itself failed. Empty
    /// on success. Call failures are prefixed `call_failed:` to
    /// distinguish them from malformed-but-received answers.
    #[serde(default)]
    pub spark_parse_error: String,
}

impl CallRecord {
    /// Create a bare input row with no accumulated columns.
    pub fn new(
        transcriptid: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            transcriptid: transcriptid.into(),
            question: question.into(),
            answer: answer.into(),
            kw_match: None,
            kw_matches: String::new(),
            used_spark: None,
            final_pred_nonanswer: None,
            spark_raw: String::new(),
            spark_json_extracted: String::new(),
            spark_assessment: String::new(),
            spark_pred_nonanswer: None,
            spark_parse_error: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_row_has_no_accumulated_columns() {
        let r = CallRecord::new("t1", "q", "a");
        assert_eq!(r.kw_match, None);
        assert_eq!(r.used_spark, None);
        assert_eq!(r.final_pred_nonanswer, None);
        assert_eq!(r.spark_pred_nonanswer, None);
        assert!(r.spark_parse_error.is_empty());
    }

    #[test]
    fn deserializes_bare_input_row() {
        let r: CallRecord = serde_json::from_str(
            r#"{"transcriptid":"t42","question":"Why?","answer":"Because."}"#,
        )
        .unwrap();
        assert_eq!(r.transcriptid, "t42");
        assert_eq!(r.answer, "Because.");
        assert_eq!(r.kw_match, None);
    }

    #[test]
    fn roundtrips_with_accumulated_columns() {
        let mut r = CallRecord::new("t1", "q", "a");
        r.kw_match = Some(1);
        r.kw_matches = "rather not".into();
        r.used_spark = Some(1);
        r.spark_pred_nonanswer = Some(1);
        r.final_pred_nonanswer = Some(1);

        let line = serde_json::to_string(&r).unwrap();
        let back: CallRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn absent_is_distinct_from_zero() {
        let zero: CallRecord =
            serde_json::from_str(r#"{"transcriptid":"t","kw_match":0}"#).unwrap();
        let absent: CallRecord =
            serde_json::from_str(r#"{"transcriptid":"t","kw_match":null}"#).unwrap();
        assert_eq!(zero.kw_match, Some(0));
        assert_eq!(absent.kw_match, None);
    }
}
