//! The candor classification pipeline.
//!
//! Drives the Spark chat client over many rows of tabular input with
//! keyword-based prefiltering to reduce call volume:
//!
//! - [`prefilter`] -- the keyword dictionary that short-circuits rows
//!   with no non-answer signal
//! - [`baseline`] -- the category-tagged regex classifier used as the
//!   manual-label baseline
//! - [`limiter`] -- the start-time rate limiter pacing outbound calls
//! - [`worker`] -- one row's bounded-retry classification call
//! - [`pipeline`] -- fan-out, merge-on-arrival, and checkpointing
//! - [`table`] -- the JSONL row store with atomic overwrite
//!
//! Row failures never escape: every submitted row yields exactly one
//! result, with diagnostics recorded in its error column.

pub mod baseline;
pub mod limiter;
pub mod pipeline;
pub mod prefilter;
pub mod prompt;
pub mod table;
pub mod worker;

pub use limiter::StartRateLimiter;
pub use pipeline::{Pipeline, RunSummary};
pub use prefilter::{KeywordDictionary, KwScan};
pub use worker::{ClassificationRequest, ClassificationResult, RetryConfig};
