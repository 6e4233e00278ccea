//! The parallel classification pipeline.
//!
//! Two phases. Phase A is a serial keyword prefilter over every row:
//! misses are resolved to label 0 on the spot and never reach the
//! network. Phase B fans the surviving rows out to a bounded set of
//! concurrent workers, merges results back into the table as they
//! arrive, and checkpoints the full table at a fixed cadence so an
//! interrupted run loses at most one checkpoint interval of work.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use candor_spark::backend::ChatBackend;
use candor_spark::client::SparkClient;
use candor_types::{CallRecord, Config, Result};

use crate::limiter::StartRateLimiter;
use crate::prefilter::KeywordDictionary;
use crate::table;
use crate::worker::{
    classify_row, ClassificationRequest, ClassificationResult, RetryConfig, CALL_FAILED_PREFIX,
};

/// Counters describing one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows in the input table.
    pub total_rows: usize,
    /// Rows the prefilter resolved to 0 without a remote call.
    pub skipped_as_zero: usize,
    /// Rows sent to the classifier.
    pub spark_called: usize,
    /// Checkpoints written, the final save included.
    pub checkpoints_written: usize,
}

/// Orchestrates prefiltering, fan-out, merging, and checkpointing.
pub struct Pipeline {
    config: Config,
    dictionary: KeywordDictionary,
    backend: Arc<dyn ChatBackend>,
    limiter: Arc<StartRateLimiter>,
}

impl Pipeline {
    /// Build a pipeline backed by the live chat service.
    pub fn new(config: Config) -> Self {
        let backend: Arc<dyn ChatBackend> = Arc::new(SparkClient::new(&config));
        Self::with_backend(config, backend)
    }

    /// Build a pipeline over an arbitrary backend.
    pub fn with_backend(config: Config, backend: Arc<dyn ChatBackend>) -> Self {
        let dictionary = KeywordDictionary::for_variant(config.pipeline.dictionary);
        let limiter = Arc::new(StartRateLimiter::new(config.start_interval()));
        Self {
            config,
            dictionary,
            backend,
            limiter,
        }
    }

    /// The dictionary the prefilter phase will use.
    pub fn dictionary(&self) -> &KeywordDictionary {
        &self.dictionary
    }

    /// Run the full pipeline over `rows`, checkpointing to `out_path`.
    ///
    /// The returned table preserves the input row order; every row
    /// comes back resolved one way or another.
    pub async fn run(
        &self,
        mut rows: Vec<CallRecord>,
        out_path: &Path,
    ) -> Result<(Vec<CallRecord>, RunSummary)> {
        let mut summary = RunSummary {
            total_rows: rows.len(),
            ..RunSummary::default()
        };

        info!(
            rows = rows.len(),
            dictionary = self.dictionary.name(),
            workers = self.config.pipeline.workers,
            "pipeline starting"
        );

        // Phase A: serial prefilter.
        let mut pending = Vec::new();
        for (row_id, row) in rows.iter_mut().enumerate() {
            let scan = self.dictionary.find_matches(&row.answer);
            if scan.matched {
                row.kw_match = Some(1);
                row.kw_matches = scan.joined_terms();
                row.used_spark = Some(1);
                pending.push(ClassificationRequest::from_record(row_id, row));
            } else {
                row.kw_match = Some(0);
                row.kw_matches = String::new();
                row.used_spark = Some(0);
                row.final_pred_nonanswer = Some(0);
                summary.skipped_as_zero += 1;
            }
            if (row_id + 1) % 200 == 0 {
                debug!(scanned = row_id + 1, queued = pending.len(), "prefilter progress");
            }
        }
        summary.spark_called = pending.len();
        info!(
            queued = pending.len(),
            skipped = summary.skipped_as_zero,
            "prefilter done"
        );

        // Phase B: bounded fan-out, merge on arrival.
        let retry = RetryConfig::from_config(&self.config);
        let semaphore = Arc::new(Semaphore::new(self.config.pipeline.workers));
        let mut tasks: JoinSet<ClassificationResult> = JoinSet::new();
        let mut task_rows: HashMap<tokio::task::Id, usize> = HashMap::new();
        for request in pending {
            let backend = Arc::clone(&self.backend);
            let limiter = Arc::clone(&self.limiter);
            let semaphore = Arc::clone(&semaphore);
            let retry = retry.clone();
            let row_id = request.row_id;
            let handle = tasks.spawn(async move {
                // A closed semaphore is unreachable; it lives as long
                // as the tasks that acquire from it.
                let _permit = semaphore.acquire_owned().await.unwrap();
                classify_row(backend.as_ref(), &limiter, &request, &retry).await
            });
            task_rows.insert(handle.id(), row_id);
        }

        let checkpoint_every = self.config.pipeline.checkpoint_every.max(1);
        let mut done = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok(result) => result,
                // A panicked or aborted task still owes its row a
                // result; synthesize a call failure for it.
                Err(e) => match task_rows.get(&e.id()).copied() {
                    Some(row_id) => {
                        warn!(row = row_id, error = %e, "worker task failed");
                        ClassificationResult {
                            row_id,
                            raw: String::new(),
                            extracted: String::new(),
                            assessment: String::new(),
                            label: None,
                            error: format!("{CALL_FAILED_PREFIX}worker task failed: {e}"),
                        }
                    }
                    None => {
                        warn!(error = %e, "worker task failed for unknown row");
                        continue;
                    }
                },
            };
            merge_result(&mut rows, result);
            done += 1;
            if done % 10 == 0 {
                debug!(done, of = summary.spark_called, "classification progress");
            }
            if done % checkpoint_every == 0 {
                table::save_records(out_path, &rows).await?;
                summary.checkpoints_written += 1;
                debug!(done, checkpoint = %out_path.display(), "checkpoint written");
            }
        }

        table::save_records(out_path, &rows).await?;
        summary.checkpoints_written += 1;

        info!(
            total = summary.total_rows,
            called = summary.spark_called,
            skipped = summary.skipped_as_zero,
            checkpoints = summary.checkpoints_written,
            "pipeline finished"
        );
        Ok((rows, summary))
    }

    /// Derive the default output path for an input table:
    /// `table.jsonl` becomes `table.classified.jsonl`.
    pub fn default_out_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".into());
        input.with_file_name(format!("{stem}.classified.jsonl"))
    }
}

/// Fold one worker result back into its row. Only the orchestrating
/// task mutates the table.
fn merge_result(rows: &mut [CallRecord], result: ClassificationResult) {
    let Some(row) = rows.get_mut(result.row_id) else {
        warn!(row = result.row_id, "result for unknown row dropped");
        return;
    };
    row.spark_raw = result.raw;
    row.spark_json_extracted = result.extracted;
    row.spark_assessment = result.assessment;
    row.spark_pred_nonanswer = result.label;
    row.spark_parse_error = result.error;
    if let Some(label) = result.label {
        row.final_pred_nonanswer = Some(label);
    }
}
