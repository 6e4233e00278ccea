//! JSONL table persistence.
//!
//! Rows travel as one JSON object per line. Checkpoints are written to
//! a sibling temp file and renamed over the target, so a crash
//! mid-write never leaves a truncated table behind.

use std::path::Path;

use tokio::fs;
use tracing::debug;

use candor_types::{CallRecord, CandorError, Result};

/// Load a table from a JSONL file. Blank lines are skipped; a
/// malformed line fails the load with its line number.
pub async fn load_records(path: &Path) -> Result<Vec<CallRecord>> {
    let contents = fs::read_to_string(path).await?;
    let mut rows = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: CallRecord = serde_json::from_str(line).map_err(|e| CandorError::Table {
            reason: format!("{}:{}: {e}", path.display(), index + 1),
        })?;
        rows.push(record);
    }
    debug!(path = %path.display(), rows = rows.len(), "table loaded");
    Ok(rows)
}

/// Write the full table to `path`, atomically replacing any previous
/// contents via a temp-file rename.
pub async fn save_records(path: &Path, rows: &[CallRecord]) -> Result<()> {
    let mut buf = String::new();
    for row in rows {
        buf.push_str(&serde_json::to_string(row)?);
        buf.push('\n');
    }

    let tmp = match path.file_name() {
        Some(name) => path.with_file_name(format!("{}.tmp", name.to_string_lossy())),
        None => {
            return Err(CandorError::Table {
                reason: format!("not a file path: {}", path.display()),
            })
        }
    };
    fs::write(&tmp, buf.as_bytes()).await?;
    fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), rows = rows.len(), "table saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<CallRecord> {
        vec![
            CallRecord::new("t1", "What drove margins?", "Mix, mostly."),
            CallRecord::new("t2", "Guidance?", "We'd rather not get into that."),
        ]
    }

    #[tokio::test]
    async fn round_trip_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.jsonl");

        let rows = sample_rows();
        save_records(&path, &rows).await.unwrap();
        let loaded = load_records(&path).await.unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].transcriptid, "t1");
        assert_eq!(loaded[1].answer, "We'd rather not get into that.");
    }

    #[tokio::test]
    async fn blank_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.jsonl");

        let line = serde_json::to_string(&CallRecord::new("t1", "q", "a")).unwrap();
        tokio::fs::write(&path, format!("\n{line}\n\n")).await.unwrap();

        let loaded = load_records(&path).await.unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn malformed_line_reports_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.jsonl");

        let good = serde_json::to_string(&CallRecord::new("t1", "q", "a")).unwrap();
        tokio::fs::write(&path, format!("{good}\n{{not json\n")).await.unwrap();

        let err = load_records(&path).await.unwrap_err();
        assert!(err.to_string().contains(":2:"), "got: {err}");
    }

    #[tokio::test]
    async fn save_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.jsonl");

        save_records(&path, &sample_rows()).await.unwrap();
        save_records(&path, &sample_rows()[..1]).await.unwrap();

        let loaded = load_records(&path).await.unwrap();
        assert_eq!(loaded.len(), 1);
        // No temp file left behind after the rename.
        assert!(!dir.path().join("table.jsonl.tmp").exists());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = load_records(Path::new("/nonexistent/table.jsonl"))
            .await
            .unwrap_err();
        assert!(matches!(err, CandorError::Io(_)));
    }
}
