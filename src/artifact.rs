//! Per-run batch artifact
//!
//! The fetched batch is serialized to one JSON file per run, intended as an
//! audit/debug trail and as a fallback lookup for later stages. The artifact
//! is never updated after the run that wrote it.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::models::EmailRecord;

/// File name of the batch artifact inside the output directory
const BATCH_FILE: &str = "fetched_emails.json";

/// Path of the batch artifact for a given output directory
pub fn batch_path(output_dir: &str) -> PathBuf {
    Path::new(output_dir).join(BATCH_FILE)
}

/// Write the fetched batch as a JSON array
///
/// Creates the output directory if it does not exist. Returns the path the
/// artifact was written to.
pub async fn write_batch(output_dir: &str, records: &[EmailRecord]) -> AppResult<PathBuf> {
    fs::create_dir_all(output_dir)
        .await
        .map_err(|e| AppError::Internal(format!("failed to create output directory: {e}")))?;

    let path = batch_path(output_dir);
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| AppError::Internal(format!("failed to serialize batch: {e}")))?;
    fs::write(&path, json)
        .await
        .map_err(|e| AppError::Internal(format!("failed to write batch artifact: {e}")))?;

    info!(path = %path.display(), count = records.len(), "wrote batch artifact");
    Ok(path)
}

/// Read a previously written batch artifact back
///
/// Used as the ad hoc fallback lookup when a later stage needs the original
/// records for a run.
pub async fn load_batch(output_dir: &str) -> AppResult<Vec<EmailRecord>> {
    let path = batch_path(output_dir);
    let json = fs::read_to_string(&path).await.map_err(|e| {
        AppError::NotFound(format!("batch artifact {} unreadable: {e}", path.display()))
    })?;
    serde_json::from_str(&json)
        .map_err(|e| AppError::Internal(format!("batch artifact is malformed: {e}")))
}

#[cfg(test)]
mod tests {
    use crate::models::{EmailRecord, ThreadInfo};

    use super::{batch_path, load_batch, write_batch};

    fn record(id: &str) -> EmailRecord {
        EmailRecord {
            id: id.to_owned(),
            subject: "hi".to_owned(),
            sender: "a@example.com".to_owned(),
            body: "EMAIL DATE: 2024-05-01\n\nhello".to_owned(),
            date: "2024-05-01".to_owned(),
            age_days: Some(3),
            thread_info: ThreadInfo {
                email_id: id.to_owned(),
                ..ThreadInfo::default()
            },
        }
    }

    #[test]
    fn batch_path_joins_output_dir() {
        assert_eq!(
            batch_path("output").to_string_lossy(),
            "output/fetched_emails.json"
        );
    }

    #[tokio::test]
    async fn batch_roundtrips_through_artifact() {
        let dir = std::env::temp_dir().join(format!("triage-artifact-{}", std::process::id()));
        let dir = dir.to_string_lossy().into_owned();

        let records = vec![record("42"), record("41")];
        write_batch(&dir, &records).await.expect("write succeeds");
        let loaded = load_batch(&dir).await.expect("load succeeds");

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "42");
        assert_eq!(loaded[0].age_days, Some(3));
        assert_eq!(loaded[1].thread_info.email_id, "41");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn missing_artifact_is_not_found() {
        let err = load_batch("/nonexistent-triage-dir").await.expect_err("must fail");
        assert!(err.to_string().contains("unreadable"));
    }
}
