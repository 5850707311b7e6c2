use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::core::errors::{KeywardenError, Result};
use crate::core::models::log_entry::RotationLogEntry;
use crate::core::traits::rotation_log::RotationLog;

/// Rotation log that appends entries as JSON lines to a file.
///
/// Each line is a self-contained JSON object representing one
/// `RotationLogEntry`. The format supports efficient appends and
/// line-by-line streaming reads.
pub struct FileRotationLog {
    log_path: PathBuf,
}

impl FileRotationLog {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }
}

impl RotationLog for FileRotationLog {
    fn append(&self, entry: &RotationLogEntry) -> Result<()> {
        let line = serde_json::to_string(entry).map_err(|e| KeywardenError::LogError {
            detail: format!("failed to serialize log entry: {e}"),
        })?;

        if let Some(parent) = self.log_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| KeywardenError::LogError {
                detail: format!("cannot open rotation log at {}: {e}", self.log_path.display()),
            })?;

        writeln!(file, "{line}").map_err(|e| KeywardenError::LogError {
            detail: format!("failed to write log entry: {e}"),
        })?;

        Ok(())
    }

    fn query(&self, key: Option<&str>, since: Option<DateTime<Utc>>) -> Result<Vec<RotationLogEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.log_path).map_err(|e| KeywardenError::LogError {
            detail: format!("cannot read rotation log: {e}"),
        })?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| KeywardenError::LogError {
                detail: format!("error reading rotation log line {}: {e}", line_num + 1),
            })?;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let entry: RotationLogEntry =
                serde_json::from_str(trimmed).map_err(|e| KeywardenError::LogError {
                    detail: format!("malformed log entry at line {}: {e}", line_num + 1),
                })?;

            if let Some(key_filter) = key
                && !entry.key.contains(key_filter)
            {
                continue;
            }

            if let Some(since_date) = since
                && entry.timestamp < since_date
            {
                continue;
            }

            entries.push(entry);
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::log_entry::RotationOutcome;
    use crate::core::models::rotation::RotationStep;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample_entry(key: &str, outcome: RotationOutcome) -> RotationLogEntry {
        RotationLogEntry {
            timestamp: Utc::now(),
            key: key.to_string(),
            outcome,
            steps_completed: vec![RotationStep::Resolve, RotationStep::Generate],
            warnings: vec![],
            detail: None,
        }
    }

    #[test]
    fn append_and_query_round_trip() {
        let tmp = TempDir::new().unwrap();
        let log = FileRotationLog::new(tmp.path().join("rotation.log"));

        log.append(&sample_entry("work/prod", RotationOutcome::Success))
            .unwrap();

        let entries = log.query(None, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "work/prod");
        assert_eq!(entries[0].outcome, RotationOutcome::Success);
        assert_eq!(
            entries[0].steps_completed,
            vec![RotationStep::Resolve, RotationStep::Generate]
        );
    }

    #[test]
    fn entries_are_appended_in_order() {
        let tmp = TempDir::new().unwrap();
        let log = FileRotationLog::new(tmp.path().join("rotation.log"));

        log.append(&sample_entry("a", RotationOutcome::Success))
            .unwrap();
        log.append(&sample_entry("b", RotationOutcome::Failed))
            .unwrap();
        log.append(&sample_entry("c", RotationOutcome::Partial))
            .unwrap();

        let keys: Vec<String> = log
            .query(None, None)
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn filter_by_key_substring() {
        let tmp = TempDir::new().unwrap();
        let log = FileRotationLog::new(tmp.path().join("rotation.log"));

        log.append(&sample_entry("work/prod", RotationOutcome::Success))
            .unwrap();
        log.append(&sample_entry("personal/id", RotationOutcome::Success))
            .unwrap();

        let entries = log.query(Some("work"), None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "work/prod");
    }

    #[test]
    fn filter_by_since() {
        let tmp = TempDir::new().unwrap();
        let log = FileRotationLog::new(tmp.path().join("rotation.log"));

        let old = RotationLogEntry {
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            ..sample_entry("old-key", RotationOutcome::Success)
        };
        let recent = RotationLogEntry {
            timestamp: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            ..sample_entry("new-key", RotationOutcome::Success)
        };

        log.append(&old).unwrap();
        log.append(&recent).unwrap();

        let cutoff = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let entries = log.query(None, Some(cutoff)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "new-key");
    }

    #[test]
    fn query_nonexistent_file_returns_empty() {
        let log = FileRotationLog::new(PathBuf::from("/nonexistent/rotation.log"));
        assert!(log.query(None, None).unwrap().is_empty());
    }
}
