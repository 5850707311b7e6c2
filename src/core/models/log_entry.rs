use serde::{Deserialize, Serialize};

use crate::core::models::rotation::{RotationResult, RotationStep};

/// Outcome classification for a rotation log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationOutcome {
    Success,
    /// Succeeded, but with warnings (failed probe or upload).
    Partial,
    Failed,
}

/// A single entry in the rotation log (JSON lines format).
///
/// One entry is appended per rotated key, recording which steps ran
/// and how the rotation ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationLogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub key: String,
    pub outcome: RotationOutcome,
    pub steps_completed: Vec<RotationStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RotationLogEntry {
    /// Build a log entry from a finished per-key result.
    pub fn from_result(result: &RotationResult) -> Self {
        let outcome = if !result.succeeded {
            RotationOutcome::Failed
        } else if result.warnings.is_empty() {
            RotationOutcome::Success
        } else {
            RotationOutcome::Partial
        };

        Self {
            timestamp: chrono::Utc::now(),
            key: result.key.clone(),
            outcome,
            steps_completed: result.steps_completed.clone(),
            warnings: result.warnings.clone(),
            detail: result.failure.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_from_result() {
        let mut result = RotationResult::new("work/prod");
        result.succeeded = true;
        assert_eq!(
            RotationLogEntry::from_result(&result).outcome,
            RotationOutcome::Success
        );

        result.warnings.push("probe failed".into());
        assert_eq!(
            RotationLogEntry::from_result(&result).outcome,
            RotationOutcome::Partial
        );

        result.succeeded = false;
        result.failure = Some("generation failed".into());
        let entry = RotationLogEntry::from_result(&result);
        assert_eq!(entry.outcome, RotationOutcome::Failed);
        assert_eq!(entry.detail.as_deref(), Some("generation failed"));
    }
}
