use crate::core::errors::Result;
use crate::core::models::log_entry::RotationLogEntry;

/// Port for recording and querying rotation history.
pub trait RotationLog: Send + Sync {
    /// Append an entry to the log.
    fn append(&self, entry: &RotationLogEntry) -> Result<()>;

    /// Query all entries, optionally filtered by key name and date.
    fn query(
        &self,
        key: Option<&str>,
        since: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Vec<RotationLogEntry>>;
}
