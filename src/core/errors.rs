use std::path::PathBuf;

/// All domain errors for keywarden.
///
/// Each variant provides enough context to diagnose the issue
/// without needing a debugger. Fatal kinds (`ConfigAccess`,
/// `ProfileStorage`, `InvalidConfig`) abort the whole command;
/// the remaining kinds fail only the key or profile they concern.
#[derive(Debug, thiserror::Error)]
pub enum KeywardenError {
    #[error(
        "Cannot access SSH config at {path}: {detail}\n\n  \
         No rewrite was attempted. Check the file's permissions and try again."
    )]
    ConfigAccess { path: PathBuf, detail: String },

    #[error(
        "Profile store error: {detail}\n\n  \
         The profiles file was NOT modified.\n  \
         If the file is corrupt, restore it from version control or fix the JSON by hand."
    )]
    ProfileStorage { detail: String },

    #[error(
        "A profile with alias '{alias}' already exists\n\n  \
         Aliases must be unique. Pick another alias or remove the existing one:\n    \
         keywarden profile remove {alias}"
    )]
    DuplicateAlias { alias: String },

    #[error("No profile found with alias '{alias}'")]
    ProfileNotFound { alias: String },

    #[error(
        "No key named '{name}' found under {root}\n\n  \
         Available keys:\n{available}\n  \
         Run 'keywarden list' to see the full inventory."
    )]
    KeyNotFound {
        name: String,
        root: PathBuf,
        available: String,
    },

    #[error(
        "Key name '{name}' is ambiguous — it matches several files:\n{candidates}\n  \
         Use a path relative to the key root to pick one, e.g. 'work/{name}'."
    )]
    AmbiguousKey { name: String, candidates: String },

    #[error(
        "Destination already exists: {path}\n\n  \
         An active key is already in place. Re-run with --force to overwrite it,\n  \
         or archive the active key first."
    )]
    Conflict { path: PathBuf },

    #[error("{tool} failed: {reason}")]
    Collaborator { tool: String, reason: String },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error("Rotation log error: {detail}")]
    LogError { detail: String },

    #[error("{failed} of {total} key(s) failed — see the summary above")]
    BatchFailed { failed: usize, total: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl KeywardenError {
    /// Whether this error aborts a whole batch rather than failing a
    /// single key.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KeywardenError::ConfigAccess { .. }
                | KeywardenError::ProfileStorage { .. }
                | KeywardenError::InvalidConfig { .. }
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KeywardenError>;
