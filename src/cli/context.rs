use std::path::PathBuf;
use std::sync::OnceLock;

use crate::core::errors::{KeywardenError, Result};
use crate::core::models::ssh_config::expand_path;

static KEYS_ROOT: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the global keys-root path.
/// If `custom` is provided (the `--path` flag), uses that path after
/// `~` expansion; otherwise defaults to `~/.ssh`.
pub fn init(custom: Option<&str>) {
    let root = custom.map(expand_path).unwrap_or_else(default_root);
    let _ = KEYS_ROOT.set(root);
}

/// Get the current keys-root path.
pub fn keys_root() -> PathBuf {
    KEYS_ROOT.get().cloned().unwrap_or_else(default_root)
}

/// The state directory holding config, profiles, log, and backups.
pub fn state_dir() -> PathBuf {
    keys_root().join(".keywarden")
}

fn default_root() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".ssh"))
        .unwrap_or_else(|| PathBuf::from(".ssh"))
}

/// Reject configured file names that could escape the state directory.
pub fn validate_simple_filename(name: &str, what: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(KeywardenError::InvalidConfig {
            detail: format!("{what} must be a plain file name, got '{name}'"),
        });
    }
    Ok(())
}
