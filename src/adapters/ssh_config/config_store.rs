use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::errors::{KeywardenError, Result};
use crate::core::models::ssh_config::SshConfig;

/// Owns the SSH client config file on disk: loading, timestamped
/// backups, and atomic rewrites.
///
/// A missing config file is an empty config, not an error; a config
/// that exists but cannot be read aborts the whole operation before
/// any rewrite is attempted.
pub struct SshConfigStore {
    path: PathBuf,
    backup_dir: PathBuf,
}

impl SshConfigStore {
    pub fn new(path: PathBuf, backup_dir: PathBuf) -> Self {
        Self { path, backup_dir }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the config file into its block model.
    pub fn load(&self) -> Result<SshConfig> {
        if !self.path.exists() {
            return Ok(SshConfig::default());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| KeywardenError::ConfigAccess {
                path: self.path.clone(),
                detail: e.to_string(),
            })?;

        Ok(SshConfig::parse(&content))
    }

    /// Serialize and write the config back, copying the current file
    /// into a timestamped backup first (unless `backup` is false). The
    /// write itself goes through a same-directory temp file + rename.
    pub fn save(&self, config: &SshConfig, backup: bool) -> Result<()> {
        if backup && self.path.exists() {
            self.backup()?;
        }

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(config.serialize().as_bytes())?;
        tmp.persist(&self.path)
            .map_err(|e| KeywardenError::ConfigAccess {
                path: self.path.clone(),
                detail: format!("failed to replace config: {e}"),
            })?;
        Ok(())
    }

    /// Copy the current config into the backup directory under a
    /// timestamped name. History is unlimited: a colliding name gets a
    /// counter suffix instead of overwriting an earlier backup.
    pub fn backup(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.backup_dir)?;

        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let base = format!("config-{stamp}");

        let mut backup_path = self.backup_dir.join(&base);
        let mut counter = 1;
        while backup_path.exists() {
            backup_path = self.backup_dir.join(format!("{base}-{counter}"));
            counter += 1;
        }

        std::fs::copy(&self.path, &backup_path).map_err(|e| KeywardenError::ConfigAccess {
            path: self.path.clone(),
            detail: format!("failed to back up config: {e}"),
        })?;
        Ok(backup_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, SshConfigStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = SshConfigStore::new(
            tmp.path().join("config"),
            tmp.path().join("backups"),
        );
        (tmp, store)
    }

    #[test]
    fn missing_file_is_empty_config() {
        let (_tmp, store) = setup();
        let config = store.load().unwrap();
        assert!(config.blocks.is_empty());
        assert!(config.prelude.is_empty());
    }

    #[test]
    fn save_and_reload_round_trips() {
        let (_tmp, store) = setup();
        let content = "# managed\nHost prod\n  IdentityFile ~/.ssh/work/prod\n";

        store.save(&SshConfig::parse(content), false).unwrap();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), content);

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.serialize(), content);
    }

    #[test]
    fn save_with_backup_keeps_previous_content() {
        let (tmp, store) = setup();
        std::fs::write(store.path(), "Host old\n").unwrap();

        store.save(&SshConfig::parse("Host new\n"), true).unwrap();

        let backups: Vec<_> = std::fs::read_dir(tmp.path().join("backups"))
            .unwrap()
            .flatten()
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(
            std::fs::read_to_string(backups[0].path()).unwrap(),
            "Host old\n"
        );
        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "Host new\n"
        );
    }

    #[test]
    fn backups_never_overwrite_each_other() {
        let (tmp, store) = setup();
        std::fs::write(store.path(), "one\n").unwrap();

        // Two backups inside the same second must both survive.
        store.backup().unwrap();
        std::fs::write(store.path(), "two\n").unwrap();
        store.backup().unwrap();

        let count = std::fs::read_dir(tmp.path().join("backups"))
            .unwrap()
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn no_backup_flag_skips_backup() {
        let (tmp, store) = setup();
        std::fs::write(store.path(), "Host old\n").unwrap();

        store.save(&SshConfig::parse("Host new\n"), false).unwrap();
        assert!(!tmp.path().join("backups").exists());
    }

    #[test]
    fn save_into_missing_parent_creates_it() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SshConfigStore::new(
            tmp.path().join("deep/dir/config"),
            tmp.path().join("backups"),
        );
        store.save(&SshConfig::parse("Host a\n"), false).unwrap();
        assert!(tmp.path().join("deep/dir/config").is_file());
    }
}
