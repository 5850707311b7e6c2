use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::errors::{KeywardenError, Result};

/// Top-level keywarden configuration read from
/// `{keys_root}/.keywarden/config.toml`.
///
/// Every section and field is optional; a missing file means defaults
/// everywhere. Filenames from the config are validated to prevent path
/// traversal out of the state directory.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub keywarden: KeywardenSection,
    pub rotate: RotateSection,
    pub tools: ToolsSection,
}

impl AppConfig {
    /// Load the configuration, falling back to defaults when the file
    /// does not exist. A file that exists but does not parse is an
    /// error, never silently ignored.
    pub fn load_or_default(state_dir: &Path) -> Result<Self> {
        let config_path = state_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content).map_err(|e| KeywardenError::InvalidConfig {
            detail: format!("failed to parse {}: {e}", config_path.display()),
        })?;

        crate::cli::context::validate_simple_filename(
            &config.keywarden.profiles_file,
            "profiles file",
        )?;
        crate::cli::context::validate_simple_filename(&config.keywarden.log_file, "log file")?;

        Ok(config)
    }

    /// The archive root, resolved against the keys root when relative.
    pub fn archive_root(&self, keys_root: &Path) -> PathBuf {
        let dir = Path::new(&self.keywarden.archive_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            keys_root.join(dir)
        }
    }

    /// The SSH config path, resolved against the keys root when relative.
    pub fn ssh_config_path(&self, keys_root: &Path) -> PathBuf {
        let path = Path::new(&self.keywarden.ssh_config);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            keys_root.join(path)
        }
    }
}

/// The `[keywarden]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeywardenSection {
    /// Archive directory, relative to the keys root unless absolute.
    pub archive_dir: String,
    /// SSH client config file, relative to the keys root unless absolute.
    pub ssh_config: String,
    /// Profile store filename inside the state directory.
    pub profiles_file: String,
    /// Rotation log filename inside the state directory.
    pub log_file: String,
}

impl Default for KeywardenSection {
    fn default() -> Self {
        Self {
            archive_dir: "archived".to_string(),
            ssh_config: "config".to_string(),
            profiles_file: "profiles.json".to_string(),
            log_file: "rotation.log".to_string(),
        }
    }
}

/// The `[rotate]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RotateSection {
    /// Key type used when a rotated key's type cannot be determined.
    pub default_type: String,
}

impl Default for RotateSection {
    fn default() -> Self {
        Self {
            default_type: "ed25519".to_string(),
        }
    }
}

/// The `[tools]` section: paths of the external binaries.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub ssh_keygen: String,
    pub ssh: String,
    pub ssh_copy_id: String,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            ssh_keygen: "ssh-keygen".to_string(),
            ssh: "ssh".to_string(),
            ssh_copy_id: "ssh-copy-id".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(tmp.path()).unwrap();

        assert_eq!(config.keywarden.archive_dir, "archived");
        assert_eq!(config.rotate.default_type, "ed25519");
        assert_eq!(config.tools.ssh_keygen, "ssh-keygen");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "[tools]\nssh_keygen = \"/opt/bin/ssh-keygen\"\n",
        )
        .unwrap();

        let config = AppConfig::load_or_default(tmp.path()).unwrap();
        assert_eq!(config.tools.ssh_keygen, "/opt/bin/ssh-keygen");
        assert_eq!(config.tools.ssh, "ssh");
        assert_eq!(config.keywarden.log_file, "rotation.log");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "not = [valid").unwrap();

        let err = AppConfig::load_or_default(tmp.path()).unwrap_err();
        assert!(matches!(err, KeywardenError::InvalidConfig { .. }));
    }

    #[test]
    fn traversal_in_filenames_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "[keywarden]\nlog_file = \"../../etc/passwd\"\n",
        )
        .unwrap();

        assert!(AppConfig::load_or_default(tmp.path()).is_err());
    }

    #[test]
    fn archive_root_resolution() {
        let config = AppConfig::default();
        assert_eq!(
            config.archive_root(Path::new("/home/u/.ssh")),
            PathBuf::from("/home/u/.ssh/archived")
        );

        let mut absolute = AppConfig::default();
        absolute.keywarden.archive_dir = "/var/keys/archive".to_string();
        assert_eq!(
            absolute.archive_root(Path::new("/home/u/.ssh")),
            PathBuf::from("/var/keys/archive")
        );
    }
}
