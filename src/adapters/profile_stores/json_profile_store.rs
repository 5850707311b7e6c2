use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::errors::{KeywardenError, Result};
use crate::core::models::profile::ConnectionProfile;
use crate::core::models::ssh_config::expand_path;
use crate::core::traits::profile_store::ProfileStore;

/// Stored shape of one profile: everything but the alias, which is the
/// JSON object key.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredProfile {
    host: String,
    user: String,
    #[serde(default = "default_port")]
    port: u16,
    identity_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key_name: Option<String>,
}

fn default_port() -> u16 {
    22
}

/// Profile store persisted as a JSON object mapping alias to profile.
///
/// Insertion order is preserved across load/save cycles so rewrites
/// stay diffable. Every save goes through a temp file in the same
/// directory followed by a rename, so a crash mid-write never corrupts
/// the existing store.
#[derive(Clone)]
pub struct JsonProfileStore {
    path: PathBuf,
}

impl JsonProfileStore {
    /// Create a store backed by the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the alias map. A missing file is an empty store; a file
    /// that exists but does not parse is a fatal storage error.
    fn load(&self) -> Result<IndexMap<String, StoredProfile>> {
        if !self.path.exists() {
            return Ok(IndexMap::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            KeywardenError::ProfileStorage {
                detail: format!("cannot read {}: {e}", self.path.display()),
            }
        })?;

        serde_json::from_str(&content).map_err(|e| KeywardenError::ProfileStorage {
            detail: format!("{} is not valid JSON: {e}", self.path.display()),
        })
    }

    /// Atomically rewrite the store: temp file in the same directory,
    /// then rename over the target.
    fn persist(&self, profiles: &IndexMap<String, StoredProfile>) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent)?;

        let json = serde_json::to_string_pretty(profiles).map_err(|e| {
            KeywardenError::ProfileStorage {
                detail: format!("failed to serialize profiles: {e}"),
            }
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path)
            .map_err(|e| KeywardenError::ProfileStorage {
                detail: format!("failed to replace {}: {e}", self.path.display()),
            })?;
        Ok(())
    }
}

fn to_profile(alias: &str, stored: &StoredProfile) -> ConnectionProfile {
    ConnectionProfile {
        alias: alias.to_string(),
        host: stored.host.clone(),
        user: stored.user.clone(),
        port: stored.port,
        identity_file: stored.identity_file.clone(),
        key_name: stored.key_name.clone(),
    }
}

fn to_stored(profile: &ConnectionProfile) -> StoredProfile {
    StoredProfile {
        host: profile.host.clone(),
        user: profile.user.clone(),
        port: profile.port,
        identity_file: profile.identity_file.clone(),
        key_name: profile.key_name.clone(),
    }
}

/// Whether a profile's identity reference points at `target`, compared
/// both literally and after path expansion.
fn identity_matches(reference: &str, target: &str) -> bool {
    reference == target || expand_path(reference) == expand_path(target)
}

impl ProfileStore for JsonProfileStore {
    fn add(&self, profile: &ConnectionProfile) -> Result<()> {
        let mut profiles = self.load()?;

        if profiles.contains_key(&profile.alias) {
            return Err(KeywardenError::DuplicateAlias {
                alias: profile.alias.clone(),
            });
        }

        profiles.insert(profile.alias.clone(), to_stored(profile));
        self.persist(&profiles)
    }

    fn list(&self) -> Result<Vec<ConnectionProfile>> {
        Ok(self
            .load()?
            .iter()
            .map(|(alias, stored)| to_profile(alias, stored))
            .collect())
    }

    fn get(&self, alias: &str) -> Result<Option<ConnectionProfile>> {
        Ok(self
            .load()?
            .get(alias)
            .map(|stored| to_profile(alias, stored)))
    }

    fn remove(&self, alias: &str) -> Result<()> {
        let mut profiles = self.load()?;

        if profiles.shift_remove(alias).is_none() {
            return Err(KeywardenError::ProfileNotFound {
                alias: alias.to_string(),
            });
        }

        self.persist(&profiles)
    }

    fn update_identity(&self, old_ref: &str, new_ref: &str) -> Result<usize> {
        let mut profiles = self.load()?;

        let mut updated = 0;
        for stored in profiles.values_mut() {
            if identity_matches(&stored.identity_file, old_ref) {
                stored.identity_file = new_ref.to_string();
                updated += 1;
            }
        }

        if updated > 0 {
            self.persist(&profiles)?;
        }
        Ok(updated)
    }
}
