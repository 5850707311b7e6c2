use std::path::Path;

use crate::core::errors::Result;
use crate::core::models::key_pair::KeyType;

/// Port for the external key tooling collaborators.
///
/// The production implementation lives in `adapters::tools` and shells
/// out to `ssh-keygen`, `ssh`, and `ssh-copy-id`. The core layer only
/// depends on this trait, so tests substitute in-memory fakes.
pub trait KeyTooling: Send + Sync {
    /// Generate a fresh key pair at `path` (private) and `path.pub`.
    fn generate(
        &self,
        path: &Path,
        key_type: KeyType,
        comment: Option<&str>,
        overwrite: bool,
    ) -> Result<()>;

    /// Probe connectivity for a host alias or target string.
    fn test_connection(&self, target: &str) -> Result<()>;

    /// Install a public key on a remote target.
    fn upload_public_key(&self, public_path: &Path, target: &str) -> Result<()>;
}
