use crate::core::errors::Result;
use crate::core::models::profile::ConnectionProfile;

/// Port for the connection-profile store.
pub trait ProfileStore: Send + Sync {
    /// Insert a profile. Fails with `DuplicateAlias` if the alias exists,
    /// without mutating the store.
    fn add(&self, profile: &ConnectionProfile) -> Result<()>;

    /// All profiles in store order.
    fn list(&self) -> Result<Vec<ConnectionProfile>>;

    /// Look up a profile by alias.
    fn get(&self, alias: &str) -> Result<Option<ConnectionProfile>>;

    /// Remove a profile by alias.
    fn remove(&self, alias: &str) -> Result<()>;

    /// Rewrite every profile whose identity reference matches `old_ref`
    /// to point at `new_ref`. Returns the number of profiles updated;
    /// zero updates is not an error.
    fn update_identity(&self, old_ref: &str, new_ref: &str) -> Result<usize>;
}
