use serde::{Deserialize, Serialize};

/// A saved connection profile, keyed by its alias in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub alias: String,
    pub host: String,
    pub user: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Key name or path this profile connects with.
    pub identity_file: String,
    /// Optional link to a managed key's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
}

fn default_port() -> u16 {
    22
}

impl std::fmt::Display for ConnectionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} → {}@{}:{} ({})",
            self.alias, self.user, self.host, self.port, self.identity_file
        )
    }
}
