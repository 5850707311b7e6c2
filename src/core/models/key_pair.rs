use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Algorithm of a discovered key, as far as it can be told from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Ed25519,
    Rsa,
    Ecdsa,
    Other,
}

impl KeyType {
    /// Parse a user-supplied or `.pub`-derived type name.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" | "ssh-ed25519" => KeyType::Ed25519,
            "rsa" | "ssh-rsa" => KeyType::Rsa,
            "ecdsa" => KeyType::Ecdsa,
            s if s.starts_with("ecdsa-sha2") => KeyType::Ecdsa,
            _ => KeyType::Other,
        }
    }

    /// The name `ssh-keygen -t` expects.
    pub fn keygen_name(&self) -> &'static str {
        match self {
            KeyType::Ed25519 => "ed25519",
            KeyType::Rsa => "rsa",
            KeyType::Ecdsa => "ecdsa",
            KeyType::Other => "ed25519",
        }
    }
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            KeyType::Ed25519 => "ed25519",
            KeyType::Rsa => "rsa",
            KeyType::Ecdsa => "ecdsa",
            KeyType::Other => "other",
        })
    }
}

/// A private key on disk, paired with its `.pub` sibling when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private_path: PathBuf,
    pub public_path: Option<PathBuf>,
    pub key_type: KeyType,
    pub comment: Option<String>,
    /// Permission bits of the private file (e.g. `0o600`).
    pub permissions: u32,
}

impl KeyPair {
    /// Whether the private file is readable only by its owner.
    ///
    /// `600` is the expected mode; read-only `400` is also accepted.
    /// Violations are flagged to the user, never silently fixed.
    pub fn permissions_ok(&self) -> bool {
        matches!(self.permissions & 0o777, 0o600 | 0o400)
    }
}

impl std::fmt::Display for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.comment {
            Some(comment) => write!(
                f,
                "{} ({}, {comment})",
                self.private_path.display(),
                self.key_type
            ),
            None => write!(f, "{} ({})", self.private_path.display(), self.key_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_types() {
        assert_eq!(KeyType::parse("ed25519"), KeyType::Ed25519);
        assert_eq!(KeyType::parse("ssh-ed25519"), KeyType::Ed25519);
        assert_eq!(KeyType::parse("RSA"), KeyType::Rsa);
        assert_eq!(KeyType::parse("ecdsa-sha2-nistp256"), KeyType::Ecdsa);
        assert_eq!(KeyType::parse("dsa"), KeyType::Other);
    }

    #[test]
    fn permission_check() {
        let mut key = KeyPair {
            private_path: "id_ed25519".into(),
            public_path: None,
            key_type: KeyType::Ed25519,
            comment: None,
            permissions: 0o600,
        };
        assert!(key.permissions_ok());

        key.permissions = 0o400;
        assert!(key.permissions_ok());

        key.permissions = 0o644;
        assert!(!key.permissions_ok());
    }
}
