use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::models::key_pair::KeyType;

/// One step of the per-key rotation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStep {
    Resolve,
    PreflightTest,
    Generate,
    Archive,
    ConfigRewrite,
    ProfileUpdate,
    PostTest,
    Upload,
}

impl std::fmt::Display for RotationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RotationStep::Resolve => "resolve",
            RotationStep::PreflightTest => "preflight test",
            RotationStep::Generate => "generate",
            RotationStep::Archive => "archive",
            RotationStep::ConfigRewrite => "config rewrite",
            RotationStep::ProfileUpdate => "profile update",
            RotationStep::PostTest => "post test",
            RotationStep::Upload => "upload",
        })
    }
}

/// Outcome of rotating one key.
#[derive(Debug, Clone)]
pub struct RotationResult {
    /// The name the key was requested by.
    pub key: String,
    pub succeeded: bool,
    pub steps_completed: Vec<RotationStep>,
    /// Non-fatal issues (failed probes, failed uploads).
    pub warnings: Vec<String>,
    pub failure: Option<String>,
}

impl RotationResult {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            succeeded: false,
            steps_completed: Vec::new(),
            warnings: Vec::new(),
            failure: None,
        }
    }

    /// Succeeded without a single warning.
    pub fn is_clean(&self) -> bool {
        self.succeeded && self.warnings.is_empty()
    }
}

/// What a rotation would do, computed without mutating anything.
#[derive(Debug, Clone)]
pub struct RotationPlan {
    pub key: String,
    pub private_path: PathBuf,
    pub public_path: Option<PathBuf>,
    pub archive_to: PathBuf,
    pub new_type: KeyType,
    pub new_comment: Option<String>,
    /// Aliases of config hosts whose IdentityFile would be rewritten.
    pub affected_hosts: Vec<String>,
    /// Aliases of profiles whose identity reference would be updated.
    pub affected_profiles: Vec<String>,
}

/// Aggregated outcome of a batch rotation.
#[derive(Debug, Default)]
pub struct RotationSummary {
    pub results: Vec<RotationResult>,
    /// Plans collected instead of results when running with `--dry-run`.
    pub plans: Vec<RotationPlan>,
}

impl RotationSummary {
    /// Keys that succeeded with no warnings.
    pub fn clean(&self) -> usize {
        self.results.iter().filter(|r| r.is_clean()).count()
    }

    /// Keys that succeeded but collected warnings.
    pub fn with_warnings(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.succeeded && !r.warnings.is_empty())
            .count()
    }

    /// Keys whose pipeline failed.
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.succeeded).count()
    }
}
