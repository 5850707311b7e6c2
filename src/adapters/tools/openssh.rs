use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::app_config::ToolsSection;
use crate::core::errors::{KeywardenError, Result};
use crate::core::models::key_pair::KeyType;
use crate::core::traits::key_tools::KeyTooling;

/// Key tooling that shells out to the system OpenSSH binaries.
///
/// The binary paths come from the `[tools]` config section, so tests
/// and unusual installations can point keywarden at substitutes.
pub struct OpensshTools {
    keygen_path: PathBuf,
    ssh_path: PathBuf,
    copy_id_path: PathBuf,
}

impl OpensshTools {
    /// Create tooling from the `[tools]` config section.
    pub fn from_config(tools: &ToolsSection) -> Self {
        Self {
            keygen_path: PathBuf::from(&tools.ssh_keygen),
            ssh_path: PathBuf::from(&tools.ssh),
            copy_id_path: PathBuf::from(&tools.ssh_copy_id),
        }
    }

    /// Check whether `ssh-keygen` can be executed at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.keygen_path)
            .arg("-?")
            .output()
            .is_ok()
    }

    /// Run one of the tools, mapping a non-zero exit into a
    /// collaborator error carrying the tool's stderr.
    fn run(&self, tool: &str, program: &Path, args: &[&str]) -> Result<()> {
        let output = Command::new(program).args(args).output().map_err(|e| {
            KeywardenError::Collaborator {
                tool: tool.to_string(),
                reason: format!("failed to run {}: {e}", program.display()),
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KeywardenError::Collaborator {
                tool: tool.to_string(),
                reason: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(())
    }
}

impl KeyTooling for OpensshTools {
    fn generate(
        &self,
        path: &Path,
        key_type: KeyType,
        comment: Option<&str>,
        overwrite: bool,
    ) -> Result<()> {
        if path.exists() {
            if !overwrite {
                return Err(KeywardenError::Collaborator {
                    tool: "ssh-keygen".to_string(),
                    reason: format!("{} already exists", path.display()),
                });
            }
            // ssh-keygen prompts on an existing file even in batch
            // mode; clear the pair first.
            std::fs::remove_file(path)?;
            let pub_path = PathBuf::from(format!("{}.pub", path.display()));
            if pub_path.exists() {
                std::fs::remove_file(&pub_path)?;
            }
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let path_arg = path.display().to_string();
        let mut args = vec![
            "-q",
            "-t",
            key_type.keygen_name(),
            "-N",
            "",
            "-f",
            path_arg.as_str(),
        ];
        if key_type == KeyType::Rsa {
            args.extend_from_slice(&["-b", "4096"]);
        }
        if let Some(comment) = comment {
            args.extend_from_slice(&["-C", comment]);
        }

        self.run("ssh-keygen", &self.keygen_path, &args)
    }

    fn test_connection(&self, target: &str) -> Result<()> {
        self.run(
            "ssh",
            &self.ssh_path,
            &[
                "-o",
                "BatchMode=yes",
                "-o",
                "ConnectTimeout=10",
                target,
                "exit",
            ],
        )
    }

    fn upload_public_key(&self, public_path: &Path, target: &str) -> Result<()> {
        let path_arg = public_path.display().to_string();
        self.run(
            "ssh-copy-id",
            &self.copy_id_path,
            &["-i", path_arg.as_str(), target],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_refuses_existing_path_without_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("id_ed25519");
        std::fs::write(&path, "existing").unwrap();

        let tools = OpensshTools::from_config(&ToolsSection::default());
        let err = tools
            .generate(&path, KeyType::Ed25519, None, false)
            .unwrap_err();
        assert!(matches!(err, KeywardenError::Collaborator { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing");
    }

    #[test]
    fn missing_binary_reports_collaborator_error() {
        let tools = OpensshTools::from_config(&ToolsSection {
            ssh_keygen: "/nonexistent/ssh-keygen".to_string(),
            ssh: "/nonexistent/ssh".to_string(),
            ssh_copy_id: "/nonexistent/ssh-copy-id".to_string(),
        });

        let err = tools.test_connection("example").unwrap_err();
        let KeywardenError::Collaborator { tool, .. } = err else {
            panic!("expected a collaborator error");
        };
        assert_eq!(tool, "ssh");
    }

    // Tests exercising real key generation live in tests/, driven
    // through stub binaries configured via [tools].
}
