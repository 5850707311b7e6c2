use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::core::errors::{KeywardenError, Result};
use crate::core::models::ssh_config::SshConfig;

const PRIVATE_MODE: u32 = 0o600;
const PUBLIC_MODE: u32 = 0o644;

/// What archiving a key would do, plus the hosts it would affect.
///
/// Computing a plan never mutates anything; the CLI uses the
/// `affected_hosts` list to ask for confirmation before calling
/// [`ArchiveService::archive`].
#[derive(Debug, Clone)]
pub struct ArchivePlan {
    pub name: String,
    pub private_path: PathBuf,
    pub public_path: Option<PathBuf>,
    pub archive_private: PathBuf,
    pub archive_public: Option<PathBuf>,
    pub affected_hosts: Vec<String>,
}

/// What restoring a key from the archive would do.
#[derive(Debug, Clone)]
pub struct RestorePlan {
    pub name: String,
    pub archive_private: PathBuf,
    pub archive_public: Option<PathBuf>,
    pub restore_private: PathBuf,
    pub restore_public: Option<PathBuf>,
    /// True when a file already exists at the restore destination.
    pub conflict: bool,
}

/// Moves key pairs between the active tree and the archive tree.
///
/// The archive mirrors the active tree's relative paths, so every
/// archive operation is reversible by path alone.
pub struct ArchiveService {
    keys_root: PathBuf,
    archive_root: PathBuf,
}

impl ArchiveService {
    pub fn new(keys_root: PathBuf, archive_root: PathBuf) -> Self {
        Self {
            keys_root,
            archive_root,
        }
    }

    /// Resolve `name` under the active tree and compute the mirror
    /// paths plus the aliases of every config host referencing the key.
    pub fn plan_archive(&self, name: &str, config: &SshConfig) -> Result<ArchivePlan> {
        let private_path = resolve_key(&self.keys_root, name, &[self.archive_root.as_path()])?;
        let relative = private_path
            .strip_prefix(&self.keys_root)
            .unwrap_or(&private_path)
            .to_path_buf();

        let public_path = existing_pub(&private_path);
        let archive_private = self.archive_root.join(&relative);
        let archive_public = public_path.as_ref().map(|p| {
            self.archive_root
                .join(p.strip_prefix(&self.keys_root).unwrap_or(p))
        });

        Ok(ArchivePlan {
            name: name.to_string(),
            affected_hosts: config.aliases_referencing(&private_path),
            private_path,
            public_path,
            archive_private,
            archive_public,
        })
    }

    /// Move the pair into the archive tree and prune any directories
    /// the move emptied. Permissions are re-asserted after the move
    /// (600 private, 644 public).
    pub fn archive(&self, plan: &ArchivePlan) -> Result<()> {
        move_file(&plan.private_path, &plan.archive_private, PRIVATE_MODE)?;
        if let (Some(from), Some(to)) = (&plan.public_path, &plan.archive_public) {
            move_file(from, to, PUBLIC_MODE)?;
        }

        if let Some(parent) = plan.private_path.parent() {
            prune_empty_dirs(&self.keys_root, parent);
        }
        Ok(())
    }

    /// Resolve `name` under the archive tree and compute where it
    /// would be restored to.
    pub fn plan_unarchive(&self, name: &str) -> Result<RestorePlan> {
        let archive_private = resolve_key(&self.archive_root, name, &[])?;
        let relative = archive_private
            .strip_prefix(&self.archive_root)
            .unwrap_or(&archive_private)
            .to_path_buf();

        let archive_public = existing_pub(&archive_private);
        let restore_private = self.keys_root.join(&relative);
        let restore_public = archive_public.as_ref().map(|p| {
            self.keys_root
                .join(p.strip_prefix(&self.archive_root).unwrap_or(p))
        });

        Ok(RestorePlan {
            name: name.to_string(),
            conflict: restore_private.exists(),
            archive_private,
            archive_public,
            restore_private,
            restore_public,
        })
    }

    /// Move the pair back into the active tree. A conflicting
    /// destination fails unless `force` is set, in which case it is
    /// overwritten.
    pub fn unarchive(&self, plan: &RestorePlan, force: bool) -> Result<()> {
        if plan.conflict && !force {
            return Err(KeywardenError::Conflict {
                path: plan.restore_private.clone(),
            });
        }

        move_file(&plan.archive_private, &plan.restore_private, PRIVATE_MODE)?;
        if let (Some(from), Some(to)) = (&plan.archive_public, &plan.restore_public) {
            move_file(from, to, PUBLIC_MODE)?;
        }

        if let Some(parent) = plan.archive_private.parent() {
            prune_empty_dirs(&self.archive_root, parent);
        }
        Ok(())
    }
}

/// The `.pub` sibling of a private key path, when it exists.
pub fn existing_pub(private_path: &Path) -> Option<PathBuf> {
    let pub_path = PathBuf::from(format!("{}.pub", private_path.display()));
    pub_path.is_file().then_some(pub_path)
}

/// Resolve a key name under `root`.
///
/// The name is tried as a direct relative path first; otherwise the
/// tree is searched for a file with a matching basename. An ambiguous
/// match is an error listing every candidate; no match is an error
/// listing every key file available under the root.
pub fn resolve_key(root: &Path, name: &str, skip_dirs: &[&Path]) -> Result<PathBuf> {
    let direct = root.join(name);
    if direct.is_file() {
        return Ok(direct);
    }

    let files = collect_key_files(root, skip_dirs);
    let candidates: Vec<&PathBuf> = files
        .iter()
        .filter(|p| p.file_name().is_some_and(|f| f == name))
        .collect();

    match candidates.len() {
        1 => Ok(candidates[0].clone()),
        0 => Err(KeywardenError::KeyNotFound {
            name: name.to_string(),
            root: root.to_path_buf(),
            available: format_listing(root, &files.iter().collect::<Vec<_>>()),
        }),
        _ => Err(KeywardenError::AmbiguousKey {
            name: name.to_string(),
            candidates: format_listing(root, &candidates),
        }),
    }
}

/// Every plausible key file under `root`: not hidden, not `.pub`, not a
/// well-known SSH support file. Sorted for stable error listings.
fn collect_key_files(root: &Path, skip_dirs: &[&Path]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk(root, skip_dirs, &mut files);
    files.sort();
    files
}

fn walk(dir: &Path, skip_dirs: &[&Path], out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') || name.ends_with(".pub") {
            continue;
        }
        let Ok(meta) = fs::symlink_metadata(&path) else {
            continue;
        };
        if meta.file_type().is_symlink() {
            continue;
        }
        if meta.is_dir() {
            if skip_dirs.iter().any(|s| *s == path) {
                continue;
            }
            walk(&path, skip_dirs, out);
        } else if !crate::core::services::scanner::is_well_known_non_key(&name) {
            out.push(path);
        }
    }
}

fn format_listing(root: &Path, paths: &[&PathBuf]) -> String {
    if paths.is_empty() {
        return "    (none)\n".to_string();
    }
    paths
        .iter()
        .map(|p| {
            format!(
                "    → {}\n",
                p.strip_prefix(root).unwrap_or(p).display()
            )
        })
        .collect()
}

/// Move a file, creating destination parents. Uses a single rename when
/// the volumes allow it; otherwise copies, verifies the copy's length,
/// applies the target mode, and only then deletes the source. The
/// target mode is asserted either way.
fn move_file(src: &Path, dst: &Path, mode: u32) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }

    if fs::rename(src, dst).is_err() {
        fs::copy(src, dst)?;
        let src_len = fs::metadata(src)?.len();
        let dst_len = fs::metadata(dst)?.len();
        if src_len != dst_len {
            let _ = fs::remove_file(dst);
            return Err(std::io::Error::other(format!(
                "copy of {} to {} is incomplete ({dst_len} of {src_len} bytes)",
                src.display(),
                dst.display()
            ))
            .into());
        }
        fs::set_permissions(dst, fs::Permissions::from_mode(mode))?;
        fs::remove_file(src)?;
    }

    fs::set_permissions(dst, fs::Permissions::from_mode(mode))?;
    Ok(())
}

/// Remove now-empty directories from `from` up to (but never
/// including) `root`.
fn prune_empty_dirs(root: &Path, from: &Path) {
    let mut dir = from.to_path_buf();
    while dir.starts_with(root) && dir != root {
        let is_empty = fs::read_dir(&dir).map(|mut e| e.next().is_none()).unwrap_or(false);
        if !is_empty || fs::remove_dir(&dir).is_err() {
            break;
        }
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, ArchiveService) {
        let tmp = tempfile::tempdir().unwrap();
        let keys = tmp.path().join("ssh");
        let archive = keys.join("archived");
        fs::create_dir_all(&keys).unwrap();
        let service = ArchiveService::new(keys, archive);
        (tmp, service)
    }

    fn write_key(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        path
    }

    #[test]
    fn archive_mirrors_relative_path() {
        let (tmp, service) = setup();
        let keys = tmp.path().join("ssh");
        write_key(&keys, "work/prod", "private");
        fs::write(keys.join("work/prod.pub"), "ssh-ed25519 AAA x").unwrap();

        let plan = service
            .plan_archive("work/prod", &SshConfig::default())
            .unwrap();
        assert!(plan.affected_hosts.is_empty());
        service.archive(&plan).unwrap();

        let archived = keys.join("archived/work/prod");
        assert!(archived.is_file());
        assert!(keys.join("archived/work/prod.pub").is_file());
        assert!(!keys.join("work/prod").exists());
        // The emptied subdirectory is pruned, the root is kept.
        assert!(!keys.join("work").exists());
        assert!(keys.exists());

        let mode = fs::metadata(&archived).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn plan_reports_affected_hosts_without_mutation() {
        let (tmp, service) = setup();
        let keys = tmp.path().join("ssh");
        let key = write_key(&keys, "work/prod", "private");

        let config = SshConfig::parse(&format!(
            "Host prod\n  IdentityFile {}\n",
            key.display()
        ));
        let plan = service.plan_archive("prod", &config).unwrap();

        assert_eq!(plan.affected_hosts, vec!["prod"]);
        assert!(key.is_file(), "planning must not touch the filesystem");
    }

    #[test]
    fn unarchive_restores_bytes_and_permissions() {
        let (tmp, service) = setup();
        let keys = tmp.path().join("ssh");
        write_key(&keys, "personal/id_ed25519", "secret-bytes");

        let plan = service
            .plan_archive("id_ed25519", &SshConfig::default())
            .unwrap();
        service.archive(&plan).unwrap();

        let restore = service.plan_unarchive("id_ed25519").unwrap();
        assert!(!restore.conflict);
        service.unarchive(&restore, false).unwrap();

        let restored = keys.join("personal/id_ed25519");
        assert_eq!(fs::read_to_string(&restored).unwrap(), "secret-bytes");
        let mode = fs::metadata(&restored).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        // Archive subtree was emptied and pruned.
        assert!(!keys.join("archived/personal").exists());
    }

    #[test]
    fn unarchive_conflict_without_force() {
        let (tmp, service) = setup();
        let keys = tmp.path().join("ssh");
        write_key(&keys, "id_ed25519", "old");

        let plan = service
            .plan_archive("id_ed25519", &SshConfig::default())
            .unwrap();
        service.archive(&plan).unwrap();

        // A new active key appears at the same path.
        write_key(&keys, "id_ed25519", "new-active");

        let restore = service.plan_unarchive("id_ed25519").unwrap();
        assert!(restore.conflict);

        let err = service.unarchive(&restore, false).unwrap_err();
        assert!(matches!(err, KeywardenError::Conflict { .. }));
        assert_eq!(
            fs::read_to_string(keys.join("id_ed25519")).unwrap(),
            "new-active",
            "conflict must not change the filesystem"
        );

        // With force the archived copy wins.
        service.unarchive(&restore, true).unwrap();
        assert_eq!(fs::read_to_string(keys.join("id_ed25519")).unwrap(), "old");
    }

    #[test]
    fn resolve_by_basename_in_subdirectory() {
        let (tmp, service) = setup();
        let keys = tmp.path().join("ssh");
        write_key(&keys, "work/deploy", "k");

        let plan = service.plan_archive("deploy", &SshConfig::default()).unwrap();
        assert!(plan.private_path.ends_with("work/deploy"));
    }

    #[test]
    fn ambiguous_name_lists_candidates() {
        let (tmp, service) = setup();
        let keys = tmp.path().join("ssh");
        write_key(&keys, "work/deploy", "a");
        write_key(&keys, "personal/deploy", "b");

        let err = service
            .plan_archive("deploy", &SshConfig::default())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("work/deploy"));
        assert!(msg.contains("personal/deploy"));
    }

    #[test]
    fn unknown_name_lists_available_keys() {
        let (tmp, service) = setup();
        let keys = tmp.path().join("ssh");
        write_key(&keys, "work/prod", "k");

        let err = service
            .plan_archive("nope", &SshConfig::default())
            .unwrap_err();
        assert!(matches!(err, KeywardenError::KeyNotFound { .. }));
        assert!(err.to_string().contains("work/prod"));
    }

    #[test]
    fn archived_keys_do_not_shadow_active_resolution() {
        let (tmp, service) = setup();
        let keys = tmp.path().join("ssh");
        write_key(&keys, "work/prod", "old");
        let plan = service
            .plan_archive("prod", &SshConfig::default())
            .unwrap();
        service.archive(&plan).unwrap();
        write_key(&keys, "personal/prod", "other");

        // Only the active key matches; the archived copy is excluded.
        let plan = service.plan_archive("prod", &SshConfig::default()).unwrap();
        assert!(plan.private_path.ends_with("personal/prod"));
    }
}
