use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::services::scanner::KeyScanner;

/// Execute the `keywarden list` command.
///
/// Shows every discovered key pair under the key root, the archived
/// keys, and flags private files with loose permissions.
pub fn execute(verbose: bool) -> Result<()> {
    let keys_root = crate::cli::context::keys_root();
    let state_dir = crate::cli::context::state_dir();
    let config = AppConfig::load_or_default(&state_dir)?;
    let archive_root = config.archive_root(&keys_root);

    let inventory = KeyScanner::new(keys_root.clone())
        .skip(archive_root.clone())
        .scan()?;

    output::header(&format!("Keys under {}", keys_root.display()));

    if inventory.keys.is_empty() {
        output::warning("No keys found.");
    }

    for key in &inventory.keys {
        let rel = key
            .private_path
            .strip_prefix(&keys_root)
            .unwrap_or(&key.private_path);

        let mut line = format!("{} ({})", rel.display(), key.key_type);
        if let Some(comment) = &key.comment {
            line.push_str(&format!("  # {comment}"));
        }
        output::success(&line);

        if !key.permissions_ok() {
            output::warning(&format!(
                "{}: permissions are {:03o}, private keys should be 600",
                rel.display(),
                key.permissions
            ));
        }
        if key.public_path.is_none() && verbose {
            output::detail("no .pub sibling");
        }
    }

    for warning in &inventory.warnings {
        output::warning(warning);
    }

    let archived = KeyScanner::new(archive_root.clone()).scan()?;
    if !archived.keys.is_empty() {
        output::header(&format!("Archived under {}", archive_root.display()));
        for key in &archived.keys {
            let rel = key
                .private_path
                .strip_prefix(&archive_root)
                .unwrap_or(&key.private_path);
            output::detail(&format!("{} ({})", rel.display(), key.key_type));
        }
    }

    Ok(())
}
