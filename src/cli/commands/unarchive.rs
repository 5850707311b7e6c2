use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::{KeywardenError, Result};
use crate::core::services::archive_service::ArchiveService;

/// Execute the `keywarden unarchive` command.
///
/// Restores keys from the archive tree to their original active paths.
/// An existing file at the destination is a conflict unless `--force`.
pub fn execute(keys: &[String], force: bool) -> Result<()> {
    let keys_root = crate::cli::context::keys_root();
    let state_dir = crate::cli::context::state_dir();
    let config = AppConfig::load_or_default(&state_dir)?;

    let service = ArchiveService::new(keys_root.clone(), config.archive_root(&keys_root));

    let mut failed = 0;
    for key in keys {
        match restore_one(&service, key, force) {
            Ok(()) => {}
            Err(e) => {
                output::error(&format!("{key}: {e}"));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(KeywardenError::BatchFailed {
            failed,
            total: keys.len(),
        });
    }
    Ok(())
}

fn restore_one(service: &ArchiveService, key: &str, force: bool) -> Result<()> {
    let plan = service.plan_unarchive(key)?;
    service.unarchive(&plan, force)?;

    output::success(&format!(
        "Restored {} → {}",
        plan.archive_private.display(),
        plan.restore_private.display()
    ));
    Ok(())
}
