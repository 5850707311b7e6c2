use crate::adapters::ssh_config::config_store::SshConfigStore;
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::{KeywardenError, Result};
use crate::core::models::ssh_config::SshConfig;
use crate::core::services::archive_service::ArchiveService;

/// Execute the `keywarden archive` command.
///
/// Keys referenced by config hosts are only archived after an explicit
/// confirmation (or `--force`); declining leaves everything untouched.
pub fn execute(keys: &[String], force: bool, dry_run: bool) -> Result<()> {
    let keys_root = crate::cli::context::keys_root();
    let state_dir = crate::cli::context::state_dir();
    let config = AppConfig::load_or_default(&state_dir)?;

    let config_store = SshConfigStore::new(
        config.ssh_config_path(&keys_root),
        state_dir.join("backups"),
    );
    let ssh_config = config_store.load()?;
    let service = ArchiveService::new(keys_root.clone(), config.archive_root(&keys_root));

    let mut failed = 0;
    for key in keys {
        if let Err(e) = archive_one(&service, &ssh_config, key, force, dry_run) {
            output::error(&format!("{key}: {e}"));
            failed += 1;
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

fn archive_one(
    service: &ArchiveService,
    ssh_config: &SshConfig,
    key: &str,
    force: bool,
    dry_run: bool,
) -> Result<()> {
    let plan = service.plan_archive(key, ssh_config)?;

    if dry_run {
        output::success(&format!(
            "would archive {} → {}",
            plan.private_path.display(),
            plan.archive_private.display()
        ));
        if !plan.affected_hosts.is_empty() {
            output::warning(&format!(
                "still referenced by: {}",
                plan.affected_hosts.join(", ")
            ));
        }
        return Ok(());
    }

    if !plan.affected_hosts.is_empty() && !force {
        output::warning(&format!(
            "{} is still referenced by host(s): {}",
            plan.name,
            plan.affected_hosts.join(", ")
        ));
        if !output::confirm("Archive it anyway?")? {
            output::warning(&format!("Skipped {}.", plan.name));
            return Ok(());
        }
    }

    service.archive(&plan)?;
    output::success(&format!(
        "Archived {} → {}",
        plan.private_path.display(),
        plan.archive_private.display()
    ));
    Ok(())
}
