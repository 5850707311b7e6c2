use crate::adapters::logs::rotation_logger::FileRotationLog;
use crate::adapters::profile_stores::json_profile_store::JsonProfileStore;
use crate::adapters::ssh_config::config_store::SshConfigStore;
use crate::adapters::tools::openssh::OpensshTools;
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::{KeywardenError, Result};
use crate::core::models::key_pair::KeyType;
use crate::core::models::rotation::RotationSummary;
use crate::core::services::archive_service::ArchiveService;
use crate::core::services::rotation_service::{RotateOptions, RotationService};

/// Flags and inputs for the `keywarden rotate` command.
pub struct RotateArgs<'a> {
    pub keys: &'a [String],
    pub key_type: Option<&'a str>,
    pub comment: Option<&'a str>,
    pub dry_run: bool,
    pub force: bool,
    pub no_backup: bool,
    pub no_test: bool,
    pub upload: Option<&'a str>,
    pub verbose: bool,
}

/// Execute the `keywarden rotate` command.
///
/// Wires the adapters into a `RotationService`, confirms config
/// rewrites unless forced, runs the batch, and prints the summary.
pub fn execute(args: RotateArgs) -> Result<()> {
    let keys_root = crate::cli::context::keys_root();
    let state_dir = crate::cli::context::state_dir();
    let config = AppConfig::load_or_default(&state_dir)?;

    let opts = RotateOptions {
        key_type: args.key_type.map(parse_key_type).transpose()?,
        fallback_type: KeyType::parse(&config.rotate.default_type),
        comment: args.comment.map(str::to_string),
        dry_run: args.dry_run,
        no_backup: args.no_backup,
        no_test: args.no_test,
        upload: split_targets(args.upload),
    };

    let service = RotationService {
        tools: OpensshTools::from_config(&config.tools),
        profiles: JsonProfileStore::new(state_dir.join(&config.keywarden.profiles_file)),
        log: FileRotationLog::new(state_dir.join(&config.keywarden.log_file)),
        config_store: SshConfigStore::new(
            config.ssh_config_path(&keys_root),
            state_dir.join("backups"),
        ),
        archive: ArchiveService::new(keys_root.clone(), config.archive_root(&keys_root)),
    };

    if !args.dry_run && !service.tools.is_available() {
        output::warning(&format!(
            "{} was not found; key generation will fail",
            config.tools.ssh_keygen
        ));
    }

    if !args.force && !args.dry_run && !confirm_config_rewrites(&service, args.keys, &opts)? {
        output::warning("Aborted, nothing was changed.");
        return Ok(());
    }

    let summary = if args.dry_run {
        service.rotate_batch(args.keys, &opts)?
    } else {
        let sp = output::spinner(&format!("Rotating {} key(s)...", args.keys.len()));
        let summary = service.rotate_batch(args.keys, &opts);
        sp.finish_and_clear();
        summary?
    };

    if args.dry_run {
        print_plans(&summary);
    } else {
        print_results(&summary, args.verbose);
    }

    let failed = summary.failed();
    if failed > 0 {
        let total = summary.results.len() + summary.plans.len();
        return Err(KeywardenError::BatchFailed { failed, total });
    }
    Ok(())
}

/// Show which config hosts the batch would rewrite and ask once.
/// Keys that fail to plan are left for the batch run to report.
fn confirm_config_rewrites<T, P, L>(
    service: &RotationService<T, P, L>,
    keys: &[String],
    opts: &RotateOptions,
) -> Result<bool>
where
    T: crate::core::traits::key_tools::KeyTooling,
    P: crate::core::traits::profile_store::ProfileStore,
    L: crate::core::traits::rotation_log::RotationLog,
{
    let mut affected = Vec::new();
    for key in keys {
        if let Ok(plan) = service.plan_rotation(key, opts)
            && !plan.affected_hosts.is_empty()
        {
            affected.push((key, plan.affected_hosts));
        }
    }

    if affected.is_empty() {
        return Ok(true);
    }

    output::header("Rotation will rewrite SSH config entries");
    for (key, hosts) in &affected {
        output::warning(&format!("{key} is used by: {}", hosts.join(", ")));
    }
    Ok(output::confirm("Rewrite these entries and continue?")?)
}

fn parse_key_type(s: &str) -> Result<KeyType> {
    match KeyType::parse(s) {
        KeyType::Other => Err(KeywardenError::InvalidConfig {
            detail: format!("Unknown key type: '{s}'. Use 'ed25519', 'rsa', or 'ecdsa'."),
        }),
        t => Ok(t),
    }
}

fn split_targets(upload: Option<&str>) -> Vec<String> {
    upload
        .map(|s| {
            s.split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn print_plans(summary: &RotationSummary) {
    output::header("Dry run — no changes were made");

    for plan in &summary.plans {
        output::success(&format!("would rotate {} ({})", plan.key, plan.new_type));
        output::detail(&format!(
            "archive {} → {}",
            plan.private_path.display(),
            plan.archive_to.display()
        ));
        if let Some(comment) = &plan.new_comment {
            output::detail(&format!("comment: {comment}"));
        }
        if plan.affected_hosts.is_empty() {
            output::detail("no config hosts reference this key");
        } else {
            output::detail(&format!("config hosts: {}", plan.affected_hosts.join(", ")));
        }
        if !plan.affected_profiles.is_empty() {
            output::detail(&format!("profiles: {}", plan.affected_profiles.join(", ")));
        }
    }

    for result in &summary.results {
        output::error(&format!(
            "{}: {}",
            result.key,
            result.failure.as_deref().unwrap_or("failed")
        ));
    }
}

fn print_results(summary: &RotationSummary, verbose: bool) {
    for result in &summary.results {
        if result.succeeded {
            output::success(&format!(
                "Rotated {} ({} steps)",
                result.key,
                result.steps_completed.len()
            ));
            if verbose {
                for step in &result.steps_completed {
                    output::detail(&step.to_string());
                }
            }
            for warning in &result.warnings {
                output::warning(&format!("{}: {warning}", result.key));
            }
        } else {
            output::error(&format!(
                "{}: {}",
                result.key,
                result.failure.as_deref().unwrap_or("failed")
            ));
        }
    }

    output::header(&format!(
        "{} rotated, {} with warnings, {} failed",
        summary.clean(),
        summary.with_warnings(),
        summary.failed()
    ));
}
