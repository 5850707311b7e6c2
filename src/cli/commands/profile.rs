use crate::adapters::profile_stores::json_profile_store::JsonProfileStore;
use crate::cli::ProfileAction;
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::{KeywardenError, Result};
use crate::core::models::profile::ConnectionProfile;
use crate::core::traits::profile_store::ProfileStore;

/// Execute the `keywarden profile` command.
pub fn execute(action: &ProfileAction) -> Result<()> {
    let state_dir = crate::cli::context::state_dir();
    let config = AppConfig::load_or_default(&state_dir)?;
    let store = JsonProfileStore::new(state_dir.join(&config.keywarden.profiles_file));

    match action {
        ProfileAction::Add {
            alias,
            host,
            user,
            port,
            identity,
            key,
        } => execute_add(&store, alias, host, user, *port, identity, key.as_deref()),
        ProfileAction::List => execute_list(&store),
        ProfileAction::Show { alias } => execute_show(&store, alias),
        ProfileAction::Remove { alias } => execute_remove(&store, alias),
    }
}

fn execute_add(
    store: &JsonProfileStore,
    alias: &str,
    host: &str,
    user: &str,
    port: u16,
    identity: &str,
    key: Option<&str>,
) -> Result<()> {
    let profile = ConnectionProfile {
        alias: alias.to_string(),
        host: host.to_string(),
        user: user.to_string(),
        port,
        identity_file: identity.to_string(),
        key_name: key.map(str::to_string),
    };

    store.add(&profile)?;
    output::success(&format!("Added profile: {profile}"));
    Ok(())
}

fn execute_list(store: &JsonProfileStore) -> Result<()> {
    let profiles = store.list()?;

    if profiles.is_empty() {
        output::warning("No profiles configured.");
        println!("  Run 'keywarden profile add <alias> <host> --identity <key>' to add one.");
        return Ok(());
    }

    output::header(&format!("Connection profiles ({})", profiles.len()));
    for profile in &profiles {
        println!("  • {profile}");
    }

    Ok(())
}

fn execute_show(store: &JsonProfileStore, alias: &str) -> Result<()> {
    let profile = store
        .get(alias)?
        .ok_or_else(|| KeywardenError::ProfileNotFound {
            alias: alias.to_string(),
        })?;

    output::header(&profile.alias);
    println!("  host:     {}", profile.host);
    println!("  user:     {}", profile.user);
    println!("  port:     {}", profile.port);
    println!("  identity: {}", profile.identity_file);
    if let Some(key_name) = &profile.key_name {
        println!("  key:      {key_name}");
    }

    Ok(())
}

fn execute_remove(store: &JsonProfileStore, alias: &str) -> Result<()> {
    store.remove(alias)?;
    output::success(&format!("Removed profile: {alias}"));
    Ok(())
}
