pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};

/// Rotate, archive, and restore SSH keys without breaking your config.
#[derive(Parser, Debug)]
#[command(name = "keywarden", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Key root directory (default: ~/.ssh)
    #[arg(long, global = true, value_name = "DIR")]
    pub path: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rotate keys: generate a replacement, archive the old pair,
    /// and fix config and profile references
    Rotate {
        /// Key name(s) to rotate
        #[arg(required = true)]
        keys: Vec<String>,

        /// Key type for the replacement (ed25519, rsa, ecdsa);
        /// defaults to the existing key's type
        #[arg(long = "type", value_name = "TYPE")]
        key_type: Option<String>,

        /// Comment for the replacement; defaults to the existing comment
        #[arg(long)]
        comment: Option<String>,

        /// Show the full plan without touching anything
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompts
        #[arg(long)]
        force: bool,

        /// Skip the timestamped SSH config backup
        #[arg(long)]
        no_backup: bool,

        /// Skip the connectivity probes before and after rotation
        #[arg(long)]
        no_test: bool,

        /// Upload the new public key to these comma-separated targets
        #[arg(long, value_name = "TARGETS")]
        upload: Option<String>,
    },

    /// Move keys into the archive tree
    Archive {
        /// Key name(s) to archive
        #[arg(required = true)]
        keys: Vec<String>,

        /// Archive even when config hosts still reference the key
        #[arg(long)]
        force: bool,

        /// Show what would be archived without touching anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Restore keys from the archive tree
    Unarchive {
        /// Key name(s) to restore
        #[arg(required = true)]
        keys: Vec<String>,

        /// Overwrite an active key already at the destination
        #[arg(long)]
        force: bool,
    },

    /// List discovered keys and flag permission problems
    List,

    /// Manage connection profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Show rotation history
    Log {
        /// Filter by key name (substring match)
        #[arg(long)]
        key: Option<String>,
        /// Filter entries since this date (ISO 8601)
        #[arg(long)]
        since: Option<String>,
        /// Show last N entries
        #[arg(long)]
        last: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// Add a connection profile
    Add {
        /// Unique alias for the profile
        alias: String,
        /// Remote host name or address
        host: String,
        /// Remote user
        #[arg(long, default_value = "root")]
        user: String,
        /// Remote port
        #[arg(long, default_value_t = 22)]
        port: u16,
        /// Key name or path this profile connects with
        #[arg(long, value_name = "KEY")]
        identity: String,
        /// Link the profile to a managed key name
        #[arg(long, value_name = "NAME")]
        key: Option<String>,
    },
    /// List all profiles
    List,
    /// Show one profile
    Show {
        /// Alias to show
        alias: String,
    },
    /// Remove a profile
    Remove {
        /// Alias to remove
        alias: String,
    },
}
