mod adapters;
mod cli;
mod config;
mod core;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let args = Cli::parse();

    cli::context::init(args.path.as_deref());

    let result = match &args.command {
        Commands::Rotate {
            keys,
            key_type,
            comment,
            dry_run,
            force,
            no_backup,
            no_test,
            upload,
        } => cli::commands::rotate::execute(cli::commands::rotate::RotateArgs {
            keys,
            key_type: key_type.as_deref(),
            comment: comment.as_deref(),
            dry_run: *dry_run,
            force: *force,
            no_backup: *no_backup,
            no_test: *no_test,
            upload: upload.as_deref(),
            verbose: args.verbose,
        }),
        Commands::Archive {
            keys,
            force,
            dry_run,
        } => cli::commands::archive::execute(keys, *force, *dry_run),
        Commands::Unarchive { keys, force } => cli::commands::unarchive::execute(keys, *force),
        Commands::List => cli::commands::list::execute(args.verbose),
        Commands::Profile { action } => cli::commands::profile::execute(action),
        Commands::Log { key, since, last } => {
            cli::commands::log::execute(key.as_deref(), since.as_deref(), *last)
        }
    };

    if let Err(e) = result {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}
