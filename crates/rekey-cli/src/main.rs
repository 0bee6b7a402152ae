//! Rekey CLI: the `rekey` command.

mod cli;
mod commands;
mod config;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    support::init_tracing(cli.verbose, cli.quiet);

    // Stores are dropped (and their lock files released) before this returns.
    let result = match cli.command {
        Commands::ChangeNamespace {
            input,
            input_overrides,
            reference,
            reference_overrides,
            old_namespace,
            new_namespace,
            error_logging,
            same_as,
            seed,
            max_attempts,
            json,
        } => commands::change_namespace::run(commands::change_namespace::Args {
            input,
            input_overrides,
            reference,
            reference_overrides,
            old_namespace,
            new_namespace,
            error_logging,
            same_as,
            seed,
            max_attempts,
            json,
        }),

        Commands::SplitProperty {
            input,
            input_overrides,
            regex,
            old_predicate,
            new_predicate,
            trim,
            json,
        } => commands::split_property::run(commands::split_property::Args {
            input,
            input_overrides,
            regex,
            old_predicate,
            new_predicate,
            trim,
            json,
        }),

        Commands::Stats {
            input,
            input_overrides,
            json,
        } => commands::stats::run(input, input_overrides, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
