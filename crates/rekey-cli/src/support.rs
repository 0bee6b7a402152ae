use crate::config::{ConfigError, StoreConfig};
use rekey_graph::StoreError;
use rekey_qualify::{MigrationError, SplitError, ValidationError};
use tracing_subscriber::EnvFilter;

/// Everything a subcommand can fail with; printed once by `main`.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to render JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn require_config(
    role: &'static str,
    config: Option<&str>,
    overrides: &[String],
) -> Result<StoreConfig, CliError> {
    StoreConfig::resolve(config, overrides)?
        .ok_or(CliError::Validation(ValidationError::MissingStore { role }))
}

pub fn print_json(payload: &serde_json::Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
