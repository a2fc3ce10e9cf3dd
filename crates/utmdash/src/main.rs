//! Main entry point for utmdash.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use utmdash::{execute, Cli};
use utmdash_common::init_logging;
use utmdash_config::ConfigLoader;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid command line overrides")?;

    let _guard = init_logging(&config.logging.to_logging_config()).context("Failed to initialize logging")?;
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }
    debug!("Using API at {}", config.api.url);

    if let Err(e) = execute(cli.command, &config).await {
        error!("Command failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
