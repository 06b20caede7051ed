//! # biu - command line for BIU spiking networks
//!
//! Compiles TOML network descriptions into the engine's artifact layout,
//! runs the external engine, and reads probed layer outputs.

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod error;
mod runner;

use commands::BiuCli;
use error::CliResult;

#[tokio::main]
async fn main() -> CliResult<()> {
    // Parse CLI arguments
    let cli = BiuCli::parse();

    // Initialize logging with environment variable support; --verbose wins
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute the command
    if let Err(err) = cli.execute().await {
        error!("Command failed: {}", err);
        std::process::exit(1);
    }

    Ok(())
}
