//! CLI command implementations for biu

use clap::{Parser, Subcommand};

use crate::config::CliConfig;
use crate::error::CliResult;

pub mod build;
pub mod diag;
pub mod probe;
pub mod resolve;
pub mod run;

/// biu - compile BIU spiking networks and read what the engine produces
#[derive(Parser, Debug)]
#[command(
    name = "biu",
    version,
    about = "Compile BIU spiking networks, run the engine, and read probes",
    long_about = "biu validates a TOML network description, resolves neuron parameter \
                  overrides, emits the engine's structural description and run \
                  configuration, runs the external engine, and reads probed layer \
                  outputs, including live tails of files still being written."
)]
pub struct BiuCli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a model and write its artifact directory
    #[command(alias = "compile")]
    Build(build::BuildCommand),

    /// Print effective per-neuron parameters
    Resolve(resolve::ResolveCommand),

    /// Run the external engine on a compiled artifact
    Run(run::RunCommand),

    /// List probes and read probed layer outputs
    Probe(probe::ProbeCommand),

    /// Show how a path resolves from the engine working directory
    Diag(diag::DiagCommand),
}

impl BiuCli {
    /// Execute the CLI command
    pub async fn execute(self) -> CliResult<()> {
        let config = CliConfig::resolve(self.config.as_deref())?;

        match self.command {
            Commands::Build(cmd) => cmd.execute().await,
            Commands::Resolve(cmd) => cmd.execute().await,
            Commands::Run(cmd) => cmd.execute(&config).await,
            Commands::Probe(cmd) => cmd.execute(&config).await,
            Commands::Diag(cmd) => cmd.execute(&config).await,
        }
    }
}
