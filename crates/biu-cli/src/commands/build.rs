//! `biu build`: model TOML to artifact directory

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use biu_compiler::{compile, EmitOptions};
use biu_ir::{stimulus, Network};

use crate::error::CliResult;

/// Validate a model and write its artifact directory
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Model description (TOML)
    pub model: PathBuf,

    /// Artifact directory
    pub out_dir: PathBuf,

    /// Existing stimulus file referenced by the run configuration
    #[arg(long, conflicts_with = "inline_input", required_unless_present = "inline_input")]
    pub input: Option<PathBuf>,

    /// Stimulus file copied into the artifact as input.txt
    #[arg(long)]
    pub inline_input: Option<PathBuf>,

    /// Also emit supervisor.xml
    #[arg(long)]
    pub supervisor: bool,

    /// Per-synapse energy table (CSV)
    #[arg(long)]
    pub syn_energy: Option<PathBuf>,

    /// Per-neuron energy table (CSV)
    #[arg(long)]
    pub neu_energy: Option<PathBuf>,
}

impl BuildCommand {
    pub async fn execute(self) -> CliResult<()> {
        info!("Loading model {:?}", self.model);
        let network = Network::load(&self.model)?;

        let mut options = EmitOptions::default().with_energy_tables(self.syn_energy, self.neu_energy);
        options.supervisor = self.supervisor;
        options.input_file = self.input;
        if let Some(path) = &self.inline_input {
            let text = std::fs::read_to_string(path)?;
            options.inline_input = Some(stimulus::parse_rows(&text)?);
        }

        let artifact = compile(&network, &self.out_dir, &options)?;
        info!("Wrote {} probe(s)", artifact.list_probes().len());
        println!("{}", artifact.config_path().display());
        Ok(())
    }
}
