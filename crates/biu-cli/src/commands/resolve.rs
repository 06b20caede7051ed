//! `biu resolve`: effective per-neuron parameters

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use serde_json::json;

use biu_compiler::{resolve_network, validate_network};
use biu_ir::Network;

use crate::error::{CliError, CliResult};

/// Print effective per-neuron parameters
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Model description (TOML)
    pub model: PathBuf,

    /// Only this layer
    #[arg(long)]
    pub layer: Option<usize>,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

fn cell<T: ToString>(v: Option<T>) -> String {
    v.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl ResolveCommand {
    pub async fn execute(self) -> CliResult<()> {
        let network = Network::load(&self.model)?;
        validate_network(&network)?;

        let resolved = resolve_network(&network);
        if let Some(l) = self.layer {
            if l >= resolved.len() {
                return Err(CliError::invalid_args(format!(
                    "layer {} does not exist (network has {})",
                    l,
                    resolved.len()
                )));
            }
        }
        let selected = resolved
            .iter()
            .filter(|r| self.layer.map_or(true, |l| l == r.layer_index));

        match self.format {
            OutputFormat::Table => {
                println!("layer\tneuron\tthreshold\tleak\trefractory");
                for layer in selected {
                    for (i, n) in layer.neurons.iter().enumerate() {
                        println!(
                            "{}\t{}\t{}\t{}\t{}",
                            layer.layer_index,
                            i,
                            cell(n.threshold),
                            cell(n.leak),
                            cell(n.refractory)
                        );
                    }
                }
            }
            OutputFormat::Json => {
                let layers: Vec<_> = selected
                    .map(|layer| json!({ "layer": layer.layer_index, "neurons": layer.neurons }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&layers).map_err(anyhow::Error::from)?);
            }
        }
        Ok(())
    }
}
