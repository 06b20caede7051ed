//! Artifact emission.
//!
//! Layout of a compiled artifact directory:
//!
//! ```text
//! <out>/biu.xml          structural description
//! <out>/supervisor.xml   secondary defaults (optional)
//! <out>/input.txt        inline stimulus (optional)
//! <out>/config.json      run configuration, absolute paths
//! <out>/probes.json      probe index (only when a layer declares a probe)
//! <out>/output/          engine output directory
//! ```
//!
//! Nothing is written unless the model validates.

use std::path::{Path, PathBuf};

use biu_ir::stimulus::render_rows;
use biu_ir::{
    defaults_document, network_document, DsMode, Network, NetworkDefaults, ProbeIndex, ProbeMetadata,
    RunConfig, PROBE_INDEX_FILE, RUN_CONFIG_FILE,
};
use log::{debug, info};

use crate::artifact::CompiledArtifact;
use crate::resolve::resolve_network;
use crate::validate::{check_stimulus, Validator};
use crate::{CompilerError, Result};

/// Structural description file name
pub const NETWORK_FILE: &str = "biu.xml";
/// Secondary defaults file name
pub const SUPERVISOR_FILE: &str = "supervisor.xml";
/// Inline stimulus file name
pub const STIMULUS_FILE: &str = "input.txt";
/// Engine output directory name
pub const OUTPUT_DIR: &str = "output";

/// What to emit besides the structural description
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmitOptions {
    /// Existing stimulus file to reference
    pub input_file: Option<PathBuf>,
    /// Stimulus rows to write as `input.txt`
    pub inline_input: Option<Vec<Vec<f64>>>,
    /// Also emit the secondary defaults file
    pub supervisor: bool,
    /// Per-synapse energy table
    pub synapse_energy: Option<PathBuf>,
    /// Per-neuron energy table
    pub neuron_energy: Option<PathBuf>,
}

impl EmitOptions {
    /// Reference an existing stimulus file
    pub fn with_input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_file = Some(path.into());
        self
    }

    /// Write the given stimulus rows
    pub fn with_inline_input(mut self, rows: Vec<Vec<f64>>) -> Self {
        self.inline_input = Some(rows);
        self
    }

    /// Emit the secondary defaults file
    pub fn with_supervisor(mut self) -> Self {
        self.supervisor = true;
        self
    }

    /// Reference energy tables
    pub fn with_energy_tables(mut self, synapse: Option<PathBuf>, neuron: Option<PathBuf>) -> Self {
        self.synapse_energy = synapse;
        self.neuron_energy = neuron;
        self
    }
}

enum StimulusSource<'a> {
    File(&'a Path),
    Inline(&'a [Vec<f64>]),
}

/// In-memory emission result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledXml {
    /// Structural description
    pub network: String,
    /// Secondary defaults, when requested
    pub supervisor: Option<String>,
}

/// Validate and print the XML documents without touching disk
pub fn compile_to_xml(network: &Network, supervisor: bool) -> Result<CompiledXml> {
    Validator::standard().run(network).into_result()?;
    render(network, supervisor)
}

fn render(network: &Network, supervisor: bool) -> Result<CompiledXml> {
    let mode = DsMode::from_declared(network.defaults.ds_mode.as_deref())
        .ok_or_else(|| CompilerError::Message("unresolvable DSMode after validation".into()))?;
    Ok(CompiledXml {
        network: network_document(network, mode).to_document(),
        supervisor: supervisor.then(|| defaults_document(&NetworkDefaults::supervisor()).to_document()),
    })
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|e| CompilerError::write(path, e))?;
    debug!("wrote {:?} ({} bytes)", path, contents.len());
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

/// Probe index in layer order
pub fn probe_index(network: &Network) -> ProbeIndex {
    ProbeIndex {
        probes: network
            .layers
            .iter()
            .enumerate()
            .filter_map(|(i, l)| {
                l.probe.as_ref().map(|name| ProbeMetadata {
                    name: name.clone(),
                    layer_index: i,
                    layer_size: l.size,
                })
            })
            .collect(),
    }
}

/// Validate `network` and write its artifact into `out_dir`
pub fn compile(network: &Network, out_dir: &Path, options: &EmitOptions) -> Result<CompiledArtifact> {
    let mut report = Validator::standard().run(network);
    if let Some(rows) = &options.inline_input {
        check_stimulus(network, rows, &mut report);
    }
    report.into_result()?;

    let source = match (&options.input_file, &options.inline_input) {
        (Some(file), None) => StimulusSource::File(file),
        (None, Some(rows)) => StimulusSource::Inline(rows),
        (Some(_), Some(_)) => {
            return Err(CompilerError::Stimulus("give either an input file or inline input, not both".into()))
        }
        (None, None) => return Err(CompilerError::Stimulus("no stimulus input given".into())),
    };

    let xml = render(network, options.supervisor)?;

    std::fs::create_dir_all(out_dir).map_err(|e| CompilerError::write(out_dir, e))?;
    let root = std::fs::canonicalize(out_dir)?;
    let output_dir = root.join(OUTPUT_DIR);
    std::fs::create_dir_all(&output_dir).map_err(|e| CompilerError::write(&output_dir, e))?;

    let network_path = root.join(NETWORK_FILE);
    write(&network_path, &xml.network)?;

    let sup_path = match &xml.supervisor {
        Some(text) => {
            let p = root.join(SUPERVISOR_FILE);
            write(&p, text)?;
            Some(p)
        }
        None => {
            remove_stale(&root.join(SUPERVISOR_FILE))?;
            None
        }
    };

    let data_input_file = match source {
        StimulusSource::File(file) => absolute(file)?,
        StimulusSource::Inline(rows) => {
            let p = root.join(STIMULUS_FILE);
            write(&p, &render_rows(rows))?;
            p
        }
    };
    let stale_input = root.join(STIMULUS_FILE);
    // an input file that is the artifact's own input.txt is kept
    if !std::fs::canonicalize(&data_input_file).is_ok_and(|p| p == stale_input) {
        remove_stale(&stale_input)?;
    }

    let run_config = RunConfig {
        output_directory: output_dir,
        xml_config_path: network_path,
        sup_xml_config_path: sup_path,
        data_input_file,
        synapses_energy_table_path: options.synapse_energy.as_deref().map(absolute).transpose()?,
        neuron_energy_table_path: options.neuron_energy.as_deref().map(absolute).transpose()?,
    };
    let config_path = root.join(RUN_CONFIG_FILE);
    write(&config_path, &run_config.to_json()?)?;

    let index = probe_index(network);
    let index_path = root.join(PROBE_INDEX_FILE);
    if index.is_empty() {
        remove_stale(&index_path)?;
    } else {
        write(&index_path, &index.to_json()?)?;
    }

    info!(
        "compiled {} layer(s), {} probe(s) into {:?}",
        network.layers.len(),
        index.probes.len(),
        root
    );
    Ok(CompiledArtifact::new(config_path, run_config, index).with_resolved(resolve_network(network)))
}

/// Drop a file an earlier compile left behind in the artifact directory
fn remove_stale(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("removed stale {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CompilerError::write(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biu_ir::{Layer, NeuronParams, SynapseMatrix};

    fn network() -> Network {
        Network::new(NetworkDefaults {
            threshold: Some(0.9),
            refractory: Some(14),
            ds_bit_width: Some(8),
            ds_clock_mhz: Some(50.0),
            ..NetworkDefaults::default()
        })
        .with_layer(Layer::new(1, SynapseMatrix::from_rows(vec![vec![1.0]])))
    }

    #[test]
    fn unset_mode_is_emitted_as_threshold_mode() {
        let xml = compile_to_xml(&network(), false).unwrap();
        assert!(xml.network.contains("<DSMode>ThresholdMode</DSMode>"));
        assert!(!xml.network.contains("NeuronRange"));
        assert!(!xml.network.contains("<Neuron "));
        assert!(xml.supervisor.is_none());
    }

    #[test]
    fn supervisor_has_fixed_values() {
        let xml = compile_to_xml(&network(), true).unwrap();
        let sup = xml.supervisor.unwrap();
        assert!(sup.contains("<fclk>10000000</fclk>"));
        assert!(sup.contains("<Cu>4e-15</Cu>"));
        assert!(!sup.contains("DSMode"));
    }

    #[test]
    fn invalid_model_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("art");
        let net = network().with_layer(
            Layer::new(2, SynapseMatrix::from_rows(vec![vec![0.0], vec![0.0]]))
                .with_neuron(3, NeuronParams::threshold(0.1)),
        );
        let err = compile(&net, &out, &EmitOptions::default().with_inline_input(vec![vec![1.0]])).unwrap_err();
        assert!(matches!(err, CompilerError::Invalid(_)));
        assert!(!out.exists());
    }

    #[test]
    fn stimulus_options_are_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let both = EmitOptions::default().with_input_file("in.txt").with_inline_input(vec![vec![0.0]]);
        assert!(matches!(compile(&network(), dir.path(), &both), Err(CompilerError::Stimulus(_))));
        assert!(matches!(
            compile(&network(), dir.path(), &EmitOptions::default()),
            Err(CompilerError::Stimulus(_))
        ));
    }

    #[test]
    fn inline_stimulus_width_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let opts = EmitOptions::default().with_inline_input(vec![vec![1.0, 0.0]]);
        let err = compile(&network(), dir.path(), &opts).unwrap_err();
        assert_eq!(err.violations().map(<[_]>::len), Some(1));
    }

    #[test]
    fn probe_index_is_in_layer_order() {
        let net = network()
            .with_layer(Layer::new(1, SynapseMatrix::from_rows(vec![vec![1.0]])).with_probe("z"))
            .with_layer(Layer::new(1, SynapseMatrix::from_rows(vec![vec![1.0]])).with_probe("a"));
        let idx = probe_index(&net);
        let names: Vec<_> = idx.probes.iter().map(|p| (p.name.as_str(), p.layer_index)).collect();
        assert_eq!(names, vec![("z", 1), ("a", 2)]);
    }
}
