use std::path::{Path, PathBuf};

use biu_ir::{ProbeIndex, ProbeMetadata, RunConfig};
use biu_storage::{EnergyTables, LayerProbe, ProbeRegistry};
use once_cell::sync::OnceCell;

use crate::resolve::ResolvedLayer;
use crate::Result;

/// A compiled network on disk.
///
/// The probe registry and both energy tables are built on first access and
/// then shared read-only.
#[derive(Debug)]
pub struct CompiledArtifact {
    config_path: PathBuf,
    run_config: RunConfig,
    probe_index: ProbeIndex,
    resolved: Option<Vec<ResolvedLayer>>,
    registry: OnceCell<ProbeRegistry>,
    energy: EnergyTables,
}

impl CompiledArtifact {
    /// Wrap records that were just emitted
    pub fn new(config_path: PathBuf, run_config: RunConfig, probe_index: ProbeIndex) -> Self {
        let energy = EnergyTables::new(
            run_config.synapses_energy_table_path.clone(),
            run_config.neuron_energy_table_path.clone(),
        );
        Self {
            config_path,
            run_config,
            probe_index,
            resolved: None,
            registry: OnceCell::new(),
            energy,
        }
    }

    /// Attach the resolved layers the artifact was emitted from
    pub fn with_resolved(mut self, resolved: Vec<ResolvedLayer>) -> Self {
        self.resolved = Some(resolved);
        self
    }

    /// Re-open an artifact from its run-configuration record
    pub fn open(config_path: &Path) -> Result<Self> {
        let run_config = RunConfig::load(config_path)?;
        let probe_index = ProbeIndex::load_beside(config_path)?;
        Ok(Self::new(config_path.to_path_buf(), run_config, probe_index))
    }

    /// Run-configuration record path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Run-configuration record
    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    /// Engine output directory
    pub fn output_dir(&self) -> &Path {
        &self.run_config.output_directory
    }

    /// Resolved layers; only present on artifacts returned by `compile`
    pub fn resolved(&self) -> Option<&[ResolvedLayer]> {
        self.resolved.as_deref()
    }

    /// Probe registry over the engine output directory
    pub fn probes(&self) -> &ProbeRegistry {
        self.registry
            .get_or_init(|| ProbeRegistry::new(self.probe_index.clone(), self.output_dir()))
    }

    /// Registered probe names, sorted
    pub fn list_probes(&self) -> Vec<String> {
        self.probes().list()
    }

    /// Metadata of one probe
    pub fn probe_metadata(&self, name: &str) -> Result<&ProbeMetadata> {
        Ok(self.probes().metadata(name)?)
    }

    /// Reader for one probe
    pub fn get_probe(&self, name: &str) -> Result<LayerProbe> {
        Ok(self.probes().resolve(name)?)
    }

    /// Energy tables referenced by the run configuration
    pub fn energy(&self) -> &EnergyTables {
        &self.energy
    }
}
