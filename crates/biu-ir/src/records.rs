//! JSON records written next to the structural description.
//!
//! `config.json` tells the engine where everything is; `probes.json` maps probe
//! names to layers for the reader. Both are pretty-printed with a trailing
//! newline so that emission is byte-stable.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// File name of the run-configuration record
pub const RUN_CONFIG_FILE: &str = "config.json";

/// File name of the probe-index record (co-located with the run configuration)
pub const PROBE_INDEX_FILE: &str = "probes.json";

/// Run-configuration record consumed by the engine. All paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory the engine writes its per-neuron output files into
    pub output_directory: PathBuf,
    /// Structural description
    pub xml_config_path: PathBuf,
    /// Secondary defaults file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sup_xml_config_path: Option<PathBuf>,
    /// Stimulus input
    pub data_input_file: PathBuf,
    /// Per-synapse energy table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synapses_energy_table_path: Option<PathBuf>,
    /// Per-neuron energy table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neuron_energy_table_path: Option<PathBuf>,
}

impl RunConfig {
    /// Pretty JSON text with trailing newline
    pub fn to_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Read a record from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// One probe: name bound to a layer position and its neuron count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeMetadata {
    /// Probe name
    pub name: String,
    /// Layer position (0-based)
    pub layer_index: usize,
    /// Neuron count of that layer
    pub layer_size: usize,
}

/// Probe-index record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeIndex {
    /// Probes in layer order
    #[serde(default)]
    pub probes: Vec<ProbeMetadata>,
}

impl ProbeIndex {
    /// True when no probe is registered
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Pretty JSON text with trailing newline
    pub fn to_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Load the index co-located with `config_path`. A missing file means no
    /// probes are registered.
    pub fn load_beside(config_path: &Path) -> Result<Self> {
        let path = config_path
            .parent()
            .map(|dir| dir.join(PROBE_INDEX_FILE))
            .unwrap_or_else(|| PathBuf::from(PROBE_INDEX_FILE));
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_paths_are_omitted() {
        let cfg = RunConfig {
            output_directory: "/a/output".into(),
            xml_config_path: "/a/biu.xml".into(),
            sup_xml_config_path: None,
            data_input_file: "/a/input.txt".into(),
            synapses_energy_table_path: None,
            neuron_energy_table_path: Some("/t/neu.csv".into()),
        };
        let json = cfg.to_json().unwrap();
        assert!(!json.contains("sup_xml_config_path"));
        assert!(!json.contains("synapses_energy_table_path"));
        assert!(json.contains("\"neuron_energy_table_path\": \"/t/neu.csv\""));
        assert!(json.ends_with("}\n"));
    }

    #[test]
    fn missing_probe_index_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let idx = ProbeIndex::load_beside(&dir.path().join(RUN_CONFIG_FILE)).unwrap();
        assert!(idx.is_empty());
    }
}
