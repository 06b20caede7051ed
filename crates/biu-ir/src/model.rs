//! Passive model description for a layered BIU network.
//!
//! These are plain values: constructed once by the caller (directly or from
//! TOML), then handed to the compiler. Fields that the engine may leave at its
//! own default are `Option`s; `None` means "not declared", never a sentinel.

use std::fmt::{Display, Formatter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Digital-interface mode of a BIU network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DsMode {
    /// Threshold-crossing interface (the default)
    ThresholdMode,
    /// Rate-coded interface
    FrequencyMode,
}

impl DsMode {
    /// Tag text used by the engine
    pub fn as_str(self) -> &'static str {
        match self {
            DsMode::ThresholdMode => "ThresholdMode",
            DsMode::FrequencyMode => "FrequencyMode",
        }
    }

    /// Interpret a declared mode. Absent or empty resolves to `ThresholdMode`;
    /// anything else unrecognised yields `None`.
    pub fn from_declared(declared: Option<&str>) -> Option<DsMode> {
        match declared.map(str::trim) {
            None | Some("") | Some("ThresholdMode") => Some(DsMode::ThresholdMode),
            Some("FrequencyMode") => Some(DsMode::FrequencyMode),
            Some(_) => None,
        }
    }
}

impl Display for DsMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global fallback parameters, emitted under `<BIUNetwork>`.
///
/// `threshold`, `leak` and `refractory` are the overridable per-neuron
/// parameters; the rest are analog and digital-interface settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkDefaults {
    /// Threshold voltage (VTh)
    #[serde(default, alias = "VTh")]
    pub threshold: Option<f64>,
    /// Leak resistance (RLeak)
    #[serde(default, alias = "RLeak")]
    pub leak: Option<f64>,
    /// Refractory period in simulation steps
    #[serde(default)]
    pub refractory: Option<u32>,
    /// Supply voltage (VDD)
    #[serde(default, alias = "VDD")]
    pub vdd: Option<f64>,
    /// Neuron capacitance (Cn)
    #[serde(default, alias = "Cn")]
    pub cn: Option<f64>,
    /// Unit capacitance (Cu)
    #[serde(default, alias = "Cu")]
    pub cu: Option<f64>,
    /// Clock frequency in Hz
    #[serde(default)]
    pub fclk: Option<f64>,
    /// Digital-interface bit width, 4 or 8
    #[serde(default, alias = "DSBitWidth")]
    pub ds_bit_width: Option<u32>,
    /// Digital-interface clock in MHz, > 0
    #[serde(default, alias = "DSClockMHz")]
    pub ds_clock_mhz: Option<f64>,
    /// Digital-interface mode as declared ("ThresholdMode", "FrequencyMode" or empty)
    #[serde(default, alias = "DSMode")]
    pub ds_mode: Option<String>,
}

impl NetworkDefaults {
    /// The fixed secondary ("supervisor") parameter set. Not user-configurable.
    pub fn supervisor() -> Self {
        Self {
            fclk: Some(1e7),
            leak: Some(1e6),
            vdd: Some(1.2),
            cn: Some(1e-12),
            cu: Some(4e-15),
            ..Self::default()
        }
    }
}

/// Sparse set of overridable neuron parameters. Unset fields leave whatever
/// was resolved before untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NeuronParams {
    /// Threshold voltage
    #[serde(default, alias = "VTh")]
    pub threshold: Option<f64>,
    /// Leak resistance
    #[serde(default, alias = "RLeak")]
    pub leak: Option<f64>,
    /// Refractory steps
    #[serde(default)]
    pub refractory: Option<u32>,
}

impl NeuronParams {
    /// Set only the threshold
    pub fn threshold(v: f64) -> Self {
        Self { threshold: Some(v), ..Self::default() }
    }

    /// Builder: set leak
    pub fn with_leak(mut self, v: f64) -> Self {
        self.leak = Some(v);
        self
    }

    /// Builder: set refractory
    pub fn with_refractory(mut self, v: u32) -> Self {
        self.refractory = Some(v);
        self
    }

    /// True when no parameter is set
    pub fn is_empty(&self) -> bool {
        self.threshold.is_none() && self.leak.is_none() && self.refractory.is_none()
    }
}

/// Incoming weights for one layer: `rows` x `cols` declared, `weights` literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynapseMatrix {
    /// Declared row count (must equal layer size)
    pub rows: usize,
    /// Declared column count
    pub cols: usize,
    /// Literal grid
    pub weights: Vec<Vec<f64>>,
}

impl SynapseMatrix {
    /// Build a matrix whose declared shape is taken from the grid itself
    pub fn from_rows(weights: Vec<Vec<f64>>) -> Self {
        let rows = weights.len();
        let cols = weights.first().map_or(0, Vec::len);
        Self { rows, cols, weights }
    }

    /// Build a matrix with an explicit declared shape
    pub fn with_shape(rows: usize, cols: usize, weights: Vec<Vec<f64>>) -> Self {
        Self { rows, cols, weights }
    }

    /// Exactly `rows` rows of exactly `cols` values each
    pub fn shape_matches(&self) -> bool {
        self.weights.len() == self.rows && self.weights.iter().all(|r| r.len() == self.cols)
    }
}

/// Override for the inclusive index span `start..=end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeOverride {
    /// First index
    pub start: usize,
    /// Last index (inclusive)
    pub end: usize,
    /// Parameters to set on every neuron of the span
    #[serde(flatten)]
    pub params: NeuronParams,
}

impl RangeOverride {
    /// New range override
    pub fn new(start: usize, end: usize, params: NeuronParams) -> Self {
        Self { start, end, params }
    }
}

/// Override for a single neuron
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexOverride {
    /// Neuron index
    pub index: usize,
    /// Parameters to set on that neuron
    #[serde(flatten)]
    pub params: NeuronParams,
}

impl IndexOverride {
    /// New single-neuron override
    pub fn new(index: usize, params: NeuronParams) -> Self {
        Self { index, params }
    }
}

/// One network layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Neuron count
    pub size: usize,
    /// Incoming synapses (rows == size)
    pub synapses: SynapseMatrix,
    /// Range overrides in declaration order
    #[serde(default)]
    pub ranges: Vec<RangeOverride>,
    /// Single-neuron overrides in declaration order
    #[serde(default)]
    pub neurons: Vec<IndexOverride>,
    /// Optional probe name, unique across the network
    #[serde(default)]
    pub probe: Option<String>,
}

impl Layer {
    /// New layer without overrides or probe
    pub fn new(size: usize, synapses: SynapseMatrix) -> Self {
        Self {
            size,
            synapses,
            ranges: Vec::new(),
            neurons: Vec::new(),
            probe: None,
        }
    }

    /// Append a range override
    pub fn with_range(mut self, start: usize, end: usize, params: NeuronParams) -> Self {
        self.ranges.push(RangeOverride::new(start, end, params));
        self
    }

    /// Append a single-neuron override
    pub fn with_neuron(mut self, index: usize, params: NeuronParams) -> Self {
        self.neurons.push(IndexOverride::new(index, params));
        self
    }

    /// Attach a probe name
    pub fn with_probe(mut self, name: impl Into<String>) -> Self {
        self.probe = Some(name.into());
        self
    }
}

/// A full network: global defaults plus ordered layers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// Global defaults
    #[serde(default)]
    pub defaults: NetworkDefaults,
    /// Layers in order
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl Network {
    /// Create a network with the given defaults and no layers
    pub fn new(defaults: NetworkDefaults) -> Self {
        Self { defaults, layers: Vec::new() }
    }

    /// Append a layer
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Decode a TOML model description
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and decode a TOML model description
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
