#![doc = "BIU network description - value types, structural XML printer, and artifact records\n\nContents:\n- model: NetworkDefaults, SynapseMatrix, RangeOverride/IndexOverride, Layer, Network (TOML-loadable)\n- xml: minimal element tree and deterministic printer for the engine's structural format\n- records: run-configuration (config.json) and probe-index (probes.json) records\n- stimulus: whitespace-separated stimulus rows (input.txt)\n\nNothing here validates or resolves; see biu-compiler for that.\n"]
#![warn(missing_docs)]

pub mod model;
pub mod records;
pub mod stimulus;
pub mod xml;

pub use model::{
    DsMode, IndexOverride, Layer, Network, NetworkDefaults, NeuronParams, RangeOverride,
    SynapseMatrix,
};
pub use records::{ProbeIndex, ProbeMetadata, RunConfig, PROBE_INDEX_FILE, RUN_CONFIG_FILE};
pub use xml::{defaults_document, format_number, network_document, Element};

/// IR-wide result type
pub type Result<T> = std::result::Result<T, IrError>;

/// IR errors
#[derive(thiserror::Error, Debug)]
pub enum IrError {
    /// Model TOML could not be decoded
    #[error("Model decode error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON record could not be encoded or decoded
    #[error("Record error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading or writing a description
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed stimulus text
    #[error("Bad stimulus at line {line}: {reason}")]
    Stimulus {
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },
}
