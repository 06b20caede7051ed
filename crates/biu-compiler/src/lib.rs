#![doc = "BIU network compiler - validation, override resolution, and artifact emission.\n\nPublic responsibilities:\n- Validation (validate_network): collects every structural violation of a Network into a ValidationReport\n- Resolution (resolve_layer, resolve_network): folds defaults, range overrides, then index overrides into per-neuron parameters\n- Emission (compile, compile_to_xml): writes the structural description, optional secondary defaults, stimulus, run configuration and probe index\n- CompiledArtifact: re-opens emitted records and lazily serves probes and energy tables\n\nKey concepts:\n- Checks: small ordered units run by the Validator, each appending violations instead of failing fast\n- Precedence: defaults < range overrides (declaration order) < index overrides (declaration order), sparse merge\n- Determinism: compiling the same Network twice produces byte-identical files\n\nIntegration points:\n- biu-ir: Network model, XML printer, RunConfig/ProbeIndex records\n- biu-storage: ProbeRegistry and EnergyTables behind CompiledArtifact\n- biu-cli: build/resolve commands\n"]
#![deny(missing_docs)]

use std::path::PathBuf;

/// Compiled artifact handle
pub mod artifact;
/// Artifact emission
pub mod emit;
/// Override precedence resolution
pub mod resolve;
/// Structural validation
pub mod validate;

pub use artifact::CompiledArtifact;
pub use emit::{
    compile, compile_to_xml, probe_index, CompiledXml, EmitOptions, NETWORK_FILE, OUTPUT_DIR, STIMULUS_FILE,
    SUPERVISOR_FILE,
};
pub use resolve::{resolve_layer, resolve_network, ResolvedLayer};
pub use validate::{check_stimulus, validate_network, Check, ValidationReport, Validator, Violation};

/// Compiler error type
#[derive(thiserror::Error, Debug)]
pub enum CompilerError {
    /// The model has structural violations; nothing was emitted
    #[error("{0}")]
    Invalid(ValidationReport),

    /// Stimulus options are inconsistent
    #[error("Stimulus error: {0}")]
    Stimulus(String),

    /// Writing an artifact file failed
    #[error("Failed to write {path:?}: {source}")]
    Write {
        /// Target file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Record or model error
    #[error(transparent)]
    Ir(#[from] biu_ir::IrError),

    /// Probe or energy-table error
    #[error(transparent)]
    Storage(#[from] biu_storage::StorageError),

    /// Other I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("Compiler error: {0}")]
    Message(String),
}

impl CompilerError {
    /// Attach the target path to a write failure
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write { path: path.into(), source }
    }

    /// Violations, if this is a validation failure
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            Self::Invalid(report) => Some(report.violations()),
            _ => None,
        }
    }
}

/// Compiler-wide result type
pub type Result<T> = std::result::Result<T, CompilerError>;
