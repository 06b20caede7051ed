//! Error types for the storage layer

use std::path::PathBuf;

use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while reading engine outputs
#[derive(Error, Debug)]
pub enum StorageError {
    /// No probe registered under this name
    #[error("Probe '{name}' not found. Available probes: {available:?}")]
    NoSuchProbe {
        /// Requested name
        name: String,
        /// Registered names, sorted
        available: Vec<String>,
    },

    /// The probe index names the same probe more than once
    #[error("Probe '{name}' is registered for more than one layer")]
    DuplicateProbe {
        /// Ambiguous name
        name: String,
    },

    /// Neuron index outside the probed layer
    #[error("Neuron {index} out of range for layer of size {size}")]
    NeuronOutOfRange {
        /// Requested neuron
        index: usize,
        /// Layer size
        size: usize,
    },

    /// A line of an output file is not a sample of the expected type
    #[error("Bad sample '{value}' at {path:?} line {line}")]
    Parse {
        /// Offending file
        path: PathBuf,
        /// 1-based line number, counted from where the cursor started
        line: usize,
        /// Raw text
        value: String,
    },

    /// Unknown signal tag
    #[error("Unsupported signal '{0}'. Valid options: spikes, vin, vns")]
    UnknownSignal(String),

    /// Caller passed an unusable argument (e.g. zero chunk size)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Waited for a file that never appeared
    #[error("Timed out waiting for {path:?}")]
    Timeout {
        /// File that was expected
        path: PathBuf,
    },

    /// Artifact record could not be read
    #[error("Record error: {0}")]
    Record(#[from] biu_ir::IrError),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        /// Source I/O error
        source: std::io::Error,
    },
}

impl StorageError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
