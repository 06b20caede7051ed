//! Result-side storage for compiled BIU networks
//!
//! This crate reads what the external engine leaves behind and the optional
//! tables it is given:
//! - [`energy`]: quantized 2-D energy tables with a fail-soft load policy
//! - [`probe`]: name-addressed access to per-neuron output files
//! - [`tail`]: cancellable live tailing of a growing output file
//!
//! Nothing here writes engine inputs; see `biu-compiler` for that.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod energy;
pub mod error;
pub mod probe;
pub mod signal;
pub mod tail;

pub use energy::{EnergyTable, EnergyTables, NeuronEnergy, Quantizer, SynapseEnergy};
pub use error::{Result, StorageError};
pub use probe::{Availability, LayerProbe, ProbeRegistry, SignalChunks, SignalSummary};
pub use signal::{Sample, Signal};
pub use tail::{StopHandle, TailBatch, TailCursor, Watch, WatchOptions};

/// Default number of samples per chunk for chunked reads
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
