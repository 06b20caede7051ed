//! biu CLI crate
//!
//! Purpose:
//! - Provide the `biu` command line over the BIU network compiler and result reader.
//!
//! Public responsibilities (library view):
//! - Re-export the primary CLI entry (BiuCli) for integration in binary and testing contexts.
//! - Expose the command modules and the engine runner so they can be driven programmatically.
//!
//! Major commands (see [commands]):
//! - build: TOML model → validated artifact directory (biu.xml, config.json, probes.json, ...)
//! - resolve: effective per-neuron parameters after override precedence
//! - run: external engine invocation with captured logs and an optional time limit
//! - probe: list probes; whole-file, head, summary, and live-tail reads of probed layers
//! - diag: path resolution relative to the engine working directory
//!
//! Integration points:
//! - biu_ir: Network loading and stimulus parsing.
//! - biu_compiler: compile, validate_network, resolve_network, CompiledArtifact.
//! - biu_storage: LayerProbe reads and Watch tails.

pub mod commands;
pub mod config;
pub mod error;
pub mod runner;

pub use commands::BiuCli;
