//! Configuration management for the biu CLI

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Global CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// External engine settings
    pub engine: EngineConfig,

    /// Probe reader settings
    pub probe: ProbeConfig,
}

/// How to find and run the external engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine binary (overridden by `--bin` / `NEMOSIM_BINARY`)
    pub binary: Option<PathBuf>,

    /// Engine working directory
    pub workdir: Option<PathBuf>,

    /// Default run time limit in seconds
    pub timeout_secs: Option<u64>,
}

/// Probe reader tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Tail poll interval in milliseconds
    pub poll_interval_ms: u64,

    /// Samples per chunk for file reads
    pub chunk_size: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            chunk_size: biu_storage::DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ProbeConfig {
    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl CliConfig {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> CliResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| CliError::config(format!("Invalid config file {:?}: {}", path, e)))
        } else {
            Ok(Self::default())
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> CliResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::config("Could not determine config directory"))?;
        Ok(config_dir.join("biu").join("config.toml"))
    }

    /// Load the explicit file if given, else the per-user file, else defaults
    pub fn resolve(explicit: Option<&Path>) -> CliResult<Self> {
        match explicit {
            Some(path) if !path.exists() => {
                Err(CliError::missing_resource(format!("config file {:?}", path)))
            }
            Some(path) => Self::load_from_file(path),
            None => match Self::default_config_path() {
                Ok(path) => Self::load_from_file(&path),
                Err(_) => Ok(Self::default()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nworkdir = \"/opt/engine\"\n").unwrap();

        let cfg = CliConfig::load_from_file(&path).unwrap();
        assert_eq!(cfg.engine.workdir, Some(PathBuf::from("/opt/engine")));
        assert_eq!(cfg.probe, ProbeConfig::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::resolve(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn bad_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[probe]\nchunk_size = \"many\"\n").unwrap();
        assert!(matches!(CliConfig::load_from_file(&path), Err(CliError::Config(_))));
    }
}
