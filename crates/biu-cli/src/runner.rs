//! External engine invocation.
//!
//! The engine is run as `<binary> <config.json> [extra...]` from its working
//! directory. Both output streams go to timestamped files under
//! `<workdir>/logs`. A non-zero exit becomes [`CliError::EngineFailed`]; there
//! are no retries.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

/// File name of the engine binary inside its working directory
pub const DEFAULT_ENGINE_BINARY: &str = "NEMOSIM";

/// Lines of stderr quoted in a failure
const STDERR_TAIL_LINES: usize = 20;

/// Finished engine run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Full command line
    pub command: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
    /// Captured stdout
    pub stdout_path: PathBuf,
    /// Captured stderr
    pub stderr_path: PathBuf,
}

/// Runs the external engine
#[derive(Debug, Clone)]
pub struct EngineRunner {
    working_dir: PathBuf,
    binary: PathBuf,
    logs_dir: PathBuf,
}

impl EngineRunner {
    /// Runner for `working_dir`. Without an explicit binary the engine is
    /// expected at `<working_dir>/NEMOSIM`; a relative binary is taken
    /// relative to `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>, binary: Option<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        let binary = match binary {
            Some(b) if b.is_absolute() => b,
            Some(b) => working_dir.join(b),
            None => working_dir.join(DEFAULT_ENGINE_BINARY),
        };
        let logs_dir = working_dir.join("logs");
        Self { working_dir, binary, logs_dir }
    }

    /// Engine binary
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run the engine on a run-configuration record and wait for it
    pub async fn run(&self, config_path: &Path, extra_args: &[String], timeout: Option<Duration>) -> CliResult<RunOutcome> {
        if !self.working_dir.is_dir() {
            return Err(CliError::missing_resource(format!("engine working directory {:?}", self.working_dir)));
        }
        if !self.binary.is_file() {
            return Err(CliError::missing_resource(format!("engine binary {:?}", self.binary)));
        }
        let config_path = std::fs::canonicalize(config_path)
            .map_err(|e| CliError::missing_resource(format!("run configuration {:?}: {}", config_path, e)))?;

        std::fs::create_dir_all(&self.logs_dir)?;
        let ts = chrono::Local::now().format("%Y%m%d_%H%M%S_%6f");
        let stdout_path = self.logs_dir.join(format!("engine_stdout_{}.log", ts));
        let stderr_path = self.logs_dir.join(format!("engine_stderr_{}.log", ts));

        let mut command = vec![self.binary.display().to_string(), config_path.display().to_string()];
        command.extend(extra_args.iter().cloned());
        info!("running {:?} in {:?}", command, self.working_dir);

        let mut child = Command::new(&self.binary)
            .arg(&config_path)
            .args(extra_args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(File::create(&stdout_path)?))
            .stderr(Stdio::from(File::create(&stderr_path)?))
            .kill_on_drop(true)
            .spawn()?;

        let status = match timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!("engine exceeded {:?}, killing it", limit);
                    child.kill().await?;
                    return Err(CliError::EngineTimeout { secs: limit.as_secs(), stderr_path });
                }
            },
            None => child.wait().await?,
        };
        debug!("engine exited with {}", status);

        if !status.success() {
            let stderr_tail = tail_lines(&stderr_path, STDERR_TAIL_LINES);
            return Err(CliError::EngineFailed { code: status.code(), stderr_path, stderr_tail });
        }

        Ok(RunOutcome {
            command,
            cwd: self.working_dir.clone(),
            stdout_path,
            stderr_path,
        })
    }
}

fn tail_lines(path: &Path, n: usize) -> String {
    let text = std::fs::read_to_string(path).unwrap_or_default();
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_defaults_into_workdir() {
        let r = EngineRunner::new("/opt/engine", None);
        assert_eq!(r.binary(), Path::new("/opt/engine/NEMOSIM"));
        let r = EngineRunner::new("/opt/engine", Some("bin/sim".into()));
        assert_eq!(r.binary(), Path::new("/opt/engine/bin/sim"));
        let r = EngineRunner::new("/opt/engine", Some("/usr/bin/sim".into()));
        assert_eq!(r.binary(), Path::new("/usr/bin/sim"));
    }

    #[test]
    fn tail_keeps_last_lines() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("err.log");
        std::fs::write(&p, "a\nb\nc\n").unwrap();
        assert_eq!(tail_lines(&p, 2), "b\nc");
        assert_eq!(tail_lines(&dir.path().join("none"), 2), "");
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineRunner::new(dir.path(), None)
            .run(&dir.path().join("config.json"), &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::MissingResource(_)));
    }
}
