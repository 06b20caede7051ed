//! `biu run`: invoke the external engine on a compiled artifact

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use tracing::info;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::runner::EngineRunner;

/// Run the external engine on a compiled artifact
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Run configuration (config.json)
    pub config_json: PathBuf,

    /// Engine working directory
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Engine binary (relative paths are taken from the working directory)
    #[arg(long, env = "NEMOSIM_BINARY")]
    pub bin: Option<PathBuf>,

    /// Kill the engine after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Extra arguments passed to the engine
    #[arg(last = true)]
    pub extra: Vec<String>,
}

impl RunCommand {
    pub async fn execute(self, config: &CliConfig) -> CliResult<()> {
        let workdir = self
            .workdir
            .or_else(|| config.engine.workdir.clone())
            .ok_or_else(|| CliError::invalid_args("no engine working directory; pass --workdir or set engine.workdir"))?;
        let binary = self.bin.or_else(|| config.engine.binary.clone());
        let timeout = self.timeout_secs.or(config.engine.timeout_secs).map(Duration::from_secs);

        let runner = EngineRunner::new(workdir, binary);
        let outcome = runner.run(&self.config_json, &self.extra, timeout).await?;

        info!("Engine finished: {}", outcome.command.join(" "));
        println!("stdout: {}", outcome.stdout_path.display());
        println!("stderr: {}", outcome.stderr_path.display());
        Ok(())
    }
}
