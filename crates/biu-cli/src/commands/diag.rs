//! `biu diag`: path resolution as seen by the engine

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Show how a path resolves from the engine working directory
#[derive(Args, Debug)]
pub struct DiagCommand {
    /// Path as written in a run configuration or passed to the engine
    pub path: PathBuf,

    /// Engine working directory
    #[arg(long)]
    pub workdir: Option<PathBuf>,
}

impl DiagCommand {
    pub async fn execute(self, config: &CliConfig) -> CliResult<()> {
        let resolved = if self.path.is_absolute() {
            self.path
        } else {
            let base = self
                .workdir
                .or_else(|| config.engine.workdir.clone())
                .ok_or_else(|| CliError::invalid_args("relative path needs --workdir or engine.workdir"))?;
            base.join(self.path)
        };
        info!("{:?} exists: {}", resolved, resolved.exists());
        println!("{}", resolved.display());
        Ok(())
    }
}
