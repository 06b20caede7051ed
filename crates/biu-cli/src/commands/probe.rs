//! `biu probe`: list probes and read probed layer outputs

use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};
use tracing::{info, warn};

use biu_compiler::CompiledArtifact;
use biu_storage::{Availability, LayerProbe, Sample, Signal, WatchOptions};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// List probes and read probed layer outputs
#[derive(Args, Debug)]
pub struct ProbeCommand {
    /// Run configuration (config.json) of the compiled artifact
    pub config_json: PathBuf,

    /// List registered probes and exit
    #[arg(long, conflicts_with = "probe")]
    pub list: bool,

    /// Probe name
    #[arg(long, required_unless_present = "list")]
    pub probe: Option<String>,

    /// Signal to read
    #[arg(long, default_value = "spikes")]
    pub signal: SignalArg,

    /// Neuron index (all neurons of the layer when omitted)
    #[arg(long)]
    pub neuron: Option<usize>,

    /// Print at most this many samples per neuron
    #[arg(long)]
    pub head: Option<usize>,

    /// Keep printing samples of one neuron as the engine appends them
    #[arg(long, conflicts_with = "summary", requires = "neuron")]
    pub follow: bool,

    /// Stop following after this many samples
    #[arg(long, requires = "follow")]
    pub max_samples: Option<usize>,

    /// Give up following if the file has not appeared after this many seconds
    #[arg(long, requires = "follow")]
    pub wait_secs: Option<u64>,

    /// Print summary statistics instead of samples
    #[arg(long)]
    pub summary: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SignalArg {
    Spikes,
    Vin,
    Vns,
}

impl From<SignalArg> for Signal {
    fn from(s: SignalArg) -> Self {
        match s {
            SignalArg::Spikes => Signal::Spikes,
            SignalArg::Vin => Signal::Vin,
            SignalArg::Vns => Signal::Vns,
        }
    }
}

impl ProbeCommand {
    pub async fn execute(self, config: &CliConfig) -> CliResult<()> {
        let artifact = CompiledArtifact::open(&self.config_json)?;

        if self.list {
            let names = artifact.list_probes();
            if names.is_empty() {
                info!("No probes registered for {:?}", self.config_json);
            }
            for name in names {
                let meta = artifact.probe_metadata(&name)?;
                println!("{}\tlayer={}\tsize={}", meta.name, meta.layer_index, meta.layer_size);
            }
            return Ok(());
        }

        let name = self
            .probe
            .as_deref()
            .ok_or_else(|| CliError::invalid_args("--probe is required unless --list is given"))?;
        let probe = artifact.get_probe(name)?;
        let signal = Signal::from(self.signal);

        if self.follow {
            return self.tail(probe, signal, config).await;
        }

        let neurons: Vec<usize> = match self.neuron {
            Some(n) => vec![n],
            None => (0..probe.layer_size()).collect(),
        };
        for n in neurons {
            if self.summary {
                self.print_summary(&probe, signal, n)?;
            } else {
                match signal {
                    Signal::Spikes => self.print_samples::<i64>(&probe, signal, n, config)?,
                    Signal::Vin | Signal::Vns => self.print_samples::<f64>(&probe, signal, n, config)?,
                }
            }
        }
        Ok(())
    }

    fn print_samples<T: Sample + Display>(
        &self,
        probe: &LayerProbe,
        signal: Signal,
        neuron: usize,
        config: &CliConfig,
    ) -> CliResult<()> {
        let chunks = match probe.chunks::<T>(signal, neuron, config.probe.chunk_size.max(1))? {
            Availability::Ready(c) => c,
            Availability::NotYetAvailable(path) => {
                println!("neuron {}: not yet available ({})", neuron, path.display());
                return Ok(());
            }
        };

        let limit = self.head.unwrap_or(usize::MAX);
        let mut shown = Vec::new();
        'chunks: for chunk in chunks {
            for v in chunk? {
                if shown.len() >= limit {
                    break 'chunks;
                }
                shown.push(v.to_string());
            }
        }
        println!("neuron {}: {}", neuron, shown.join(" "));
        Ok(())
    }

    fn print_summary(&self, probe: &LayerProbe, signal: Signal, neuron: usize) -> CliResult<()> {
        match probe.summarize(signal, neuron)? {
            Availability::Ready(s) => {
                let opt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
                println!(
                    "neuron {}: count={} min={} max={} sum={} mean={}",
                    neuron,
                    s.count,
                    opt(s.min),
                    opt(s.max),
                    s.sum,
                    opt(s.mean)
                );
            }
            Availability::NotYetAvailable(path) => {
                println!("neuron {}: not yet available ({})", neuron, path.display());
            }
        }
        Ok(())
    }

    async fn tail(&self, probe: LayerProbe, signal: Signal, config: &CliConfig) -> CliResult<()> {
        let neuron = self
            .neuron
            .ok_or_else(|| CliError::invalid_args("--follow needs --neuron"))?;
        let mut options = WatchOptions::default().with_poll_interval(config.probe.poll_interval());
        if let Some(max) = self.max_samples {
            options = options.with_max_samples(max);
        }
        if let Some(secs) = self.wait_secs {
            options = options.with_wait_timeout(Duration::from_secs(secs));
        }

        match signal {
            Signal::Spikes => follow_samples(probe.tail::<i64>(signal, neuron, options)?).await,
            Signal::Vin | Signal::Vns => follow_samples(probe.tail::<f64>(signal, neuron, options)?).await,
        }
    }
}

async fn follow_samples<T: Sample + Display>(watch: biu_storage::Watch<T>) -> CliResult<()> {
    let stop = watch.stop_handle();
    let worker = tokio::task::spawn_blocking(move || -> CliResult<usize> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let mut count = 0;
        for sample in watch {
            writeln!(out, "{}", sample?)?;
            out.flush()?;
            count += 1;
        }
        Ok(count)
    });

    tokio::pin!(worker);
    let joined = tokio::select! {
        res = &mut worker => res,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping tail");
            stop.stop();
            worker.await
        }
    };
    let count = joined.map_err(anyhow::Error::from)??;
    info!("Printed {} sample(s)", count);
    Ok(())
}
