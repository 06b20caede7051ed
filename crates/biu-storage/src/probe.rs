//! Probe registry and per-layer readers.
//!
//! The engine writes one text file per (signal, layer, neuron) into its output
//! directory, one sample per line, named `<signal>_<layer>_<neuron>.txt`.
//! The registry maps probe names from the probe index onto those files.
//!
//! A file that does not exist yet is reported as
//! [`Availability::NotYetAvailable`]: the engine may simply not have reached
//! that point.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Lines};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use biu_ir::{ProbeIndex, ProbeMetadata, RunConfig};
use log::{debug, info};

use crate::error::{Result, StorageError};
use crate::signal::{Sample, Signal};
use crate::tail::{Watch, WatchOptions};

/// Outcome of reading a file the engine may not have written yet
#[derive(Debug, Clone, PartialEq)]
pub enum Availability<T> {
    /// File exists and was read
    Ready(T),
    /// File does not exist (yet)
    NotYetAvailable(PathBuf),
}

impl<T> Availability<T> {
    /// True when ready
    pub fn is_ready(&self) -> bool {
        matches!(self, Availability::Ready(_))
    }

    /// The value, if ready
    pub fn ready(self) -> Option<T> {
        match self {
            Availability::Ready(v) => Some(v),
            Availability::NotYetAvailable(_) => None,
        }
    }

    /// Map the ready value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Availability<U> {
        match self {
            Availability::Ready(v) => Availability::Ready(f(v)),
            Availability::NotYetAvailable(p) => Availability::NotYetAvailable(p),
        }
    }
}

/// Name-addressed view over the probe index and an output directory
#[derive(Debug, Clone)]
pub struct ProbeRegistry {
    index: ProbeIndex,
    output_dir: PathBuf,
}

impl ProbeRegistry {
    /// Registry over an index and the directory the engine writes into
    pub fn new(index: ProbeIndex, output_dir: impl Into<PathBuf>) -> Self {
        Self { index, output_dir: output_dir.into() }
    }

    /// Registry for a compiled artifact, from its run-configuration record
    pub fn from_config(config_path: &Path) -> Result<Self> {
        let config = RunConfig::load(config_path)?;
        let index = ProbeIndex::load_beside(config_path)?;
        debug!("{} probes registered for {:?}", index.probes.len(), config_path);
        Ok(Self::new(index, config.output_directory))
    }

    /// Engine output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Registered probe names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.probes.iter().map(|p| p.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    /// Index entry for `name`
    pub fn metadata(&self, name: &str) -> Result<&ProbeMetadata> {
        let mut hits = self.index.probes.iter().filter(|p| p.name == name);
        match (hits.next(), hits.next()) {
            (Some(meta), None) => Ok(meta),
            (Some(_), Some(_)) => Err(StorageError::DuplicateProbe { name: name.to_string() }),
            (None, _) => Err(StorageError::NoSuchProbe {
                name: name.to_string(),
                available: self.list(),
            }),
        }
    }

    /// Reader bound to the probed layer
    pub fn resolve(&self, name: &str) -> Result<LayerProbe> {
        let meta = self.metadata(name)?;
        Ok(LayerProbe {
            name: meta.name.clone(),
            layer_index: meta.layer_index,
            layer_size: meta.layer_size,
            output_dir: self.output_dir.clone(),
        })
    }
}

/// Reader for one probed layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerProbe {
    name: String,
    layer_index: usize,
    layer_size: usize,
    output_dir: PathBuf,
}

impl LayerProbe {
    /// Probe name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Layer position
    pub fn layer_index(&self) -> usize {
        self.layer_index
    }

    /// Neuron count of the layer
    pub fn layer_size(&self) -> usize {
        self.layer_size
    }

    /// Output file of one neuron's signal
    pub fn path(&self, signal: Signal, neuron: usize) -> Result<PathBuf> {
        if neuron >= self.layer_size {
            return Err(StorageError::NeuronOutOfRange { index: neuron, size: self.layer_size });
        }
        Ok(self.output_dir.join(signal.file_name(self.layer_index, neuron)))
    }

    /// Whole-file read
    pub fn read<T: Sample>(&self, signal: Signal, neuron: usize) -> Result<Availability<Vec<T>>> {
        let path = self.path(signal, neuron)?;
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Availability::NotYetAvailable(path)),
            Err(e) => return Err(e.into()),
        };
        let mut samples = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if let Some(v) = parse_line(&path, i + 1, line)? {
                samples.push(v);
            }
        }
        Ok(Availability::Ready(samples))
    }

    /// Spike train of one neuron
    pub fn spikes(&self, neuron: usize) -> Result<Availability<Vec<i64>>> {
        self.read(Signal::Spikes, neuron)
    }

    /// Synapse input voltage of one neuron
    pub fn vin(&self, neuron: usize) -> Result<Availability<Vec<f64>>> {
        self.read(Signal::Vin, neuron)
    }

    /// Neural state voltage of one neuron
    pub fn vns(&self, neuron: usize) -> Result<Availability<Vec<f64>>> {
        self.read(Signal::Vns, neuron)
    }

    /// Lazy chunked read. Each call opens the file afresh, so the sequence can
    /// be restarted by calling again.
    pub fn chunks<T: Sample>(
        &self,
        signal: Signal,
        neuron: usize,
        chunk_size: usize,
    ) -> Result<Availability<SignalChunks<T>>> {
        if chunk_size == 0 {
            return Err(StorageError::invalid_argument("chunk size must be positive"));
        }
        let path = self.path(signal, neuron)?;
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Availability::NotYetAvailable(path)),
            Err(e) => return Err(e.into()),
        };
        Ok(Availability::Ready(SignalChunks {
            lines: BufReader::new(file).lines(),
            path,
            chunk_size,
            line_no: 0,
            done: false,
            _marker: PhantomData,
        }))
    }

    /// Every neuron's full sequence, keyed by neuron index. Neurons whose file
    /// does not exist yet are left out.
    pub fn all<T: Sample>(&self, signal: Signal) -> Result<BTreeMap<usize, Vec<T>>> {
        let mut out = BTreeMap::new();
        for neuron in 0..self.layer_size {
            if let Availability::Ready(samples) = self.read(signal, neuron)? {
                out.insert(neuron, samples);
            }
        }
        Ok(out)
    }

    /// Neuron indices that currently have a file for `signal`
    pub fn neuron_indices(&self, signal: Signal) -> Result<Vec<usize>> {
        let prefix = format!("{}_{}_", signal.tag(), self.layer_index);
        let entries = match std::fs::read_dir(&self.output_dir) {
            Ok(e) => e,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut found = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else { continue };
            let index = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".txt"))
                .and_then(|n| n.parse::<usize>().ok());
            if let Some(i) = index.filter(|i| *i < self.layer_size) {
                found.push(i);
            }
        }
        found.sort_unstable();
        Ok(found)
    }

    /// Summary statistics of one neuron's signal
    pub fn summarize(&self, signal: Signal, neuron: usize) -> Result<Availability<SignalSummary>> {
        Ok(match signal {
            Signal::Spikes => self.read::<i64>(signal, neuron)?.map(|s| SignalSummary::from_samples(&s)),
            Signal::Vin | Signal::Vns => self.read::<f64>(signal, neuron)?.map(|s| SignalSummary::from_samples(&s)),
        })
    }

    /// Live tail of one neuron's signal. The file need not exist yet.
    pub fn tail<T: Sample>(&self, signal: Signal, neuron: usize, options: WatchOptions) -> Result<Watch<T>> {
        let path = self.path(signal, neuron)?;
        info!("tailing {:?} for probe '{}'", path, self.name);
        Ok(Watch::new(path, options))
    }

    /// Block until a neuron's file exists, polling every `poll_interval`
    pub fn wait_for_file(
        &self,
        signal: Signal,
        neuron: usize,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<PathBuf> {
        let path = self.path(signal, neuron)?;
        let started = Instant::now();
        while !path.exists() {
            if started.elapsed() >= timeout {
                return Err(StorageError::Timeout { path });
            }
            thread::sleep(poll_interval);
        }
        Ok(path)
    }
}

fn parse_line<T: Sample>(path: &Path, line_no: usize, line: &str) -> Result<Option<T>> {
    let text = line.trim();
    if text.is_empty() {
        return Ok(None);
    }
    T::parse_sample(text).map(Some).ok_or_else(|| StorageError::Parse {
        path: path.to_path_buf(),
        line: line_no,
        value: text.to_string(),
    })
}

/// Finite iterator of bounded-size chunks of one output file
#[derive(Debug)]
pub struct SignalChunks<T> {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
    chunk_size: usize,
    line_no: usize,
    done: bool,
    _marker: PhantomData<T>,
}

impl<T: Sample> Iterator for SignalChunks<T> {
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut chunk = Vec::with_capacity(self.chunk_size);
        while chunk.len() < self.chunk_size {
            let line = match self.lines.next() {
                Some(Ok(l)) => l,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.done = true;
                    break;
                }
            };
            self.line_no += 1;
            match parse_line(&self.path, self.line_no, &line) {
                Ok(Some(v)) => chunk.push(v),
                Ok(None) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        if chunk.is_empty() {
            None
        } else {
            Some(Ok(chunk))
        }
    }
}

/// Basic statistics over one signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalSummary {
    /// Number of samples
    pub count: usize,
    /// Smallest sample
    pub min: Option<f64>,
    /// Largest sample
    pub max: Option<f64>,
    /// Sum of samples (spike count for spike trains)
    pub sum: f64,
    /// Arithmetic mean (firing rate for spike trains)
    pub mean: Option<f64>,
}

impl SignalSummary {
    /// Summarize a sample sequence
    pub fn from_samples<T: Sample>(samples: &[T]) -> Self {
        let mut min = None::<f64>;
        let mut max = None::<f64>;
        let mut sum = 0.0;
        for v in samples.iter().map(|s| s.to_f64()) {
            min = Some(min.map_or(v, |m| m.min(v)));
            max = Some(max.map_or(v, |m| m.max(v)));
            sum += v;
        }
        let mean = (!samples.is_empty()).then(|| sum / samples.len() as f64);
        Self { count: samples.len(), min, max, sum, mean }
    }
}
