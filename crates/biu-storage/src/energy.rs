//! Energy table lookup.
//!
//! Tables are advisory: a missing or malformed file must never abort a run.
//! Load failures are logged and produce [`EnergyTable::Empty`], and every
//! query against an empty table, or outside a loaded one, returns `0.0`.
//!
//! File format: one header row (ignored), then data rows whose first column is
//! a label (ignored) and whose remaining comma-separated columns are numbers.
//! Data row `r`, value column `c` is bucket `(r, c)`.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use once_cell::sync::OnceCell;

/// A loaded table, or the typed "nothing loaded" state
#[derive(Debug, Clone, PartialEq)]
pub enum EnergyTable {
    /// Parsed value grid
    Loaded {
        /// Source file
        path: PathBuf,
        /// Rows of values (label column dropped)
        grid: Vec<Vec<f64>>,
    },
    /// Unconfigured or failed to load
    Empty,
}

impl EnergyTable {
    /// Load a table, logging and degrading to `Empty` on any failure
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                warn!("energy table {:?} unavailable: {}", path, e);
                return EnergyTable::Empty;
            }
        };
        match parse_grid(&text) {
            Ok(grid) => {
                debug!("energy table {:?}: {} rows", path, grid.len());
                EnergyTable::Loaded { path: path.to_path_buf(), grid }
            }
            Err(reason) => {
                warn!("energy table {:?} ignored: {}", path, reason);
                EnergyTable::Empty
            }
        }
    }

    /// Load when a path is configured, `Empty` otherwise
    pub fn load_opt(path: Option<&Path>) -> Self {
        path.map_or(EnergyTable::Empty, Self::load)
    }

    /// Build from an in-memory grid
    pub fn from_grid(grid: Vec<Vec<f64>>) -> Self {
        if grid.is_empty() {
            return EnergyTable::Empty;
        }
        EnergyTable::Loaded { path: PathBuf::new(), grid }
    }

    /// True when nothing is loaded
    pub fn is_empty(&self) -> bool {
        matches!(self, EnergyTable::Empty)
    }

    /// Value at bucket `(row, col)`; `0.0` when out of range or empty
    pub fn lookup(&self, row: usize, col: usize) -> f64 {
        match self {
            EnergyTable::Loaded { grid, .. } => grid
                .get(row)
                .and_then(|r| r.get(col))
                .copied()
                .unwrap_or(0.0),
            EnergyTable::Empty => 0.0,
        }
    }

    /// Same as [`lookup`](Self::lookup) for buckets that may not exist
    pub fn lookup_opt(&self, row: Option<usize>, col: Option<usize>) -> f64 {
        match (row, col) {
            (Some(r), Some(c)) => self.lookup(r, c),
            _ => 0.0,
        }
    }
}

fn parse_grid(text: &str) -> std::result::Result<Vec<Vec<f64>>, String> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    if lines.next().is_none() {
        return Err("file is empty".into());
    }

    let mut grid = Vec::new();
    for (i, line) in lines.enumerate() {
        let cells = split_cells(line);
        if cells.len() < 2 {
            return Err(format!("data row {} has no values", i + 1));
        }
        let row = cells[1..]
            .iter()
            .map(|c| {
                c.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| format!("data row {}: '{}' is not a number", i + 1, c))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        grid.push(row);
    }

    if grid.is_empty() {
        return Err("no data rows".into());
    }
    Ok(grid)
}

// Comma split that keeps quoted labels intact
fn split_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => cells.push(std::mem::take(&mut cur).trim().to_string()),
            _ => cur.push(c),
        }
    }
    cells.push(cur.trim().to_string());
    cells
}

/// Fixed-width bucketing of a continuous quantity. Bucket `k` covers
/// `[origin + k*width, origin + (k+1)*width)`; values below `origin` have no bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    /// Lower edge of bucket 0
    pub origin: f64,
    /// Bucket width, > 0
    pub width: f64,
}

impl Quantizer {
    /// New quantizer
    pub const fn new(origin: f64, width: f64) -> Self {
        Self { origin, width }
    }

    /// Bucket of `value`, `None` when below origin or not representable
    pub fn bucket(&self, value: f64) -> Option<usize> {
        if !(self.width > 0.0) || !value.is_finite() {
            return None;
        }
        let k = ((value - self.origin) / self.width).floor();
        if k < 0.0 || k > usize::MAX as f64 {
            return None;
        }
        Some(k as usize)
    }
}

/// Column of the synapse table for a synapse whose presynaptic neuron spiked
pub const SPIKE_IN_COLUMN: usize = 0;
/// Column of the synapse table for a synapse without a presynaptic spike
pub const NO_SPIKE_IN_COLUMN: usize = 1;

/// Per-synapse table: rows are weight classes (by magnitude), columns are
/// spike-in / no-spike-in.
#[derive(Debug, Clone, PartialEq)]
pub struct SynapseEnergy {
    /// Underlying grid
    pub table: EnergyTable,
    /// Weight-magnitude classes
    pub weight: Quantizer,
}

impl SynapseEnergy {
    /// Unit-width weight classes starting at 0
    pub const DEFAULT_WEIGHT: Quantizer = Quantizer::new(0.0, 1.0);

    /// Wrap a table with default quantization
    pub fn new(table: EnergyTable) -> Self {
        Self { table, weight: Self::DEFAULT_WEIGHT }
    }

    /// Energy of one synapse event
    pub fn query(&self, weight: f64, spiked: bool) -> f64 {
        let col = if spiked { SPIKE_IN_COLUMN } else { NO_SPIKE_IN_COLUMN };
        self.table.lookup_opt(self.weight.bucket(weight.abs()), Some(col))
    }
}

/// Per-neuron table: rows are threshold-voltage buckets, columns are
/// state-voltage buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronEnergy {
    /// Underlying grid
    pub table: EnergyTable,
    /// Threshold buckets
    pub threshold: Quantizer,
    /// State buckets
    pub state: Quantizer,
}

impl NeuronEnergy {
    /// 100 mV buckets from 0 V
    pub const DEFAULT_VOLTAGE: Quantizer = Quantizer::new(0.0, 0.1);

    /// Wrap a table with default quantization
    pub fn new(table: EnergyTable) -> Self {
        Self {
            table,
            threshold: Self::DEFAULT_VOLTAGE,
            state: Self::DEFAULT_VOLTAGE,
        }
    }

    /// Energy of one neuron step at the given threshold and state voltage
    pub fn query(&self, threshold: f64, state: f64) -> f64 {
        self.table
            .lookup_opt(self.threshold.bucket(threshold), self.state.bucket(state))
    }
}

/// Both tables of a compiled artifact, each loaded on first use and cached.
#[derive(Debug, Default)]
pub struct EnergyTables {
    synapse_path: Option<PathBuf>,
    neuron_path: Option<PathBuf>,
    synapse: OnceCell<SynapseEnergy>,
    neuron: OnceCell<NeuronEnergy>,
}

impl EnergyTables {
    /// Tables backed by the given (optional) files
    pub fn new(synapse_path: Option<PathBuf>, neuron_path: Option<PathBuf>) -> Self {
        Self {
            synapse_path,
            neuron_path,
            synapse: OnceCell::new(),
            neuron: OnceCell::new(),
        }
    }

    /// Per-synapse table
    pub fn synapse(&self) -> &SynapseEnergy {
        self.synapse
            .get_or_init(|| SynapseEnergy::new(EnergyTable::load_opt(self.synapse_path.as_deref())))
    }

    /// Per-neuron table
    pub fn neuron(&self) -> &NeuronEnergy {
        self.neuron
            .get_or_init(|| NeuronEnergy::new(EnergyTable::load_opt(self.neuron_path.as_deref())))
    }
}
