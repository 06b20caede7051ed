//! Structural validation.
//!
//! The [`Validator`] runs an ordered list of [`Check`]s over a network. Checks
//! append to a shared [`ValidationReport`] rather than returning early, so one
//! run reports every independent violation. Layer shape problems do not stop
//! the override and probe checks: those only need the declared layer size.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use biu_ir::{DsMode, Network, NeuronParams};
use log::debug;

use crate::{CompilerError, Result};

/// One structural violation, with enough context to locate it
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Violation {
    /// DSBitWidth outside {4, 8}
    #[error("DSBitWidth must be 4 or 8, got {value}")]
    BitWidth {
        /// Declared value
        value: u32,
    },

    /// DSClockMHz not strictly positive
    #[error("DSClockMHz must be > 0, got {value}")]
    Clock {
        /// Declared value
        value: f64,
    },

    /// DSMode not a known mode
    #[error("DSMode must be 'ThresholdMode' or 'FrequencyMode', got '{value}'")]
    Mode {
        /// Declared value
        value: String,
    },

    /// Global default that is NaN or infinite
    #[error("default {field} must be finite, got {value}")]
    NonFiniteDefault {
        /// Engine tag of the field
        field: &'static str,
        /// Declared value
        value: f64,
    },

    /// Weight that is NaN or infinite
    #[error("layer {layer}: weight [{row}][{col}] must be finite, got {value}")]
    NonFiniteWeight {
        /// Layer position
        layer: usize,
        /// Row position
        row: usize,
        /// Column position
        col: usize,
        /// Literal value
        value: f64,
    },

    /// Override parameter that is NaN or infinite
    #[error("layer {layer}: {field} override for neurons {start}..={end} must be finite, got {value}")]
    NonFiniteOverride {
        /// Layer position
        layer: usize,
        /// Engine tag of the field
        field: &'static str,
        /// First neuron covered
        start: usize,
        /// Last neuron covered
        end: usize,
        /// Declared value
        value: f64,
    },

    /// Network without layers
    #[error("network has no layers")]
    NoLayers,

    /// Layer size of zero
    #[error("layer {layer}: size must be > 0")]
    EmptyLayer {
        /// Layer position
        layer: usize,
    },

    /// Declared matrix dimensions of zero
    #[error("layer {layer}: synapses rows and cols must be > 0 (got {rows}x{cols})")]
    EmptyMatrix {
        /// Layer position
        layer: usize,
        /// Declared rows
        rows: usize,
        /// Declared cols
        cols: usize,
    },

    /// Layer size differs from the declared matrix row count
    #[error("layer {layer}: synapses.rows ({rows}) must equal layer size ({size})")]
    RowsMismatch {
        /// Layer position
        layer: usize,
        /// Layer size
        size: usize,
        /// Declared rows
        rows: usize,
    },

    /// Literal grid has a different row count than declared
    #[error("layer {layer}: weights has {found} rows, declared {declared}")]
    RowCount {
        /// Layer position
        layer: usize,
        /// Declared rows
        declared: usize,
        /// Literal rows
        found: usize,
    },

    /// A literal row has a different width than declared
    #[error("layer {layer}: weights row {row} has {found} entries, declared {declared}")]
    RowWidth {
        /// Layer position
        layer: usize,
        /// Row position
        row: usize,
        /// Declared cols
        declared: usize,
        /// Literal entries
        found: usize,
    },

    /// Range override outside the layer or reversed
    #[error("layer {layer}: range override #{position} [{start}, {end}] invalid for size {size}")]
    RangeBounds {
        /// Layer position
        layer: usize,
        /// Override position in declaration order
        position: usize,
        /// Declared start
        start: usize,
        /// Declared end (inclusive)
        end: usize,
        /// Layer size
        size: usize,
    },

    /// Index override outside the layer
    #[error("layer {layer}: neuron override #{position} index {index} out of bounds for size {size}")]
    IndexBounds {
        /// Layer position
        layer: usize,
        /// Override position in declaration order
        position: usize,
        /// Declared index
        index: usize,
        /// Layer size
        size: usize,
    },

    /// Probe name is blank
    #[error("layer {layer}: probe name must not be empty")]
    EmptyProbeName {
        /// Layer position
        layer: usize,
    },

    /// Probe name used by more than one layer
    #[error("probe '{name}' is declared on layers {layers:?}")]
    DuplicateProbe {
        /// Probe name
        name: String,
        /// All layers declaring it
        layers: Vec<usize>,
    },

    /// Inline stimulus row width differs from the first layer size
    #[error("stimulus row {row} has {found} values, first layer has {expected} neurons")]
    StimulusWidth {
        /// Row position (0-based)
        row: usize,
        /// First layer size
        expected: usize,
        /// Values in the row
        found: usize,
    },
}

/// All violations found in one validation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    /// Empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Recorded violations, in discovery order
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// `Ok(())` when empty, `CompilerError::Invalid` otherwise
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CompilerError::Invalid(self))
        }
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "model has {} violation(s)", self.violations.len())?;
        for v in &self.violations {
            write!(f, "\n  - {}", v)?;
        }
        Ok(())
    }
}

/// A validation check over a network
pub trait Check {
    /// Human-readable check name
    fn name(&self) -> &'static str;
    /// Append any violations found to `report`
    fn run(&self, network: &Network, report: &mut ValidationReport);
}

/// Runs checks in sequence over one network
pub struct Validator {
    checks: Vec<Box<dyn Check>>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::standard()
    }
}

impl Validator {
    /// Validator without checks
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// The full check list, most general first
    pub fn standard() -> Self {
        let mut v = Self::new();
        v.add(Box::new(DigitalInterfaceCheck));
        v.add(Box::new(LayerShapeCheck));
        v.add(Box::new(OverrideBoundsCheck));
        v.add(Box::new(ProbeNameCheck));
        v
    }

    /// Append a check
    pub fn add(&mut self, check: Box<dyn Check>) {
        self.checks.push(check);
    }

    /// Run every check and collect the report
    pub fn run(&self, network: &Network) -> ValidationReport {
        let mut report = ValidationReport::new();
        for c in &self.checks {
            let before = report.violations.len();
            c.run(network, &mut report);
            debug!("check '{}': {} violation(s)", c.name(), report.violations.len() - before);
        }
        report
    }
}

/// Validate with the standard checks
pub fn validate_network(network: &Network) -> Result<()> {
    Validator::standard().run(network).into_result()
}

/// Check inline stimulus rows against the first layer
pub fn check_stimulus(network: &Network, rows: &[Vec<f64>], report: &mut ValidationReport) {
    let Some(first) = network.layers.first() else { return };
    for (row, values) in rows.iter().enumerate() {
        if values.len() != first.size {
            report.push(Violation::StimulusWidth {
                row,
                expected: first.size,
                found: values.len(),
            });
        }
    }
}

/// Bit width, clock and mode of the digital interface
pub struct DigitalInterfaceCheck;

impl Check for DigitalInterfaceCheck {
    fn name(&self) -> &'static str {
        "digital-interface"
    }

    fn run(&self, network: &Network, report: &mut ValidationReport) {
        let d = &network.defaults;
        if let Some(value) = d.ds_bit_width {
            if value != 4 && value != 8 {
                report.push(Violation::BitWidth { value });
            }
        }
        if let Some(value) = d.ds_clock_mhz {
            if !(value > 0.0) {
                report.push(Violation::Clock { value });
            }
        }
        if DsMode::from_declared(d.ds_mode.as_deref()).is_none() {
            report.push(Violation::Mode { value: d.ds_mode.clone().unwrap_or_default() });
        }
        let analog = [
            ("VTh", d.threshold),
            ("RLeak", d.leak),
            ("VDD", d.vdd),
            ("Cn", d.cn),
            ("Cu", d.cu),
            ("fclk", d.fclk),
            ("DSClockMHz", d.ds_clock_mhz),
        ];
        for (field, value) in analog {
            if let Some(value) = value.filter(|v| !v.is_finite()) {
                report.push(Violation::NonFiniteDefault { field, value });
            }
        }
    }
}

fn check_params(layer: usize, start: usize, end: usize, params: &NeuronParams, report: &mut ValidationReport) {
    for (field, value) in [("VTh", params.threshold), ("RLeak", params.leak)] {
        if let Some(value) = value.filter(|v| !v.is_finite()) {
            report.push(Violation::NonFiniteOverride { layer, field, start, end, value });
        }
    }
}

/// Layer sizes and synapse matrix shapes
pub struct LayerShapeCheck;

impl Check for LayerShapeCheck {
    fn name(&self) -> &'static str {
        "layer-shape"
    }

    fn run(&self, network: &Network, report: &mut ValidationReport) {
        if network.layers.is_empty() {
            report.push(Violation::NoLayers);
        }
        for (layer, l) in network.layers.iter().enumerate() {
            let m = &l.synapses;
            if l.size == 0 {
                report.push(Violation::EmptyLayer { layer });
            }
            if m.rows == 0 || m.cols == 0 {
                report.push(Violation::EmptyMatrix { layer, rows: m.rows, cols: m.cols });
            }
            if l.size != m.rows {
                report.push(Violation::RowsMismatch { layer, size: l.size, rows: m.rows });
            }
            if m.weights.len() != m.rows {
                report.push(Violation::RowCount { layer, declared: m.rows, found: m.weights.len() });
            }
            for (row, w) in m.weights.iter().enumerate() {
                if w.len() != m.cols {
                    report.push(Violation::RowWidth { layer, row, declared: m.cols, found: w.len() });
                }
                for (col, &value) in w.iter().enumerate() {
                    if !value.is_finite() {
                        report.push(Violation::NonFiniteWeight { layer, row, col, value });
                    }
                }
            }
            for r in &l.ranges {
                check_params(layer, r.start, r.end, &r.params, report);
            }
            for n in &l.neurons {
                check_params(layer, n.index, n.index, &n.params, report);
            }
        }
    }
}

/// Range and index overrides within `[0, size)`
pub struct OverrideBoundsCheck;

impl Check for OverrideBoundsCheck {
    fn name(&self) -> &'static str {
        "override-bounds"
    }

    fn run(&self, network: &Network, report: &mut ValidationReport) {
        for (layer, l) in network.layers.iter().enumerate() {
            for (position, r) in l.ranges.iter().enumerate() {
                if r.start > r.end || r.end >= l.size {
                    report.push(Violation::RangeBounds {
                        layer,
                        position,
                        start: r.start,
                        end: r.end,
                        size: l.size,
                    });
                }
            }
            for (position, n) in l.neurons.iter().enumerate() {
                if n.index >= l.size {
                    report.push(Violation::IndexBounds { layer, position, index: n.index, size: l.size });
                }
            }
        }
    }
}

/// Probe names are non-empty and unique across the network
pub struct ProbeNameCheck;

impl Check for ProbeNameCheck {
    fn name(&self) -> &'static str {
        "probe-names"
    }

    fn run(&self, network: &Network, report: &mut ValidationReport) {
        let mut seen: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (layer, l) in network.layers.iter().enumerate() {
            let Some(name) = l.probe.as_deref() else { continue };
            if name.trim().is_empty() {
                report.push(Violation::EmptyProbeName { layer });
                continue;
            }
            seen.entry(name).or_default().push(layer);
        }
        for (name, layers) in seen {
            if layers.len() > 1 {
                report.push(Violation::DuplicateProbe { name: name.to_string(), layers });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biu_ir::{Layer, NetworkDefaults, NeuronParams, SynapseMatrix};

    fn square(n: usize) -> SynapseMatrix {
        SynapseMatrix::from_rows(vec![vec![0.5; n]; n])
    }

    fn defaults() -> NetworkDefaults {
        NetworkDefaults {
            threshold: Some(0.9),
            refractory: Some(14),
            ds_bit_width: Some(8),
            ds_clock_mhz: Some(50.0),
            ..NetworkDefaults::default()
        }
    }

    #[test]
    fn minimal_network_is_valid() {
        let net = Network::new(defaults()).with_layer(Layer::new(1, square(1)));
        assert!(validate_network(&net).is_ok());
    }

    #[test]
    fn digital_interface_rules() {
        let mut d = defaults();
        d.ds_bit_width = Some(6);
        d.ds_clock_mhz = Some(0.0);
        d.ds_mode = Some("Burst".into());
        let net = Network::new(d).with_layer(Layer::new(1, square(1)));
        let report = Validator::standard().run(&net);
        assert_eq!(report.violations().len(), 3);
        assert!(matches!(report.violations()[0], Violation::BitWidth { value: 6 }));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut d = defaults();
        d.threshold = Some(f64::NAN);
        d.ds_clock_mhz = Some(f64::INFINITY);
        let mut m = square(2);
        m.weights[1][0] = f64::NEG_INFINITY;
        let net = Network::new(d).with_layer(
            Layer::new(2, m)
                .with_range(0, 1, NeuronParams::threshold(0.2).with_leak(f64::INFINITY))
                .with_neuron(1, NeuronParams::threshold(f64::NAN)),
        );
        let report = Validator::standard().run(&net);
        let v = report.violations();
        assert!(v.iter().any(|v| matches!(v, Violation::NonFiniteDefault { field: "VTh", .. })));
        assert!(v.iter().any(|v| matches!(v, Violation::NonFiniteDefault { field: "DSClockMHz", .. })));
        assert!(v.contains(&Violation::NonFiniteWeight { layer: 0, row: 1, col: 0, value: f64::NEG_INFINITY }));
        assert!(v.iter().any(|v| matches!(v, Violation::NonFiniteOverride { field: "RLeak", start: 0, end: 1, .. })));
        assert!(v.iter().any(|v| matches!(v, Violation::NonFiniteOverride { field: "VTh", start: 1, end: 1, .. })));
        assert_eq!(v.len(), 5);
    }

    #[test]
    fn reversed_range_fails() {
        let net = Network::new(defaults())
            .with_layer(Layer::new(7, square(7)).with_range(5, 2, NeuronParams::threshold(0.1)));
        let err = validate_network(&net).unwrap_err();
        assert!(matches!(
            err.violations().unwrap(),
            [Violation::RangeBounds { layer: 0, position: 0, start: 5, end: 2, size: 7 }]
        ));
    }

    #[test]
    fn shape_violations_are_located() {
        let mut m = square(3);
        m.weights[1].pop();
        let net = Network::new(defaults()).with_layer(Layer::new(3, m));
        let report = Validator::standard().run(&net);
        assert_eq!(
            report.violations(),
            &[Violation::RowWidth { layer: 0, row: 1, declared: 3, found: 2 }]
        );
    }

    #[test]
    fn collects_independent_violations() {
        let net = Network::new(defaults())
            .with_layer(
                Layer::new(2, square(3))
                    .with_neuron(9, NeuronParams::threshold(0.1))
                    .with_probe("p"),
            )
            .with_layer(Layer::new(2, square(2)).with_range(0, 2, NeuronParams::default()).with_probe("p"));
        let report = Validator::standard().run(&net);
        let v = report.violations();
        assert!(v.contains(&Violation::RowsMismatch { layer: 0, size: 2, rows: 3 }));
        assert!(v.contains(&Violation::IndexBounds { layer: 0, position: 0, index: 9, size: 2 }));
        assert!(v.contains(&Violation::RangeBounds { layer: 1, position: 0, start: 0, end: 2, size: 2 }));
        assert!(v.contains(&Violation::DuplicateProbe { name: "p".into(), layers: vec![0, 1] }));
        assert!(report.to_string().starts_with("model has 4 violation(s)"));
    }

    #[test]
    fn empty_network_and_blank_probe() {
        let report = Validator::standard().run(&Network::new(defaults()));
        assert_eq!(report.violations(), &[Violation::NoLayers]);

        let net = Network::new(defaults()).with_layer(Layer::new(1, square(1)).with_probe("  "));
        assert_eq!(
            Validator::standard().run(&net).violations(),
            &[Violation::EmptyProbeName { layer: 0 }]
        );
    }

    #[test]
    fn stimulus_width_follows_first_layer() {
        let net = Network::new(defaults()).with_layer(Layer::new(2, square(2)));
        let mut report = ValidationReport::new();
        check_stimulus(&net, &[vec![1.0, 0.0], vec![1.0]], &mut report);
        assert_eq!(
            report.violations(),
            &[Violation::StimulusWidth { row: 1, expected: 2, found: 1 }]
        );
    }
}
