//! Signal kinds written by the engine and their sample types

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::StorageError;

/// Per-neuron signal kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Signal {
    /// Spike train (integer 0/1 per step)
    Spikes,
    /// Synapse input voltage
    Vin,
    /// Neural state voltage
    Vns,
}

impl Signal {
    /// All signal kinds
    pub const ALL: [Signal; 3] = [Signal::Spikes, Signal::Vin, Signal::Vns];

    /// File-name tag
    pub fn tag(self) -> &'static str {
        match self {
            Signal::Spikes => "spikes",
            Signal::Vin => "vin",
            Signal::Vns => "vns",
        }
    }

    /// `<tag>_<layer>_<neuron>.txt`
    pub fn file_name(self, layer_index: usize, neuron: usize) -> String {
        format!("{}_{}_{}.txt", self.tag(), layer_index, neuron)
    }
}

impl Display for Signal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Signal {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "spikes" => Ok(Signal::Spikes),
            "vin" => Ok(Signal::Vin),
            "vns" => Ok(Signal::Vns),
            other => Err(StorageError::UnknownSignal(other.to_string())),
        }
    }
}

/// A numeric sample parsed from one line of an output file
pub trait Sample: Copy + Send + 'static {
    /// Parse trimmed, non-empty text
    fn parse_sample(text: &str) -> Option<Self>;
    /// Widen for statistics
    fn to_f64(self) -> f64;
}

impl Sample for i64 {
    fn parse_sample(text: &str) -> Option<Self> {
        if let Ok(v) = text.parse::<i64>() {
            return Some(v);
        }
        // some engine builds print spikes as "1.0"
        match text.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
            _ => None,
        }
    }

    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Sample for f64 {
    fn parse_sample(text: &str) -> Option<Self> {
        text.parse::<f64>().ok()
    }

    fn to_f64(self) -> f64 {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for s in Signal::ALL {
            assert_eq!(s.tag().parse::<Signal>().unwrap(), s);
        }
        assert!("currents".parse::<Signal>().is_err());
        assert_eq!(Signal::Vns.file_name(1, 4), "vns_1_4.txt");
    }

    #[test]
    fn integer_samples_accept_integral_floats() {
        assert_eq!(i64::parse_sample("1"), Some(1));
        assert_eq!(i64::parse_sample("1.0"), Some(1));
        assert_eq!(i64::parse_sample("0.5"), None);
        assert_eq!(f64::parse_sample("2.5e-3"), Some(2.5e-3));
    }
}
