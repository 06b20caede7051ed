//! Override precedence.
//!
//! Effective per-neuron parameters are a pure fold over the layer:
//! global defaults, then range overrides in declaration order, then index
//! overrides in declaration order. Each step only writes the parameters it
//! sets. A parameter that is still unset afterwards has no global default
//! either and is left to the engine's built-in value.

use biu_ir::{Layer, Network, NetworkDefaults, NeuronParams};

/// Effective parameters of every neuron in one layer
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayer {
    /// Layer position
    pub layer_index: usize,
    /// One entry per neuron, index `0..size`
    pub neurons: Vec<NeuronParams>,
}

impl ResolvedLayer {
    /// Neuron count
    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    /// True for a zero-size layer
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    /// Parameters of neuron `index`
    pub fn neuron(&self, index: usize) -> Option<&NeuronParams> {
        self.neurons.get(index)
    }
}

fn overlay(target: &mut NeuronParams, patch: &NeuronParams) {
    if patch.threshold.is_some() {
        target.threshold = patch.threshold;
    }
    if patch.leak.is_some() {
        target.leak = patch.leak;
    }
    if patch.refractory.is_some() {
        target.refractory = patch.refractory;
    }
}

/// Resolve one layer. Out-of-bounds overrides are skipped; validate first to
/// have them reported.
pub fn resolve_layer(layer_index: usize, layer: &Layer, defaults: &NetworkDefaults) -> ResolvedLayer {
    let base = NeuronParams {
        threshold: defaults.threshold,
        leak: defaults.leak,
        refractory: defaults.refractory,
    };
    let mut neurons = vec![base; layer.size];

    for r in &layer.ranges {
        if r.start > r.end {
            continue;
        }
        let end = r.end.min(layer.size.saturating_sub(1));
        for n in neurons.iter_mut().take(end + 1).skip(r.start) {
            overlay(n, &r.params);
        }
    }

    // strictly after every range
    for o in &layer.neurons {
        if let Some(n) = neurons.get_mut(o.index) {
            overlay(n, &o.params);
        }
    }

    ResolvedLayer { layer_index, neurons }
}

/// Resolve every layer of a network, in order
pub fn resolve_network(network: &Network) -> Vec<ResolvedLayer> {
    network
        .layers
        .iter()
        .enumerate()
        .map(|(i, l)| resolve_layer(i, l, &network.defaults))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use biu_ir::SynapseMatrix;
    use proptest::prelude::*;

    fn defaults() -> NetworkDefaults {
        NetworkDefaults {
            threshold: Some(0.9),
            leak: Some(1e9),
            refractory: Some(14),
            ..NetworkDefaults::default()
        }
    }

    fn layer(n: usize) -> Layer {
        Layer::new(n, SynapseMatrix::from_rows(vec![vec![0.0; n]; n]))
    }

    #[test]
    fn untouched_neurons_inherit_defaults() {
        let r = resolve_layer(0, &layer(1), &defaults());
        assert_eq!(r.neurons, vec![NeuronParams::threshold(0.9).with_leak(1e9).with_refractory(14)]);
    }

    #[test]
    fn seven_neuron_chain() {
        let l = layer(7)
            .with_range(0, 3, NeuronParams::threshold(0.2))
            .with_range(4, 6, NeuronParams::threshold(0.2).with_leak(520e6).with_refractory(12))
            .with_neuron(6, NeuronParams::threshold(0.19));
        let r = resolve_layer(0, &l, &defaults());

        let n6 = r.neuron(6).unwrap();
        assert_eq!((n6.threshold, n6.leak, n6.refractory), (Some(0.19), Some(520e6), Some(12)));
        let n2 = r.neuron(2).unwrap();
        assert_eq!((n2.threshold, n2.leak, n2.refractory), (Some(0.2), Some(1e9), Some(14)));
    }

    #[test]
    fn index_override_wins_even_when_declared_first() {
        let mut l = layer(3).with_neuron(1, NeuronParams::threshold(0.7));
        l = l.with_range(0, 2, NeuronParams::threshold(0.3));
        let r = resolve_layer(0, &l, &defaults());
        assert_eq!(r.neuron(1).unwrap().threshold, Some(0.7));
        assert_eq!(r.neuron(0).unwrap().threshold, Some(0.3));
    }

    #[test]
    fn later_ranges_win_on_what_they_set() {
        let l = layer(4)
            .with_range(0, 3, NeuronParams::threshold(0.1).with_refractory(2))
            .with_range(2, 3, NeuronParams::threshold(0.5));
        let r = resolve_layer(0, &l, &defaults());
        assert_eq!(r.neuron(3).unwrap().threshold, Some(0.5));
        assert_eq!(r.neuron(3).unwrap().refractory, Some(2));
        assert_eq!(r.neuron(1).unwrap().threshold, Some(0.1));
    }

    #[test]
    fn missing_defaults_stay_unset() {
        let r = resolve_layer(0, &layer(2).with_neuron(0, NeuronParams::threshold(0.4)), &NetworkDefaults::default());
        assert_eq!(r.neuron(0).unwrap().leak, None);
        assert!(r.neuron(1).unwrap().is_empty());
    }

    #[test]
    fn invalid_overrides_do_not_panic() {
        let l = layer(2)
            .with_range(1, 9, NeuronParams::threshold(0.3))
            .with_range(5, 2, NeuronParams::threshold(0.4))
            .with_neuron(7, NeuronParams::threshold(0.5));
        let r = resolve_layer(0, &l, &defaults());
        assert_eq!(r.neuron(1).unwrap().threshold, Some(0.3));
        assert_eq!(r.len(), 2);
    }

    proptest! {
        #[test]
        fn index_override_always_wins(
            size in 1usize..20,
            ranges in proptest::collection::vec((0usize..20, 0usize..20, -1.0f64..1.0), 0..6),
            idx in 0usize..20,
            value in -1.0f64..1.0,
            index_first in any::<bool>(),
        ) {
            let idx = idx % size;
            let mut l = layer(size);
            if index_first {
                l = l.with_neuron(idx, NeuronParams::threshold(value));
            }
            for (a, b, t) in &ranges {
                let (s, e) = (*a.min(b) % size, *a.max(b) % size);
                if s <= e {
                    l = l.with_range(s, e, NeuronParams::threshold(*t));
                }
            }
            if !index_first {
                l = l.with_neuron(idx, NeuronParams::threshold(value));
            }
            let r = resolve_layer(0, &l, &defaults());
            prop_assert_eq!(r.neuron(idx).unwrap().threshold, Some(value));
        }

        #[test]
        fn untouched_parameters_keep_defaults(size in 1usize..20, start in 0usize..20, t in -1.0f64..1.0) {
            let start = start % size;
            let l = layer(size).with_range(start, size - 1, NeuronParams::threshold(t));
            let r = resolve_layer(0, &l, &defaults());
            for (i, n) in r.neurons.iter().enumerate() {
                prop_assert_eq!(n.leak, Some(1e9));
                prop_assert_eq!(n.refractory, Some(14));
                let expected = if i >= start { t } else { 0.9 };
                prop_assert_eq!(n.threshold, Some(expected));
            }
        }
    }
}
