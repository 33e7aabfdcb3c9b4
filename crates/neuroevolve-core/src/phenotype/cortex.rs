use std::collections::HashMap;

use neuroevolve_error::ActivationError;

use crate::activation::{Aggregation, ActivationKind};
use crate::genome::{Genotype, Layer, NeuronId};

#[derive(Debug, Clone)]
struct CompiledNeuron {
    activation: ActivationKind,
    bias: f64,
    aggregation: Aggregation,
    /// (source index in `values`, weight, true if the edge reads last cycle's value)
    incoming: Vec<(usize, f64, bool)>,
}

/// An executable compilation of a [`Genotype`]: the phenotype.
///
/// Compiling walks the genotype's topological order once and bakes every neuron's incoming
/// edges into index-addressed slots, so repeated activation never touches the slotmap arenas
/// again. Recurrent edges read the *previous cycle's* value within the same `Cortex`; that
/// history is zeroed by [`Cortex::compile`] and by [`Cortex::reset`], never implicitly elsewhere,
/// so starting a new episode means building (or resetting) a fresh `Cortex`.
#[derive(Debug, Clone)]
pub struct Cortex {
    neurons: Vec<CompiledNeuron>,
    is_source: Vec<bool>,
    input_indices: Vec<usize>,
    bias_indices: Vec<usize>,
    output_indices: Vec<usize>,
    /// Each neuron's activation after the most recently completed cycle; recurrent edges read
    /// from here before it is overwritten by the cycle in progress.
    values: Vec<f64>,
    /// The cycle currently being computed; every slot is overwritten before `activate` returns,
    /// then swapped into `values` so the next cycle builds into what used to be `values`.
    scratch: Vec<f64>,
    /// Reused output slots, refilled from `values` each cycle so `activate` never allocates.
    outputs: Vec<f64>,
}

impl Cortex {
    pub fn compile(genotype: &Genotype) -> Self {
        let order: Vec<NeuronId> = genotype.topological_order().to_vec();
        let index_of: HashMap<NeuronId, usize> = order
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();

        let mut is_source = vec![false; order.len()];
        let mut neurons = Vec::with_capacity(order.len());
        for &id in &order {
            let neuron = genotype
                .neuron(id)
                .expect("topological order only contains live neurons");

            let incoming: Vec<(usize, f64, bool)> = genotype
                .incoming(id)
                .into_iter()
                .filter_map(|cid| genotype.connection(cid))
                .map(|c| (index_of[&c.from()], c.weight(), c.is_recurrent()))
                .collect();

            neurons.push(CompiledNeuron {
                activation: neuron.activation(),
                bias: neuron.bias(),
                aggregation: neuron.aggregation(),
                incoming,
            });
        }

        let input_indices: Vec<usize> = genotype
            .neurons_in_layer(Layer::Input)
            .into_iter()
            .map(|id| index_of[&id])
            .collect();
        let bias_indices: Vec<usize> = genotype
            .neurons_in_layer(Layer::Bias)
            .into_iter()
            .map(|id| index_of[&id])
            .collect();
        let output_indices: Vec<usize> = genotype
            .neurons_in_layer(Layer::Output)
            .into_iter()
            .map(|id| index_of[&id])
            .collect();

        for &i in input_indices.iter().chain(bias_indices.iter()) {
            is_source[i] = true;
        }

        let len = neurons.len();
        let output_count = output_indices.len();
        Cortex {
            neurons,
            is_source,
            input_indices,
            bias_indices,
            output_indices,
            values: vec![0.0; len],
            scratch: vec![0.0; len],
            outputs: vec![0.0; output_count],
        }
    }

    pub fn input_arity(&self) -> usize {
        self.input_indices.len()
    }

    pub fn output_arity(&self) -> usize {
        self.output_indices.len()
    }

    /// Zeroes recurrent history without recompiling, for starting a fresh episode against the
    /// same topology.
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
        self.scratch.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Runs one activation cycle. Recurrent connections read the value each source neuron held
    /// after the *previous* call to `activate` (0.0 on the first call after compiling or
    /// resetting). The returned slice borrows `self` and is only valid until the next call.
    pub fn activate(&mut self, inputs: &[f64]) -> Result<&[f64], ActivationError> {
        if inputs.len() != self.input_indices.len() {
            return Err(ActivationError::InputArityMismatch {
                expected: self.input_indices.len(),
                actual: inputs.len(),
            });
        }

        for (&idx, &x) in self.input_indices.iter().zip(inputs.iter()) {
            self.scratch[idx] = x;
        }
        for &idx in &self.bias_indices {
            self.scratch[idx] = 1.0;
        }

        for (idx, neuron) in self.neurons.iter().enumerate() {
            if self.is_source[idx] {
                continue;
            }
            let weighted = neuron.incoming.iter().map(|&(src, weight, recurrent)| {
                let source_value = if recurrent { self.values[src] } else { self.scratch[src] };
                source_value * weight
            });
            let net = neuron.aggregation.aggregate(weighted) + neuron.bias;
            let y = neuron.activation.apply(net);
            if !y.is_finite() {
                return Err(ActivationError::NumericOverflow { neuron: idx as u64 });
            }
            self.scratch[idx] = y;
        }

        std::mem::swap(&mut self.values, &mut self.scratch);

        for (slot, &i) in self.outputs.iter_mut().zip(self.output_indices.iter()) {
            *slot = self.values[i];
        }
        Ok(&self.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationKind;
    use crate::genome::Genotype;

    fn xor_like_genotype() -> Genotype {
        let mut g = Genotype::new(0);
        let i1 = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let i2 = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let h = g.add_neuron(Layer::Hidden, ActivationKind::Tanh, 0.0, Aggregation::DotProduct);
        let o = g.add_neuron(Layer::Output, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct);
        g.add_connection(i1, h, 0.6).unwrap();
        g.add_connection(i2, h, -0.4).unwrap();
        g.add_connection(h, o, 0.8).unwrap();
        g
    }

    #[test]
    fn activate_rejects_wrong_arity() {
        let g = xor_like_genotype();
        let mut cortex = Cortex::compile(&g);
        assert!(cortex.activate(&[1.0]).is_err());
    }

    #[test]
    fn activate_produces_one_output_per_output_neuron() {
        let g = xor_like_genotype();
        let mut cortex = Cortex::compile(&g);
        let out = cortex.activate(&[1.0, 0.0]).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].is_finite());
    }

    #[test]
    fn bias_neuron_always_outputs_one() {
        let mut g = Genotype::new(0);
        let bias = g.add_neuron(Layer::Bias, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let input = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let output = g.add_neuron(Layer::Output, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        g.add_connection(bias, output, 1.0).unwrap();
        g.add_connection(input, output, 0.0).unwrap();

        let mut cortex = Cortex::compile(&g);
        let out = cortex.activate(&[0.0]).unwrap().to_vec();
        assert_eq!(out, vec![1.0]);
    }

    #[test]
    fn recurrent_edge_lags_by_one_cycle() {
        let mut g = Genotype::new(0);
        let input = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let output = g.add_neuron(Layer::Output, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        g.add_connection(input, output, 1.0).unwrap();
        let back = g.add_connection(output, output, 1.0).unwrap();
        assert!(g.connection(back).unwrap().is_recurrent());

        let mut cortex = Cortex::compile(&g);
        let first = cortex.activate(&[1.0]).unwrap().to_vec();
        assert_eq!(first, vec![1.0]); // recurrent input is still 0.0 on the first cycle

        let second = cortex.activate(&[1.0]).unwrap().to_vec();
        assert_eq!(second, vec![2.0]); // now folds in the previous cycle's output
    }

    #[test]
    fn reset_clears_recurrent_history() {
        let mut g = Genotype::new(0);
        let input = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let output = g.add_neuron(Layer::Output, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        g.add_connection(input, output, 1.0).unwrap();
        g.add_connection(output, output, 1.0).unwrap();

        let mut cortex = Cortex::compile(&g);
        cortex.activate(&[1.0]).unwrap();
        cortex.reset();
        let after_reset = cortex.activate(&[1.0]).unwrap().to_vec();
        assert_eq!(after_reset, vec![1.0]);
    }
}
