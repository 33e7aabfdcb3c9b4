#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::activation::{Aggregation, ActivationKind};
use crate::genome::Layer;

/// A local synaptic learning rule a neuron can carry. None of these rules run inside this core
/// gradient-/plasticity-based training is out of scope here — the tag and its
/// parameters are preserved through genotype → phenotype compilation so a
/// downstream layer can read them without recompiling the network.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Plasticity {
    None,
    Hebbian(Vec<f64>),
    Oja(Vec<f64>),
    Abcn(Vec<f64>),
}

impl Default for Plasticity {
    fn default() -> Self {
        Plasticity::None
    }
}

/// A node in a [`Genotype`](crate::genome::Genotype)'s neuron arena.
///
/// The neuron's own `NeuronId` is not stored on the struct: it is the slotmap key under which
/// the neuron lives, so every accessor that needs it is handed `(NeuronId, &Neuron)` pairs by
/// the genotype rather than reading it back off the value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Neuron {
    pub(crate) layer: Layer,
    pub(crate) activation: ActivationKind,
    pub(crate) bias: f64,
    pub(crate) aggregation: Aggregation,
    pub(crate) plasticity: Plasticity,
}

impl Neuron {
    pub fn new(layer: Layer, activation: ActivationKind, bias: f64) -> Self {
        Neuron {
            layer,
            activation,
            bias,
            aggregation: Aggregation::default(),
            plasticity: Plasticity::default(),
        }
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_plasticity(mut self, plasticity: Plasticity) -> Self {
        self.plasticity = plasticity;
        self
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn activation(&self) -> ActivationKind {
        self.activation
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    pub fn plasticity(&self) -> &Plasticity {
        &self.plasticity
    }

    pub fn set_bias(&mut self, bias: f64) {
        self.bias = bias;
    }

    pub fn set_activation(&mut self, activation: ActivationKind) {
        self.activation = activation;
    }
}
