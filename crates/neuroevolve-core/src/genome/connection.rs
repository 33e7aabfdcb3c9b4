#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::genome::NeuronId;

/// A directed, weighted edge between two neurons.
///
/// `recurrent` is a derived property (true iff the edge closes a cycle in topological order, or
/// is a self-loop) recomputed by [`Genotype::recompute_topology`](crate::genome::Genotype::recompute_topology)
/// after every structural mutation — it is cached on the connection rather than recomputed on
/// every read because the phenotype compiler and the mutator both need to query it frequently.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Connection {
    pub(crate) from: NeuronId,
    pub(crate) to: NeuronId,
    pub(crate) weight: f64,
    pub(crate) recurrent: bool,
    pub(crate) enabled: bool,
}

impl Connection {
    pub fn new(from: NeuronId, to: NeuronId, weight: f64) -> Self {
        Connection {
            from,
            to,
            weight,
            recurrent: false,
            enabled: true,
        }
    }

    pub fn from(&self) -> NeuronId {
        self.from
    }

    pub fn to(&self) -> NeuronId {
        self.to
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn is_recurrent(&self) -> bool {
        self.recurrent
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
