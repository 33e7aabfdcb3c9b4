mod connection;
mod genotype;
mod ids;
mod layer;
mod neuron;

pub use connection::Connection;
pub use genotype::{GenomeBounds, Genotype};
pub use ids::{ConnectionId, NeuronId};
pub use layer::Layer;
pub use neuron::{Neuron, Plasticity};
