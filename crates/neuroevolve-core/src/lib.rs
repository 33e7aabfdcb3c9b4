//! Core data model for the neuroevolve workspace: genotypes, the phenotype compiler, fitness
//! objectives, evaluation stats, and the `Scape` trait a task implements against.

pub mod activation;
pub mod domain;
pub mod dot;
pub mod genome;
pub mod objectives;
pub mod phenotype;
pub mod scape;
pub mod stats;
mod valid;

pub use valid::Valid;

/// Re-exports the types most call sites need, mirroring how the workspace's facade crate
/// re-exports this crate in turn.
pub mod prelude {
    pub use crate::activation::{Aggregation, ActivationKind};
    pub use crate::domain::{random_provider, Rate};
    pub use crate::dot::to_dot;
    pub use crate::genome::{Connection, ConnectionId, GenomeBounds, Genotype, Layer, Neuron, NeuronId, Plasticity};
    pub use crate::objectives::{Fitness, FitnessComparator};
    pub use crate::phenotype::Cortex;
    pub use crate::scape::{run_episode, EpisodeSummary, Scape, StepOutcome};
    pub use crate::stats::{diversity, GenerationStats, Metric, MetricSummary};
    pub use crate::Valid;
}
