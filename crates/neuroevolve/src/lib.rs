//! A Rust library for evolving recurrent neural network topologies and weights.
//!
//! This crate re-exports the genome/phenotype model, mutation operators, selection
//! strategies, and population/experiment orchestration that make up the engine, so a
//! downstream crate only needs this one dependency.

pub use neuroevolve_alters::*;
pub use neuroevolve_core::*;
pub use neuroevolve_engines::*;
pub use neuroevolve_error::*;
pub use neuroevolve_selectors::*;

pub mod prelude {
    pub use neuroevolve_core::prelude::*;

    pub use neuroevolve_alters::{MutationMode, Mutator, MutatorConfig};
    pub use neuroevolve_engines::{
        ConfigBuilder, EngineConfig, ExperimentManager, ExperimentSummary, Member, PopulationManager,
        RunRecord, RunStatus, SelectionConfig,
    };
    pub use neuroevolve_error::{NeuroError, NeuroResult};
    pub use neuroevolve_selectors::{Candidate, EliteSelector, RouletteSelector, Select, TournamentSelector, TruncationSelector};
}
