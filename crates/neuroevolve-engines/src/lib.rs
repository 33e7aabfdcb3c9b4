//! Population and experiment orchestration: turns a [`neuroevolve_core::Scape`] and an
//! [`EngineConfig`] into a running, steppable evolutionary loop, and a set of such loops into a
//! multi-run experiment.

mod config;
mod evaluator;
mod experiment_manager;
mod member;
mod population_manager;
mod worker_pool;

pub use config::{ConfigBuilder, EngineConfig, SelectionConfig};
pub use evaluator::Evaluator;
pub use experiment_manager::{ExperimentManager, ExperimentSummary, RunRecord, RunStatus};
pub use member::Member;
pub use population_manager::{ManagerState, PopulationManager};
pub use worker_pool::WorkerPool;

#[cfg(feature = "persistence")]
pub use experiment_manager::ExportFormat;
