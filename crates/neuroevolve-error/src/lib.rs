//! Error taxonomy for the neuroevolve workspace.
//!
//! Each evolutionary-core crate raises one of the component error enums below; the
//! `NeuroError` composition is what crosses the ExperimentManager / CLI boundary, where a
//! single exit code has to be chosen for whatever went wrong underneath.

use std::fmt;
use thiserror::Error;

/// Errors raised while constructing or mutating a [`Genotype`](neuroevolve-core).
///
/// Both variants are locally recoverable: the mutator that triggers one simply skips the
/// operator for this round rather than propagating the error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenomeError {
    #[error("invalid edge {from:?} -> {to:?}: {reason}")]
    InvalidEdge {
        from: u64,
        to: u64,
        reason: &'static str,
    },

    #[error("operation would break invariant: {reason}")]
    WouldBreakInvariant { reason: &'static str },
}

/// Errors raised while compiling or activating a [`Cortex`](neuroevolve-core).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActivationError {
    #[error("input arity mismatch: expected {expected} inputs, got {actual}")]
    InputArityMismatch { expected: usize, actual: usize },

    #[error("numeric overflow while activating neuron {neuron}")]
    NumericOverflow { neuron: u64 },
}

/// Errors raised while an [`Evaluator`](neuroevolve-engines) drives a Scape.
#[derive(Debug, Error, Clone)]
pub enum EvaluationError {
    #[error("scape error for agent {agent_id}: {message}")]
    ScapeError { agent_id: String, message: String },

    #[error("evaluation storm: {failed}/{total} evaluations failed this generation")]
    EvaluationStorm { failed: usize, total: usize },
}

/// Errors raised while loading or validating an [`EngineConfig`](neuroevolve-engines).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("failed to parse configuration: {0}")]
    ParseFailure(String),
}

/// Errors raised while checkpointing or exporting an experiment record.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serde(String),
}

/// The stable classification used to pick a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Genome,
    Activation,
    Evaluation,
    Config,
    Persistence,
}

/// Composed top-level error that crosses the ExperimentManager / CLI boundary.
#[derive(Debug, Error)]
pub enum NeuroError {
    #[error(transparent)]
    Genome(#[from] GenomeError),

    #[error(transparent)]
    Activation(#[from] ActivationError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl NeuroError {
    pub fn code(&self) -> ErrorCode {
        match self {
            NeuroError::Genome(_) => ErrorCode::Genome,
            NeuroError::Activation(_) => ErrorCode::Activation,
            NeuroError::Evaluation(_) => ErrorCode::Evaluation,
            NeuroError::Config(_) => ErrorCode::Config,
            NeuroError::Persistence(_) => ErrorCode::Persistence,
        }
    }

    /// Process exit code for the CLI surface: 0 is reserved for success, so every
    /// branch here returns a distinct non-zero code.
    pub fn exit_code(&self) -> i32 {
        match self.code() {
            ErrorCode::Config => 2,
            ErrorCode::Genome => 3,
            ErrorCode::Activation => 4,
            ErrorCode::Evaluation => 5,
            ErrorCode::Persistence => 6,
        }
    }
}

pub type NeuroResult<T> = Result<T, NeuroError>;

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Genome => "genome",
            ErrorCode::Activation => "activation",
            ErrorCode::Evaluation => "evaluation",
            ErrorCode::Config => "config",
            ErrorCode::Persistence => "persistence",
        };
        write!(f, "{s}")
    }
}
