use thiserror::Error;

use neuroevolve_error::{NeuroError, PersistenceError};

/// Errors the CLI itself can hit, on top of whatever [`NeuroError`] the engine raises.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Neuro(#[from] NeuroError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown task `{0}`; run `neuroevolve tasks` to list the built-in ones")]
    UnknownTask(String),

    #[error("run index {index} is out of range (experiment has {runs} runs)")]
    RunIndexOutOfRange { index: usize, runs: usize },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Neuro(e) => e.exit_code(),
            CliError::Persistence(_) => 6,
            CliError::Io(_) => 7,
            CliError::UnknownTask(_) | CliError::RunIndexOutOfRange { .. } => 2,
        }
    }
}
