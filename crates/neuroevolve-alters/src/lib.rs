//! Mutation operators that turn one genotype into a structurally or numerically different one.

mod mode;
mod mutator;

pub use mode::MutationMode;
pub use mutator::{Mutator, MutatorConfig};
