#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a [`Mutator`](crate::Mutator) combines its operators within one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MutationMode {
    /// Every operator is sampled against its own rate; any number of them (including zero or
    /// all seven) may fire in a single call.
    Independent,
    /// Exactly one operator fires, chosen with probability proportional to its configured rate.
    ExactlyOne,
}

impl Default for MutationMode {
    fn default() -> Self {
        MutationMode::Independent
    }
}
