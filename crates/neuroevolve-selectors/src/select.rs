use neuroevolve_core::prelude::FitnessComparator;

use crate::candidate::Candidate;

/// A strategy for picking which population members reproduce (or survive).
///
/// `select` returns `count` indices into `pool`; implementations may repeat an index (selection
/// with replacement is standard for breeding pools) unless documented otherwise.
pub trait Select<C: Candidate> {
    fn select(&self, pool: &[C], count: usize, comparator: &FitnessComparator) -> Vec<usize>;
}
