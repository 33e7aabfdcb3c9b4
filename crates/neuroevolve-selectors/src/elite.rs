use neuroevolve_core::prelude::FitnessComparator;

use crate::candidate::Candidate;
use crate::select::Select;

/// Deterministically returns the `count` fittest indices, for carrying the best genotypes over
/// to the next generation unchanged rather than for breeding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EliteSelector;

impl<C: Candidate> Select<C> for EliteSelector {
    fn select(&self, pool: &[C], count: usize, comparator: &FitnessComparator) -> Vec<usize> {
        let mut order: Vec<usize> = (0..pool.len()).collect();
        order.sort_by(|&a, &b| comparator.compare(pool[b].fitness(), pool[a].fitness()));
        order.truncate(count);
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroevolve_core::prelude::Fitness;

    struct Member(Fitness);

    impl Candidate for Member {
        fn fitness(&self) -> &Fitness {
            &self.0
        }

        fn age(&self) -> usize {
            0
        }
    }

    #[test]
    fn returns_the_fittest_indices_in_descending_order() {
        let pool = vec![
            Member(Fitness::scalar(3.0)),
            Member(Fitness::scalar(1.0)),
            Member(Fitness::scalar(2.0)),
        ];
        let chosen = EliteSelector.select(&pool, 2, &FitnessComparator::default());
        assert_eq!(chosen, vec![0, 2]);
    }
}
