use neuroevolve_core::prelude::{random_provider, FitnessComparator, Rate};

use crate::candidate::Candidate;
use crate::select::Select;

/// Keeps the fittest `fraction` of the pool, then samples selections uniformly (with
/// replacement) from that surviving fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruncationSelector {
    pub fraction: Rate,
}

impl TruncationSelector {
    pub fn new(fraction: Rate) -> Self {
        TruncationSelector { fraction }
    }
}

impl<C: Candidate> Select<C> for TruncationSelector {
    fn select(&self, pool: &[C], count: usize, comparator: &FitnessComparator) -> Vec<usize> {
        if pool.is_empty() {
            return Vec::new();
        }

        let mut order: Vec<usize> = (0..pool.len()).collect();
        order.sort_by(|&a, &b| comparator.compare(pool[b].fitness(), pool[a].fitness()));

        let keep = ((pool.len() as f32) * self.fraction.get()).ceil() as usize;
        let survivors = &order[..keep.clamp(1, pool.len())];

        (0..count).map(|_| *random_provider::choose(survivors)).collect()
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
    fn only_survivors_are_ever_selected() {
        let pool = vec![
            Member(Fitness::scalar(1.0)),
            Member(Fitness::scalar(2.0)),
            Member(Fitness::scalar(3.0)),
            Member(Fitness::scalar(4.0)),
        ];
        let selector = TruncationSelector::new(Rate::new(0.5));
        let chosen = selector.select(&pool, 20, &FitnessComparator::default());
        assert!(chosen.iter().all(|&idx| idx == 2 || idx == 3));
    }
}
