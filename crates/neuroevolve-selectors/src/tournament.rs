use std::cmp::Ordering;

use neuroevolve_core::prelude::{random_provider, FitnessComparator};

use crate::candidate::Candidate;
use crate::select::Select;

/// Runs `size`-way tournaments: each selection draws `size` *distinct* pool members without
/// replacement and keeps the fittest. Ties are broken in favor of the younger genotype, then at
/// random.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentSelector {
    pub size: usize,
}

impl TournamentSelector {
    pub fn new(size: usize) -> Self {
        TournamentSelector { size: size.max(1) }
    }

    fn run_one<C: Candidate>(&self, pool: &[C], comparator: &FitnessComparator) -> usize {
        let contestants = random_provider::sample_indices(pool.len(), self.size);
        contestants
            .into_iter()
            .reduce(|best, challenger| self.better(pool, comparator, best, challenger))
            .expect("pool is non-empty, sample_indices returns at least one index")
    }

    fn better<C: Candidate>(
        &self,
        pool: &[C],
        comparator: &FitnessComparator,
        a: usize,
        b: usize,
    ) -> usize {
        match comparator.compare(pool[a].fitness(), pool[b].fitness()) {
            Ordering::Greater => a,
            Ordering::Less => b,
            Ordering::Equal => match pool[a].age().cmp(&pool[b].age()) {
                Ordering::Less => a,
                Ordering::Greater => b,
                Ordering::Equal => {
                    if random_provider::bool(0.5) {
                        a
                    } else {
                        b
                    }
                }
            },
        }
    }
}

impl<C: Candidate> Select<C> for TournamentSelector {
    fn select(&self, pool: &[C], count: usize, comparator: &FitnessComparator) -> Vec<usize> {
        if pool.is_empty() {
            return Vec::new();
        }
        (0..count).map(|_| self.run_one(pool, comparator)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroevolve_core::prelude::Fitness;

    struct Member {
        fitness: Fitness,
        age: usize,
    }

    impl Candidate for Member {
        fn fitness(&self) -> &Fitness {
            &self.fitness
        }

        fn age(&self) -> usize {
            self.age
        }
    }

    #[test]
    fn large_tournaments_tend_to_pick_the_best_member() {
        let pool = vec![
            Member { fitness: Fitness::scalar(1.0), age: 0 },
            Member { fitness: Fitness::scalar(2.0), age: 0 },
            Member { fitness: Fitness::scalar(100.0), age: 0 },
        ];
        let selector = TournamentSelector::new(3);
        let chosen = selector.select(&pool, 1, &FitnessComparator::default());
        assert_eq!(chosen, vec![2]);
    }

    #[test]
    fn select_returns_requested_count() {
        let pool = vec![
            Member { fitness: Fitness::scalar(1.0), age: 0 },
            Member { fitness: Fitness::scalar(2.0), age: 0 },
        ];
        let selector = TournamentSelector::new(2);
        let chosen = selector.select(&pool, 5, &FitnessComparator::default());
        assert_eq!(chosen.len(), 5);
    }

    #[test]
    fn a_full_size_tournament_never_repeats_a_contestant() {
        let pool: Vec<Member> = (0..5)
            .map(|i| Member { fitness: Fitness::scalar(i as f64), age: 0 })
            .collect();
        let selector = TournamentSelector::new(5);
        // size == pool.len(), so the tournament is deterministic: the fittest always wins.
        let chosen = selector.select(&pool, 20, &FitnessComparator::default());
        assert!(chosen.iter().all(|&i| i == 4));
    }
}
