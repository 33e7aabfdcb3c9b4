use neuroevolve_core::prelude::{random_provider, FitnessComparator};

use crate::candidate::Candidate;
use crate::select::Select;

/// Fitness-proportionate selection: each member's probability of being picked is proportional to
/// `max(0, fitness)`. If every member's fitness is non-positive, falls back to uniform selection.
/// Ignores `comparator` beyond its use elsewhere in the pipeline — roulette selection only makes
/// sense against a single scalar score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouletteSelector;

impl<C: Candidate> Select<C> for RouletteSelector {
    fn select(&self, pool: &[C], count: usize, _comparator: &FitnessComparator) -> Vec<usize> {
        if pool.is_empty() {
            return Vec::new();
        }

        let weights: Vec<f64> = pool.iter().map(|c| c.fitness().primary().max(0.0)).collect();
        let total: f64 = weights.iter().sum();

        if total <= 0.0 {
            return (0..count).map(|_| random_provider::range(0..pool.len())).collect();
        }

        (0..count)
            .map(|_| {
                let mut pick = random_provider::range(0.0..total);
                for (idx, weight) in weights.iter().enumerate() {
                    if pick < *weight {
                        return idx;
                    }
                    pick -= weight;
                }
                weights.len() - 1
            })
            .collect()
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
    fn all_zero_fitness_falls_back_to_uniform() {
        let pool = vec![Member(Fitness::scalar(0.0)), Member(Fitness::scalar(0.0))];
        let chosen = RouletteSelector.select(&pool, 10, &FitnessComparator::default());
        assert_eq!(chosen.len(), 10);
    }

    #[test]
    fn all_negative_fitness_falls_back_to_uniform() {
        let pool = vec![Member(Fitness::scalar(-3.0)), Member(Fitness::scalar(-1.0))];
        let chosen = RouletteSelector.select(&pool, 400, &FitnessComparator::default());
        let wins = chosen.iter().filter(|&&i| i == 1).count();
        assert!((150..250).contains(&wins), "expected roughly even split, got {wins}/400");
    }

    #[test]
    fn negative_fitness_members_get_zero_weight_among_positives() {
        let pool = vec![Member(Fitness::scalar(-5.0)), Member(Fitness::scalar(1000.0))];
        let chosen = RouletteSelector.select(&pool, 200, &FitnessComparator::default());
        assert!(chosen.iter().all(|&i| i == 1));
    }

    #[test]
    fn a_dominant_fitness_wins_most_draws() {
        let pool = vec![Member(Fitness::scalar(0.0)), Member(Fitness::scalar(1000.0))];
        let chosen = RouletteSelector.select(&pool, 200, &FitnessComparator::default());
        let wins = chosen.iter().filter(|&&i| i == 1).count();
        assert!(wins > 150);
    }
}
