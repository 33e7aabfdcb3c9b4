use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::stats::MetricSummary;

/// Everything recorded about one completed generation: a single value that a
/// population manager can append to a run's history, checkpoint, and export.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenerationStats {
    pub generation: usize,
    pub fitness: MetricSummary,
    pub neuron_count: MetricSummary,
    pub connection_count: MetricSummary,
    /// Mean pairwise structural distance across the population, see
    /// [`crate::stats::diversity`].
    pub diversity: f64,
    pub duration: Duration,
}

impl GenerationStats {
    pub fn best_fitness(&self) -> f64 {
        self.fitness.max
    }

    pub fn mean_fitness(&self) -> f64 {
        self.fitness.mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_and_mean_read_from_the_fitness_summary() {
        let stats = GenerationStats {
            generation: 4,
            fitness: MetricSummary {
                count: 10,
                mean: 3.0,
                min: 1.0,
                max: 9.0,
            },
            neuron_count: MetricSummary {
                count: 10,
                mean: 6.0,
                min: 4.0,
                max: 8.0,
            },
            connection_count: MetricSummary {
                count: 10,
                mean: 10.0,
                min: 5.0,
                max: 16.0,
            },
            diversity: 0.42,
            duration: Duration::from_millis(12),
        };

        assert_eq!(stats.best_fitness(), 9.0);
        assert_eq!(stats.mean_fitness(), 3.0);
    }
}
