use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::objectives::Fitness;

/// How two [`Fitness`] values are ranked against each other. Defaults to `Lexicographic`: the
/// first objective decides unless it ties, in which case the next objective breaks the tie, and
/// so on. This is the cheapest thing that behaves sensibly for both the common single-objective
/// case and small multi-objective ones, without pulling in a Pareto-front machinery a scape may
/// never need.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FitnessComparator {
    Lexicographic,
    ScalarSum,
    WeightedSum(Vec<f64>),
}

impl Default for FitnessComparator {
    fn default() -> Self {
        FitnessComparator::Lexicographic
    }
}

impl FitnessComparator {
    /// `Ordering::Greater` means `a` is fitter than `b`. NaN components compare as the least
    /// fit value so a single bad evaluation can't silently win a comparison.
    pub fn compare(&self, a: &Fitness, b: &Fitness) -> Ordering {
        match self {
            FitnessComparator::Lexicographic => {
                for (x, y) in a.values().iter().zip(b.values().iter()) {
                    match cmp_f64(*x, *y) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }
                a.values().len().cmp(&b.values().len())
            }
            FitnessComparator::ScalarSum => {
                cmp_f64(a.values().iter().sum(), b.values().iter().sum())
            }
            FitnessComparator::WeightedSum(weights) => {
                let score = |f: &Fitness| -> f64 {
                    f.values()
                        .iter()
                        .zip(weights.iter())
                        .map(|(v, w)| v * w)
                        .sum()
                };
                cmp_f64(score(a), score(b))
            }
        }
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicographic_breaks_ties_on_second_objective() {
        let cmp = FitnessComparator::Lexicographic;
        let a = Fitness::new(vec![1.0, 2.0]);
        let b = Fitness::new(vec![1.0, 3.0]);
        assert_eq!(cmp.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn nan_is_always_least_fit() {
        let cmp = FitnessComparator::Lexicographic;
        let nan = Fitness::scalar(f64::NAN);
        let ok = Fitness::scalar(-100.0);
        assert_eq!(cmp.compare(&nan, &ok), Ordering::Less);
    }

    #[test]
    fn weighted_sum_respects_weights() {
        let cmp = FitnessComparator::WeightedSum(vec![1.0, 10.0]);
        let a = Fitness::new(vec![5.0, 0.0]);
        let b = Fitness::new(vec![0.0, 1.0]);
        assert_eq!(cmp.compare(&a, &b), Ordering::Less);
    }
}
