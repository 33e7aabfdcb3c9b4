#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The score(s) a [`Scape`](crate::scape::Scape) assigns one evaluation. Most scapes report a
/// single objective, but the vector form lets a [`FitnessComparator`](crate::objectives::FitnessComparator)
/// compare on more than one criterion without the genome or evaluator caring which.
///
/// Every component is "higher is better"; a scape that naturally minimizes a cost should report
/// its negation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fitness(Vec<f64>);

impl Fitness {
    pub fn new(values: Vec<f64>) -> Self {
        Fitness(values)
    }

    pub fn scalar(value: f64) -> Self {
        Fitness(vec![value])
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// The first objective, the common case for single-objective scapes.
    pub fn primary(&self) -> f64 {
        self.0.first().copied().unwrap_or(f64::NEG_INFINITY)
    }
}

impl From<f64> for Fitness {
    fn from(value: f64) -> Self {
        Fitness::scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_reads_back_as_primary() {
        let f = Fitness::scalar(3.5);
        assert_eq!(f.primary(), 3.5);
        assert_eq!(f.get(1), None);
    }
}
