#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use neuroevolve_core::prelude::{Fitness, Genotype};
use neuroevolve_selectors::Candidate;

/// One genotype's place in a [`crate::PopulationManager`]'s population: its genotype, its most
/// recent fitness, and how many generations it (or its lineage, through copy-and-mutate) has
/// survived.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Member {
    pub genotype: Genotype,
    pub fitness: Fitness,
    pub age: usize,
}

impl Member {
    pub fn new(genotype: Genotype) -> Self {
        Member {
            genotype,
            fitness: Fitness::scalar(f64::NEG_INFINITY),
            age: 0,
        }
    }
}

impl Candidate for Member {
    fn fitness(&self) -> &Fitness {
        &self.fitness
    }

    fn age(&self) -> usize {
        self.age
    }
}
