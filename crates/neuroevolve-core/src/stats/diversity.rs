use crate::genome::Genotype;

/// A cheap structural distance between two genotypes, used in place of species tracking.
///
/// Genotypes carry no global innovation numbering, so connections in two genotypes can't be
/// matched gene-for-gene the way NEAT compatibility distance does; instead this combines the
/// difference in neuron/connection counts with the difference in mean connection weight, which
/// is enough to tell a population that has collapsed onto one topology from one that hasn't.
pub fn pairwise_distance(a: &Genotype, b: &Genotype) -> f64 {
    let neuron_delta = (a.len_neurons() as f64 - b.len_neurons() as f64).abs();
    let connection_delta = (a.len_connections() as f64 - b.len_connections() as f64).abs();
    let weight_delta = (mean_weight(a) - mean_weight(b)).abs();
    neuron_delta + connection_delta + weight_delta
}

fn mean_weight(g: &Genotype) -> f64 {
    let weights: Vec<f64> = g.connections().map(|(_, c)| c.weight()).collect();
    if weights.is_empty() {
        0.0
    } else {
        weights.iter().sum::<f64>() / weights.len() as f64
    }
}

/// Mean pairwise distance across a population, the figure reported as `GenerationStats::diversity`.
/// `O(n^2)` in population size, acceptable at the population sizes this engine targets.
pub fn population_diversity(genotypes: &[Genotype]) -> f64 {
    if genotypes.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..genotypes.len() {
        for j in (i + 1)..genotypes.len() {
            total += pairwise_distance(&genotypes[i], &genotypes[j]);
            pairs += 1;
        }
    }
    total / pairs as f64
}
