use neuroevolve_core::prelude::Fitness;

/// What a [`Select`](crate::Select) strategy needs to know about one population member, without
/// depending on however a population manager stores its genotypes.
pub trait Candidate {
    fn fitness(&self) -> &Fitness;
    /// Generations since this genotype was created, used by [`crate::TournamentSelector`] to
    /// break ties in favor of younger genotypes.
    fn age(&self) -> usize;
}
