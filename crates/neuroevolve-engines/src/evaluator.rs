use rayon::prelude::*;

use neuroevolve_core::prelude::{run_episode, Cortex, Fitness, Scape};
use neuroevolve_error::EvaluationError;

use crate::member::Member;
use crate::worker_pool::WorkerPool;

/// Compiles each population member into a [`Cortex`] and drives it through a [`Scape`] episode
/// across the worker pool, one genotype per task. A member's index in the population is used as
/// its `agent_id`.
pub struct Evaluator {
    pool: WorkerPool,
    storm_threshold: f32,
    max_steps: usize,
}

impl Evaluator {
    pub fn new(workers: usize, storm_threshold: f32, max_steps: usize) -> Self {
        Evaluator {
            pool: WorkerPool::new(workers),
            storm_threshold,
            max_steps,
        }
    }

    /// Evaluates every member in place. Individual scape failures are logged and scored as the
    /// worst possible fitness rather than aborting the generation; only when the failing
    /// fraction crosses `storm_threshold` is the whole call failed with
    /// [`EvaluationError::EvaluationStorm`], leaving fitness values from this call unassigned.
    pub fn evaluate(&self, members: &mut [Member], scape: &dyn Scape) -> Result<(), EvaluationError> {
        let total = members.len();
        if total == 0 {
            return Ok(());
        }

        let max_steps = self.max_steps;
        let results: Vec<Result<Fitness, EvaluationError>> = self.pool.install(|| {
            members
                .par_iter()
                .enumerate()
                .map(|(agent_id, member)| {
                    let mut cortex = Cortex::compile(&member.genotype);
                    run_episode(&mut cortex, scape, agent_id, max_steps)
                })
                .collect()
        });

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed as f32 / total as f32 > self.storm_threshold {
            tracing::error!(failed, total, "evaluation storm, aborting generation");
            return Err(EvaluationError::EvaluationStorm { failed, total });
        }

        for (member, result) in members.iter_mut().zip(results.into_iter()) {
            member.fitness = match result {
                Ok(fitness) => fitness,
                Err(err) => {
                    tracing::warn!(error = %err, "scape evaluation failed, scoring as worst fitness");
                    Fitness::scalar(f64::NEG_INFINITY)
                }
            };
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroevolve_core::prelude::{ActivationKind, Aggregation, EpisodeSummary, Genotype, Layer, StepOutcome};

    fn genotype() -> Genotype {
        let mut g = Genotype::new(0);
        let i = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let o = g.add_neuron(Layer::Output, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        g.add_connection(i, o, 2.0).unwrap();
        g
    }

    struct OneShot;

    impl Scape for OneShot {
        fn reset(&self, _agent_id: usize) -> Result<Vec<f64>, EvaluationError> {
            Ok(vec![1.0])
        }

        fn step(&self, _agent_id: usize, action: &[f64]) -> Result<StepOutcome, EvaluationError> {
            Ok(StepOutcome {
                observation: vec![0.0],
                reward: action[0],
                terminal: true,
            })
        }

        fn score(&self, summary: &EpisodeSummary) -> Fitness {
            Fitness::scalar(summary.total_reward)
        }
    }

    struct AlwaysFails;

    impl Scape for AlwaysFails {
        fn reset(&self, agent_id: usize) -> Result<Vec<f64>, EvaluationError> {
            Err(EvaluationError::ScapeError {
                agent_id: agent_id.to_string(),
                message: "boom".into(),
            })
        }

        fn step(&self, _agent_id: usize, _action: &[f64]) -> Result<StepOutcome, EvaluationError> {
            unreachable!("reset always fails first")
        }
    }

    #[test]
    fn evaluates_every_member() {
        let evaluator = Evaluator::new(2, 0.5, 1);
        let mut members: Vec<Member> = (0..4).map(|_| Member::new(genotype())).collect();

        evaluator.evaluate(&mut members, &OneShot).unwrap();
        assert!(members.iter().all(|m| m.fitness.primary() == 2.0));
    }

    #[test]
    fn storm_threshold_aborts_the_generation() {
        let evaluator = Evaluator::new(2, 0.1, 1);
        let mut members: Vec<Member> = (0..4).map(|_| Member::new(genotype())).collect();

        assert!(evaluator.evaluate(&mut members, &AlwaysFails).is_err());
    }
}
