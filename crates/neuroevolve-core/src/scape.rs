use neuroevolve_error::EvaluationError;

use crate::objectives::Fitness;
use crate::phenotype::Cortex;

/// What a scape hands back from one `step` call.
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    pub observation: Vec<f64>,
    pub reward: f64,
    pub terminal: bool,
}

/// What actually happened over an episode, reduced by [`Scape::score`] into a fitness.
#[derive(Debug, Clone, Default)]
pub struct EpisodeSummary {
    pub total_reward: f64,
    pub step_count: usize,
    pub terminal: bool,
}

/// A task environment a phenotype is driven against one step at a time: `reset` starts an
/// episode, `step` advances it by one action, and `score` reduces the finished episode to a
/// fitness. `agent_id` distinguishes concurrent episodes against a scape that keeps its own
/// per-agent state (e.g. separate physics worlds per population member); a stateless scape can
/// ignore it.
///
/// Implementations must be safe to call from multiple worker threads concurrently; every method
/// takes `&self`, so scape-internal state shared across evaluations needs its own
/// synchronization.
pub trait Scape: Send + Sync {
    fn reset(&self, agent_id: usize) -> Result<Vec<f64>, EvaluationError>;

    fn step(&self, agent_id: usize, action: &[f64]) -> Result<StepOutcome, EvaluationError>;

    /// Pull-style auxiliary observation outside the reset/step loop. Defaults to reporting
    /// nothing extra; only scapes that expose secondary senses need to override this.
    fn sense(&self, _agent_id: usize, _kind: &str) -> Result<Vec<f64>, EvaluationError> {
        Ok(Vec::new())
    }

    /// Reduces a finished episode to a fitness vector. Defaults to the accumulated reward as a
    /// single-objective scalar.
    fn score(&self, summary: &EpisodeSummary) -> Fitness {
        Fitness::scalar(summary.total_reward)
    }

    /// A human-readable label used in tracing spans and exported records.
    fn name(&self) -> &str {
        "scape"
    }
}

/// Drives one full episode: reset, then `cortex.activate(observation) -> action`, `scape.step`,
/// repeat until the scape reports `terminal` or `max_steps` is reached, then scores the episode.
/// A step count hitting `max_steps` without `terminal` is a timeout, not a failure.
pub fn run_episode(
    cortex: &mut Cortex,
    scape: &dyn Scape,
    agent_id: usize,
    max_steps: usize,
) -> Result<Fitness, EvaluationError> {
    cortex.reset();
    let mut observation = scape.reset(agent_id)?;
    let mut summary = EpisodeSummary::default();

    for _ in 0..max_steps {
        let action = cortex
            .activate(&observation)
            .map_err(|e| EvaluationError::ScapeError {
                agent_id: agent_id.to_string(),
                message: e.to_string(),
            })?;
        let outcome = scape.step(agent_id, action)?;

        summary.total_reward += outcome.reward;
        summary.step_count += 1;
        observation = outcome.observation;

        if outcome.terminal {
            summary.terminal = true;
            break;
        }
    }

    if !summary.terminal {
        tracing::trace!(agent_id, steps = summary.step_count, scape = scape.name(), "episode timed out");
    }

    Ok(scape.score(&summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::{Aggregation, ActivationKind};
    use crate::genome::{Genotype, Layer};

    struct OneShotSum;

    impl Scape for OneShotSum {
        fn reset(&self, _agent_id: usize) -> Result<Vec<f64>, EvaluationError> {
            Ok(vec![1.0])
        }

        fn step(&self, _agent_id: usize, action: &[f64]) -> Result<StepOutcome, EvaluationError> {
            Ok(StepOutcome {
                observation: vec![0.0],
                reward: action.iter().sum(),
                terminal: true,
            })
        }
    }

    fn identity_genotype() -> Genotype {
        let mut g = Genotype::new(0);
        let i = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let o = g.add_neuron(Layer::Output, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        g.add_connection(i, o, 1.0).unwrap();
        g
    }

    #[test]
    fn run_episode_stops_at_the_first_terminal_step() {
        let g = identity_genotype();
        let mut cortex = Cortex::compile(&g);

        let fitness = run_episode(&mut cortex, &OneShotSum, 0, 10).unwrap();
        assert_eq!(fitness.primary(), 1.0);
    }

    struct CountToThree;

    impl Scape for CountToThree {
        fn reset(&self, _agent_id: usize) -> Result<Vec<f64>, EvaluationError> {
            Ok(vec![1.0])
        }

        fn step(&self, _agent_id: usize, action: &[f64]) -> Result<StepOutcome, EvaluationError> {
            Ok(StepOutcome {
                observation: vec![1.0],
                reward: action[0],
                terminal: false,
            })
        }
    }

    #[test]
    fn run_episode_times_out_at_max_steps_without_failing() {
        let g = identity_genotype();
        let mut cortex = Cortex::compile(&g);

        let fitness = run_episode(&mut cortex, &CountToThree, 0, 3).unwrap();
        assert_eq!(fitness.primary(), 3.0);
    }
}
