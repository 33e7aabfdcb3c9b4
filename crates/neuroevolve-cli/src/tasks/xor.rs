use std::sync::atomic::{AtomicUsize, Ordering};

use neuroevolve_core::prelude::{Scape, StepOutcome};
use neuroevolve_error::EvaluationError;

const CASES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

/// Steps a phenotype through all four XOR cases within one episode. `step_per_agent` tracks how
/// far each population member has progressed through the case list, since `Scape::step` takes
/// `&self`. Requires `max_steps_per_episode` of at least [`Xor::CASE_COUNT`].
pub struct Xor {
    step_per_agent: Vec<AtomicUsize>,
}

impl Xor {
    pub const CASE_COUNT: usize = CASES.len();

    pub fn new(population_size: usize) -> Self {
        Xor {
            step_per_agent: (0..population_size).map(|_| AtomicUsize::new(0)).collect(),
        }
    }
}

impl Scape for Xor {
    fn reset(&self, agent_id: usize) -> Result<Vec<f64>, EvaluationError> {
        self.step_per_agent[agent_id].store(0, Ordering::Relaxed);
        Ok(CASES[0].0.to_vec())
    }

    fn step(&self, agent_id: usize, action: &[f64]) -> Result<StepOutcome, EvaluationError> {
        let case = self.step_per_agent[agent_id].fetch_add(1, Ordering::Relaxed);
        let expected = CASES[case].1;
        let error = (action[0] - expected).powi(2);

        let next_case = case + 1;
        let terminal = next_case >= CASES.len();
        let observation = if terminal {
            vec![0.0, 0.0]
        } else {
            CASES[next_case].0.to_vec()
        };

        Ok(StepOutcome {
            observation,
            reward: 1.0 - error,
            terminal,
        })
    }

    fn name(&self) -> &str {
        "xor"
    }
}
