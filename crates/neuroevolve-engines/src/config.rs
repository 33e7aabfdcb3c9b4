#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use neuroevolve_alters::{MutationMode, MutatorConfig};
use neuroevolve_core::prelude::{ActivationKind, FitnessComparator, Rate};
use neuroevolve_error::ConfigError;

/// Which [`neuroevolve_selectors::Select`] strategy breeds the non-elite part of a generation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SelectionConfig {
    Tournament { size: usize },
    Truncation { fraction: Rate },
    Roulette,
}

/// Everything a [`crate::PopulationManager`] / [`crate::ExperimentManager`] needs to run,
/// normally loaded from a TOML file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    pub population_size: usize,
    pub max_generations: usize,
    pub input_count: usize,
    pub output_count: usize,
    pub use_bias: bool,
    /// Fraction of `population_size` carried over as elites, unmutated, each generation.
    pub elitism_fraction: Rate,
    pub selection: SelectionConfig,
    pub mutator: MutatorConfig,
    pub fitness_comparator: FitnessComparator,
    /// Fraction of a generation's evaluations that may fail (scape error or non-finite output)
    /// before the generation as a whole is reported as an evaluation storm.
    pub evaluation_storm_threshold: f32,
    /// Upper bound on steps per episode; an episode that never reports `terminal` is cut off
    /// here rather than run forever.
    pub max_steps_per_episode: usize,
    /// Generation loop stops early once the best fitness in a generation reaches this value, in
    /// addition to the usual `max_generations` bound.
    pub fitness_target: Option<f64>,
    pub seed: u64,
    pub workers: usize,
    /// How many independent runs an [`crate::ExperimentManager`] built from this config performs.
    pub runs_per_experiment: usize,
    /// How often, in generations, a running experiment writes a checkpoint. `0` disables
    /// per-generation checkpointing (the experiment is still checkpointed when it stops).
    pub checkpoint_interval: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            population_size: 150,
            max_generations: 100,
            input_count: 2,
            output_count: 1,
            use_bias: true,
            elitism_fraction: Rate::new(2.0 / 150.0),
            selection: SelectionConfig::Tournament { size: 3 },
            mutator: MutatorConfig {
                mutate_weights: Rate::new(0.8),
                mutate_bias: Rate::new(0.2),
                mutate_activation: Rate::new(0.05),
                add_connection: Rate::new(0.1),
                remove_connection: Rate::new(0.05),
                add_neuron: Rate::new(0.05),
                remove_neuron: Rate::new(0.02),
                perturb_std_dev: 0.5,
                allowed_activations: ActivationKind::ALL.to_vec(),
                mode: MutationMode::Independent,
            },
            fitness_comparator: FitnessComparator::default(),
            evaluation_storm_threshold: 0.5,
            max_steps_per_episode: 1,
            fitness_target: None,
            seed: 0,
            workers: 4,
            runs_per_experiment: 1,
            checkpoint_interval: 0,
        }
    }
}

impl EngineConfig {
    #[cfg(feature = "serde")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::ParseFailure(e.to_string()))
    }

    /// Loads a config from a TOML file, then applies [`Self::apply_env_overrides`].
    #[cfg(feature = "serde")]
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ParseFailure(format!("{}: {e}", path.display())))?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Overrides a small set of operational knobs from the environment, so a deployment can pin
    /// the seed or the worker count without editing a checked-in config file:
    /// `NEUROEVOLVE_SEED`, `NEUROEVOLVE_WORKERS`. Malformed values are ignored, not rejected.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(seed) = std::env::var("NEUROEVOLVE_SEED").and_then(|v| v.parse().map_err(|_| std::env::VarError::NotPresent)) {
            self.seed = seed;
        }
        if let Ok(workers) = std::env::var("NEUROEVOLVE_WORKERS").and_then(|v| v.parse().map_err(|_| std::env::VarError::NotPresent)) {
            self.workers = workers;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::InvalidField {
                field: "population_size",
                reason: "must be greater than zero".into(),
            });
        }
        if self.input_count == 0 || self.output_count == 0 {
            return Err(ConfigError::InvalidField {
                field: "input_count/output_count",
                reason: "a network needs at least one input and one output".into(),
            });
        }
        if let SelectionConfig::Tournament { size } = self.selection {
            if size == 0 {
                return Err(ConfigError::InvalidField {
                    field: "selection.size",
                    reason: "tournament size must be greater than zero".into(),
                });
            }
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidField {
                field: "workers",
                reason: "must be greater than zero".into(),
            });
        }
        if self.max_steps_per_episode == 0 {
            return Err(ConfigError::InvalidField {
                field: "max_steps_per_episode",
                reason: "must be greater than zero".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.evaluation_storm_threshold) {
            return Err(ConfigError::InvalidField {
                field: "evaluation_storm_threshold",
                reason: "must be within [0.0, 1.0]".into(),
            });
        }
        if self.runs_per_experiment == 0 {
            return Err(ConfigError::InvalidField {
                field: "runs_per_experiment",
                reason: "must be greater than zero".into(),
            });
        }
        if self.mutator.allowed_activations.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "mutator.allowed_activations",
                reason: "must name at least one activation kind".into(),
            });
        }
        Ok(())
    }
}

/// Fluent, programmatic alternative to writing a TOML file. Starts from [`EngineConfig::default`]
/// and validates on [`Self::build`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: EngineConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        ConfigBuilder {
            config: EngineConfig::default(),
        }
    }

    pub fn population_size(mut self, value: usize) -> Self {
        self.config.population_size = value;
        self
    }

    pub fn max_generations(mut self, value: usize) -> Self {
        self.config.max_generations = value;
        self
    }

    pub fn io_shape(mut self, input_count: usize, output_count: usize) -> Self {
        self.config.input_count = input_count;
        self.config.output_count = output_count;
        self
    }

    pub fn use_bias(mut self, value: bool) -> Self {
        self.config.use_bias = value;
        self
    }

    pub fn elitism_fraction(mut self, value: Rate) -> Self {
        self.config.elitism_fraction = value;
        self
    }

    pub fn selection(mut self, value: SelectionConfig) -> Self {
        self.config.selection = value;
        self
    }

    pub fn mutator(mut self, value: MutatorConfig) -> Self {
        self.config.mutator = value;
        self
    }

    pub fn fitness_comparator(mut self, value: FitnessComparator) -> Self {
        self.config.fitness_comparator = value;
        self
    }

    pub fn evaluation_storm_threshold(mut self, value: f32) -> Self {
        self.config.evaluation_storm_threshold = value;
        self
    }

    pub fn max_steps_per_episode(mut self, value: usize) -> Self {
        self.config.max_steps_per_episode = value;
        self
    }

    pub fn fitness_target(mut self, value: f64) -> Self {
        self.config.fitness_target = Some(value);
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.config.seed = value;
        self
    }

    pub fn workers(mut self, value: usize) -> Self {
        self.config.workers = value;
        self
    }

    pub fn runs_per_experiment(mut self, value: usize) -> Self {
        self.config.runs_per_experiment = value;
        self
    }

    pub fn checkpoint_interval(mut self, value: usize) -> Self {
        self.config.checkpoint_interval = value;
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_population_is_rejected() {
        let config = EngineConfig {
            population_size: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_size_tournament_is_rejected() {
        let config = EngineConfig {
            selection: SelectionConfig::Tournament { size: 0 },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_allowed_activations_is_rejected() {
        let config = EngineConfig {
            mutator: MutatorConfig {
                allowed_activations: Vec::new(),
                ..EngineConfig::default().mutator
            },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_applies_every_setter() {
        let config = ConfigBuilder::new()
            .population_size(50)
            .max_generations(10)
            .io_shape(3, 2)
            .elitism_fraction(Rate::new(0.1))
            .selection(SelectionConfig::Tournament { size: 2 })
            .seed(7)
            .workers(1)
            .max_steps_per_episode(4)
            .fitness_target(3.5)
            .runs_per_experiment(5)
            .checkpoint_interval(10)
            .build()
            .unwrap();

        assert_eq!(config.population_size, 50);
        assert_eq!(config.input_count, 3);
        assert_eq!(config.output_count, 2);
        assert_eq!(config.seed, 7);
        assert_eq!(config.fitness_target, Some(3.5));
        assert_eq!(config.runs_per_experiment, 5);
        assert_eq!(config.checkpoint_interval, 10);
    }

    #[test]
    fn builder_rejects_invalid_configs() {
        let result = ConfigBuilder::new().population_size(0).build();
        assert!(result.is_err());
    }
}
