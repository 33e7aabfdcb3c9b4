use std::time::{Duration, Instant};

use neuroevolve_alters::Mutator;
use neuroevolve_core::prelude::{
    diversity, random_provider, ActivationKind, Aggregation, GenerationStats, Genotype, Layer,
    Metric, Rate, Scape,
};
use neuroevolve_error::{ConfigError, EvaluationError};
use neuroevolve_selectors::{
    Candidate, EliteSelector, RouletteSelector, Select, TournamentSelector, TruncationSelector,
};

use crate::config::{EngineConfig, SelectionConfig};
use crate::evaluator::Evaluator;
use crate::member::Member;

/// Where a [`PopulationManager`] is in its generation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Idle,
    Initializing,
    Evaluating,
    Selecting,
    Terminated,
}

/// Builds, evaluates, and evolves one population across generations.
///
/// A manager is driven one generation at a time via [`PopulationManager::step`] rather than
/// running its whole loop internally, so a caller (an [`crate::ExperimentManager`] or a CLI
/// command) can observe state between generations, checkpoint, or stop early.
pub struct PopulationManager {
    config: EngineConfig,
    evaluator: Evaluator,
    mutator: Mutator,
    elite: EliteSelector,
    selector: Box<dyn Select<Member> + Send + Sync>,
    members: Vec<Member>,
    generation: usize,
    state: ManagerState,
    history: Vec<GenerationStats>,
    stopped: bool,
}

impl PopulationManager {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let evaluator = Evaluator::new(
            config.workers,
            config.evaluation_storm_threshold,
            config.max_steps_per_episode,
        );
        let mutator = Mutator::new(config.mutator.clone());
        let selector = selector_from_config(config.selection);

        Ok(PopulationManager {
            config,
            evaluator,
            mutator,
            elite: EliteSelector,
            selector,
            members: Vec::new(),
            generation: 0,
            state: ManagerState::Idle,
            history: Vec::new(),
            stopped: false,
        })
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds a fresh population of minimally connected genotypes (every input and bias neuron
    /// wired directly to every output, no hidden neurons), ready for the first `step`.
    pub fn initialize(&mut self) {
        self.state = ManagerState::Initializing;
        self.members = (0..self.config.population_size)
            .map(|_| Member::new(minimal_genotype(&self.config)))
            .collect();
        self.generation = 0;
        self.history.clear();
        self.stopped = false;
        self.state = ManagerState::Idle;
    }

    /// Requests that the run stop at the next generation boundary, checked by
    /// [`Self::is_terminated`]. Does not interrupt a generation already in progress.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, ManagerState::Terminated)
            || self.generation >= self.config.max_generations
            || self.stopped
            || self
                .best()
                .zip(self.config.fitness_target)
                .is_some_and(|(best, target)| best.fitness.primary() >= target)
    }

    pub fn best(&self) -> Option<&Member> {
        self.members
            .iter()
            .max_by(|a, b| self.config.fitness_comparator.compare(a.fitness(), b.fitness()))
    }

    /// Runs one full generation: evaluate, record stats, select parents, mutate, replace the
    /// population. Returns the stats just recorded, or the evaluation error that ended the run.
    pub fn step(&mut self, scape: &dyn Scape) -> Result<&GenerationStats, EvaluationError> {
        let start = Instant::now();
        let _span = tracing::info_span!("generation", generation = self.generation).entered();

        self.state = ManagerState::Evaluating;
        if let Err(err) = self.evaluator.evaluate(&mut self.members, scape) {
            self.state = ManagerState::Terminated;
            return Err(err);
        }

        let stats = self.collect_stats(start.elapsed());
        self.history.push(stats);

        self.state = ManagerState::Selecting;
        self.advance_generation();

        self.generation += 1;
        self.state = if self.is_terminated() {
            ManagerState::Terminated
        } else {
            ManagerState::Idle
        };

        Ok(self.history.last().expect("a generation was just recorded"))
    }

    fn collect_stats(&self, duration: Duration) -> GenerationStats {
        let fitness: Metric = self.members.iter().map(|m| m.fitness.primary()).collect();
        let neuron_count: Metric = self
            .members
            .iter()
            .map(|m| m.genotype.len_neurons() as f64)
            .collect();
        let connection_count: Metric = self
            .members
            .iter()
            .map(|m| m.genotype.len_connections() as f64)
            .collect();
        let genotypes: Vec<Genotype> = self.members.iter().map(|m| m.genotype.clone()).collect();

        GenerationStats {
            generation: self.generation,
            fitness: fitness.summary(),
            neuron_count: neuron_count.summary(),
            connection_count: connection_count.summary(),
            diversity: diversity::population_diversity(&genotypes),
            duration,
        }
    }

    fn advance_generation(&mut self) {
        let elite_count =
            ((self.members.len() as f32) * self.config.elitism_fraction.get()).round() as usize;
        let elite_indices =
            self.elite
                .select(&self.members, elite_count, &self.config.fitness_comparator);
        let mut elites: Vec<Member> = elite_indices
            .iter()
            .map(|&i| {
                let mut m = self.members[i].clone();
                m.age += 1;
                m
            })
            .collect();

        let remaining = self.config.population_size.saturating_sub(elites.len());
        let parent_indices =
            self.selector
                .select(&self.members, remaining, &self.config.fitness_comparator);

        let mut children: Vec<Member> = parent_indices
            .into_iter()
            .map(|i| {
                let mut genotype = self.members[i].genotype.clone();
                genotype.set_generation(self.generation + 1);
                self.mutator.mutate(&mut genotype);
                Member::new(genotype)
            })
            .collect();

        elites.append(&mut children);
        self.members = elites;
    }
}

fn selector_from_config(selection: SelectionConfig) -> Box<dyn Select<Member> + Send + Sync> {
    match selection {
        SelectionConfig::Tournament { size } => Box::new(TournamentSelector::new(size)),
        SelectionConfig::Truncation { fraction } => Box::new(TruncationSelector::new(fraction)),
        SelectionConfig::Roulette => Box::new(RouletteSelector),
    }
}

fn minimal_genotype(config: &EngineConfig) -> Genotype {
    let mut genotype = Genotype::new(0);

    let mut sources = Vec::with_capacity(config.input_count + 1);
    for _ in 0..config.input_count {
        sources.push(genotype.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct));
    }
    if config.use_bias {
        sources.push(genotype.add_neuron(Layer::Bias, ActivationKind::Identity, 0.0, Aggregation::DotProduct));
    }

    let outputs: Vec<_> = (0..config.output_count)
        .map(|_| genotype.add_neuron(Layer::Output, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct))
        .collect();

    for &source in &sources {
        for &output in &outputs {
            let weight = random_provider::gaussian(0.0, 1.0);
            let _ = genotype.add_connection(source, output, weight);
        }
    }

    genotype
}
