use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use neuroevolve_core::prelude::{random_provider, GenerationStats, Metric, Scape};
use neuroevolve_error::NeuroError;

use crate::config::EngineConfig;
use crate::member::Member;
use crate::population_manager::PopulationManager;

#[cfg(feature = "persistence")]
use neuroevolve_error::PersistenceError;
#[cfg(feature = "persistence")]
use std::path::Path;

/// Lifecycle of one run within an [`ExperimentManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Stopped,
    Failed,
}

/// Everything recorded about one run by the time it stops, however it stopped.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunRecord {
    pub run_index: usize,
    pub status: RunStatus,
    pub history: Vec<GenerationStats>,
    pub best: Option<Member>,
}

/// Runs the same configuration `runs` times, each with its own deterministically derived seed,
/// and aggregates the results. This is the surface the CLI's `run`/`status`/`stop`/`export`
/// commands are built on.
pub struct ExperimentManager {
    config: EngineConfig,
    runs: usize,
    records: Vec<RunRecord>,
    stop_flags: Vec<Arc<AtomicBool>>,
}

impl ExperimentManager {
    pub fn new(config: EngineConfig, runs: usize) -> Self {
        let records = (0..runs)
            .map(|run_index| RunRecord {
                run_index,
                status: RunStatus::Pending,
                history: Vec::new(),
                best: None,
            })
            .collect();
        let stop_flags = (0..runs).map(|_| Arc::new(AtomicBool::new(false))).collect();

        ExperimentManager {
            config,
            runs,
            records,
            stop_flags,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Requests that a run stop at its next generation boundary. Best-effort: a run already
    /// mid-evaluation finishes that generation first.
    pub fn stop(&self, run_index: usize) {
        if let Some(flag) = self.stop_flags.get(run_index) {
            flag.store(true, Ordering::Relaxed);
        }
    }

    pub fn status(&self, run_index: usize) -> Option<RunStatus> {
        self.records.get(run_index).map(|r| r.status)
    }

    /// Clones of every run's stop flag, ordered by run index. A caller can hold these
    /// independently of `&self` (e.g. in a Ctrl+C handler) and set them while [`Self::run_all`]
    /// is borrowing `self` mutably.
    pub fn stop_tokens(&self) -> Vec<Arc<AtomicBool>> {
        self.stop_flags.clone()
    }

    pub fn list_all(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn list_active(&self) -> Vec<&RunRecord> {
        self.records
            .iter()
            .filter(|r| r.status == RunStatus::Running)
            .collect()
    }

    /// The fittest genotype across every completed (or stopped-with-progress) run.
    pub fn best_solution(&self) -> Option<&Member> {
        self.records
            .iter()
            .filter_map(|r| r.best.as_ref())
            .max_by(|a, b| self.config.fitness_comparator.compare(a.fitness(), b.fitness()))
    }

    /// Runs every configured run to completion, to a stop request, or to an unrecoverable
    /// evaluation error, in turn. A run that errors is marked `Failed` rather than aborting the
    /// remaining runs. Runs already `Completed` (as restored by [`Self::resume`]) are skipped, so
    /// resuming a finished experiment is a no-op and resuming a partial one only continues the
    /// runs that didn't finish.
    pub fn run_all(&mut self, scape: Arc<dyn Scape>) {
        self.run_all_checkpointing(scape, None);
    }

    /// Like [`Self::run_all`], but writes a checkpoint to `checkpoint_path` every
    /// `config.checkpoint_interval` generations (in addition to once per run, regardless of
    /// interval, when that run stops).
    #[cfg(feature = "persistence")]
    pub fn run_all_resumable(&mut self, scape: Arc<dyn Scape>, checkpoint_path: &Path) {
        self.run_all_checkpointing(scape, Some(checkpoint_path));
    }

    fn run_all_checkpointing(&mut self, scape: Arc<dyn Scape>, checkpoint_path: Option<&std::path::Path>) {
        #[cfg(not(feature = "persistence"))]
        let _ = &checkpoint_path;

        for run_index in 0..self.runs {
            if self.records[run_index].status == RunStatus::Completed {
                tracing::info!(run_index, "run already completed, skipping");
                continue;
            }

            let _span = tracing::info_span!("run", run_index).entered();
            self.records[run_index].status = RunStatus::Running;
            let seed = random_provider::worker_seed(self.config.seed, run_index, 0, 0);
            let stop_flag = Arc::clone(&self.stop_flags[run_index]);
            let scape = Arc::clone(&scape);
            let config = self.config.clone();
            #[cfg(feature = "persistence")]
            let checkpoint_interval = self.config.checkpoint_interval;
            #[cfg(feature = "persistence")]
            let other_records = self.records.clone();

            let outcome: Result<RunRecord, NeuroError> = random_provider::scoped_seed(seed, || {
                let mut manager = PopulationManager::new(config.clone())?;
                manager.initialize();

                while !manager.is_terminated() {
                    if stop_flag.load(Ordering::Relaxed) {
                        return Ok(RunRecord {
                            run_index,
                            status: RunStatus::Stopped,
                            history: manager.history().to_vec(),
                            best: manager.best().cloned(),
                        });
                    }
                    manager.step(scape.as_ref())?;

                    #[cfg(feature = "persistence")]
                    if let Some(path) = checkpoint_path {
                        let due = checkpoint_interval > 0 && manager.generation() % checkpoint_interval == 0;
                        if due {
                            let mut snapshot = other_records.clone();
                            snapshot[run_index] = RunRecord {
                                run_index,
                                status: RunStatus::Running,
                                history: manager.history().to_vec(),
                                best: manager.best().cloned(),
                            };
                            if let Err(err) = write_checkpoint(path, &config, snapshot.len(), &snapshot) {
                                tracing::warn!(run_index, error = %err, "periodic checkpoint failed");
                            }
                        }
                    }
                }

                Ok(RunRecord {
                    run_index,
                    status: RunStatus::Completed,
                    history: manager.history().to_vec(),
                    best: manager.best().cloned(),
                })
            });

            self.records[run_index] = match outcome {
                Ok(record) => record,
                Err(err) => {
                    tracing::error!(run_index, error = %err, "run failed");
                    RunRecord {
                        run_index,
                        status: RunStatus::Failed,
                        history: Vec::new(),
                        best: None,
                    }
                }
            };

            #[cfg(feature = "persistence")]
            if let Some(path) = checkpoint_path {
                if let Err(err) = self.checkpoint(path) {
                    tracing::warn!(run_index, error = %err, "end-of-run checkpoint failed");
                }
            }
        }
    }

    /// Per-run best, mean, median, and standard deviation of final fitness, plus the mean number
    /// of generations taken to reach `config.fitness_target` across the runs that reached it.
    pub fn summary(&self) -> ExperimentSummary {
        let finals: Vec<f64> = self
            .records
            .iter()
            .filter_map(|r| r.best.as_ref())
            .map(|m| m.fitness.primary())
            .collect();

        let metric: Metric = finals.iter().copied().collect();
        let fitness = metric.summary();

        let mean_generations_to_target = self.config.fitness_target.and_then(|target| {
            let generations: Vec<f64> = self
                .records
                .iter()
                .filter_map(|r| r.history.iter().find(|s| s.best_fitness() >= target))
                .map(|s| s.generation as f64)
                .collect();
            if generations.is_empty() {
                None
            } else {
                Some(generations.iter().sum::<f64>() / generations.len() as f64)
            }
        });

        ExperimentSummary {
            runs: self.records.len(),
            best_fitness: if finals.is_empty() { None } else { Some(fitness.max) },
            mean_fitness: fitness.mean,
            median_fitness: median(&finals),
            fitness_std_dev: std_dev(&finals, fitness.mean),
            mean_generations_to_target,
        }
    }
}

/// Aggregate statistics across every run in an experiment, see [`ExperimentManager::summary`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExperimentSummary {
    pub runs: usize,
    pub best_fitness: Option<f64>,
    pub mean_fitness: f64,
    pub median_fitness: f64,
    pub fitness_std_dev: f64,
    pub mean_generations_to_target: Option<f64>,
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// On-disk format for [`ExperimentManager::export`].
#[cfg(feature = "persistence")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Binary,
    Csv,
}

#[cfg(feature = "persistence")]
impl ExperimentManager {
    pub fn export(&self, path: &Path, format: ExportFormat) -> Result<(), PersistenceError> {
        match format {
            ExportFormat::Json => {
                let json = serde_json::to_string_pretty(&self.records)
                    .map_err(|e| PersistenceError::Serde(e.to_string()))?;
                write_file(path, json.as_bytes())
            }
            ExportFormat::Binary => {
                let bytes = bincode::serialize(&self.records)
                    .map_err(|e| PersistenceError::Serde(e.to_string()))?;
                write_file(path, &bytes)
            }
            ExportFormat::Csv => self.export_csv(path),
        }
    }

    fn export_csv(&self, path: &Path) -> Result<(), PersistenceError> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| PersistenceError::Serde(e.to_string()))?;
        writer
            .write_record(["run", "generation", "best_fitness", "mean_fitness", "diversity"])
            .map_err(|e| PersistenceError::Serde(e.to_string()))?;

        for record in &self.records {
            for stats in &record.history {
                writer
                    .write_record([
                        record.run_index.to_string(),
                        stats.generation.to_string(),
                        stats.best_fitness().to_string(),
                        stats.mean_fitness().to_string(),
                        stats.diversity.to_string(),
                    ])
                    .map_err(|e| PersistenceError::Serde(e.to_string()))?;
            }
        }

        writer.flush().map_err(|e| PersistenceError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Serializes the full experiment state (config, every run record) to resume later.
    pub fn checkpoint(&self, path: &Path) -> Result<(), PersistenceError> {
        let result = write_checkpoint(path, &self.config, self.runs, &self.records);
        match &result {
            Ok(()) => tracing::info!(path = %path.display(), "checkpoint written"),
            Err(err) => tracing::warn!(path = %path.display(), error = %err, "checkpoint write failed"),
        }
        result
    }

    pub fn resume(path: &Path) -> Result<Self, PersistenceError> {
        let bytes = std::fs::read(path).map_err(|e| PersistenceError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let (config, runs, records): (EngineConfig, usize, Vec<RunRecord>) =
            bincode::deserialize(&bytes).map_err(|e| PersistenceError::Serde(e.to_string()))?;
        let stop_flags = (0..runs).map(|_| Arc::new(AtomicBool::new(false))).collect();

        Ok(ExperimentManager {
            config,
            runs,
            records,
            stop_flags,
        })
    }
}

#[cfg(feature = "persistence")]
fn write_file(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    std::fs::write(path, bytes).map_err(|e| PersistenceError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Serializes `(config, runs, records)` and writes it to `path`; the format [`ExperimentManager::resume`]
/// reads back. Shared by [`ExperimentManager::checkpoint`] and the periodic mid-run checkpoint in
/// [`ExperimentManager::run_all_checkpointing`].
#[cfg(feature = "persistence")]
fn write_checkpoint(
    path: &Path,
    config: &EngineConfig,
    runs: usize,
    records: &[RunRecord],
) -> Result<(), PersistenceError> {
    let payload = (config, runs, records);
    let bytes = bincode::serialize(&payload).map_err(|e| PersistenceError::Serde(e.to_string()))?;
    write_file(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroevolve_core::prelude::{Rate, Scape, StepOutcome};
    use neuroevolve_error::EvaluationError;

    use crate::config::SelectionConfig;

    struct SumScape;

    impl Scape for SumScape {
        fn reset(&self, _agent_id: usize) -> Result<Vec<f64>, EvaluationError> {
            Ok(vec![1.0, 1.0])
        }

        fn step(&self, _agent_id: usize, action: &[f64]) -> Result<StepOutcome, EvaluationError> {
            Ok(StepOutcome {
                observation: vec![0.0; action.len()],
                reward: action.iter().sum(),
                terminal: true,
            })
        }
    }

    fn small_config() -> EngineConfig {
        EngineConfig {
            population_size: 6,
            max_generations: 2,
            input_count: 2,
            output_count: 1,
            elitism_fraction: Rate::new(0.2),
            selection: SelectionConfig::Tournament { size: 2 },
            workers: 2,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn run_all_completes_every_run() {
        let mut manager = ExperimentManager::new(small_config(), 3);
        manager.run_all(Arc::new(SumScape));

        assert_eq!(manager.list_all().len(), 3);
        assert!(manager.list_all().iter().all(|r| r.status == RunStatus::Completed));
        assert!(manager.best_solution().is_some());
    }

    #[test]
    fn stopping_a_run_before_it_starts_marks_it_stopped_immediately() {
        let mut manager = ExperimentManager::new(small_config(), 1);
        manager.stop(0);
        manager.run_all(Arc::new(SumScape));
        assert_eq!(manager.status(0), Some(RunStatus::Stopped));
    }

    #[test]
    fn run_all_skips_runs_already_marked_completed() {
        let mut manager = ExperimentManager::new(small_config(), 2);
        manager.records[0] = RunRecord {
            run_index: 0,
            status: RunStatus::Completed,
            history: Vec::new(),
            best: None,
        };
        manager.run_all(Arc::new(SumScape));

        assert_eq!(manager.status(0), Some(RunStatus::Completed));
        assert!(manager.records[0].history.is_empty(), "the pre-seeded record must not be overwritten");
        assert_eq!(manager.status(1), Some(RunStatus::Completed));
        assert!(!manager.records[1].history.is_empty(), "the un-started run must actually run");
    }

    #[test]
    fn summary_reports_best_mean_and_spread_of_final_fitness() {
        let mut manager = ExperimentManager::new(small_config(), 4);
        manager.run_all(Arc::new(SumScape));

        let summary = manager.summary();
        assert_eq!(summary.runs, 4);
        assert!(summary.best_fitness.is_some());
        assert!(summary.mean_fitness.is_finite());
        assert!(summary.median_fitness.is_finite());
        assert!(summary.fitness_std_dev >= 0.0);
    }

    #[test]
    fn summary_tracks_generations_to_target_only_for_runs_that_reach_it() {
        let config = EngineConfig {
            fitness_target: Some(f64::NEG_INFINITY),
            ..small_config()
        };
        let mut manager = ExperimentManager::new(config, 2);
        manager.run_all(Arc::new(SumScape));

        let summary = manager.summary();
        assert_eq!(summary.mean_generations_to_target, Some(0.0));
    }
}
