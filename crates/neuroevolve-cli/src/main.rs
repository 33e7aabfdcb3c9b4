mod error;
mod tasks;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use neuroevolve_engines::{EngineConfig, ExperimentManager, ExportFormat, RunStatus};

use crate::error::CliError;

/// Command-line runner for the neuroevolve engine.
#[derive(Parser, Debug)]
#[command(name = "neuroevolve", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start (or, with `--resume`, continue) an experiment.
    Run {
        /// TOML file holding the `EngineConfig`.
        #[arg(long)]
        config: PathBuf,
        /// Built-in task to evolve against, see the `tasks` command for the list.
        #[arg(long)]
        task: String,
        /// Number of independent runs to perform.
        #[arg(long, default_value_t = 1)]
        runs: usize,
        /// Where to read an existing checkpoint from and write progress back to.
        #[arg(long)]
        checkpoint: PathBuf,
        /// Resume from `--checkpoint` instead of starting a fresh experiment.
        #[arg(long, default_value_t = false)]
        resume: bool,
        /// Poll for this file's existence and stop the experiment as soon as it appears, in
        /// addition to the usual Ctrl+C handling.
        #[arg(long)]
        stop_file: Option<PathBuf>,
    },
    /// List the built-in task environments `run --task` accepts.
    Tasks,
    /// Print the status of every run in a checkpointed experiment.
    Status {
        #[arg(long)]
        checkpoint: PathBuf,
        /// Restrict the report to a single run.
        #[arg(long)]
        run: Option<usize>,
    },
    /// Export a checkpointed experiment's history to a file.
    Export {
        #[arg(long)]
        checkpoint: PathBuf,
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Request that a running experiment stop by creating its stop file.
    Stop {
        #[arg(long)]
        stop_file: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Json,
    Binary,
    Csv,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => ExportFormat::Json,
            Format::Binary => ExportFormat::Binary,
            Format::Csv => ExportFormat::Csv,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    tracing::info!(command = ?cli.command, "dispatching command");
    if let Err(err) = run(cli.command) {
        tracing::error!(error = %err, "command failed");
        std::process::exit(err.exit_code());
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Run {
            config,
            task,
            runs,
            checkpoint,
            resume,
            stop_file,
        } => run_experiment(&config, &task, runs, &checkpoint, resume, stop_file.as_deref()),
        Command::Tasks => {
            for name in tasks::NAMES {
                println!("{name}");
            }
            Ok(())
        }
        Command::Status { checkpoint, run } => print_status(&checkpoint, run),
        Command::Export { checkpoint, out, format } => {
            let experiment = ExperimentManager::resume(&checkpoint)?;
            experiment.export(&out, format.into())?;
            println!("exported to {}", out.display());
            Ok(())
        }
        Command::Stop { stop_file } => {
            std::fs::write(&stop_file, b"stop")?;
            println!("requested stop via {}", stop_file.display());
            Ok(())
        }
    }
}

fn run_experiment(
    config_path: &PathBuf,
    task: &str,
    runs: usize,
    checkpoint_path: &PathBuf,
    resume: bool,
    stop_file: Option<&std::path::Path>,
) -> Result<(), CliError> {
    let experiment = if resume && checkpoint_path.exists() {
        tracing::info!(path = %checkpoint_path.display(), "resuming experiment");
        ExperimentManager::resume(checkpoint_path)?
    } else {
        let config = EngineConfig::load(config_path).map_err(neuroevolve_error::NeuroError::from)?;
        config.validate().map_err(neuroevolve_error::NeuroError::from)?;
        ExperimentManager::new(config, runs)
    };

    let scape = tasks::by_name(task, experiment.config().population_size)
        .ok_or_else(|| CliError::UnknownTask(task.to_string()))?;

    let tokens = experiment.stop_tokens();
    let ctrlc_tokens = tokens.clone();
    ctrlc::set_handler(move || {
        tracing::info!("interrupt received, stopping after the current generation");
        for token in &ctrlc_tokens {
            token.store(true, Ordering::Relaxed);
        }
    })
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let experiment = Arc::new(Mutex::new(experiment));
    let handle = {
        let experiment = Arc::clone(&experiment);
        let checkpoint_path = checkpoint_path.clone();
        std::thread::spawn(move || {
            experiment
                .lock()
                .expect("experiment lock poisoned")
                .run_all_resumable(scape, &checkpoint_path);
        })
    };

    if let Some(stop_file) = stop_file {
        while !handle.is_finished() {
            if stop_file.exists() {
                tracing::info!(path = %stop_file.display(), "stop file seen, requesting stop");
                for token in &tokens {
                    token.store(true, Ordering::Relaxed);
                }
                break;
            }
            std::thread::sleep(Duration::from_millis(200));
        }
    }
    handle.join().expect("experiment thread panicked");

    let experiment = Arc::try_unwrap(experiment)
        .map_err(|_| ())
        .expect("only this thread holds the experiment once run_all returns")
        .into_inner()
        .expect("experiment lock poisoned");

    experiment.checkpoint(checkpoint_path)?;
    report(&experiment);
    Ok(())
}

fn print_status(checkpoint_path: &PathBuf, run: Option<usize>) -> Result<(), CliError> {
    let experiment = ExperimentManager::resume(checkpoint_path)?;
    match run {
        Some(index) => {
            let status = experiment
                .status(index)
                .ok_or_else(|| CliError::RunIndexOutOfRange {
                    index,
                    runs: experiment.list_all().len(),
                })?;
            println!("run {index}: {status:?}");
        }
        None => report(&experiment),
    }
    Ok(())
}

fn report(experiment: &ExperimentManager) {
    for record in experiment.list_all() {
        let generations = record.history.len();
        let best = record.best.as_ref().map(|m| m.fitness.primary());
        println!(
            "run {}: {:?} ({generations} generations, best = {})",
            record.run_index,
            record.status,
            best.map_or("none".to_string(), |f| format!("{f:.4}")),
        );
    }
    if let Some(best) = experiment.best_solution() {
        println!("overall best fitness: {:.4}", best.fitness.primary());
    }
    let completed = experiment
        .list_all()
        .iter()
        .filter(|r| r.status == RunStatus::Completed)
        .count();
    println!("{completed}/{} runs completed", experiment.list_all().len());

    let summary = experiment.summary();
    println!(
        "fitness: mean {:.4}, median {:.4}, std dev {:.4}",
        summary.mean_fitness, summary.median_fitness, summary.fitness_std_dev
    );
    if let Some(generations) = summary.mean_generations_to_target {
        println!("mean generations to target: {generations:.2}");
    }
}
