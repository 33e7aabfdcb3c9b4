use rayon::{ThreadPool, ThreadPoolBuilder};

/// A fixed-size worker pool genotypes are evaluated across. Built once per [`crate::Evaluator`]
/// rather than per generation, so thread spin-up cost is paid once per run.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("neuroevolve-worker-{i}"))
            .build()
            .expect("failed to build worker thread pool");
        WorkerPool { pool }
    }

    pub fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        self.pool.install(f)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}
