//! Thread-local random number source.
//!
//! Every call into the evolutionary loop goes through this module instead of touching `rand`
//! directly, so that a single `set_seed`/`scoped_seed` call makes an entire run reproducible
//! (seeds derive deterministically from
//! `(experiment_seed, run_index, generation, worker_id)`).

use rand::distributions::uniform::SampleUniform;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use std::cell::RefCell;
use std::ops::Range;
use std::sync::{Arc, Mutex, OnceLock};

fn global_rng() -> &'static Arc<Mutex<StdRng>> {
    static GLOBAL_RNG: OnceLock<Arc<Mutex<StdRng>>> = OnceLock::new();
    GLOBAL_RNG.get_or_init(|| Arc::new(Mutex::new(StdRng::from_entropy())))
}

thread_local! {
    static TLS_RNG: RefCell<StdRng> = RefCell::new({
        let mut global = global_rng().lock().unwrap();
        StdRng::seed_from_u64(global.next_u64())
    });
}

/// Seeds the global RNG; every thread spawned afterwards derives its local RNG from it.
pub fn set_seed(seed: u64) {
    let mut global = global_rng().lock().unwrap();
    *global = StdRng::seed_from_u64(seed);
}

/// Derives the deterministic per-worker seed.
pub fn worker_seed(experiment_seed: u64, run_index: usize, generation: usize, worker_id: usize) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    use std::hash::{Hash, Hasher};
    (experiment_seed, run_index as u64, generation as u64, worker_id as u64).hash(&mut hasher);
    hasher.finish()
}

/// Runs `f` with the thread-local RNG seeded to `seed` for the duration of the call, then
/// restores whatever state the thread-local RNG had before.
pub fn scoped_seed<R>(seed: u64, f: impl FnOnce() -> R) -> R {
    TLS_RNG.with(|cell| {
        let previous = {
            let mut rng = cell.borrow_mut();
            let previous = StdRng::from_rng(&mut *rng).expect("rng reseed");
            *rng = StdRng::seed_from_u64(seed);
            previous
        };

        let result = f();
        *cell.borrow_mut() = previous;
        result
    })
}

pub fn with_rng<R>(f: impl FnOnce(&mut StdRng) -> R) -> R {
    TLS_RNG.with(|cell| f(&mut cell.borrow_mut()))
}

pub fn random<T>() -> T
where
    rand::distributions::Standard: rand::distributions::Distribution<T>,
{
    with_rng(|rng| rng.gen())
}

pub fn bool(prob: f32) -> bool {
    with_rng(|rng| rng.gen_bool(prob.clamp(0.0, 1.0) as f64))
}

pub fn range<T>(range: Range<T>) -> T
where
    T: SampleUniform + PartialOrd,
{
    with_rng(|rng| rng.gen_range(range))
}

pub fn choose<T>(items: &[T]) -> &T {
    with_rng(|rng| items.choose(rng).expect("choose from non-empty slice"))
}

/// Box-Muller Gaussian sample with the given mean and standard deviation.
pub fn gaussian(mean: f64, std_dev: f64) -> f64 {
    with_rng(|rng| {
        let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = rng.gen_range(0.0..1.0);
        let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z0
    })
}

pub fn shuffle<T>(items: &mut [T]) {
    with_rng(|rng| items.shuffle(rng));
}

/// Samples `count` distinct indices from `0..len` without replacement.
pub fn sample_indices(len: usize, count: usize) -> Vec<usize> {
    with_rng(|rng| {
        let mut indices: Vec<usize> = (0..len).collect();
        indices.shuffle(rng);
        indices.truncate(count.min(len));
        indices
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_stays_in_bounds() {
        for _ in 0..200 {
            let v = range(0.0..100.0);
            assert!((0.0..100.0).contains(&v));
        }
    }

    #[test]
    fn scoped_seed_is_deterministic() {
        let a = scoped_seed(42, || (0..5).map(|_| range(0.0..1.0)).collect::<Vec<_>>());
        let b = scoped_seed(42, || (0..5).map(|_| range(0.0..1.0)).collect::<Vec<_>>());
        assert_eq!(a, b);
    }

    #[test]
    fn scoped_seed_restores_previous_state() {
        set_seed(7);
        // prime the thread-local RNG
        let _ = range::<f64>(0.0..1.0);
        let before = scoped_seed(1, || range::<f64>(0.0..1.0));
        let after = scoped_seed(1, || range::<f64>(0.0..1.0));
        assert_eq!(before, after);
    }

    #[test]
    fn sample_indices_are_distinct() {
        let idx = sample_indices(10, 4);
        assert_eq!(idx.len(), 4);
        let mut sorted = idx.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
    }

    #[test]
    fn worker_seed_is_deterministic_and_sensitive_to_each_field() {
        let s1 = worker_seed(1, 0, 0, 0);
        let s2 = worker_seed(1, 0, 0, 0);
        assert_eq!(s1, s2);
        assert_ne!(s1, worker_seed(1, 0, 0, 1));
        assert_ne!(s1, worker_seed(1, 0, 1, 0));
        assert_ne!(s1, worker_seed(1, 1, 0, 0));
        assert_ne!(s1, worker_seed(2, 0, 0, 0));
    }
}
