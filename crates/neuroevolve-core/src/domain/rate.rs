#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A probability in `[0.0, 1.0]`, used for every per-operator rate in the engine
/// (`mutate_weights`'s `p_w`, `elitism_fraction`, and friends).
///
/// Values outside the range are clamped rather than rejected: configuration parsing is where
/// out-of-range values are treated as hard errors (`ConfigError`); once a `Rate` exists it is
/// always valid to sample against.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct Rate(f32);

impl Rate {
    pub fn new(value: f32) -> Self {
        Rate(value.clamp(0.0, 1.0))
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Samples a Bernoulli trial with this probability using the thread-local RNG.
    pub fn sample(self) -> bool {
        super::random_provider::bool(self.0)
    }
}

impl From<f32> for Rate {
    fn from(value: f32) -> Self {
        Rate::new(value)
    }
}

impl From<f64> for Rate {
    fn from(value: f64) -> Self {
        Rate::new(value as f32)
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(Rate::new(-1.0).get(), 0.0);
        assert_eq!(Rate::new(2.0).get(), 1.0);
        assert_eq!(Rate::new(0.25).get(), 0.25);
    }

    #[test]
    fn zero_rate_never_samples_true() {
        let rate = Rate::new(0.0);
        for _ in 0..100 {
            assert!(!rate.sample());
        }
    }

    #[test]
    fn one_rate_always_samples_true() {
        let rate = Rate::new(1.0);
        for _ in 0..100 {
            assert!(rate.sample());
        }
    }
}
