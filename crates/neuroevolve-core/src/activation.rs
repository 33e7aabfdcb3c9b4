//! The closed set of activation functions a [`Neuron`](crate::genome::Neuron) may carry
//! Every function is pure, total, and clamps its input before calling into
//! `exp` so that no finite input can produce `NaN`/`Inf`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inputs are clamped into this range before `exp`-based functions are applied. Beyond this
/// range `sigmoid`/`gaussian` have already saturated to their limit value in `f64`, so clamping
/// changes no observable output.
const SAFE_EXP_RANGE: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ActivationKind {
    Identity,
    Sigmoid,
    Tanh,
    Relu,
    Step,
    Gaussian,
    Sin,
}

impl ActivationKind {
    pub const ALL: [ActivationKind; 7] = [
        ActivationKind::Identity,
        ActivationKind::Sigmoid,
        ActivationKind::Tanh,
        ActivationKind::Relu,
        ActivationKind::Step,
        ActivationKind::Gaussian,
        ActivationKind::Sin,
    ];

    /// Applies the activation function to `x`, clamping inputs to [`SAFE_EXP_RANGE`] first so
    /// the result is always finite.
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        let x = x.clamp(-SAFE_EXP_RANGE, SAFE_EXP_RANGE);
        match self {
            ActivationKind::Identity => x,
            ActivationKind::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationKind::Tanh => x.tanh(),
            ActivationKind::Relu => x.max(0.0),
            ActivationKind::Step => {
                if x >= 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ActivationKind::Gaussian => (-x * x).exp(),
            ActivationKind::Sin => x.sin(),
        }
    }

    /// Picks a uniformly random activation tag from the allowed set, used by
    /// `mutate_activation` and `add_neuron`.
    pub fn sample_from(allowed: &[ActivationKind]) -> ActivationKind {
        *crate::domain::random_provider::choose(allowed)
    }
}

impl Default for ActivationKind {
    fn default() -> Self {
        ActivationKind::Identity
    }
}

/// Aggregation rule applied to a neuron's incoming signals before the activation function.
/// `DotProduct` (weight * upstream activation, summed) is the only tag currently implemented;
/// the type is open so alternate aggregations can be added without touching [`Neuron`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Aggregation {
    DotProduct,
}

impl Aggregation {
    #[inline]
    pub fn aggregate(self, weighted_inputs: impl Iterator<Item = f64>) -> f64 {
        match self {
            Aggregation::DotProduct => weighted_inputs.sum(),
        }
    }
}

impl Default for Aggregation {
    fn default() -> Self {
        Aggregation::DotProduct
    }
}
