#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The role a neuron plays in its genotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Layer {
    Input,
    Bias,
    Hidden,
    Output,
}

impl Layer {
    /// No connection may target an `input` or `bias` neuron.
    pub fn can_be_connection_target(self) -> bool {
        matches!(self, Layer::Hidden | Layer::Output)
    }

    /// No connection may originate from an `output` neuron.
    pub fn can_be_connection_source(self) -> bool {
        matches!(self, Layer::Input | Layer::Bias | Layer::Hidden)
    }
}
