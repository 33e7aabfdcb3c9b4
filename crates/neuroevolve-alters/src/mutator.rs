#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use neuroevolve_core::prelude::*;

use crate::mode::MutationMode;

/// Per-operator rates and parameters for a [`Mutator`]. Every rate defaults to 0.0 so building
/// one from `Default` and opting into the operators a caller actually wants is the common path.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MutatorConfig {
    pub mutate_weights: Rate,
    pub mutate_bias: Rate,
    pub mutate_activation: Rate,
    pub add_connection: Rate,
    pub remove_connection: Rate,
    pub add_neuron: Rate,
    pub remove_neuron: Rate,

    /// Standard deviation of the Gaussian perturbation applied to a single weight or bias.
    pub perturb_std_dev: f64,
    /// Activation tags `mutate_activation` and `add_neuron` may choose from.
    pub allowed_activations: Vec<ActivationKind>,
    pub mode: MutationMode,
}

impl Default for MutatorConfig {
    fn default() -> Self {
        MutatorConfig {
            mutate_weights: Rate::default(),
            mutate_bias: Rate::default(),
            mutate_activation: Rate::default(),
            add_connection: Rate::default(),
            remove_connection: Rate::default(),
            add_neuron: Rate::default(),
            remove_neuron: Rate::default(),
            perturb_std_dev: 0.5,
            allowed_activations: ActivationKind::ALL.to_vec(),
            mode: MutationMode::default(),
        }
    }
}

/// Applies structural and perturbation mutation to a [`Genotype`] in place.
///
/// Every operator is best-effort: when its precondition doesn't hold (no connection to split, a
/// removal that would break an invariant, and so on) it is silently skipped rather than treated
/// as an error — a mutation pass never fails the generation it runs in. In [`MutationMode::Independent`]
/// the four structural operators always run before the three perturbation operators, so a
/// freshly added neuron or connection is never perturbed in the same pass it was created in.
#[derive(Debug, Clone, Default)]
pub struct Mutator {
    config: MutatorConfig,
}

const STRUCTURAL_OPS: [Op; 4] = [Op::AddNeuron, Op::RemoveNeuron, Op::AddConnection, Op::RemoveConnection];
const PERTURBATION_OPS: [Op; 3] = [Op::MutateWeights, Op::MutateBias, Op::MutateActivation];

/// Chance that a gated weight/bias element is resampled uniformly across its bounds instead of
/// perturbed by the usual Gaussian nudge, letting a run occasionally escape a local optimum a
/// small perturbation can't.
const RESAMPLE_PROBABILITY: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    MutateWeights,
    MutateBias,
    MutateActivation,
    AddConnection,
    RemoveConnection,
    AddNeuron,
    RemoveNeuron,
}

impl Mutator {
    pub fn new(config: MutatorConfig) -> Self {
        Mutator { config }
    }

    pub fn config(&self) -> &MutatorConfig {
        &self.config
    }

    pub fn mutate(&self, genotype: &mut Genotype) {
        match self.config.mode {
            MutationMode::Independent => {
                for op in STRUCTURAL_OPS {
                    if self.rate_of(op).sample() {
                        self.apply(op, genotype);
                    }
                }
                // mutate_weights/mutate_bias gate per connection/bias rather than per call, so
                // they always run and let each element decide for itself.
                self.apply(Op::MutateWeights, genotype);
                self.apply(Op::MutateBias, genotype);
                if self.rate_of(Op::MutateActivation).sample() {
                    self.apply(Op::MutateActivation, genotype);
                }
            }
            MutationMode::ExactlyOne => {
                if let Some(op) = self.choose_weighted() {
                    self.apply(op, genotype);
                }
            }
        }
    }

    fn rate_of(&self, op: Op) -> Rate {
        match op {
            Op::MutateWeights => self.config.mutate_weights,
            Op::MutateBias => self.config.mutate_bias,
            Op::MutateActivation => self.config.mutate_activation,
            Op::AddConnection => self.config.add_connection,
            Op::RemoveConnection => self.config.remove_connection,
            Op::AddNeuron => self.config.add_neuron,
            Op::RemoveNeuron => self.config.remove_neuron,
        }
    }

    fn choose_weighted(&self) -> Option<Op> {
        let all = STRUCTURAL_OPS.iter().chain(PERTURBATION_OPS.iter()).copied();
        let total: f32 = all.clone().map(|op| self.rate_of(op).get()).sum();
        if total <= 0.0 {
            return None;
        }
        let mut pick = random_provider::range(0.0..total);
        for op in all {
            let weight = self.rate_of(op).get();
            if pick < weight {
                return Some(op);
            }
            pick -= weight;
        }
        None
    }

    fn apply(&self, op: Op, genotype: &mut Genotype) {
        let applied = match op {
            Op::MutateWeights => self.mutate_weights(genotype),
            Op::MutateBias => self.mutate_bias(genotype),
            Op::MutateActivation => self.mutate_activation(genotype),
            Op::AddConnection => self.add_connection(genotype),
            Op::RemoveConnection => self.remove_connection(genotype),
            Op::AddNeuron => self.add_neuron(genotype),
            Op::RemoveNeuron => self.remove_neuron(genotype),
        };
        tracing::trace!(?op, applied, "mutation operator");
    }

    fn mutate_weights(&self, genotype: &mut Genotype) -> bool {
        let ids: Vec<_> = genotype.connections().map(|(id, _)| id).collect();
        let bounds = genotype.bounds();
        let rate = self.config.mutate_weights;
        let mut changed = false;
        for id in ids {
            if !rate.sample() {
                continue;
            }
            let new_weight = if random_provider::bool(RESAMPLE_PROBABILITY) {
                random_provider::range(bounds.weight_range.0..bounds.weight_range.1)
            } else if let Some(c) = genotype.connection_mut(id) {
                bounds.clamp_weight(c.weight() + random_provider::gaussian(0.0, self.config.perturb_std_dev))
            } else {
                continue;
            };
            if let Some(c) = genotype.connection_mut(id) {
                c.set_weight(new_weight);
                changed = true;
            }
        }
        changed
    }

    fn mutate_bias(&self, genotype: &mut Genotype) -> bool {
        let ids: Vec<_> = genotype.neurons().map(|(id, _)| id).collect();
        let bounds = genotype.bounds();
        let rate = self.config.mutate_bias;
        let mut changed = false;
        for id in ids {
            if !rate.sample() {
                continue;
            }
            let new_bias = if random_provider::bool(RESAMPLE_PROBABILITY) {
                random_provider::range(bounds.bias_range.0..bounds.bias_range.1)
            } else if let Some(n) = genotype.neuron_mut(id) {
                bounds.clamp_bias(n.bias() + random_provider::gaussian(0.0, self.config.perturb_std_dev))
            } else {
                continue;
            };
            if let Some(n) = genotype.neuron_mut(id) {
                n.set_bias(new_bias);
                changed = true;
            }
        }
        changed
    }

    fn mutate_activation(&self, genotype: &mut Genotype) -> bool {
        if self.config.allowed_activations.is_empty() {
            return false;
        }
        let candidates: Vec<_> = genotype
            .neurons_in_layer(Layer::Hidden)
            .into_iter()
            .chain(genotype.neurons_in_layer(Layer::Output))
            .collect();
        let Some(&id) = candidates_choose(&candidates) else {
            return false;
        };
        let kind = ActivationKind::sample_from(&self.config.allowed_activations);
        if let Some(n) = genotype.neuron_mut(id) {
            n.set_activation(kind);
            true
        } else {
            false
        }
    }

    fn add_connection(&self, genotype: &mut Genotype) -> bool {
        let sources: Vec<_> = [Layer::Input, Layer::Bias, Layer::Hidden]
            .into_iter()
            .flat_map(|l| genotype.neurons_in_layer(l))
            .collect();
        let targets: Vec<_> = [Layer::Hidden, Layer::Output]
            .into_iter()
            .flat_map(|l| genotype.neurons_in_layer(l))
            .collect();
        let (Some(&from), Some(&to)) = (candidates_choose(&sources), candidates_choose(&targets)) else {
            return false;
        };
        let (lo, hi) = genotype.bounds().weight_range;
        let weight = random_provider::range(lo..hi);
        genotype.add_connection(from, to, weight).is_ok()
    }

    fn remove_connection(&self, genotype: &mut Genotype) -> bool {
        let ids: Vec<_> = genotype
            .connections()
            .filter(|(_, c)| c.is_enabled())
            .map(|(id, _)| id)
            .collect();
        let Some(&id) = candidates_choose(&ids) else {
            return false;
        };
        genotype.disable_connection(id).is_ok()
    }

    fn add_neuron(&self, genotype: &mut Genotype) -> bool {
        let ids: Vec<_> = genotype
            .connections()
            .filter(|(_, c)| c.is_enabled())
            .map(|(id, _)| id)
            .collect();
        let Some(&split_id) = candidates_choose(&ids) else {
            return false;
        };

        let snapshot = genotype.clone();
        let (from, to, weight) = {
            let c = genotype.connection(split_id).expect("just listed");
            (c.from(), c.to(), c.weight())
        };

        if genotype.disable_connection(split_id).is_err() {
            *genotype = snapshot;
            return false;
        }

        let kind = ActivationKind::sample_from(&self.config.allowed_activations);
        let new_id = genotype.add_neuron(Layer::Hidden, kind, 0.0, Aggregation::DotProduct);

        let ok = genotype.add_connection(from, new_id, 1.0).is_ok()
            && genotype.add_connection(new_id, to, weight).is_ok();
        if !ok {
            *genotype = snapshot;
            return false;
        }
        true
    }

    fn remove_neuron(&self, genotype: &mut Genotype) -> bool {
        let ids: Vec<_> = genotype.neurons_in_layer(Layer::Hidden);
        let Some(&id) = candidates_choose(&ids) else {
            return false;
        };
        genotype.remove_neuron(id).is_ok()
    }
}

fn candidates_choose<T>(items: &[T]) -> Option<&T> {
    if items.is_empty() {
        None
    } else {
        Some(random_provider::choose(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wired_genotype() -> Genotype {
        let mut g = Genotype::new(0);
        let i = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let h = g.add_neuron(Layer::Hidden, ActivationKind::Tanh, 0.0, Aggregation::DotProduct);
        let o = g.add_neuron(Layer::Output, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct);
        g.add_connection(i, h, 0.3).unwrap();
        g.add_connection(h, o, 0.3).unwrap();
        g
    }

    #[test]
    fn zero_rates_never_mutate_anything() {
        let mutator = Mutator::new(MutatorConfig::default());
        let g = wired_genotype();
        let mut mutated = g.clone();
        mutator.mutate(&mut mutated);
        assert_eq!(g, mutated);
    }

    #[test]
    fn mutate_weights_changes_every_connection_when_rate_is_one() {
        let mutator = Mutator::new(MutatorConfig {
            mutate_weights: Rate::new(1.0),
            ..MutatorConfig::default()
        });
        let mut g = wired_genotype();
        let before: Vec<f64> = g.connections().map(|(_, c)| c.weight()).collect();
        mutator.mutate(&mut g);
        let after: Vec<f64> = g.connections().map(|(_, c)| c.weight()).collect();
        assert_ne!(before, after);
    }

    #[test]
    fn add_neuron_splits_a_connection_and_preserves_validity() {
        let mutator = Mutator::new(MutatorConfig {
            add_neuron: Rate::new(1.0),
            ..MutatorConfig::default()
        });
        let mut g = wired_genotype();
        let neurons_before = g.len_neurons();
        mutator.mutate(&mut g);
        assert!(g.is_valid());
        assert!(g.len_neurons() >= neurons_before);
    }

    #[test]
    fn remove_neuron_never_breaks_invariants() {
        let mutator = Mutator::new(MutatorConfig {
            remove_neuron: Rate::new(1.0),
            ..MutatorConfig::default()
        });
        for _ in 0..20 {
            let mut g = wired_genotype();
            mutator.mutate(&mut g);
            assert!(g.is_valid());
        }
    }

    #[test]
    fn exactly_one_mode_with_no_positive_rates_does_nothing() {
        let mutator = Mutator::new(MutatorConfig {
            mode: MutationMode::ExactlyOne,
            ..MutatorConfig::default()
        });
        let g = wired_genotype();
        let mut mutated = g.clone();
        mutator.mutate(&mut mutated);
        assert_eq!(g, mutated);
    }
}
