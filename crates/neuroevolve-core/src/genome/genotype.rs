use std::collections::{HashMap, HashSet, VecDeque};

use neuroevolve_error::GenomeError;
use slotmap::{Key, SlotMap};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::activation::{Aggregation, ActivationKind};
use crate::genome::{Connection, ConnectionId, Layer, Neuron, NeuronId};
use crate::valid::Valid;

/// The weight/bias ranges a [`Genotype`] enforces on every write (invariant 6: weights and biases must stay within configured bounds).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GenomeBounds {
    pub weight_range: (f64, f64),
    pub bias_range: (f64, f64),
}

impl Default for GenomeBounds {
    fn default() -> Self {
        GenomeBounds {
            weight_range: (-1.0, 1.0),
            bias_range: (-1.0, 1.0),
        }
    }
}

impl GenomeBounds {
    pub fn clamp_weight(&self, weight: f64) -> f64 {
        weight.clamp(self.weight_range.0, self.weight_range.1)
    }

    pub fn clamp_bias(&self, bias: f64) -> f64 {
        bias.clamp(self.bias_range.0, self.bias_range.1)
    }
}

/// A typed graph of neurons and weighted connections (§3).
///
/// Neurons and connections live in [`slotmap::SlotMap`] arenas keyed by [`NeuronId`] /
/// [`ConnectionId`]; `order` records neuron insertion order so that `neurons_in_layer` (and, in
/// particular, the input/output neuron orders the phenotype depends on) are stable without a
/// separate sort. The topological order and each connection's `recurrent` flag are recomputed
/// eagerly by [`Genotype::recompute_topology`] after every structural change, so a caller can
/// always read `connection.is_recurrent()` without first calling anything.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Genotype {
    neurons: SlotMap<NeuronId, Neuron>,
    connections: SlotMap<ConnectionId, Connection>,
    order: Vec<NeuronId>,
    topo_order: Vec<NeuronId>,
    bounds: GenomeBounds,
    generation: u64,
}

impl Genotype {
    pub fn new(generation: u64) -> Self {
        Self::with_bounds(generation, GenomeBounds::default())
    }

    pub fn with_bounds(generation: u64, bounds: GenomeBounds) -> Self {
        Genotype {
            neurons: SlotMap::with_key(),
            connections: SlotMap::with_key(),
            order: Vec::new(),
            topo_order: Vec::new(),
            bounds,
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn bounds(&self) -> GenomeBounds {
        self.bounds
    }

    pub fn len_neurons(&self) -> usize {
        self.neurons.len()
    }

    pub fn len_connections(&self) -> usize {
        self.connections.len()
    }

    pub fn neuron(&self, id: NeuronId) -> Option<&Neuron> {
        self.neurons.get(id)
    }

    pub fn neuron_mut(&mut self, id: NeuronId) -> Option<&mut Neuron> {
        self.neurons.get_mut(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(id)
    }

    pub fn neurons(&self) -> impl Iterator<Item = (NeuronId, &Neuron)> {
        self.neurons.iter()
    }

    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connections.iter()
    }

    /// Neurons of the given layer, in the order they were added to this genotype. This is the
    /// order the phenotype uses for its input/output vectors.
    pub fn neurons_in_layer(&self, layer: Layer) -> Vec<NeuronId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.neurons.get(*id).map(|n| n.layer()) == Some(layer))
            .collect()
    }

    /// Enabled connections terminating at `id`.
    pub fn incoming(&self, id: NeuronId) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .filter(|(_, c)| c.enabled && c.to == id)
            .map(|(cid, _)| cid)
            .collect()
    }

    /// Enabled connections originating at `id`.
    pub fn outgoing(&self, id: NeuronId) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .filter(|(_, c)| c.enabled && c.from == id)
            .map(|(cid, _)| cid)
            .collect()
    }

    /// Adds a neuron, minting a fresh [`NeuronId`]. Bias is clamped into this genotype's
    /// configured range (invariant 6) rather than rejected.
    pub fn add_neuron(
        &mut self,
        layer: Layer,
        activation: ActivationKind,
        bias: f64,
        aggregation: Aggregation,
    ) -> NeuronId {
        let bias = self.bounds.clamp_bias(bias);
        let neuron = Neuron::new(layer, activation, bias).with_aggregation(aggregation);
        let id = self.neurons.insert(neuron);
        self.order.push(id);
        id
    }

    /// Adds a connection, failing with [`GenomeError::InvalidEdge`] if it would violate
    /// invariants 1-3 or duplicate an existing enabled edge.
    pub fn add_connection(
        &mut self,
        from: NeuronId,
        to: NeuronId,
        weight: f64,
    ) -> Result<ConnectionId, GenomeError> {
        let from_neuron = self.neurons.get(from).ok_or(GenomeError::InvalidEdge {
            from: from.data().as_ffi(),
            to: to.data().as_ffi(),
            reason: "source neuron does not exist",
        })?;
        let to_neuron = self.neurons.get(to).ok_or(GenomeError::InvalidEdge {
            from: from.data().as_ffi(),
            to: to.data().as_ffi(),
            reason: "target neuron does not exist",
        })?;

        if !to_neuron.layer().can_be_connection_target() {
            return Err(GenomeError::InvalidEdge {
                from: from.data().as_ffi(),
                to: to.data().as_ffi(),
                reason: "target cannot be an input or bias neuron",
            });
        }
        if !from_neuron.layer().can_be_connection_source() {
            return Err(GenomeError::InvalidEdge {
                from: from.data().as_ffi(),
                to: to.data().as_ffi(),
                reason: "source cannot be an output neuron",
            });
        }
        if self
            .connections
            .iter()
            .any(|(_, c)| c.enabled && c.from == from && c.to == to)
        {
            return Err(GenomeError::InvalidEdge {
                from: from.data().as_ffi(),
                to: to.data().as_ffi(),
                reason: "duplicate enabled edge",
            });
        }

        let weight = self.bounds.clamp_weight(weight);
        let id = self.connections.insert(Connection::new(from, to, weight));
        self.recompute_topology();
        Ok(id)
    }

    /// Removes a neuron and every connection incident to it, rolling back if invariants 1, 4, or
    /// 5 would break.
    pub fn remove_neuron(&mut self, id: NeuronId) -> Result<(), GenomeError> {
        let snapshot = self.clone();

        self.neurons.remove(id);
        self.order.retain(|n| *n != id);
        self.connections.retain(|_, c| c.from != id && c.to != id);

        match self.check_invariants() {
            Ok(()) => {
                self.recompute_topology();
                Ok(())
            }
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// Fully removes a connection, rolling back if invariant 5 (output reachability) would
    /// break.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Result<(), GenomeError> {
        let snapshot = self.clone();
        self.connections.remove(id);

        match self.check_invariants() {
            Ok(()) => {
                self.recompute_topology();
                Ok(())
            }
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// Disables (rather than deletes) a connection, used by the mutator's `remove_connection`
    /// operator so the edge remains available to future structural mutation. Rolled back on
    /// invariant 5 violation.
    pub fn disable_connection(&mut self, id: ConnectionId) -> Result<(), GenomeError> {
        let snapshot = self.clone();
        if let Some(c) = self.connections.get_mut(id) {
            c.enabled = false;
        }

        match self.check_invariants() {
            Ok(()) => {
                self.recompute_topology();
                Ok(())
            }
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// The feed-forward topological order over every neuron ,
    /// recomputed after every structural mutation.
    pub fn topological_order(&self) -> &[NeuronId] {
        &self.topo_order
    }

    /// Enabled connections currently marked recurrent.
    pub fn recurrent_edges(&self) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .filter(|(_, c)| c.enabled && c.recurrent)
            .map(|(id, _)| id)
            .collect()
    }

    /// Recomputes each connection's `recurrent` flag and the feed-forward `topo_order`.
    ///
    /// Strongly connected components are found with Tarjan's algorithm over the subgraph of
    /// enabled edges; any edge inside a non-trivial SCC, or a self-loop, is marked recurrent.
    /// The remaining edges form a DAG by construction, which is then topologically sorted with a
    /// pending-index scan over the non-recurrent subgraph; any surviving edge
    /// whose target sorts at or before its source is marked recurrent defensively.
    pub fn recompute_topology(&mut self) {
        let nodes: Vec<NeuronId> = self.order.clone();
        let mut adjacency: HashMap<NeuronId, Vec<NeuronId>> = HashMap::new();
        for &n in &nodes {
            adjacency.insert(n, Vec::new());
        }
        for (_, c) in self.connections.iter() {
            if c.enabled {
                adjacency.entry(c.from).or_default().push(c.to);
            }
        }

        let components = tarjan_scc(&nodes, &adjacency);
        let mut component_of: HashMap<NeuronId, usize> = HashMap::new();
        let mut component_size: Vec<usize> = Vec::with_capacity(components.len());
        for (idx, comp) in components.iter().enumerate() {
            component_size.push(comp.len());
            for &n in comp {
                component_of.insert(n, idx);
            }
        }

        for (_, c) in self.connections.iter_mut() {
            if !c.enabled {
                continue;
            }
            let same_nontrivial_scc = component_of.get(&c.from) == component_of.get(&c.to)
                && component_of
                    .get(&c.from)
                    .map(|&idx| component_size[idx] > 1)
                    .unwrap_or(false);
            c.recurrent = c.from == c.to || same_nontrivial_scc;
        }

        let order = pending_index_topological_sort(&nodes, &adjacency, &self.connections);

        let mut index_of: HashMap<NeuronId, usize> = HashMap::new();
        for (i, &n) in order.iter().enumerate() {
            index_of.insert(n, i);
        }
        for (_, c) in self.connections.iter_mut() {
            if !c.enabled || c.recurrent {
                continue;
            }
            if let (Some(&fi), Some(&ti)) = (index_of.get(&c.from), index_of.get(&c.to)) {
                if ti <= fi {
                    c.recurrent = true;
                }
            }
        }

        self.topo_order = order;
    }

    /// Runs every structural invariant and returns the first one violated.
    pub fn check_invariants(&self) -> Result<(), GenomeError> {
        for (_, c) in self.connections.iter() {
            if self.neurons.get(c.from).is_none() || self.neurons.get(c.to).is_none() {
                return Err(GenomeError::WouldBreakInvariant {
                    reason: "connection references a missing neuron",
                });
            }
        }

        let has_input = self
            .neurons
            .values()
            .any(|n| matches!(n.layer(), Layer::Input | Layer::Bias));
        let has_output = self.neurons.values().any(|n| n.layer() == Layer::Output);
        if !has_input || !has_output {
            return Err(GenomeError::WouldBreakInvariant {
                reason: "genotype must retain at least one input/bias and one output neuron",
            });
        }

        if !self.outputs_are_reachable() {
            return Err(GenomeError::WouldBreakInvariant {
                reason: "an output neuron is unreachable from every input/bias neuron",
            });
        }

        for (_, c) in self.connections.iter() {
            let (lo, hi) = self.bounds.weight_range;
            if c.weight < lo || c.weight > hi {
                return Err(GenomeError::WouldBreakInvariant {
                    reason: "connection weight out of configured range",
                });
            }
        }
        for (_, n) in self.neurons.iter() {
            let (lo, hi) = self.bounds.bias_range;
            if n.bias < lo || n.bias > hi {
                return Err(GenomeError::WouldBreakInvariant {
                    reason: "neuron bias out of configured range",
                });
            }
        }

        Ok(())
    }

    fn outputs_are_reachable(&self) -> bool {
        let mut visited: HashSet<NeuronId> = HashSet::new();
        let mut queue: VecDeque<NeuronId> = VecDeque::new();

        for (id, n) in self.neurons.iter() {
            if matches!(n.layer(), Layer::Input | Layer::Bias) {
                visited.insert(id);
                queue.push_back(id);
            }
        }

        while let Some(id) = queue.pop_front() {
            for (_, c) in self.connections.iter() {
                if c.enabled && c.from == id && visited.insert(c.to) {
                    queue.push_back(c.to);
                }
            }
        }

        self.neurons
            .iter()
            .filter(|(_, n)| n.layer() == Layer::Output)
            .all(|(id, _)| visited.contains(&id))
    }
}

impl Valid for Genotype {
    fn is_valid(&self) -> bool {
        self.check_invariants().is_ok()
    }
}

/// Tarjan's strongly-connected-components algorithm, iterative to avoid recursion-depth limits
/// on large genotypes.
fn tarjan_scc(
    nodes: &[NeuronId],
    adjacency: &HashMap<NeuronId, Vec<NeuronId>>,
) -> Vec<Vec<NeuronId>> {
    struct State {
        index: HashMap<NeuronId, usize>,
        lowlink: HashMap<NeuronId, usize>,
        on_stack: HashSet<NeuronId>,
        stack: Vec<NeuronId>,
        counter: usize,
        components: Vec<Vec<NeuronId>>,
    }

    enum Frame {
        Enter(NeuronId),
        Finish(NeuronId),
    }

    let mut state = State {
        index: HashMap::new(),
        lowlink: HashMap::new(),
        on_stack: HashSet::new(),
        stack: Vec::new(),
        counter: 0,
        components: Vec::new(),
    };

    for &start in nodes {
        if state.index.contains_key(&start) {
            continue;
        }

        let mut work: Vec<Frame> = vec![Frame::Enter(start)];
        let mut child_cursor: HashMap<NeuronId, usize> = HashMap::new();

        while let Some(frame) = work.pop() {
            match frame {
                Frame::Enter(v) => {
                    if state.index.contains_key(&v) {
                        continue;
                    }
                    state.index.insert(v, state.counter);
                    state.lowlink.insert(v, state.counter);
                    state.counter += 1;
                    state.stack.push(v);
                    state.on_stack.insert(v);

                    work.push(Frame::Finish(v));
                    let cursor = *child_cursor.get(&v).unwrap_or(&0);
                    child_cursor.insert(v, cursor);
                    if let Some(neighbors) = adjacency.get(&v) {
                        for &w in neighbors {
                            if !state.index.contains_key(&w) {
                                work.push(Frame::Enter(w));
                            } else if state.on_stack.contains(&w) {
                                let v_low = state.lowlink[&v];
                                let w_idx = state.index[&w];
                                state.lowlink.insert(v, v_low.min(w_idx));
                            }
                        }
                    }
                }
                Frame::Finish(v) => {
                    if let Some(neighbors) = adjacency.get(&v) {
                        for &w in neighbors {
                            if state.on_stack.contains(&w) {
                                let v_low = state.lowlink[&v];
                                let w_low = state.lowlink[&w];
                                state.lowlink.insert(v, v_low.min(w_low));
                            }
                        }
                    }

                    if state.lowlink[&v] == state.index[&v] {
                        let mut component = Vec::new();
                        loop {
                            let w = state.stack.pop().expect("scc stack underflow");
                            state.on_stack.remove(&w);
                            component.push(w);
                            if w == v {
                                break;
                            }
                        }
                        state.components.push(component);
                    }
                }
            }
        }
    }

    state.components
}

/// Scans the pending range for zero-indegree nodes, repeating until every node is placed,
/// over the non-recurrent subgraph only.
fn pending_index_topological_sort(
    nodes: &[NeuronId],
    adjacency: &HashMap<NeuronId, Vec<NeuronId>>,
    connections: &SlotMap<ConnectionId, Connection>,
) -> Vec<NeuronId> {
    let mut indegree: HashMap<NeuronId, usize> = HashMap::new();
    for &n in nodes {
        indegree.insert(n, 0);
    }
    for (_, c) in connections.iter() {
        if c.enabled && !c.recurrent {
            *indegree.entry(c.to).or_insert(0) += 1;
        }
    }

    let mut remaining = indegree;
    let mut order = Vec::with_capacity(nodes.len());
    let mut done: HashSet<NeuronId> = HashSet::new();

    while done.len() < nodes.len() {
        let mut progressed = false;
        for &n in nodes {
            if done.contains(&n) {
                continue;
            }
            if *remaining.get(&n).unwrap_or(&0) == 0 {
                done.insert(n);
                order.push(n);
                progressed = true;
                if let Some(neighbors) = adjacency.get(&n) {
                    for &w in neighbors {
                        if let Some(d) = remaining.get_mut(&w) {
                            *d = d.saturating_sub(1);
                        }
                    }
                }
            }
        }
        if !progressed {
            // Defensive: should be unreachable once SCC-internal edges are marked recurrent,
            // but never spin forever on a malformed graph.
            for &n in nodes {
                if !done.contains(&n) {
                    order.push(n);
                    done.insert(n);
                }
            }
            break;
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationKind;

    fn line_genotype() -> (Genotype, Vec<NeuronId>) {
        let mut g = Genotype::new(0);
        let a = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let b = g.add_neuron(Layer::Hidden, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct);
        let c = g.add_neuron(Layer::Hidden, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct);
        let d = g.add_neuron(Layer::Hidden, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct);
        let e = g.add_neuron(Layer::Output, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct);
        g.add_connection(a, b, 0.5).unwrap();
        g.add_connection(b, c, 0.5).unwrap();
        g.add_connection(a, c, 0.5).unwrap();
        g.add_connection(c, d, 0.5).unwrap();
        g.add_connection(d, e, 0.5).unwrap();
        (g, vec![a, b, c, d, e])
    }

    #[test]
    fn s3_topological_sort_matches_expected_order() {
        let (g, ids) = line_genotype();
        assert_eq!(g.topological_order(), ids.as_slice());
    }

    #[test]
    fn s3_adding_a_back_edge_marks_it_recurrent_without_reordering() {
        let (mut g, ids) = line_genotype();
        let e = ids[4];
        let b = ids[1];
        let back = g.add_connection(e, b, 0.3).unwrap();

        assert!(g.connection(back).unwrap().is_recurrent());
        assert_eq!(g.topological_order(), ids.as_slice());
    }

    #[test]
    fn add_connection_rejects_bad_targets() {
        let mut g = Genotype::new(0);
        let input = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let output = g.add_neuron(Layer::Output, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct);

        assert!(g.add_connection(output, input, 0.1).is_err());
        assert!(g.add_connection(input, input, 0.1).is_err());
    }

    #[test]
    fn add_connection_rejects_duplicate_enabled_edges() {
        let mut g = Genotype::new(0);
        let input = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let output = g.add_neuron(Layer::Output, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct);

        g.add_connection(input, output, 0.1).unwrap();
        assert!(g.add_connection(input, output, 0.2).is_err());
    }

    #[test]
    fn remove_neuron_rolls_back_when_it_breaks_reachability() {
        let mut g = Genotype::new(0);
        let input = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let output = g.add_neuron(Layer::Output, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct);
        g.add_connection(input, output, 0.1).unwrap();

        let before = g.clone();
        assert!(g.remove_neuron(input).is_err());
        assert_eq!(g, before);
    }

    #[test]
    fn remove_neuron_succeeds_when_invariants_survive() {
        let (mut g, ids) = line_genotype();
        assert!(g.remove_neuron(ids[1]).is_ok());
        assert_eq!(g.len_neurons(), 4);
    }

    #[test]
    fn bias_is_clamped_into_configured_range() {
        let mut g = Genotype::new(0);
        let id = g.add_neuron(Layer::Hidden, ActivationKind::Identity, 50.0, Aggregation::DotProduct);
        assert_eq!(g.neuron(id).unwrap().bias(), 1.0);
    }

    #[test]
    fn fresh_genotype_with_single_path_is_valid() {
        let (g, _) = line_genotype();
        assert!(g.is_valid());
    }

    #[test]
    fn recurrent_cycle_is_detected() {
        let mut g = Genotype::new(0);
        let a = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let b = g.add_neuron(Layer::Hidden, ActivationKind::Tanh, 0.0, Aggregation::DotProduct);
        let c = g.add_neuron(Layer::Hidden, ActivationKind::Tanh, 0.0, Aggregation::DotProduct);
        let out = g.add_neuron(Layer::Output, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct);

        g.add_connection(a, b, 0.2).unwrap();
        g.add_connection(b, c, 0.2).unwrap();
        let back = g.add_connection(c, b, 0.2).unwrap();
        g.add_connection(c, out, 0.2).unwrap();

        assert!(g.connection(back).unwrap().is_recurrent());
        assert_eq!(g.recurrent_edges(), vec![back]);
    }
}
