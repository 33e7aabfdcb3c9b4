use std::fmt::Write as _;

use crate::genome::{Genotype, Layer};

/// Renders a genotype as Graphviz `dot` source, grouping neurons by layer and drawing recurrent
/// edges dashed. Disabled connections are omitted.
pub fn to_dot(genotype: &Genotype) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph genotype {{");
    let _ = writeln!(out, "  rankdir=LR;");

    for layer in [Layer::Input, Layer::Bias, Layer::Hidden, Layer::Output] {
        let ids = genotype.neurons_in_layer(layer);
        if ids.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  subgraph cluster_{} {{", layer_label(layer));
        let _ = writeln!(out, "    label=\"{}\";", layer_label(layer));
        for id in ids {
            let _ = writeln!(out, "    n{} [label=\"{}\"];", node_index(id), node_index(id));
        }
        let _ = writeln!(out, "  }}");
    }

    for (_, c) in genotype.connections() {
        if !c.is_enabled() {
            continue;
        }
        let style = if c.is_recurrent() { "style=dashed" } else { "style=solid" };
        let _ = writeln!(
            out,
            "  n{} -> n{} [label=\"{:.3}\", {}];",
            node_index(c.from()),
            node_index(c.to()),
            c.weight(),
            style
        );
    }

    let _ = writeln!(out, "}}");
    out
}

fn layer_label(layer: Layer) -> &'static str {
    match layer {
        Layer::Input => "input",
        Layer::Bias => "bias",
        Layer::Hidden => "hidden",
        Layer::Output => "output",
    }
}

fn node_index(id: crate::genome::NeuronId) -> u64 {
    use slotmap::Key;
    id.data().as_ffi()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::{Aggregation, ActivationKind};

    #[test]
    fn renders_a_minimal_genotype() {
        let mut g = Genotype::new(0);
        let i = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let o = g.add_neuron(Layer::Output, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct);
        g.add_connection(i, o, 0.5).unwrap();

        let dot = to_dot(&g);
        assert!(dot.starts_with("digraph genotype {"));
        assert!(dot.contains("->"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn disabled_connections_are_omitted() {
        let mut g = Genotype::new(0);
        let i = g.add_neuron(Layer::Input, ActivationKind::Identity, 0.0, Aggregation::DotProduct);
        let o = g.add_neuron(Layer::Output, ActivationKind::Sigmoid, 0.0, Aggregation::DotProduct);
        let c = g.add_connection(i, o, 0.5).unwrap();
        g.connection_mut(c).unwrap().set_enabled(false);

        let dot = to_dot(&g);
        assert!(!dot.contains("->"));
    }
}
