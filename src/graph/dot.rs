//! Graphviz DOT export.
//!
//! Scripts are boxes. Data is an ellipse: solid when present, dashed when
//! missing, dashed and grey when retired. Edges run script → output and
//! input → script.

use super::{AnnotatedGraph, Presence};

/// Renders the live part of the graph as a DOT `digraph`.
pub fn export(annotated: &AnnotatedGraph) -> String {
    let graph = annotated.graph();
    let mut out = String::from("digraph mm {\n");

    for id in graph.live_scripts() {
        let label = quote(&graph.script(id).label.to_string_lossy());
        out.push_str(&format!("  s{} [label={label}, shape=box];\n", id.index()));
    }

    for id in graph.live_data() {
        let style = match annotated.presence(id) {
            Some(Presence::Present) => "style=solid",
            Some(Presence::Missing) | None => "style=dashed",
            Some(Presence::Retired) => "style=dashed, color=gray50, fontcolor=gray50",
        };
        let label = quote(&graph.data(id).name.to_string_lossy());
        out.push_str(&format!("  d{} [label={label}, {style}];\n", id.index()));
    }

    for id in graph.live_data() {
        // The producer of a retired input may have been pruned.
        if let Some(producer) = graph.data(id).producer
            && graph.is_live_script(producer)
        {
            out.push_str(&format!("  s{} -> d{};\n", producer.index(), id.index()));
        }
    }

    for id in graph.live_scripts() {
        for input in &graph.script(id).inputs {
            out.push_str(&format!("  d{} -> s{};\n", input.index(), id.index()));
        }
    }

    out.push_str("}\n");
    out
}

fn quote(label: &str) -> String {
    let mut quoted = String::with_capacity(label.len() + 2);
    quoted.push('"');
    for c in label.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::graph::{ProvenanceGraph, resolve, staleness::tests::FakeProbe, tests::command};

    #[test]
    fn empty_graph_is_empty_digraph() {
        let annotated = resolve(ProvenanceGraph::build(&[]), &FakeProbe::with(&[]));
        assert_eq!(export(&annotated), "digraph mm {\n}\n");
    }

    #[test]
    fn exports_nodes_and_edges() {
        let graph = ProvenanceGraph::build(&[command(&["raw.csv"], &["clean.csv"], "clean.py")]);
        let annotated = resolve(graph, &FakeProbe::with(&["raw.csv", "clean.csv"]));

        let dot = export(&annotated);
        let expected = "digraph mm {\n\
                        \x20 s0 [label=\"clean.py\", shape=box];\n\
                        \x20 d0 [label=\"raw.csv\", style=solid];\n\
                        \x20 d1 [label=\"clean.csv\", style=solid];\n\
                        \x20 s0 -> d1;\n\
                        \x20 d0 -> s0;\n\
                        }\n";
        assert_eq!(dot, expected);
    }

    #[test]
    fn missing_and_retired_data_are_dashed() {
        let graph = ProvenanceGraph::build(&[
            command(&[], &["a.txt"], "gen.sh"),
            command(&["a.txt"], &["b.txt"], "use.sh"),
            command(&[], &["a.txt"], "gen.sh"),
        ]);
        let annotated = resolve(graph, &FakeProbe::with(&["a.txt"]));
        let dot = export(&annotated);

        // Original a.txt: retired, its pruned producer has no node or edge.
        assert!(dot.contains("d0 [label=\"a.txt\", style=dashed, color=gray50"));
        assert!(!dot.contains("s0 "));
        assert!(dot.contains("d0 -> s1;"));
        // b.txt is the current binding but deleted.
        assert!(dot.contains("d1 [label=\"b.txt\", style=dashed];"));
        assert!(dot.contains("d2 [label=\"a.txt\", style=solid];"));
        assert!(dot.contains("s2 -> d2;"));
    }

    #[test]
    fn labels_are_escaped() {
        assert_eq!(quote(r#"say "hi"\now"#), r#""say \"hi\"\\now""#);
    }
}
