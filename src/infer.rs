//! The two external operations (§6): 2T-INF automaton construction (C3)
//! and the top-level `infer_sore`/`infer` control loop tying the rewrite
//! engine (C4) and repair engine (C5) together.

use std::hash::Hash;

use crate::graph::Graph;
use crate::repair::try_repair;
use crate::rewrite::rewrite;
use crate::term::Re;

/// Builds the initial GFA from a collection of sample sequences by unioning
/// all observed 2-grams, framed by `Start`/`End` edges (§4.3, the "2T-INF"
/// algorithm of Bex et al.).
///
/// An empty sequence contributes the single edge `(Start, End)`. Symbols
/// and edges are deduplicated; no frequency counts are kept.
pub fn infer_automaton<S, I, Seq>(sequences: I) -> Graph<S>
where
    S: Clone + Eq + Hash,
    I: IntoIterator<Item = Seq>,
    Seq: IntoIterator<Item = S>,
{
    let mut graph = Graph::new();

    for sequence in sequences {
        let mut last = Re::Start;
        let mut any = false;
        for item in sequence {
            any = true;
            let node = Re::symbol(item);
            graph.add_node(node.clone());
            graph.add_edge(last, node.clone());
            last = node;
        }
        if any {
            graph.add_edge(last, Re::End);
        } else {
            graph.add_edge(Re::Start, Re::End);
        }
    }

    log::debug!(
        "infer_automaton: built GFA with {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}

/// Reduces `graph` in place to the final GFA shape by alternating the
/// rewrite engine (C4) and the repair engine (C5), per the control loop of
/// §4.5 and §2. Returns `true` iff the graph reached the final shape
/// `{Start, X, End}`; otherwise the graph is left in its most-reduced
/// intermediate state (§7, `InferenceIncomplete`).
pub fn infer_sore<S: Clone + Eq + Hash + std::fmt::Debug>(graph: &mut Graph<S>) -> bool {
    rewrite(graph);
    if graph.is_final() {
        log::debug!("infer_sore: reached final shape without repairs");
        return true;
    }

    loop {
        if !try_repair(graph) {
            log::debug!("infer_sore: repair engine exhausted, graph not reducible");
            return false;
        }
        rewrite(graph);
        if graph.is_final() {
            log::debug!("infer_sore: reached final shape after repair");
            return true;
        }
    }
}

/// Convenience wiring `infer_automaton` and `infer_sore` together: infers
/// the GFA from `sequences`, reduces it, and returns whether reduction
/// succeeded along with the inferred term when it did.
pub fn infer<S, I, Seq>(sequences: I) -> (bool, Option<Re<S>>)
where
    S: Clone + Eq + Hash + std::fmt::Debug,
    I: IntoIterator<Item = Seq>,
    Seq: IntoIterator<Item = S>,
{
    let mut graph = infer_automaton(sequences);
    let ok = infer_sore(&mut graph);
    let term = graph.final_term();
    (ok, term)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(s: &str) -> Vec<String> {
        s.chars().map(|c| c.to_string()).collect()
    }

    fn sym(s: &str) -> Re<String> {
        Re::symbol(s.to_string())
    }

    #[test]
    fn bex_figure_2_example() {
        // §8 scenario 1.
        let g = infer_automaton(vec![seq("bacacdacde"), seq("cbacdbacde")]);
        assert_eq!(g.node_count(), 7);
        assert_eq!(g.edge_count(), 11);
        for (s, t) in [
            (Re::Start, sym("b")),
            (Re::Start, sym("c")),
            (sym("b"), sym("a")),
            (sym("a"), sym("c")),
            (sym("c"), sym("a")),
            (sym("c"), sym("b")),
            (sym("c"), sym("d")),
            (sym("d"), sym("a")),
            (sym("d"), sym("b")),
            (sym("d"), sym("e")),
            (sym("e"), Re::End),
        ] {
            assert!(g.has_edge(&s, &t), "missing edge {:?} -> {:?}", s, t);
        }

        let (ok, _) = infer(vec![seq("bacacdacde"), seq("cbacdbacde")]);
        assert!(ok);
    }

    #[test]
    fn three_cycle_with_empty_sequence() {
        // §8 scenario 2.
        let g = infer_automaton(vec![seq(""), seq("abc"), seq("bca"), seq("cab")]);
        assert!(g.has_edge(&Re::Start, &sym("a")));
        assert!(g.has_edge(&Re::Start, &sym("b")));
        assert!(g.has_edge(&Re::Start, &sym("c")));
        assert!(g.has_edge(&sym("a"), &Re::End));
        assert!(g.has_edge(&sym("b"), &Re::End));
        assert!(g.has_edge(&sym("c"), &Re::End));
        assert!(g.has_edge(&sym("a"), &sym("b")));
        assert!(g.has_edge(&sym("b"), &sym("c")));
        assert!(g.has_edge(&sym("c"), &sym("a")));
        assert!(g.has_edge(&Re::Start, &Re::End));

        let (ok, _) = infer(vec![seq(""), seq("abc"), seq("bca"), seq("cab")]);
        assert!(ok);
    }

    #[test]
    fn repeated_single_symbol() {
        // §8 scenario 3.
        let (ok, term) = infer(vec![seq("a"), seq("a"), seq("a")]);
        assert!(ok);
        assert_eq!(term, Some(sym("a")));
    }

    #[test]
    fn optional_trailing_symbol() {
        // §8 scenario 4.
        let (ok, term) = infer(vec![seq("ab"), seq("a")]);
        assert!(ok);
        assert_eq!(term, Some(Re::conjunction(vec![sym("a"), Re::optional(sym("b"))])));
    }

    #[test]
    fn empty_input_is_inference_incomplete() {
        // §7, EmptyInput.
        let (ok, term) = infer::<String, _, Vec<String>>(vec![]);
        assert!(!ok);
        assert_eq!(term, None);
    }

    #[test]
    fn idempotent_ingest() {
        let once = infer_automaton(vec![seq("bacacdacde"), seq("cbacdbacde")]);
        let twice = infer_automaton(vec![
            seq("bacacdacde"),
            seq("cbacdbacde"),
            seq("bacacdacde"),
            seq("cbacdbacde"),
        ]);
        assert_eq!(once.node_count(), twice.node_count());
        assert_eq!(once.edge_count(), twice.edge_count());
    }
}
