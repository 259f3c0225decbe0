//! The rewrite engine (C4): four structural rules, applied in a fixed
//! preference order until none fires.
//!
//! Each `try_*` function attempts exactly one rule application (the first
//! candidate it finds, in node-insertion order) and reports whether it
//! fired. [`rewrite`] loops over the rules in preference order, restarting
//! from the top after every successful application, until none applies.

use std::collections::HashSet;
use std::hash::Hash;

use crate::graph::Graph;
use crate::term::Re;

/// Runs the four rewrite rules to quiescence: optional, self-loop,
/// disjunction, concatenation, in that order, restarting from the top after
/// every firing (§4.4).
pub fn rewrite<S: Clone + Eq + Hash + std::fmt::Debug>(graph: &mut Graph<S>) {
    loop {
        if try_optional(graph) {
            continue;
        }
        if try_self_loop(graph) {
            continue;
        }
        if try_disjunction(graph) {
            continue;
        }
        if try_concatenation(graph) {
            continue;
        }
        break;
    }
}

/// Rule 1: Optional. A non-`Optional`, non-framing node `r` qualifies when
/// every `r' in Pred(r)` already has `Succ(r) subseteq Succ(r')`. Bypasser
/// edges around `r` are removed before `r` is folded into `Optional(r)`.
fn try_optional<S: Clone + Eq + Hash + std::fmt::Debug>(graph: &mut Graph<S>) -> bool {
    let candidate = graph.nodes().find(|n| applicable_for_optional(graph, n)).cloned();
    let node = match candidate {
        Some(n) => n,
        None => return false,
    };

    let pred = graph.pred(&node);
    let succ = graph.succ(&node);
    let bypassers: Vec<(Re<S>, Re<S>)> = pred
        .iter()
        .flat_map(|p| succ.iter().filter(|s| **s != node).map(move |s| (p.clone(), s.clone())))
        .filter(|(p, s)| graph.has_edge(p, s))
        .collect();
    for (p, s) in &bypassers {
        graph.remove_edge(p, s);
    }
    log::debug!("rewrite: optional rule fires on {:?}", node);
    graph.replace_node(&node, Re::optional(node.clone()));
    true
}

fn applicable_for_optional<S: Clone + Eq + Hash>(graph: &Graph<S>, node: &Re<S>) -> bool {
    if node.is_framing() || matches!(node, Re::Optional(_)) {
        return false;
    }
    let succ = graph.succ(node);
    graph.pred(node).iter().all(|p| succ.is_subset(&graph.succ(p)))
}

/// Rule 2: Self-loop. The first node (in insertion order) with an edge
/// `(r, r)` has that edge removed and is folded into `Repeat(r)`.
fn try_self_loop<S: Clone + Eq + Hash + std::fmt::Debug>(graph: &mut Graph<S>) -> bool {
    let candidate = graph.nodes().find(|n| graph.has_edge(n, n)).cloned();
    let node = match candidate {
        Some(n) => n,
        None => return false,
    };
    graph.remove_edge(&node, &node);
    log::debug!("rewrite: self-loop rule fires on {:?}", node);
    graph.replace_node(&node, Re::repeat(node.clone()));
    true
}

/// Rule 3: Disjunction. Finds the first non-framing node `r1` that shares
/// `Pred`/`Succ` with some other non-framing `r2`, then greedily extends
/// the set with every further node sharing that same `Pred`/`Succ` pair.
fn try_disjunction<S: Clone + Eq + Hash + std::fmt::Debug>(graph: &mut Graph<S>) -> bool {
    let nodes: Vec<Re<S>> = graph.nodes().cloned().collect();
    for r1 in nodes.iter().filter(|n| !n.is_framing()) {
        let pred1 = graph.pred(r1);
        let succ1 = graph.succ(r1);
        let mut group: Vec<Re<S>> = nodes
            .iter()
            .filter(|r2| {
                *r2 != r1 && !r2.is_framing() && graph.pred(r2) == pred1 && graph.succ(r2) == succ1
            })
            .cloned()
            .collect();
        if group.is_empty() {
            continue;
        }
        group.insert(0, r1.clone());
        log::debug!("rewrite: disjunction rule fires on {:?}", group);
        let pivot = group.pop().unwrap();
        for member in &group {
            graph.remove_node(member);
        }
        group.push(pivot.clone());
        graph.replace_node(&pivot, Re::disjunction(group));
        return true;
    }
    false
}

/// Rule 4: Concatenation. Finds the first node that starts a maximal chain
/// of length >= 2 whose interior nodes each have exactly one non-framing
/// in-neighbor and one non-framing out-neighbor, and folds the chain into
/// a single `Conjunction`.
fn try_concatenation<S: Clone + Eq + Hash + std::fmt::Debug>(graph: &mut Graph<S>) -> bool {
    let nodes: Vec<Re<S>> = graph.nodes().filter(|n| !n.is_framing()).cloned().collect();
    for node in &nodes {
        let chain = concatenable_chain(graph, node);
        if chain.len() < 2 {
            continue;
        }
        log::debug!("rewrite: concatenation rule fires on {:?}", chain);
        let new_node = Re::conjunction(chain.clone());
        graph.add_node(new_node.clone());
        let first = chain.first().unwrap();
        let last = chain.last().unwrap();
        for (s, _) in graph.in_edges(first) {
            graph.replace_edge((s.clone(), first.clone()), (s, new_node.clone()));
        }
        for (_, t) in graph.out_edges(last) {
            graph.replace_edge((last.clone(), t.clone()), (new_node.clone(), t));
        }
        for member in &chain {
            graph.remove_node(member);
        }
        return true;
    }
    false
}

/// A single non-framing out-neighbor of `node`, if it has exactly one.
fn single_out<S: Clone + Eq + Hash>(graph: &Graph<S>, node: &Re<S>) -> Option<Re<S>> {
    let mut it = graph.out_edges(node).into_iter().map(|(_, t)| t).filter(|t| !t.is_framing());
    let first = it.next()?;
    if it.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// A single non-framing in-neighbor of `node`, if it has exactly one.
fn single_in<S: Clone + Eq + Hash>(graph: &Graph<S>, node: &Re<S>) -> Option<Re<S>> {
    let mut it = graph.in_edges(node).into_iter().map(|(s, _)| s).filter(|s| !s.is_framing());
    let first = it.next()?;
    if it.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Extends `node` into the maximal concatenable chain containing it:
/// follows single-out/single-in links in both directions as long as the
/// interior condition (exactly one non-framing in- and out-neighbor) holds.
fn concatenable_chain<S: Clone + Eq + Hash>(graph: &Graph<S>, node: &Re<S>) -> Vec<Re<S>> {
    let mut chain = vec![node.clone()];
    let mut seen: HashSet<Re<S>> = chain.iter().cloned().collect();

    // Extend rightward: the current last element has a single non-framing
    // successor, which becomes part of the chain as long as each interior
    // element also has a single non-framing predecessor.
    loop {
        let last = chain.last().unwrap();
        let next = match single_out(graph, last) {
            Some(n) if !seen.contains(&n) => n,
            _ => break,
        };
        if single_in(graph, &next) != Some(last.clone()) {
            break;
        }
        chain.push(next.clone());
        seen.insert(next);
    }

    // Extend leftward symmetrically.
    loop {
        let first = chain.first().unwrap();
        let prev = match single_in(graph, first) {
            Some(n) if !seen.contains(&n) => n,
            _ => break,
        };
        if single_out(graph, &prev) != Some(first.clone()) {
            break;
        }
        chain.insert(0, prev.clone());
        seen.insert(prev);
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::infer_automaton;

    fn seq(s: &str) -> Vec<String> {
        s.chars().map(|c| c.to_string()).collect()
    }

    #[test]
    fn self_loop_before_anything_else() {
        let mut g: Graph<String> = Graph::new();
        let a = Re::symbol("a".to_string());
        g.add_node(a.clone());
        g.add_edge(Re::Start, a.clone());
        g.add_edge(a.clone(), a.clone());
        g.add_edge(a.clone(), Re::End);

        rewrite(&mut g);
        assert!(g.is_final());
        assert_eq!(g.final_term(), Some(Re::repeat(a)));
    }

    #[test]
    fn concatenation_reduces_simple_chain() {
        let g = infer_automaton(vec![seq("ab")]);
        let mut g = g;
        rewrite(&mut g);
        assert!(g.is_final());
        assert_eq!(
            g.final_term(),
            Some(Re::conjunction(vec![
                Re::symbol("a".to_string()),
                Re::symbol("b".to_string())
            ]))
        );
    }

    #[test]
    fn rewrite_never_increases_size() {
        let mut g = infer_automaton(vec![seq("bacacdacde"), seq("cbacdbacde")]);
        loop {
            let before = g.node_count() + g.edge_count();
            let fired = try_optional(&mut g)
                || try_self_loop(&mut g)
                || try_disjunction(&mut g)
                || try_concatenation(&mut g);
            if !fired {
                break;
            }
            assert!(g.node_count() + g.edge_count() <= before);
        }
    }
}
