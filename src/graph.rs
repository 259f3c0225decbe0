//! The mutable labeled directed graph (C2) that rewriting operates on: the
//! generalized finite automaton (GFA).
//!
//! Nodes are `Re<S>` values, not identities — two structurally equal compound
//! terms are the same node — so both the node set and the edge set are
//! indexed by value. We keep an [`indexmap::IndexSet`] rather than a plain
//! `HashSet` so that iteration order matches insertion order, which is what
//! makes rule selection deterministic (§5, §9 Design Notes).

use std::collections::HashSet;
use std::hash::Hash;

use indexmap::IndexSet;

use crate::term::Re;

/// A generalized finite automaton: the graph 2T-INF builds and rewriting
/// reduces in place.
#[derive(Clone, Debug)]
pub struct Graph<S> {
    nodes: IndexSet<Re<S>>,
    edges: IndexSet<(Re<S>, Re<S>)>,
}

impl<S: Clone + Eq + Hash> Graph<S> {
    /// A fresh graph containing only the `Start` and `End` sentinels.
    pub fn new() -> Self {
        let mut nodes = IndexSet::new();
        nodes.insert(Re::Start);
        nodes.insert(Re::End);
        Graph {
            nodes,
            edges: IndexSet::new(),
        }
    }

    /// Iterates nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Re<S>> {
        self.nodes.iter()
    }

    /// Number of nodes, `|V|`.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges, `|E|`.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether `n` is currently a node of this graph.
    pub fn has_node(&self, n: &Re<S>) -> bool {
        self.nodes.contains(n)
    }

    /// Whether the edge `(s, t)` exists.
    pub fn has_edge(&self, s: &Re<S>, t: &Re<S>) -> bool {
        self.edges.contains(&(s.clone(), t.clone()))
    }

    /// Adds `n` to the node set. A no-op if `n` is already present.
    pub fn add_node(&mut self, n: Re<S>) {
        self.nodes.insert(n);
    }

    /// Removes `n` and every edge incident to it. A no-op if `n` is absent.
    pub fn remove_node(&mut self, n: &Re<S>) {
        if !self.nodes.contains(n) {
            return;
        }
        let incident: Vec<(Re<S>, Re<S>)> = self
            .edges
            .iter()
            .filter(|(s, t)| s == n || t == n)
            .cloned()
            .collect();
        for edge in incident {
            self.edges.shift_remove(&edge);
        }
        self.nodes.shift_remove(n);
    }

    /// Adds the edge `(s, t)`. Idempotent: re-adding an existing edge is a
    /// no-op.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint is not already a member of the node set.
    pub fn add_edge(&mut self, s: Re<S>, t: Re<S>) {
        assert!(
            self.nodes.contains(&s) && self.nodes.contains(&t),
            "add_edge: both endpoints must already be nodes of the graph"
        );
        self.edges.insert((s, t));
    }

    /// Removes the edge `(s, t)`. A no-op if the edge is absent.
    pub fn remove_edge(&mut self, s: &Re<S>, t: &Re<S>) {
        self.edges.shift_remove(&(s.clone(), t.clone()));
    }

    /// Removes `old` and inserts `new`, deduplicated.
    ///
    /// # Panics
    ///
    /// Panics if `old` is not a current edge.
    pub fn replace_edge(&mut self, old: (Re<S>, Re<S>), new: (Re<S>, Re<S>)) {
        assert!(self.edges.contains(&old), "replace_edge: original edge absent");
        self.edges.shift_remove(&old);
        self.edges.insert(new);
    }

    /// The pivotal structural operation used by rewrite rules to fold a node
    /// into a compound term: adds `new` (if absent), rewires every edge
    /// incident to `old` onto `new`, and removes `old`.
    pub fn replace_node(&mut self, old: &Re<S>, new: Re<S>) {
        self.add_node(new.clone());

        let self_loop = (old.clone(), old.clone());
        if self.edges.contains(&self_loop) {
            self.edges.shift_remove(&self_loop);
            self.edges.insert((new.clone(), new.clone()));
        }

        let out_edges: Vec<(Re<S>, Re<S>)> =
            self.edges.iter().filter(|(s, _)| s == old).cloned().collect();
        let in_edges: Vec<(Re<S>, Re<S>)> =
            self.edges.iter().filter(|(_, t)| t == old).cloned().collect();

        for (s, t) in out_edges {
            self.replace_edge((s.clone(), t.clone()), (new.clone(), t));
        }
        for (s, t) in in_edges {
            self.replace_edge((s.clone(), t.clone()), (s, new.clone()));
        }

        self.nodes.shift_remove(old);
    }

    /// Edges leaving `n`.
    pub fn out_edges(&self, n: &Re<S>) -> Vec<(Re<S>, Re<S>)> {
        self.edges.iter().filter(|(s, _)| s == n).cloned().collect()
    }

    /// Edges entering `n`.
    pub fn in_edges(&self, n: &Re<S>) -> Vec<(Re<S>, Re<S>)> {
        self.edges.iter().filter(|(_, t)| t == n).cloned().collect()
    }

    /// The extent-closure successor set `Succ(n)`: direct successors of `n`,
    /// extended transitively through any intermediate node that matches the
    /// empty string (§4.2).
    pub fn succ(&self, n: &Re<S>) -> HashSet<Re<S>> {
        extent_closure(n, |x| {
            self.out_edges(x).into_iter().map(|(_, t)| t).collect()
        })
    }

    /// The extent-closure predecessor set `Pred(n)`, symmetric to [`Self::succ`].
    pub fn pred(&self, n: &Re<S>) -> HashSet<Re<S>> {
        extent_closure(n, |x| {
            self.in_edges(x).into_iter().map(|(s, _)| s).collect()
        })
    }

    /// Whether the GFA has reached the final shape: exactly `{Start, X, End}`
    /// with edges `{(Start, X), (X, End)}`.
    pub fn is_final(&self) -> bool {
        self.nodes.len() == 3 && self.edges.len() == 2
    }

    /// The inferred term `X`, once [`Self::is_final`] holds: the sole
    /// non-framing node. Returns `None` if the graph isn't final.
    pub fn final_term(&self) -> Option<Re<S>> {
        if !self.is_final() {
            return None;
        }
        self.nodes.iter().find(|n| !n.is_framing()).cloned()
    }
}

impl<S: Clone + Eq + Hash> Default for Graph<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// The shared traversal behind both `Pred` and `Succ`: a worklist search
/// that follows `direct(n)` and keeps expanding through any node that
/// matches the empty string, per §4.2.
fn extent_closure<S, F>(node: &Re<S>, direct: F) -> HashSet<Re<S>>
where
    S: Clone + Eq + Hash,
    F: Fn(&Re<S>) -> Vec<Re<S>>,
{
    let mut result: HashSet<Re<S>> = direct(node).into_iter().collect();
    let mut queue: Vec<Re<S>> = result.iter().cloned().collect();
    let mut trash: HashSet<Re<S>> = HashSet::new();

    while let Some(which) = queue.pop() {
        trash.insert(which.clone());
        if which.matches_empty() {
            log::trace!("extent-closure: expanding through empty-accepting node");
            let extent: Vec<Re<S>> = direct(&which);
            for e in &extent {
                result.insert(e.clone());
            }
            for e in extent {
                if !trash.contains(&e) && !queue.contains(&e) {
                    queue.push(e);
                }
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Re<String> {
        Re::symbol(s.to_string())
    }

    #[test]
    fn replace_node_rewires_self_loop() {
        let mut g = Graph::new();
        let a = sym("a");
        g.add_node(a.clone());
        g.add_edge(Re::Start, a.clone());
        g.add_edge(a.clone(), a.clone());
        g.add_edge(a.clone(), Re::End);

        let rep = Re::repeat(a.clone());
        g.replace_node(&a, rep.clone());

        assert!(g.has_edge(&rep, &rep));
        assert!(g.has_edge(&Re::Start, &rep));
        assert!(g.has_edge(&rep, &Re::End));
        assert!(!g.has_node(&a));
    }

    #[test]
    fn succ_looks_through_empty_accepting_nodes() {
        let mut g = Graph::new();
        let a = sym("a");
        let opt_a = Re::optional(a.clone());
        let b = sym("b");
        g.add_node(opt_a.clone());
        g.add_node(b.clone());
        g.add_edge(Re::Start, opt_a.clone());
        g.add_edge(opt_a.clone(), b.clone());
        g.add_edge(b.clone(), Re::End);

        let succ_start = g.succ(&Re::Start);
        assert!(succ_start.contains(&opt_a));
        assert!(succ_start.contains(&b));
    }

    #[test]
    #[should_panic]
    fn add_edge_requires_known_endpoints() {
        let mut g: Graph<String> = Graph::new();
        g.add_edge(Re::Start, sym("a"));
    }
}
