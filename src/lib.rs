//! Infers a concise single-occurrence regular expression (SORE) from a
//! finite set of example sequences of labeled symbols.
//!
//! The canonical application is inferring the content model of an XML
//! element (the right-hand side of a DTD rule) from observed child
//! sequences, but the core operates on any sequences of hashable tokens.
//!
//! Inference runs in two stages: [`infer_automaton`] builds a generalized
//! finite automaton (GFA) whose edges union all observed 2-grams, and
//! [`infer_sore`] collapses that GFA in place into a single regular
//! expression term by interleaving structural rewrite rules with repairs
//! that locally perturb the graph when rewriting stalls. [`infer`] wires
//! the two together.
//!
//! No logger is installed by this crate; callers who want to see the
//! firing sequence of rewrite rules and repairs should install one (e.g.
//! `env_logger`) and enable `trace`/`debug` level output.

#![deny(unsafe_code)]
#![cfg_attr(test, deny(warnings))]
#![cfg_attr(test, allow(missing_docs))]

mod graph;
mod infer;
mod repair;
mod rewrite;
mod term;

pub use crate::graph::Graph;
pub use crate::infer::{infer, infer_automaton, infer_sore};
pub use crate::term::Re;
