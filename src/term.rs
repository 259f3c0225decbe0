//! Regular expression terms (C1).
//!
//! A term is the algebraic object rewritten in place as the GFA reduces:
//! atomic symbols, the four operator forms, and the two framing sentinels
//! `Start`/`End` that are never themselves wrapped by a rewrite rule.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A regular expression term over an alphabet of symbols `S`.
///
/// `Start` and `End` are modeled as dedicated variants rather than as
/// `Symbol(S)` values, so that a caller's own symbol type can never collide
/// with the reserved framing sentinels.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub enum Re<S> {
    /// The reserved start-of-sequence sentinel. Never wrapped, never matched
    /// against user symbols.
    Start,
    /// The reserved end-of-sequence sentinel.
    End,
    /// An atomic leaf symbol.
    Symbol(S),
    /// `t+`: one or more repetitions of `t`.
    Repeat(Box<Re<S>>),
    /// `t*`: zero or more repetitions of `t`.
    Kleene(Box<Re<S>>),
    /// `t?`: zero or one occurrence of `t`.
    Optional(Box<Re<S>>),
    /// `t1,t2,...,tk`: an ordered sequence, `k >= 2`.
    Conjunction(Vec<Re<S>>),
    /// `t1|t2|...|tk`: an unordered choice, `k >= 2`. Equality and hashing
    /// treat the operand list as a multiset.
    Disjunction(Vec<Re<S>>),
}

impl<S> Re<S> {
    /// Builds an atomic leaf.
    pub fn symbol(s: S) -> Self {
        Re::Symbol(s)
    }

    /// Builds `Repeat(t)`.
    pub fn repeat(t: Re<S>) -> Self {
        Re::Repeat(Box::new(t))
    }

    /// Builds `Kleene(t)`.
    pub fn kleene(t: Re<S>) -> Self {
        Re::Kleene(Box::new(t))
    }

    /// Builds `Optional(t)`.
    pub fn optional(t: Re<S>) -> Self {
        Re::Optional(Box::new(t))
    }

    /// Builds `Conjunction(ts)`.
    ///
    /// # Panics
    ///
    /// Panics if `ts` has fewer than two operands; a `Conjunction` of arity
    /// less than two is a programming fault, not a representable term.
    pub fn conjunction(ts: Vec<Re<S>>) -> Self {
        assert!(
            ts.len() >= 2,
            "Conjunction requires at least two operands, got {}",
            ts.len()
        );
        Re::Conjunction(ts)
    }

    /// Builds `Disjunction(ts)`.
    ///
    /// # Panics
    ///
    /// Panics if `ts` has fewer than two operands.
    pub fn disjunction(ts: Vec<Re<S>>) -> Self {
        assert!(
            ts.len() >= 2,
            "Disjunction requires at least two operands, got {}",
            ts.len()
        );
        Re::Disjunction(ts)
    }

    /// Whether this is the `Start` or `End` sentinel.
    pub fn is_framing(&self) -> bool {
        matches!(self, Re::Start | Re::End)
    }

    /// Whether this term matches the empty string.
    ///
    /// `Symbol`, `Start` and `End` never match empty; `Kleene` and
    /// `Optional` always do; `Repeat` follows its target; `Conjunction`
    /// requires every operand to match empty; `Disjunction` requires any
    /// operand to.
    pub fn matches_empty(&self) -> bool {
        match self {
            Re::Start | Re::End | Re::Symbol(_) => false,
            Re::Repeat(t) => t.matches_empty(),
            Re::Kleene(_) | Re::Optional(_) => true,
            Re::Conjunction(ts) => ts.iter().all(|t| t.matches_empty()),
            Re::Disjunction(ts) => ts.iter().any(|t| t.matches_empty()),
        }
    }
}

impl<S: PartialEq> PartialEq for Re<S> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Re::Start, Re::Start) | (Re::End, Re::End) => true,
            (Re::Symbol(a), Re::Symbol(b)) => a == b,
            (Re::Repeat(a), Re::Repeat(b)) => a == b,
            (Re::Kleene(a), Re::Kleene(b)) => a == b,
            (Re::Optional(a), Re::Optional(b)) => a == b,
            (Re::Conjunction(a), Re::Conjunction(b)) => a == b,
            (Re::Disjunction(a), Re::Disjunction(b)) => multiset_eq(a, b),
            _ => false,
        }
    }
}

impl<S: Eq> Eq for Re<S> {}

/// Compares two operand lists as multisets, the equality rule `Disjunction`
/// uses since its operands are order-insensitive (§3, Data Model).
fn multiset_eq<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        used.iter_mut()
            .zip(b.iter())
            .find(|(used, y)| !**used && x == *y)
            .map(|(used, _)| *used = true)
            .is_some()
    })
}

impl<S: Hash> Hash for Re<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Re::Start => 0u8.hash(state),
            Re::End => 1u8.hash(state),
            Re::Symbol(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            Re::Repeat(t) => {
                3u8.hash(state);
                t.hash(state);
            }
            Re::Kleene(t) => {
                4u8.hash(state);
                t.hash(state);
            }
            Re::Optional(t) => {
                5u8.hash(state);
                t.hash(state);
            }
            Re::Conjunction(ts) => {
                6u8.hash(state);
                ts.hash(state);
            }
            Re::Disjunction(ts) => {
                7u8.hash(state);
                // XOR is commutative, so the combined value doesn't depend
                // on operand order, matching the multiset equality above.
                let combined = ts.iter().fold(0u64, |acc, t| {
                    let mut h = DefaultHasher::new();
                    t.hash(&mut h);
                    acc ^ h.finish()
                });
                combined.hash(state);
            }
        }
    }
}

/// Writes `t` as an operand, parenthesizing it only if it's ambiguous
/// without the grouping: `Conjunction`/`Disjunction` operands. Postfix
/// forms (`Repeat`/`Kleene`/`Optional`) bind tightly enough as written
/// (`a,b?`, not `a,(b?)`) that they never need enclosing parens.
fn fmt_enclosed<S: fmt::Display>(t: &Re<S>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match t {
        Re::Conjunction(_) | Re::Disjunction(_) => write!(f, "({})", t),
        _ => write!(f, "{}", t),
    }
}

impl<S: fmt::Display> fmt::Display for Re<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Re::Start => write!(f, "<start>"),
            Re::End => write!(f, "<end>"),
            Re::Symbol(s) => write!(f, "{}", s),
            Re::Repeat(t) => {
                fmt_enclosed(t, f)?;
                write!(f, "+")
            }
            Re::Kleene(t) => {
                fmt_enclosed(t, f)?;
                write!(f, "*")
            }
            Re::Optional(t) => {
                fmt_enclosed(t, f)?;
                write!(f, "?")
            }
            Re::Conjunction(ts) => {
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    fmt_enclosed(t, f)?;
                }
                Ok(())
            }
            Re::Disjunction(ts) => {
                for (i, t) in ts.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    fmt_enclosed(t, f)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_empty_rules() {
        let a = Re::symbol("a");
        assert!(!a.matches_empty());
        assert!(!Re::repeat(a.clone()).matches_empty());
        assert!(Re::kleene(a.clone()).matches_empty());
        assert!(Re::optional(a.clone()).matches_empty());

        let opt_a = Re::optional(a.clone());
        assert!(Re::conjunction(vec![a.clone(), opt_a.clone()]).matches_empty() == false);
        assert!(Re::conjunction(vec![opt_a.clone(), opt_a.clone()]).matches_empty());
        assert!(Re::disjunction(vec![a.clone(), opt_a.clone()]).matches_empty());
        assert!(!Re::disjunction(vec![a.clone(), Re::symbol("b")]).matches_empty());
    }

    #[test]
    fn disjunction_equality_is_order_insensitive() {
        let a = Re::symbol("a");
        let b = Re::symbol("b");
        assert_eq!(
            Re::disjunction(vec![a.clone(), b.clone()]),
            Re::disjunction(vec![b.clone(), a.clone()])
        );
        assert_ne!(
            Re::conjunction(vec![a.clone(), b.clone()]),
            Re::conjunction(vec![b.clone(), a.clone()])
        );
    }

    #[test]
    #[should_panic]
    fn conjunction_requires_arity_two() {
        let _ = Re::conjunction(vec![Re::symbol("a")]);
    }

    #[test]
    fn display_parenthesizes_non_atomic_operands() {
        let a = Re::symbol("a");
        let b = Re::symbol("b");
        let opt_b = Re::optional(b.clone());
        let conj = Re::conjunction(vec![a.clone(), opt_b.clone()]);
        assert_eq!(conj.to_string(), "a,b?");

        let disj = Re::disjunction(vec![a.clone(), conj.clone()]);
        assert_eq!(disj.to_string(), "a|(a,b?)");
    }
}
