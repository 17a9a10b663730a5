//! Query clause terms.
//!
//! A clause is `[e_term, a_term, v_term]`. Each term is a bare variable, a
//! wildcard, a literal, or a predicate application capturing a variable.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::index::Atom;
use crate::value::Value;

type PredFn = Arc<dyn Fn(&Atom) -> bool + Send + Sync>;

/// One position within a [`Clause`].
#[derive(Clone)]
pub enum Term {
    /// A bound variable, e.g. `?id`. `_` is the wildcard and never binds
    /// (use [`Term::Wildcard`] explicitly, or pass `"_"` — both compile
    /// the same way).
    Var(String),
    /// Matches anything, captures nothing.
    Wildcard,
    /// An equality literal, e.g. `:patient/city`.
    Lit(Atom),
    /// `(pred ?x)`.
    UnaryPred { var: String, pred: PredFn },
    /// `(op ?x lit)` or `(op lit ?x)`, already resolved to "does the
    /// variable's value satisfy this predicate" by [`Term::compare`].
    BinaryPred { var: String, pred: PredFn },
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(v) => write!(f, "Var({v})"),
            Term::Wildcard => write!(f, "_"),
            Term::Lit(v) => write!(f, "Lit({v:?})"),
            Term::UnaryPred { var, .. } => write!(f, "UnaryPred(?{var})"),
            Term::BinaryPred { var, .. } => write!(f, "BinaryPred(?{var})"),
        }
    }
}

/// A binary comparison operator for [`Term::compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    fn satisfied(&self, ord: Ordering) -> bool {
        match (self, ord) {
            (CompareOp::Lt, Ordering::Less) => true,
            (CompareOp::Le, Ordering::Less | Ordering::Equal) => true,
            (CompareOp::Gt, Ordering::Greater) => true,
            (CompareOp::Ge, Ordering::Greater | Ordering::Equal) => true,
            (CompareOp::Eq, Ordering::Equal) => true,
            (CompareOp::Ne, Ordering::Less | Ordering::Greater) => true,
            _ => false,
        }
    }
}

impl Term {
    pub fn var(name: impl Into<String>) -> Term {
        Term::Var(name.into())
    }

    pub fn wildcard() -> Term {
        Term::Wildcard
    }

    pub fn lit(value: impl Into<Atom>) -> Term {
        Term::Lit(value.into())
    }

    pub fn unary(var: impl Into<String>, pred: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Term {
        Term::UnaryPred {
            var: var.into(),
            pred: Arc::new(move |atom| pred(&atom.to_value())),
        }
    }

    /// `(op ?var literal)`, e.g. `Term::compare("b", CompareOp::Lt, 200.into())`
    /// for the clause-reading `(> 200 ?b)` (200 > b).
    pub fn compare(var: impl Into<String>, op: CompareOp, literal: Value) -> Term {
        Term::BinaryPred {
            var: var.into(),
            pred: Arc::new(move |atom| op.satisfied(atom.to_value().cmp(&literal))),
        }
    }
}

/// A triple `[e_term, a_term, v_term]`.
pub type Clause = [Term; 3];

/// A compiled-ready query: which variables to project, and the clauses
/// that bind them.
#[derive(Clone)]
pub struct Query {
    pub find: Vec<String>,
    pub where_: Vec<Clause>,
}

impl Query {
    pub fn new(find: Vec<String>, where_: Vec<Clause>) -> Query {
        Query { find, where_ }
    }
}

#[cfg(test)]
#[path = "term_test.rs"]
mod term_test;
