//! Clause compilation: term -> (predicate, captured variable).

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::index::Atom;
use crate::query::term::{Clause, Term};

/// A compiled clause: three predicates plus the variable name (or `None`)
/// each position captures, in EAV order.
#[derive(Clone)]
pub struct PredicateClause {
    pub preds: [Arc<dyn Fn(&Atom) -> bool + Send + Sync>; 3],
    pub vars: [Option<String>; 3],
}

fn is_wildcard(name: &str) -> bool {
    name == "_"
}

fn compile_term(term: &Term) -> (Arc<dyn Fn(&Atom) -> bool + Send + Sync>, Option<String>) {
    match term {
        Term::Wildcard => (Arc::new(|_: &Atom| true), None),
        Term::Var(name) if is_wildcard(name) => (Arc::new(|_: &Atom| true), None),
        Term::Var(name) => (Arc::new(|_: &Atom| true), Some(name.clone())),
        Term::Lit(atom) => {
            let atom = atom.clone();
            (Arc::new(move |candidate: &Atom| candidate == &atom), None)
        }
        Term::UnaryPred { var, pred } => {
            let pred = pred.clone();
            let var = if is_wildcard(var) { None } else { Some(var.clone()) };
            (pred, var)
        }
        Term::BinaryPred { var, pred } => {
            let pred = pred.clone();
            let var = if is_wildcard(var) { None } else { Some(var.clone()) };
            (pred, var)
        }
    }
}

/// Compile one `[e_term, a_term, v_term]` clause into a [`PredicateClause`].
/// `MalformedClause` if the clause captures no variable at all.
pub fn compile_clause(clause: &Clause) -> Result<PredicateClause> {
    let mut preds: Vec<Arc<dyn Fn(&Atom) -> bool + Send + Sync>> = Vec::with_capacity(3);
    let mut vars: Vec<Option<String>> = Vec::with_capacity(3);

    for term in clause.iter() {
        let (pred, var) = compile_term(term);
        preds.push(pred);
        vars.push(var);
    }

    if vars.iter().all(Option::is_none) {
        return Err(Error::MalformedClause(
            "clause must capture at least one variable".to_string(),
        ));
    }

    Ok(PredicateClause {
        preds: [preds[0].clone(), preds[1].clone(), preds[2].clone()],
        vars: [vars[0].clone(), vars[1].clone(), vars[2].clone()],
    })
}

/// Compile every clause of a `where` list.
pub fn compile(clauses: &[Clause]) -> Result<Vec<PredicateClause>> {
    clauses.iter().map(compile_clause).collect()
}

#[cfg(test)]
#[path = "compiler_test.rs"]
mod compiler_test;
