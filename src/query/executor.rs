//! Index selection, per-clause filtering, join-by-frequency, binding and
//! projection.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{Error, Result};
use crate::index::{Atom, Index, Permutation};
use crate::query::compiler::{self, PredicateClause};
use crate::query::term::Query;
use crate::snapshot::Snapshot;
use crate::value::Value;

/// One surviving `(l1, l2, leaf-set)` from the per-clause index filter,
/// plus enough metadata to reconstruct `(e, a, v)` triples and rebind
/// them to variable names.
struct ResultPath {
    l1: Atom,
    l2: Atom,
    leaves: HashSet<Atom>,
    permutation: Permutation,
    vars: [Option<String>; 3],
}

impl ResultPath {
    fn eav(&self, leaf: &Atom) -> Option<(Atom, Atom, Atom)> {
        let (e, a, v) = self.permutation.to_eav(&self.l1, &self.l2, leaf)?;
        Some((Atom::Entity(e), Atom::Attr(a), Atom::Value(v)))
    }
}

/// Stage 1: collapse the variable-name triples of all compiled clauses
/// column-wise; the first column where every clause agrees on the same
/// (non-none) variable name is the join-variable position.
fn join_position(clauses: &[PredicateClause]) -> Result<usize> {
    for position in 0..3 {
        let first = match &clauses[0].vars[position] {
            Some(name) => name,
            None => continue,
        };
        if clauses
            .iter()
            .all(|c| c.vars[position].as_deref() == Some(first.as_str()))
        {
            return Ok(position);
        }
    }
    Err(Error::UnsupportedQuery(
        "no column has the same variable across every clause".to_string(),
    ))
}

/// Stage 2: walk `index`, permuting this clause's 3 predicates to line
/// up with the index's (l1, l2, l3) levels, producing one result path
/// per (l1, l2) pair whose filtered leaf set is non-empty.
fn filter_clause(index: &Index, clause: &PredicateClause) -> Vec<ResultPath> {
    let permutation = index.permutation();
    let positions = permutation.eav_positions();
    let (p1, p2, p3) = (&clause.preds[positions[0]], &clause.preds[positions[1]], &clause.preds[positions[2]]);

    let mut paths = Vec::new();
    for (l1, l2map) in index.levels().iter() {
        if !p1(l1) {
            continue;
        }
        for (l2, leafset) in l2map.iter() {
            if !p2(l2) {
                continue;
            }
            let leaves: HashSet<Atom> = leafset.iter().filter(|l3| p3(l3)).cloned().collect();
            if leaves.is_empty() {
                continue;
            }
            paths.push(ResultPath {
                l1: l1.clone(),
                l2: l2.clone(),
                leaves,
                permutation,
                vars: clause.vars.clone(),
            });
        }
    }
    paths
}

/// Stage 3: keep only leaf items that appear across every clause, then
/// intersect each path's leaves against that kept set, dropping paths
/// left with nothing.
fn join_by_frequency(mut per_clause_paths: Vec<Vec<ResultPath>>) -> Vec<Vec<ResultPath>> {
    let clause_count = per_clause_paths.len();

    let clause_leaf_sets: Vec<HashSet<Atom>> = per_clause_paths
        .iter()
        .map(|paths| paths.iter().flat_map(|p| p.leaves.iter().cloned()).collect())
        .collect();

    let mut counts: HashMap<Atom, usize> = HashMap::new();
    for set in &clause_leaf_sets {
        for atom in set {
            *counts.entry(atom.clone()).or_insert(0) += 1;
        }
    }
    let kept: HashSet<Atom> = counts
        .into_iter()
        .filter(|(_, count)| *count == clause_count)
        .map(|(atom, _)| atom)
        .collect();

    for paths in per_clause_paths.iter_mut() {
        for path in paths.iter_mut() {
            path.leaves.retain(|leaf| kept.contains(leaf));
        }
        paths.retain(|p| !p.leaves.is_empty());
    }
    per_clause_paths
}

/// Stage 4: expand surviving paths to rows, keyed by the join value so
/// bindings from every clause that shares a join value are merged into
/// one row, then project to `find`.
fn bind_and_project(per_clause_paths: Vec<Vec<ResultPath>>, find: &[String]) -> Vec<Vec<(String, Value)>> {
    // One map per clause: join-value -> every binding-map this clause
    // produces for that join value (usually one, more if a
    // multi-cardinality attribute fans a single entity out to several
    // leaves under the same (l1, l2)).
    let mut per_clause_bindings: Vec<HashMap<Atom, Vec<Vec<(String, Value)>>>> = Vec::new();

    for paths in &per_clause_paths {
        let mut bindings: HashMap<Atom, Vec<Vec<(String, Value)>>> = HashMap::new();
        for path in paths {
            for leaf in &path.leaves {
                let Some((e, a, v)) = path.eav(leaf) else { continue };
                let positions = [e, a, v];
                let mut row = Vec::new();
                for (atom, var) in positions.iter().zip(path.vars.iter()) {
                    if let Some(name) = var {
                        if find.contains(name) {
                            row.push((name.clone(), atom.to_value()));
                        }
                    }
                }
                bindings.entry(leaf.clone()).or_default().push(row);
            }
        }
        per_clause_bindings.push(bindings);
    }

    let Some(first) = per_clause_bindings.first() else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    'join_values: for join_value in first.keys() {
        let mut candidate_rows: Vec<Vec<(String, Value)>> = vec![Vec::new()];
        for bindings in &per_clause_bindings {
            let Some(options) = bindings.get(join_value) else {
                continue 'join_values;
            };
            let mut next = Vec::new();
            for base in &candidate_rows {
                for option in options {
                    let mut merged = base.clone();
                    for (name, value) in option {
                        if !merged.iter().any(|(n, _)| n == name) {
                            merged.push((name.clone(), value.clone()));
                        }
                    }
                    next.push(merged);
                }
            }
            candidate_rows = next;
        }
        rows.extend(candidate_rows);
    }
    rows
}

/// Run a query against a snapshot, returning one row per distinct binding
/// of the `find` variables.
pub fn execute(snap: &Snapshot, query: &Query) -> Result<Vec<Vec<(String, Value)>>> {
    let clauses = compiler::compile(&query.where_)?;
    if clauses.is_empty() {
        return Ok(Vec::new());
    }

    let join_position = join_position(&clauses)?;
    let permutation = Permutation::for_join_position(join_position)
        .ok_or_else(|| Error::UnsupportedQuery("join position out of range".to_string()))?;
    let index = snap.index(permutation);

    let per_clause_paths: Vec<Vec<ResultPath>> =
        clauses.iter().map(|clause| filter_clause(index, clause)).collect();
    let per_clause_paths = join_by_frequency(per_clause_paths);

    debug!(clauses = clauses.len(), join_position, "query executed");
    Ok(bind_and_project(per_clause_paths, &query.find))
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod executor_test;
