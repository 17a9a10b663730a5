//! Reconstructing the evolution of one attribute of one entity across
//! snapshots.

use std::sync::Arc;

use crate::attribute::{AttrName, Attribute};
use crate::entity::EntityId;
use crate::snapshot::Snapshot;

/// Every recorded version of one entity's attribute, oldest first.
///
/// Walks `prev_ts` pointers from the attribute as it stands in `snap`
/// backwards to `None`, looking each prior version up in `history` (the
/// full sequence of snapshots addressable through a
/// [`crate::connection::Connection`]). Returns `(snap_time, Attribute)`
/// pairs oldest first. A missing entity or attribute at some point in the
/// walk ends the walk there rather than failing: the returned vector is
/// simply truncated to the versions found so far.
pub fn evolution_of(
    history: &[Arc<Snapshot>],
    snap: &Snapshot,
    id: &EntityId,
    attr_name: &AttrName,
) -> Vec<(u64, Attribute)> {
    let mut versions = Vec::new();

    let mut current = snap.attr_at(id, attr_name).cloned();
    while let Some(attr) = current {
        let ts = attr.curr_ts();
        let prev_ts = attr.prev_ts();
        versions.push((ts, attr));

        current = match prev_ts {
            None => None,
            Some(prev_ts) => history
                .get(prev_ts as usize)
                .and_then(|s| s.attr_at(id, attr_name))
                .cloned(),
        };
    }

    versions.reverse();
    versions
}

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;
