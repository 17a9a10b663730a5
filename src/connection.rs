//! A connection: an ordered history of snapshots behind a single
//! atomically-swapped reference.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{info, warn};

use crate::attribute::{AttrName, UpdateOp};
use crate::entity::{Entity, EntityId};
use crate::error::Result;
use crate::graph::{Direction, Strategy, Traversal};
use crate::history;
use crate::snapshot::Snapshot;
use crate::transactor::{self, Op};
use crate::value::Value;

type History = Vec<Arc<Snapshot>>;

/// An ordered, non-empty history of [`Snapshot`]s. The last element is
/// the present.
///
/// Reads take a single atomic load of the history pointer and then
/// operate against a snapshot that can never change beneath them. Writes
/// go through [`Connection::transact`], which reads the present, computes
/// the next snapshot, and retries a compare-and-set against the history
/// pointer until it lands without a concurrent writer racing it.
pub struct Connection {
    history: ArcSwap<History>,
}

impl Connection {
    /// A connection with one initial empty snapshot at `curr_time = 0`.
    pub fn new() -> Connection {
        Connection {
            history: ArcSwap::from_pointee(vec![Arc::new(Snapshot::empty())]),
        }
    }

    /// The present snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.history.load().last().expect("history is never empty").clone()
    }

    /// Number of snapshots in this connection's history.
    pub fn history_len(&self) -> usize {
        self.history.load().len()
    }

    /// The snapshot at position `k` in the history, oldest first, or
    /// `None` if out of range. Every prior snapshot stays addressable
    /// this way even after later writes have moved the present on.
    pub fn snapshot_at(&self, k: usize) -> Option<Arc<Snapshot>> {
        self.history.load().get(k).cloned()
    }

    /// Apply a batch of operations atomically against the present
    /// snapshot, appending exactly one new snapshot to the history on
    /// success. On error, nothing is appended.
    ///
    /// A concurrent writer that commits between this call's read of the
    /// present and its compare-and-set causes a retry: the whole batch is
    /// recomputed against the new present. Under contention the relative
    /// order of two racing transacts is non-deterministic, but each still
    /// commits atomically as a whole.
    pub fn transact(&self, ops: &[Op]) -> Result<Arc<Snapshot>> {
        if ops.is_empty() {
            return Ok(self.snapshot());
        }
        let mut retries = 0u32;
        loop {
            let current = self.history.load_full();
            let present = current.last().expect("history is never empty");
            let next = transactor::apply_ops(present, ops)?;

            let mut candidate = (*current).clone();
            candidate.push(Arc::new(next));
            let candidate = Arc::new(candidate);

            let previous = self.history.compare_and_swap(&current, candidate.clone());
            if Arc::ptr_eq(&previous, &current) {
                if retries > 0 {
                    warn!(retries, "transact committed after compare-and-set retries");
                }
                info!(curr_time = candidate.last().unwrap().curr_time(), "transact committed");
                return Ok(candidate.last().expect("just pushed").clone());
            }
            retries += 1;
        }
    }

    /// Add one entity in its own transact.
    pub fn add_entity(&self, entity: Entity) -> Result<Arc<Snapshot>> {
        self.transact(&[Op::AddEntity(entity)])
    }

    /// Add several entities as a single transact: either all land, or
    /// none do.
    pub fn add_entities(&self, entities: impl IntoIterator<Item = Entity>) -> Result<Arc<Snapshot>> {
        let ops: Vec<Op> = entities.into_iter().map(Op::AddEntity).collect();
        self.transact(&ops)
    }

    /// Update one attribute of one entity in its own transact.
    pub fn update_entity(&self, id: EntityId, attr: AttrName, value: Value, op: UpdateOp) -> Result<Arc<Snapshot>> {
        self.transact(&[Op::UpdateEntity { id, attr, value, op }])
    }

    /// Remove one entity in its own transact.
    pub fn remove_entity(&self, id: EntityId) -> Result<Arc<Snapshot>> {
        self.transact(&[Op::RemoveEntity(id)])
    }

    /// Every recorded version of one entity's attribute, oldest first, as
    /// seen from the present snapshot.
    pub fn evolution_of(&self, id: &EntityId, attr_name: &AttrName) -> Vec<(u64, crate::attribute::Attribute)> {
        let hist = self.history.load_full();
        let present = hist.last().expect("history is never empty");
        history::evolution_of(&hist, present, id, attr_name)
    }

    /// Walk the reference graph from `root_id` against the present
    /// snapshot.
    pub fn traverse(&self, root_id: &EntityId, strategy: Strategy, direction: Direction) -> Vec<Entity> {
        let present = self.snapshot();
        Traversal::new(root_id, &present, strategy, direction).collect()
    }
}

impl Default for Connection {
    fn default() -> Self {
        Connection::new()
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;
