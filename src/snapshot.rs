//! The immutable whole-database value.

use crate::attribute::{AttrName, Attribute};
use crate::entity::{Entity, EntityId, Storage};
use crate::index::{Index, Permutation};
use crate::value::Value;

/// An immutable snapshot of the whole database at one logical time.
///
/// Every write produces a fresh `Snapshot` whose `curr_time` is the
/// predecessor's plus one; no earlier snapshot is ever mutated.
/// Cloning a `Snapshot` is cheap — `Storage` and each `Index` are
/// persistent maps, so an unchanged branch is shared with its
/// predecessor rather than copied.
#[derive(Debug, Clone)]
pub struct Snapshot {
    storage: Storage,
    eavt: Index,
    avet: Index,
    veat: Index,
    top_id: u64,
    curr_time: u64,
}

impl Snapshot {
    /// The initial empty snapshot a fresh [`crate::Connection`] opens
    /// with (`curr_time = 0`).
    pub fn empty() -> Snapshot {
        Snapshot {
            storage: Storage::new(),
            eavt: Index::new(Permutation::Eavt),
            avet: Index::new(Permutation::Avet),
            veat: Index::new(Permutation::Veat),
            top_id: 0,
            curr_time: 0,
        }
    }

    pub fn curr_time(&self) -> u64 {
        self.curr_time
    }

    pub fn top_id(&self) -> u64 {
        self.top_id
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn eavt(&self) -> &Index {
        &self.eavt
    }

    pub fn avet(&self) -> &Index {
        &self.avet
    }

    pub fn veat(&self) -> &Index {
        &self.veat
    }

    pub fn index(&self, permutation: Permutation) -> &Index {
        match permutation {
            Permutation::Eavt => &self.eavt,
            Permutation::Avet => &self.avet,
            Permutation::Veat => &self.veat,
        }
    }

    /// The entity with this id as it stands in this snapshot, if any.
    pub fn entity_at(&self, id: &EntityId) -> Option<&Entity> {
        self.storage.get(id)
    }

    /// One named attribute of one entity as it stands in this snapshot.
    pub fn attr_at(&self, id: &EntityId, attr: &AttrName) -> Option<&Attribute> {
        self.entity_at(id).and_then(|entity| entity.attr(attr))
    }

    /// The current value of one named attribute of one entity.
    pub fn value_of_at(&self, id: &EntityId, attr: &AttrName) -> Option<&Value> {
        self.attr_at(id, attr).map(Attribute::value)
    }

    /// All live entity ids, oldest-insertion order unspecified (persistent
    /// maps do not preserve insertion order); used by
    /// [`crate::history::evolution_of`]'s callers and by tests, not by
    /// the query executor itself.
    pub fn entity_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.storage.keys()
    }

    /// Every live entity in this snapshot, for callers that want to walk
    /// or report on entities without reaching into `Storage` directly.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.storage.values()
    }

    /// Every attribute name defined on entity `id` in this snapshot, or
    /// an empty iterator if the entity is absent.
    pub fn attr_names<'a>(&'a self, id: &EntityId) -> impl Iterator<Item = &'a AttrName> + 'a {
        self.entity_at(id).into_iter().flat_map(Entity::attr_names)
    }

    /// The mutable parts of this snapshot, cloned cheaply (persistent
    /// maps), for a transactor function to build the next version from.
    pub(crate) fn components(&self) -> (Storage, Index, Index, Index, u64) {
        (
            self.storage.clone(),
            self.eavt.clone(),
            self.avet.clone(),
            self.veat.clone(),
            self.top_id,
        )
    }

    pub(crate) fn assemble(
        storage: Storage,
        eavt: Index,
        avet: Index,
        veat: Index,
        top_id: u64,
        curr_time: u64,
    ) -> Snapshot {
        Snapshot {
            storage,
            eavt,
            avet,
            veat,
            top_id,
            curr_time,
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot::empty()
    }
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;
