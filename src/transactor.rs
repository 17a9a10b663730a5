//! Compound snapshot-producing operations: add/update/remove entity, and
//! index maintenance.

use tracing::{debug, trace};

use crate::attribute::{Attribute, AttrName, Cardinality, UpdateOp};
use crate::entity::{Entity, EntityId};
use crate::error::{Error, Result};
use crate::index::Index;
use crate::snapshot::Snapshot;
use crate::value::Value;

/// One mutation to apply as part of a [`apply_ops`] / `transact` call.
#[derive(Debug, Clone)]
pub enum Op {
    AddEntity(Entity),
    UpdateEntity {
        id: EntityId,
        attr: AttrName,
        value: Value,
        op: UpdateOp,
    },
    RemoveEntity(EntityId),
}

fn insert_attr_paths(
    eavt: &mut Index,
    avet: &mut Index,
    veat: &mut Index,
    id: &EntityId,
    attr: &Attribute,
) {
    if !attr.indexed() {
        return;
    }
    for v in values_of(attr.value()) {
        eavt.insert(id, attr.name(), v);
        avet.insert(id, attr.name(), v);
        veat.insert(id, attr.name(), v);
    }
}

fn remove_attr_paths(
    eavt: &mut Index,
    avet: &mut Index,
    veat: &mut Index,
    id: &EntityId,
    attr: &Attribute,
) {
    if !attr.indexed() {
        return;
    }
    for v in values_of(attr.value()) {
        eavt.remove(id, attr.name(), v);
        avet.remove(id, attr.name(), v);
        veat.remove(id, attr.name(), v);
    }
}

fn values_of(value: &Value) -> Vec<&Value> {
    match value {
        Value::Set(set) => set.iter().collect(),
        other => vec![other],
    }
}

/// Add a new entity to `snap`, producing the next snapshot.
///
/// Fails with [`Error::DuplicateEntity`] if the id already exists. Stamps
/// every attribute with `curr_ts = snap.curr_time + 1`, `prev_ts = None`,
/// and inserts one index path per indexed attribute per value (a
/// multi-cardinality value expands to one path per set member).
pub fn add_entity(snap: &Snapshot, entity: Entity) -> Result<Snapshot> {
    add_entity_at(snap, entity, snap.curr_time() + 1)
}

fn add_entity_at(snap: &Snapshot, entity: Entity, new_time: u64) -> Result<Snapshot> {
    if snap.storage().contains_key(entity.id()) {
        return Err(Error::DuplicateEntity(entity.id().clone()));
    }
    let (storage, mut eavt, mut avet, mut veat, top_id) = snap.components();

    let mut stamped = Entity::new(entity.id().clone());
    for (_, attr) in entity.attrs().iter() {
        let attr = attr.clone().stamped(new_time);
        insert_attr_paths(&mut eavt, &mut avet, &mut veat, entity.id(), &attr);
        stamped = stamped.with_attr(attr);
    }
    trace!(entity = %entity.id(), attrs = entity.attrs().len(), "add_entity");

    let storage = storage.update(stamped.id().clone(), stamped);
    Ok(Snapshot::assemble(storage, eavt, avet, veat, top_id, new_time))
}

/// Update one attribute of an existing entity in `snap`, producing the
/// next snapshot.
///
/// `op` is `Add` (union for multi-cardinality, replace for single),
/// `Remove` (subtract for multi-cardinality) or `ResetTo` (replace
/// wholesale). Index maintenance removes the old paths before inserting
/// the new ones. See DESIGN.md for the resolution of `Remove` on a
/// single-cardinality attribute.
pub fn update_entity(
    snap: &Snapshot,
    id: &EntityId,
    attr_name: &AttrName,
    value: Value,
    op: UpdateOp,
) -> Result<Snapshot> {
    update_entity_at(snap, id, attr_name, value, op, snap.curr_time() + 1)
}

fn update_entity_at(
    snap: &Snapshot,
    id: &EntityId,
    attr_name: &AttrName,
    value: Value,
    op: UpdateOp,
    new_time: u64,
) -> Result<Snapshot> {
    let entity = snap
        .entity_at(id)
        .ok_or_else(|| Error::UnknownEntity(id.clone()))?;
    let old_attr = entity
        .attr(attr_name)
        .ok_or_else(|| Error::UnknownAttribute(id.clone(), attr_name.clone()))?;

    if !old_attr.type_matches(&value) {
        return Err(Error::TypeMismatch(id.clone(), attr_name.clone()));
    }

    let new_value = match (old_attr.cardinality(), op) {
        (Cardinality::Single, UpdateOp::Add) | (Cardinality::Single, UpdateOp::ResetTo) => value,
        // A single-cardinality attribute has no "subtract" operation to
        // perform; treated as a no-op reset-to-current rather than an
        // error (see DESIGN.md's Open Question resolution).
        (Cardinality::Single, UpdateOp::Remove) => old_attr.value().clone(),
        (Cardinality::Multiple, UpdateOp::Add) => {
            let mut set = old_attr.value().as_set().cloned().unwrap_or_default();
            set.extend(value.into_set());
            Value::Set(set)
        }
        (Cardinality::Multiple, UpdateOp::Remove) => {
            let mut set = old_attr.value().as_set().cloned().unwrap_or_default();
            for v in value.into_set() {
                set.remove(&v);
            }
            Value::Set(set)
        }
        (Cardinality::Multiple, UpdateOp::ResetTo) => Value::Set(value.into_set()),
    };

    let (storage, mut eavt, mut avet, mut veat, top_id) = snap.components();

    remove_attr_paths(&mut eavt, &mut avet, &mut veat, id, old_attr);
    let new_attr = old_attr.with_version(new_value, new_time);
    insert_attr_paths(&mut eavt, &mut avet, &mut veat, id, &new_attr);

    let updated_entity = entity.with_attr(new_attr);
    let storage = storage.update(id.clone(), updated_entity);
    debug!(entity = %id, attr = %attr_name, "update_entity");
    Ok(Snapshot::assemble(storage, eavt, avet, veat, top_id, new_time))
}

/// Remove an entity from `snap`, producing the next snapshot. References
/// held by other entities to this id are left dangling: the graph walker
/// skips them rather than treating them as an error.
pub fn remove_entity(snap: &Snapshot, id: &EntityId) -> Result<Snapshot> {
    remove_entity_at(snap, id, snap.curr_time() + 1)
}

fn remove_entity_at(snap: &Snapshot, id: &EntityId, new_time: u64) -> Result<Snapshot> {
    let entity = snap
        .entity_at(id)
        .ok_or_else(|| Error::UnknownEntity(id.clone()))?;

    let (storage, mut eavt, mut avet, mut veat, top_id) = snap.components();
    for (_, attr) in entity.attrs().iter() {
        remove_attr_paths(&mut eavt, &mut avet, &mut veat, id, attr);
    }
    let storage = storage.without(id);
    trace!(entity = %id, "remove_entity");
    Ok(Snapshot::assemble(storage, eavt, avet, veat, top_id, new_time))
}

fn apply_op_at(snap: &Snapshot, op: &Op, new_time: u64) -> Result<Snapshot> {
    match op {
        Op::AddEntity(entity) => add_entity_at(snap, entity.clone(), new_time),
        Op::UpdateEntity { id, attr, value, op } => {
            update_entity_at(snap, id, attr, value.clone(), *op, new_time)
        }
        Op::RemoveEntity(id) => remove_entity_at(snap, id, new_time),
    }
}

/// Apply a batch of [`Op`]s against `snap` as a single logical step: every
/// sub-operation observes the effects of the ones before it, and every
/// touched attribute in the batch is stamped with the same new snapshot
/// time, so the whole batch advances `curr_time` by exactly one regardless
/// of how many sub-operations it contains. If any sub-operation fails, an
/// error is returned and `snap` is left untouched by the caller (no
/// partial snapshot escapes this function on error).
pub fn apply_ops(snap: &Snapshot, ops: &[Op]) -> Result<Snapshot> {
    let new_time = snap.curr_time() + 1;
    let mut working = snap.clone();
    for op in ops {
        working = apply_op_at(&working, op, new_time)?;
    }
    Ok(working)
}

#[cfg(test)]
#[path = "transactor_test.rs"]
mod transactor_test;
