//! evolvedb is an in-memory, immutable, time-traveling entity-attribute-value
//! database with a small datalog-style query language.
//!
//! Every write produces a new, logically complete [`Snapshot`] of the
//! world; prior snapshots remain addressable through a [`Connection`] so
//! callers can reconstruct how any attribute of any entity evolved over
//! time. A connection holds an ordered history of snapshots; readers
//! always operate against a specific snapshot they hold, which can never
//! change beneath them.
//!
//! The crate has three tightly coupled parts: the storage and indexing
//! engine ([`entity`], [`attribute`], [`index`], [`snapshot`],
//! [`transactor`]), the datalog query engine ([`query`]), and the history
//! and graph subsystem ([`history`], [`graph`]). [`Connection`] and
//! [`registry`] tie them together behind a process-global name registry.
//!
//! Out of scope: an interactive read-eval surface, command-line entry
//! points, and on-disk persistence — this is a library, drivers above it
//! are thin.

pub mod attribute;
pub mod connection;
pub mod entity;
pub mod error;
pub mod graph;
pub mod history;
pub mod index;
pub mod query;
pub mod registry;
pub mod snapshot;
pub mod transactor;
pub mod value;

pub use crate::attribute::{AttrName, AttrOptions, Attribute, Cardinality, UpdateOp};
pub use crate::connection::Connection;
pub use crate::entity::{Entity, EntityId, Storage};
pub use crate::error::{Error, Result};
pub use crate::graph::{traverse_db, Direction, Strategy, Traversal};
pub use crate::history::evolution_of;
pub use crate::index::{Atom, Index, Permutation};
pub use crate::query::term::{CompareOp, Query, Term};
pub use crate::query::{q};
pub use crate::registry::{close, drop_connection, open};
pub use crate::snapshot::Snapshot;
pub use crate::transactor::Op;
pub use crate::value::{Value, ValueType};

/// Build a fresh, unstored entity with no attributes yet.
pub fn make_entity(id: impl Into<EntityId>) -> Entity {
    Entity::new(id)
}

/// Build a typed, optionally-indexed attribute, ready to attach to an
/// entity via [`Op::AddEntity`] or [`Entity::with_attr`][crate::entity::Entity].
pub fn make_attr(
    name: impl Into<AttrName>,
    value: impl Into<Value>,
    value_type: ValueType,
    options: AttrOptions,
) -> Attribute {
    Attribute::new(name, value, value_type, options)
}

#[cfg(test)]
#[path = "scenarios_test.rs"]
mod scenarios_test;
