//! Entities and the storage map that holds their present state.

use std::fmt;
use std::sync::Arc;

use imbl::HashMap;
use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, AttrName};

/// An opaque, user-chosen entity identifier.
///
/// Cloning an id is cheap (it is a reference-counted string) since ids are
/// threaded through every index path and every query binding.
#[derive(Clone, Serialize, Deserialize)]
pub struct EntityId(Arc<str>);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        EntityId(Arc::from(id.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for EntityId {}

impl std::hash::Hash for EntityId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::new(s)
    }
}

/// An entity: an id plus its attribute-name -> [`Attribute`] map.
///
/// The attribute map is a persistent [`imbl::HashMap`] so that updating one
/// attribute shares every other attribute's storage with the previous
/// version of this entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    attrs: HashMap<AttrName, Attribute>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Entity {
            id: id.into(),
            attrs: HashMap::new(),
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn attr(&self, name: &AttrName) -> Option<&Attribute> {
        self.attrs.get(name)
    }

    pub fn attrs(&self) -> &HashMap<AttrName, Attribute> {
        &self.attrs
    }

    /// Every attribute name defined on this entity, without reaching into
    /// the attribute map itself.
    pub fn attr_names(&self) -> impl Iterator<Item = &AttrName> {
        self.attrs.keys()
    }

    /// Attach (insert or replace by name) an attribute on an unstored
    /// entity being built with [`crate::make_entity`]/[`crate::make_attr`].
    ///
    /// This is how callers compose an entity before handing it to
    /// [`Op::AddEntity`][crate::transactor::Op::AddEntity] — it is not a
    /// mutation of a *stored* entity: once an entity is live in a
    /// [`crate::Snapshot`], all further change goes through
    /// [`crate::transactor`], which re-stamps every attribute's version
    /// timestamps regardless of whatever this method was called with.
    pub fn with_attr(&self, attr: Attribute) -> Entity {
        Entity {
            id: self.id.clone(),
            attrs: self.attrs.update(attr.name().clone(), attr),
        }
    }
}

/// Present-state entity map: entity id -> [`Entity`].
pub type Storage = HashMap<EntityId, Entity>;

#[cfg(test)]
#[path = "entity_test.rs"]
mod entity_test;
