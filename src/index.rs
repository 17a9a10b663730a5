//! The three EAV permutation indices.
//!
//! An [`Index`] is a three-level nested mapping, `l1 -> l2 -> {l3}`, plus a
//! [`Permutation`] descriptor carrying the `from_eav`/`to_eav` reordering
//! functions. Only attributes whose `indexed` flag is true ever appear in
//! an index.

use imbl::{HashMap, HashSet};

use crate::attribute::AttrName;
use crate::entity::EntityId;
use crate::value::Value;

/// A uniform key type for index levels: any of the three EAV components
/// can occupy any level depending on the permutation, so all three levels
/// share this one enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Atom {
    Entity(EntityId),
    Attr(AttrName),
    Value(Value),
}

impl Atom {
    pub fn as_entity(&self) -> Option<&EntityId> {
        match self {
            Atom::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_attr(&self) -> Option<&AttrName> {
        match self {
            Atom::Attr(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Atom::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Every atom viewed as a `Value`, used by predicates that need to
    /// compare regardless of which EAV position they were bound at
    /// (entity ids become `Value::Ref`, attribute names become
    /// `Value::Text`).
    pub fn to_value(&self) -> Value {
        match self {
            Atom::Entity(e) => Value::Ref(e.clone()),
            Atom::Attr(a) => Value::Text(a.as_str().to_string()),
            Atom::Value(v) => v.clone(),
        }
    }
}

impl From<EntityId> for Atom {
    fn from(e: EntityId) -> Self {
        Atom::Entity(e)
    }
}
impl From<AttrName> for Atom {
    fn from(a: AttrName) -> Self {
        Atom::Attr(a)
    }
}
impl From<Value> for Atom {
    fn from(v: Value) -> Self {
        Atom::Value(v)
    }
}

/// Which of (Entity, Attribute, Value) occupies which index level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permutation {
    /// entity -> attribute -> {value}
    Eavt,
    /// attribute -> value -> {entity}
    Avet,
    /// value -> entity -> {attribute}
    Veat,
}

impl Permutation {
    /// The permutation whose leaf level holds the EAV component at
    /// `position` (0 = entity, 1 = attribute, 2 = value) — see
    /// [`crate::query::executor`], which picks `position` as the column
    /// every clause shares a join variable in.
    pub fn for_join_position(position: usize) -> Option<Permutation> {
        match position {
            0 => Some(Permutation::Avet),
            1 => Some(Permutation::Veat),
            2 => Some(Permutation::Eavt),
            _ => None,
        }
    }

    /// Reorder an (entity, attribute, value) triple into this
    /// permutation's (l1, l2, l3).
    pub fn from_eav(&self, e: &EntityId, a: &AttrName, v: &Value) -> (Atom, Atom, Atom) {
        match self {
            Permutation::Eavt => (
                Atom::Entity(e.clone()),
                Atom::Attr(a.clone()),
                Atom::Value(v.clone()),
            ),
            Permutation::Avet => (
                Atom::Attr(a.clone()),
                Atom::Value(v.clone()),
                Atom::Entity(e.clone()),
            ),
            Permutation::Veat => (
                Atom::Value(v.clone()),
                Atom::Entity(e.clone()),
                Atom::Attr(a.clone()),
            ),
        }
    }

    /// Reorder (l1, l2, l3) back into (entity, attribute, value).
    pub fn to_eav(&self, l1: &Atom, l2: &Atom, l3: &Atom) -> Option<(EntityId, AttrName, Value)> {
        match self {
            Permutation::Eavt => Some((
                l1.as_entity()?.clone(),
                l2.as_attr()?.clone(),
                l3.as_value()?.clone(),
            )),
            Permutation::Avet => Some((
                l3.as_entity()?.clone(),
                l1.as_attr()?.clone(),
                l2.as_value()?.clone(),
            )),
            Permutation::Veat => Some((
                l2.as_entity()?.clone(),
                l3.as_attr()?.clone(),
                l1.as_value()?.clone(),
            )),
        }
    }

    /// Which EAV position (0=e, 1=a, 2=v) each index level corresponds to,
    /// used by the executor to permute per-clause predicates to line up
    /// with (l1, l2, l3).
    pub fn eav_positions(&self) -> [usize; 3] {
        match self {
            Permutation::Eavt => [0, 1, 2],
            Permutation::Avet => [1, 2, 0],
            Permutation::Veat => [2, 0, 1],
        }
    }
}

/// A three-level nested mapping over one EAV permutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    permutation: Permutation,
    levels: HashMap<Atom, HashMap<Atom, HashSet<Atom>>>,
}

impl Index {
    pub fn new(permutation: Permutation) -> Index {
        Index {
            permutation,
            levels: HashMap::new(),
        }
    }

    pub fn permutation(&self) -> Permutation {
        self.permutation
    }

    pub fn levels(&self) -> &HashMap<Atom, HashMap<Atom, HashSet<Atom>>> {
        &self.levels
    }

    /// Insert one (e, a, v) path. A no-op if the path already exists.
    pub fn insert(&mut self, e: &EntityId, a: &AttrName, v: &Value) {
        let (l1, l2, l3) = self.permutation.from_eav(e, a, v);
        let l2map = self.levels.entry(l1).or_insert_with(HashMap::new);
        let leafset = l2map.entry(l2).or_insert_with(HashSet::new);
        leafset.insert(l3);
    }

    /// Remove one (e, a, v) path. A no-op if the path is absent.
    pub fn remove(&mut self, e: &EntityId, a: &AttrName, v: &Value) {
        let (l1, l2, l3) = self.permutation.from_eav(e, a, v);
        if let Some(l2map) = self.levels.get(&l1) {
            if let Some(leafset) = l2map.get(&l2) {
                let mut leafset = leafset.clone();
                leafset.remove(&l3);
                let mut l2map = l2map.clone();
                if leafset.is_empty() {
                    l2map.remove(&l2);
                } else {
                    l2map.insert(l2, leafset);
                }
                if l2map.is_empty() {
                    self.levels.remove(&l1);
                } else {
                    self.levels.insert(l1, l2map);
                }
            }
        }
    }

    /// Whether a path exists; used by invariant tests.
    pub fn contains(&self, e: &EntityId, a: &AttrName, v: &Value) -> bool {
        let (l1, l2, l3) = self.permutation.from_eav(e, a, v);
        self.levels
            .get(&l1)
            .and_then(|l2map| l2map.get(&l2))
            .map(|leafset| leafset.contains(&l3))
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod index_test;
