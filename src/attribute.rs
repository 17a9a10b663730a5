//! Attributes: typed, optionally-indexed, versioned entity properties.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::{Value, ValueType};

/// A namespaced attribute name, e.g. `patient/city`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AttrName(Arc<str>);

impl AttrName {
    pub fn new(name: impl Into<String>) -> Self {
        AttrName(Arc::from(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for AttrName {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for AttrName {}

impl std::hash::Hash for AttrName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl PartialOrd for AttrName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for AttrName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AttrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AttrName {
    fn from(s: &str) -> Self {
        AttrName::new(s)
    }
}

impl From<String> for AttrName {
    fn from(s: String) -> Self {
        AttrName::new(s)
    }
}

/// Cardinality of an attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    Single,
    Multiple,
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::Single
    }
}

/// How [`crate::transactor::update_entity`] combines a new value with an
/// existing multi-cardinality value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    /// Union into the existing set (single-cardinality: replace).
    Add,
    /// Subtract from the existing set (single-cardinality: see
    /// DESIGN.md's resolution of the relevant Open Question).
    Remove,
    /// Replace the value/set wholesale.
    ResetTo,
}

/// Options accepted by [`make_attr`][crate::make_attr].
#[derive(Debug, Clone, Copy, Default)]
pub struct AttrOptions {
    pub indexed: bool,
    pub cardinality: Cardinality,
}

/// A typed, optionally-indexed, single- or multi-valued attribute with
/// version timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: AttrName,
    value: Value,
    value_type: ValueType,
    cardinality: Cardinality,
    indexed: bool,
    /// Snapshot index of the previous version of this attribute, or `None`.
    prev_ts: Option<u64>,
    /// Snapshot index at which this version took effect.
    curr_ts: u64,
}

impl Attribute {
    pub fn new(
        name: impl Into<AttrName>,
        value: impl Into<Value>,
        value_type: ValueType,
        options: AttrOptions,
    ) -> Attribute {
        let value = value.into();
        let value = match options.cardinality {
            Cardinality::Multiple => Value::Set(value.into_set()),
            Cardinality::Single => value,
        };
        Attribute {
            name: name.into(),
            value,
            value_type,
            cardinality: options.cardinality,
            indexed: options.indexed,
            prev_ts: None,
            curr_ts: 0,
        }
    }

    pub fn name(&self) -> &AttrName {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn indexed(&self) -> bool {
        self.indexed
    }

    pub fn prev_ts(&self) -> Option<u64> {
        self.prev_ts
    }

    pub fn curr_ts(&self) -> u64 {
        self.curr_ts
    }

    /// True if `value` satisfies this attribute's declared type.
    pub fn type_matches(&self, value: &Value) -> bool {
        match value {
            Value::Set(set) => set.iter().all(|v| v.type_tag() == self.value_type),
            other => other.type_tag() == self.value_type,
        }
    }

    /// Produce a new version of this attribute carrying `value`, stamped
    /// at `new_ts`.
    ///
    /// `prev_ts` anchors to `self.curr_ts` — unless `self` is itself an
    /// ephemeral version already stamped at `new_ts` (a prior version of
    /// this same attribute produced earlier in the same batch, per
    /// [`crate::transactor::apply_ops`]'s single-timestamp-per-transact
    /// rule), in which case it anchors to `self.prev_ts` instead. Without
    /// this, two updates to the same attribute inside one transact would
    /// leave `prev_ts == curr_ts`, which both violates the
    /// strictly-earlier invariant and would spin
    /// [`crate::history::evolution_of`] forever walking a version that
    /// points at itself.
    pub(crate) fn with_version(&self, value: Value, new_ts: u64) -> Attribute {
        let prev_ts = if self.curr_ts == new_ts {
            self.prev_ts
        } else {
            Some(self.curr_ts)
        };
        Attribute {
            name: self.name.clone(),
            value,
            value_type: self.value_type,
            cardinality: self.cardinality,
            indexed: self.indexed,
            prev_ts,
            curr_ts: new_ts,
        }
    }

    /// Stamp the initial version of a freshly-added attribute: sets
    /// `curr_ts` to `ts` and clears `prev_ts`.
    pub(crate) fn stamped(mut self, ts: u64) -> Attribute {
        self.curr_ts = ts;
        self.prev_ts = None;
        self
    }
}

#[cfg(test)]
#[path = "attribute_test.rs"]
mod attribute_test;
