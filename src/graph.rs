//! Traversing the reference graph across entities.

use std::collections::{HashSet, VecDeque};

use crate::entity::{Entity, EntityId};
use crate::index::Atom;
use crate::snapshot::Snapshot;
use crate::value::{Value, ValueType};

/// Breadth-first or depth-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Bfs,
    Dfs,
}

/// Follow reference-typed attributes forward (`Outgoing`) or look them up
/// via the `VEAT` index backward (`Incoming`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// A traversal of the reference graph rooted at one entity.
///
/// Each call produces a fresh, restartable walk: cycles are handled with
/// a visited set, dangling references are silently skipped, and a root
/// absent from storage yields an empty traversal.
pub struct Traversal<'a> {
    snap: &'a Snapshot,
    direction: Direction,
    strategy: Strategy,
    visited: HashSet<EntityId>,
    frontier: VecDeque<EntityId>,
}

impl<'a> Traversal<'a> {
    pub fn new(root_id: &EntityId, snap: &'a Snapshot, strategy: Strategy, direction: Direction) -> Traversal<'a> {
        let mut frontier = VecDeque::new();
        frontier.push_back(root_id.clone());
        Traversal {
            snap,
            direction,
            strategy,
            visited: HashSet::new(),
            frontier,
        }
    }

    fn take_next_id(&mut self) -> Option<EntityId> {
        match self.strategy {
            Strategy::Bfs => self.frontier.pop_front(),
            Strategy::Dfs => self.frontier.pop_back(),
        }
    }

    fn outgoing(&self, entity: &Entity) -> Vec<EntityId> {
        let mut refs = Vec::new();
        for (_, attr) in entity.attrs().iter() {
            if attr.value_type() != ValueType::Ref {
                continue;
            }
            match attr.value() {
                Value::Ref(id) => refs.push(id.clone()),
                Value::Set(set) => {
                    for v in set.iter() {
                        if let Value::Ref(id) = v {
                            refs.push(id.clone());
                        }
                    }
                }
                _ => {}
            }
        }
        refs
    }

    fn incoming(&self, id: &EntityId) -> Vec<EntityId> {
        self.snap
            .veat()
            .levels()
            .get(&Atom::Value(Value::Ref(id.clone())))
            .map(|l2map| l2map.keys().filter_map(Atom::as_entity).cloned().collect())
            .unwrap_or_default()
    }
}

impl<'a> Iterator for Traversal<'a> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        loop {
            let id = self.take_next_id()?;
            if self.visited.contains(&id) {
                continue;
            }
            self.visited.insert(id.clone());

            let entity = match self.snap.entity_at(&id) {
                Some(entity) => entity.clone(),
                // Dangling reference: skip it, keep walking.
                None => continue,
            };

            let neighbours = match self.direction {
                Direction::Outgoing => self.outgoing(&entity),
                Direction::Incoming => self.incoming(&id),
            };
            for n in neighbours {
                if !self.visited.contains(&n) {
                    self.frontier.push_back(n);
                }
            }

            return Some(entity);
        }
    }
}

/// Walk the reference graph from `root_id`, returning a fresh,
/// lazily-evaluated iterator in visit order.
pub fn traverse_db<'a>(
    root_id: &EntityId,
    snap: &'a Snapshot,
    strategy: Strategy,
    direction: Direction,
) -> Traversal<'a> {
    Traversal::new(root_id, snap, strategy, direction)
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod graph_test;
