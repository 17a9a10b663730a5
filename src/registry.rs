//! Process-global name -> [`Connection`] registry.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::connection::Connection;

lazy_static! {
    static ref CONNECTIONS: Mutex<HashMap<String, Arc<Connection>>> = Mutex::new(HashMap::new());
}

/// Return the existing connection registered under `name`, or create and
/// register an empty one.
pub fn open(name: &str) -> Arc<Connection> {
    let mut connections = CONNECTIONS.lock();
    connections
        .entry(name.to_string())
        .or_insert_with(|| Arc::new(Connection::new()))
        .clone()
}

/// Remove `name` from the registry. Existing `Arc<Connection>` handles
/// obtained from a prior [`open`] remain valid and usable; only a fresh
/// `open(name)` call is affected, getting a brand-new empty connection
/// rather than this one.
pub fn close(name: &str) {
    CONNECTIONS.lock().remove(name);
}

/// Identical to [`close`] at the registry level: this library surface has
/// no handle-reference-count concept, so "release a handle" and "destroy
/// permanently" both collapse to "deregister the name" (see DESIGN.md).
/// Actual reclamation happens once every `Arc<Connection>` held by
/// callers is dropped.
pub fn drop_connection(name: &str) {
    CONNECTIONS.lock().remove(name);
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
