//! Error kinds returned by evolvedb's public operations.

use thiserror::Error;

use crate::attribute::AttrName;
use crate::entity::EntityId;

/// All error kinds produced by this crate.
///
/// Errors raised inside a sub-operation of [`transact`][crate::connection::Connection::transact]
/// abort the whole transact: the connection's history is left untouched.
/// A compiled query predicate never returns an error of its own; it can
/// only ever report a match or not.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("entity {0:?} is not present in storage")]
    UnknownEntity(EntityId),

    #[error("entity {0:?} has no attribute {1:?}")]
    UnknownAttribute(EntityId, AttrName),

    #[error("entity {0:?} already exists")]
    DuplicateEntity(EntityId),

    #[error("malformed query clause: {0}")]
    MalformedClause(String),

    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),

    #[error("value for {1:?} on entity {0:?} does not match the attribute's declared type")]
    TypeMismatch(EntityId, AttrName),

    #[error("no connection named {0:?}")]
    UnknownConnection(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
