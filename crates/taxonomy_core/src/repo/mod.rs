//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for the three stores.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Every read/write is scoped by the owning session; a repository never
//!   touches rows of another session.
//! - Multi-step writes run inside one immediate transaction.
//! - Repository APIs return semantic errors (`NotFound`, `Integrity`,
//!   `Validation`) in addition to transport errors.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::category::CategoryId;
use crate::model::item::ItemKey;
use crate::model::properties::Properties;
use crate::model::session::SessionId;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod category_repo;
pub mod item_repo;
pub mod session_repo;

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity reference that failed a scope lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingEntity {
    Session(SessionId),
    Category(CategoryId),
    Item(ItemKey),
}

impl Display for MissingEntity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session(id) => write!(f, "session `{id}`"),
            Self::Category(id) => write!(f, "category `{id}`"),
            Self::Item(id) => write!(f, "item `{id}`"),
        }
    }
}

/// Unified error surface of the taxonomy store.
#[derive(Debug)]
pub enum StoreError {
    /// Referenced session/category/item is not in scope.
    NotFound(MissingEntity),
    /// Stored state or a requested link violates a structural invariant.
    Integrity(String),
    /// Malformed caller input.
    Validation(String),
    /// Storage transport failure.
    Db(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::Integrity(message) => write!(f, "integrity violation: {message}"),
            Self::Validation(message) => write!(f, "invalid input: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Verifies the connection carries the schema version this binary expects.
///
/// Repositories call this once at construction so later queries can assume
/// the tables exist.
pub(crate) fn ensure_store_ready(conn: &Connection) -> StoreResult<()> {
    let expected = latest_version();
    let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual != expected {
        return Err(StoreError::Integrity(format!(
            "store requires schema version {expected}, got {actual}"
        )));
    }
    Ok(())
}

pub(crate) fn parse_stored_uuid(value: &str, column: &'static str) -> StoreResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::Integrity(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_stored_properties(value: &str, column: &'static str) -> StoreResult<Properties> {
    serde_json::from_str(value)
        .map_err(|err| StoreError::Integrity(format!("invalid payload in {column}: {err}")))
}

pub(crate) fn encode_properties(properties: &Properties) -> StoreResult<String> {
    serde_json::to_string(properties)
        .map_err(|err| StoreError::Integrity(format!("unencodable properties payload: {err}")))
}
