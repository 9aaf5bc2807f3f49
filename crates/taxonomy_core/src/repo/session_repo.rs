//! Session repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Bootstrap new sessions together with their root category.
//! - Resolve session tokens for scope checks.
//!
//! # Invariants
//! - Session creation is atomic: the session row, the root category and the
//!   root link commit together or not at all.
//! - Every freshly created session has exactly one root category.

use crate::model::category::CategoryId;
use crate::model::session::{new_session_id, Session};
use crate::repo::{ensure_store_ready, parse_stored_uuid, StoreResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use uuid::Uuid;

/// Name given to the category bootstrapped with every session.
pub const ROOT_CATEGORY_NAME: &str = "Root Category";
/// Description given to the bootstrapped root category.
pub const ROOT_CATEGORY_DESCRIPTION: &str = "This is the root category";

/// Repository interface for session lifecycle operations.
pub trait SessionRepository {
    /// Creates one session with its root category in one transaction.
    fn create_session(&self) -> StoreResult<Session>;
    /// Loads one session by token.
    fn get_session(&self, session_id: &str) -> StoreResult<Option<Session>>;
}

/// SQLite-backed session repository.
pub struct SqliteSessionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_ready(conn)?;
        Ok(Self { conn })
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn create_session(&self) -> StoreResult<Session> {
        let session_id = new_session_id();
        let root_id: CategoryId = Uuid::new_v4();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO sessions (id) VALUES (?1);",
            [session_id.as_str()],
        )?;
        tx.execute(
            "INSERT INTO categories (id, session_id, name, description)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                root_id.to_string(),
                session_id,
                ROOT_CATEGORY_NAME,
                ROOT_CATEGORY_DESCRIPTION,
            ],
        )?;
        tx.execute(
            "UPDATE sessions SET root_category_id = ?2 WHERE id = ?1;",
            params![session_id, root_id.to_string()],
        )?;
        tx.commit()?;

        info!("event=session_create module=session_repo status=ok session={session_id}");

        Ok(Session {
            id: session_id,
            root_category_id: Some(root_id),
        })
    }

    fn get_session(&self, session_id: &str) -> StoreResult<Option<Session>> {
        let row: Option<(String, Option<String>)> = self
            .conn
            .query_row(
                "SELECT id, root_category_id FROM sessions WHERE id = ?1;",
                [session_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((id, root_text)) = row else {
            return Ok(None);
        };

        let root_category_id = root_text
            .map(|value| parse_stored_uuid(&value, "sessions.root_category_id"))
            .transpose()?;

        Ok(Some(Session {
            id,
            root_category_id,
        }))
    }
}
