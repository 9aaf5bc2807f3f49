//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own input normalization and cross-entity scope checks above the SQL
//!   boundary.
//!
//! # Invariants
//! - Every service entry point resolves the session scope before touching
//!   category or item state.

use crate::model::session::{is_well_formed_session_id, Session};
use crate::repo::session_repo::SessionRepository;
use crate::repo::{MissingEntity, StoreError, StoreResult};

pub mod category_service;
pub mod item_service;
pub mod session_service;

/// Resolves a session token to its session record.
///
/// Fails with `Validation` for a malformed token and `NotFound` for an
/// unknown one, so scope errors never fall through to SQL no-ops.
pub(crate) fn resolve_session<S: SessionRepository>(
    sessions: &S,
    session_id: &str,
) -> StoreResult<Session> {
    if !is_well_formed_session_id(session_id) {
        return Err(StoreError::Validation(format!(
            "malformed session token `{session_id}`"
        )));
    }
    sessions.get_session(session_id)?.ok_or_else(|| {
        StoreError::NotFound(MissingEntity::Session(session_id.to_string()))
    })
}
