//! Session domain model.
//!
//! # Responsibility
//! - Define the opaque session token and the session record.
//! - Own the token shape used by every scope check.
//!
//! # Invariants
//! - A token is 32 lowercase hex characters (a dash-stripped UUIDv4), which
//!   keeps it URL-safe for boundary layers.
//! - Tokens are never reused for another session.

use crate::model::category::CategoryId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque URL-safe token owning one taxonomy scope.
pub type SessionId = String;

static SESSION_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{32}$").expect("valid session token regex"));

/// Top-level ownership scope for one client taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session token.
    pub id: SessionId,
    /// Root category created with the session. `None` only after the root
    /// category was explicitly deleted.
    pub root_category_id: Option<CategoryId>,
}

/// Generates a fresh session token.
pub fn new_session_id() -> SessionId {
    Uuid::new_v4().simple().to_string()
}

/// Returns whether `value` has the session token shape.
///
/// Used to reject malformed tokens before any storage round-trip.
pub fn is_well_formed_session_id(value: &str) -> bool {
    SESSION_TOKEN_RE.is_match(value)
}
