//! Item domain model.
//!
//! # Responsibility
//! - Define the item record and its client input shape.
//! - Keep the client-assigned id and the system-assigned internal id apart.
//!
//! # Invariants
//! - `id` is client-assigned and unique within one session.
//! - `internal_id` is system-assigned and globally unique.
//! - An item is contained by at most one category; `None` means orphan.

use crate::model::category::CategoryId;
use crate::model::properties::Properties;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client-assigned item identifier, unique within a session.
pub type ItemKey = String;

/// System-assigned globally unique item identifier.
pub type InternalId = Uuid;

/// Stored item record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// System-assigned globally unique id.
    pub internal_id: InternalId,
    /// Client-assigned id, unique within the owning session.
    pub id: ItemKey,
    /// Opaque client-defined payload, excluding identity keys.
    pub properties: Properties,
    /// Containing category. `None` means the item is an orphan.
    pub category_id: Option<CategoryId>,
}

/// Client input for item creation and replacement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDraft {
    /// Client-assigned id.
    pub id: ItemKey,
    /// Client-defined payload.
    pub properties: Properties,
}

impl ItemDraft {
    /// Creates a draft from a client id and payload.
    pub fn new(id: impl Into<String>, properties: Properties) -> Self {
        Self {
            id: id.into(),
            properties,
        }
    }
}
