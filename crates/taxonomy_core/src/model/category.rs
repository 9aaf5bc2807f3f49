//! Category domain model.
//!
//! # Responsibility
//! - Define the category node and its client input shapes.
//! - Keep partial-update semantics explicit via `CategoryPatch`.
//!
//! # Invariants
//! - `id` is stable and never reused for another category.
//! - A category has at most one parent; the inverse child direction is
//!   derived from it.
//! - `position` is display metadata only and never drives ordering.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable category identifier.
pub type CategoryId = Uuid;

/// Display-only 2D coordinate for layout clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Stored category record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Stable category id.
    pub id: CategoryId,
    /// User-facing label.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Optional display coordinate.
    pub position: Option<Position>,
    /// Parent category. `None` means the category is a tree root.
    pub parent_id: Option<CategoryId>,
}

/// Client input for category creation.
///
/// `parent_id` links the new category as a child of an existing one;
/// `child_id` links an existing category as a child of the new one. Both may
/// be supplied in one call and create two independent links on the new node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryDraft {
    pub name: String,
    pub description: String,
    pub position: Option<Position>,
    pub parent_id: Option<CategoryId>,
    pub child_id: Option<CategoryId>,
}

impl CategoryDraft {
    /// Creates a draft with name and description only.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Self::default()
        }
    }
}

/// Explicit optional-field update for a category.
///
/// A `None` field is left untouched by the update; a `Some` field overwrites.
/// Parent/child links are intentionally not updatable here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub position: Option<Position>,
}

impl CategoryPatch {
    /// Returns whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.position.is_none()
    }
}
