//! Core domain logic for the session-scoped taxonomy store.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::category::{Category, CategoryDraft, CategoryId, CategoryPatch, Position};
pub use model::item::{InternalId, Item, ItemDraft, ItemKey};
pub use model::properties::{Properties, PropertyValue};
pub use model::session::{Session, SessionId};
pub use model::tree::{ItemView, SessionSnapshot, TreeNode};
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::item_repo::{ItemRepository, SqliteItemRepository};
pub use repo::session_repo::{SessionRepository, SqliteSessionRepository};
pub use repo::{MissingEntity, StoreError, StoreResult};
pub use service::category_service::CategoryService;
pub use service::item_service::ItemService;
pub use service::session_service::SessionService;
pub use store::TaxonomyStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
