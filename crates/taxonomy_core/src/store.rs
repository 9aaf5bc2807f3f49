//! Taxonomy store facade.
//!
//! # Responsibility
//! - Wire the SQLite repositories into the use-case services behind one
//!   owned connection.
//! - Serialize every operation through a single-writer guard.
//!
//! # Invariants
//! - Two concurrent mutations never interleave their read/diff/write steps;
//!   in particular, concurrent membership replacements on one category
//!   cannot produce a lost update.

use crate::db::{open_store, open_store_in_memory};
use crate::model::category::{Category, CategoryDraft, CategoryId, CategoryPatch};
use crate::model::item::{Item, ItemDraft, ItemKey};
use crate::model::session::Session;
use crate::model::tree::SessionSnapshot;
use crate::repo::category_repo::SqliteCategoryRepository;
use crate::repo::item_repo::SqliteItemRepository;
use crate::repo::session_repo::SqliteSessionRepository;
use crate::repo::StoreResult;
use crate::service::category_service::CategoryService;
use crate::service::item_service::ItemService;
use crate::service::session_service::SessionService;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe entry point to the session-scoped taxonomy store.
pub struct TaxonomyStore {
    conn: Mutex<Connection>,
}

impl TaxonomyStore {
    /// Opens a file-backed store and applies pending migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self {
            conn: Mutex::new(open_store(path)?),
        })
    }

    /// Opens an in-memory store, mainly for tests and smoke probes.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: Mutex::new(open_store_in_memory()?),
        })
    }

    /// Creates one session with its bootstrapped root category.
    pub fn create_session(&self) -> StoreResult<Session> {
        let conn = self.lock();
        session_service(&conn)?.create_session()
    }

    /// Reconstructs the nested category tree plus orphan items for one
    /// session.
    pub fn get_session_data(&self, session_id: &str) -> StoreResult<SessionSnapshot> {
        let conn = self.lock();
        session_service(&conn)?.get_session_data(session_id)
    }

    /// Creates one category, optionally linked to a parent and/or child.
    pub fn create_category(
        &self,
        session_id: &str,
        draft: CategoryDraft,
    ) -> StoreResult<Category> {
        let conn = self.lock();
        category_service(&conn)?.create_category(session_id, draft)
    }

    /// Applies a partial field patch to one category.
    pub fn update_category(
        &self,
        session_id: &str,
        category_id: CategoryId,
        patch: CategoryPatch,
    ) -> StoreResult<Category> {
        let conn = self.lock();
        category_service(&conn)?.update_category(session_id, category_id, patch)
    }

    /// Deletes one category, detaching its children and contained items.
    pub fn delete_category(&self, session_id: &str, category_id: CategoryId) -> StoreResult<()> {
        let conn = self.lock();
        category_service(&conn)?.delete_category(session_id, category_id)
    }

    /// Creates one item, optionally contained in a category.
    pub fn create_item(
        &self,
        session_id: &str,
        draft: ItemDraft,
        container: Option<CategoryId>,
    ) -> StoreResult<Item> {
        let conn = self.lock();
        item_service(&conn)?.create_item(session_id, draft, container)
    }

    /// Overwrites one item's payload and container (strict; no upsert).
    pub fn update_item(
        &self,
        session_id: &str,
        draft: ItemDraft,
        container: Option<CategoryId>,
    ) -> StoreResult<Item> {
        let conn = self.lock();
        item_service(&conn)?.update_item(session_id, draft, container)
    }

    /// Deletes the listed items; unknown ids are silently ignored.
    pub fn delete_items(&self, session_id: &str, item_ids: &[ItemKey]) -> StoreResult<usize> {
        let conn = self.lock();
        item_service(&conn)?.delete_items(session_id, item_ids)
    }

    /// Synchronizes one category's item membership to the desired list.
    pub fn update_category_items(
        &self,
        session_id: &str,
        category_id: CategoryId,
        desired: Vec<ItemDraft>,
    ) -> StoreResult<Vec<Item>> {
        let conn = self.lock();
        item_service(&conn)?.update_category_items(session_id, category_id, desired)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type SqliteSessionService<'conn> = SessionService<
    SqliteSessionRepository<'conn>,
    SqliteCategoryRepository<'conn>,
    SqliteItemRepository<'conn>,
>;

type SqliteCategoryService<'conn> =
    CategoryService<SqliteSessionRepository<'conn>, SqliteCategoryRepository<'conn>>;

type SqliteItemService<'conn> = ItemService<
    SqliteSessionRepository<'conn>,
    SqliteCategoryRepository<'conn>,
    SqliteItemRepository<'conn>,
>;

fn session_service<'conn>(conn: &'conn Connection) -> StoreResult<SqliteSessionService<'conn>> {
    Ok(SessionService::new(
        SqliteSessionRepository::try_new(conn)?,
        SqliteCategoryRepository::try_new(conn)?,
        SqliteItemRepository::try_new(conn)?,
    ))
}

fn category_service<'conn>(conn: &'conn Connection) -> StoreResult<SqliteCategoryService<'conn>> {
    Ok(CategoryService::new(
        SqliteSessionRepository::try_new(conn)?,
        SqliteCategoryRepository::try_new(conn)?,
    ))
}

fn item_service<'conn>(conn: &'conn Connection) -> StoreResult<SqliteItemService<'conn>> {
    Ok(ItemService::new(
        SqliteSessionRepository::try_new(conn)?,
        SqliteCategoryRepository::try_new(conn)?,
        SqliteItemRepository::try_new(conn)?,
    ))
}
