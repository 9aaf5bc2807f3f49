//! Item use-case service.
//!
//! # Responsibility
//! - Validate item input and container references above the repository
//!   layer.
//! - Provide create, strict update, batch delete and category membership
//!   replacement operations.
//!
//! # Invariants
//! - Item client ids must be non-blank and unique within a replacement list.
//! - Reserved identity keys never reach the stored payload.
//! - A referenced container category must exist in the session.

use crate::model::category::CategoryId;
use crate::model::item::{Item, ItemDraft, ItemKey};
use crate::model::properties::strip_reserved_keys;
use crate::repo::category_repo::CategoryRepository;
use crate::repo::item_repo::ItemRepository;
use crate::repo::session_repo::SessionRepository;
use crate::repo::{MissingEntity, StoreError, StoreResult};
use crate::service::resolve_session;
use std::collections::BTreeSet;

/// Item use-case facade.
pub struct ItemService<S: SessionRepository, C: CategoryRepository, I: ItemRepository> {
    sessions: S,
    categories: C,
    items: I,
}

impl<S: SessionRepository, C: CategoryRepository, I: ItemRepository> ItemService<S, C, I> {
    /// Creates a service from repository implementations.
    pub fn new(sessions: S, categories: C, items: I) -> Self {
        Self {
            sessions,
            categories,
            items,
        }
    }

    /// Creates one item, optionally contained in a category.
    pub fn create_item(
        &self,
        session_id: &str,
        draft: ItemDraft,
        container: Option<CategoryId>,
    ) -> StoreResult<Item> {
        let draft = normalize_item_draft(draft)?;
        resolve_session(&self.sessions, session_id)?;
        if let Some(category_id) = container {
            self.ensure_category_exists(session_id, category_id)?;
        }
        self.items.create_item(session_id, &draft, container)
    }

    /// Overwrites an existing item's payload and container.
    ///
    /// Strict policy: an unknown client id fails with `NotFound`; single-item
    /// update never falls back to create. Passing a different container moves
    /// the item; passing `None` orphans it.
    pub fn update_item(
        &self,
        session_id: &str,
        draft: ItemDraft,
        container: Option<CategoryId>,
    ) -> StoreResult<Item> {
        let draft = normalize_item_draft(draft)?;
        resolve_session(&self.sessions, session_id)?;
        if let Some(category_id) = container {
            self.ensure_category_exists(session_id, category_id)?;
        }
        self.items.update_item(session_id, &draft, container)
    }

    /// Deletes the listed items; unknown ids are silently ignored.
    pub fn delete_items(&self, session_id: &str, item_ids: &[ItemKey]) -> StoreResult<usize> {
        resolve_session(&self.sessions, session_id)?;
        self.items.delete_items(session_id, item_ids)
    }

    /// Synchronizes a category's membership to exactly `desired`.
    ///
    /// Three-way diff applied atomically: stale members are deleted, kept ids
    /// have their payload fully replaced, new ids are created (or adopted
    /// from elsewhere in the session). Idempotent at the membership level.
    pub fn update_category_items(
        &self,
        session_id: &str,
        category_id: CategoryId,
        desired: Vec<ItemDraft>,
    ) -> StoreResult<Vec<Item>> {
        resolve_session(&self.sessions, session_id)?;
        self.ensure_category_exists(session_id, category_id)?;

        let desired = desired
            .into_iter()
            .map(normalize_item_draft)
            .collect::<StoreResult<Vec<_>>>()?;

        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for draft in &desired {
            if !seen.insert(draft.id.as_str()) {
                return Err(StoreError::Validation(format!(
                    "duplicate item id `{}` in replacement list",
                    draft.id
                )));
            }
        }

        self.items
            .replace_category_items(session_id, category_id, &desired)
    }

    fn ensure_category_exists(
        &self,
        session_id: &str,
        category_id: CategoryId,
    ) -> StoreResult<()> {
        self.categories
            .get_category(session_id, category_id)?
            .ok_or(StoreError::NotFound(MissingEntity::Category(category_id)))?;
        Ok(())
    }
}

fn normalize_item_draft(mut draft: ItemDraft) -> StoreResult<ItemDraft> {
    if draft.id.trim().is_empty() {
        return Err(StoreError::Validation(
            "item id must not be blank".to_string(),
        ));
    }
    strip_reserved_keys(&mut draft.properties);
    Ok(draft)
}
