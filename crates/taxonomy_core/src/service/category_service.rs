//! Category use-case service.
//!
//! # Responsibility
//! - Validate category input and link targets above the repository layer.
//! - Provide create, partial-update and delete operations.
//!
//! # Invariants
//! - A referenced parent or child must exist in the session; dangling link
//!   targets fail with `NotFound` instead of being silently skipped.
//! - A parent+child pair supplied in one create call must not close a cycle.

use crate::model::category::{Category, CategoryDraft, CategoryId, CategoryPatch};
use crate::repo::category_repo::CategoryRepository;
use crate::repo::session_repo::SessionRepository;
use crate::repo::{MissingEntity, StoreError, StoreResult};
use crate::service::resolve_session;
use std::collections::HashSet;

/// Category use-case facade.
pub struct CategoryService<S: SessionRepository, C: CategoryRepository> {
    sessions: S,
    categories: C,
}

impl<S: SessionRepository, C: CategoryRepository> CategoryService<S, C> {
    /// Creates a service from repository implementations.
    pub fn new(sessions: S, categories: C) -> Self {
        Self {
            sessions,
            categories,
        }
    }

    /// Creates one category, optionally linked to an existing parent and/or
    /// an existing child.
    pub fn create_category(
        &self,
        session_id: &str,
        draft: CategoryDraft,
    ) -> StoreResult<Category> {
        let name = normalize_category_name(&draft.name)?;
        resolve_session(&self.sessions, session_id)?;

        if let Some(parent_id) = draft.parent_id {
            self.ensure_category_exists(session_id, parent_id)?;
        }
        if let Some(child_id) = draft.child_id {
            self.ensure_category_exists(session_id, child_id)?;
            if let Some(parent_id) = draft.parent_id {
                // Re-parenting `child_id` under the new node closes a cycle
                // exactly when `child_id` sits on the parent chain above
                // `parent_id`.
                if self.is_on_parent_chain(session_id, child_id, parent_id)? {
                    return Err(StoreError::Integrity(format!(
                        "linking category `{child_id}` as child would close a cycle"
                    )));
                }
            }
        }

        self.categories
            .create_category(session_id, &CategoryDraft { name, ..draft })
    }

    /// Applies a partial field patch; omitted fields stay untouched.
    /// Parent/child links are not updatable through this operation.
    pub fn update_category(
        &self,
        session_id: &str,
        category_id: CategoryId,
        patch: CategoryPatch,
    ) -> StoreResult<Category> {
        let patch = CategoryPatch {
            name: patch
                .name
                .map(|name| normalize_category_name(&name))
                .transpose()?,
            description: patch.description,
            position: patch.position,
        };
        resolve_session(&self.sessions, session_id)?;
        self.categories
            .update_category(session_id, category_id, &patch)
    }

    /// Deletes one category; its children and contained items are detached,
    /// not deleted.
    pub fn delete_category(&self, session_id: &str, category_id: CategoryId) -> StoreResult<()> {
        resolve_session(&self.sessions, session_id)?;
        self.categories.delete_category(session_id, category_id)
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

    fn is_on_parent_chain(
        &self,
        session_id: &str,
        candidate: CategoryId,
        start: CategoryId,
    ) -> StoreResult<bool> {
        let mut visited = HashSet::new();
        let mut cursor = Some(start);
        while let Some(current) = cursor {
            if current == candidate {
                return Ok(true);
            }
            if !visited.insert(current) {
                // Persisted cycle above `start`; refuse the link rather than
                // walking forever.
                return Ok(true);
            }
            cursor = self
                .categories
                .get_category(session_id, current)?
                .and_then(|category| category.parent_id);
        }
        Ok(false)
    }
}

fn normalize_category_name(value: &str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(
            "category name must not be blank".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
