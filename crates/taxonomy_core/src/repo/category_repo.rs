//! Category repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for category nodes and their parent links.
//! - Keep SQL details and ordering behavior inside the repository boundary.
//!
//! # Invariants
//! - All queries are scoped by the owning session.
//! - Linking a missing parent or child fails with `NotFound`; zero-row link
//!   updates are never silently ignored.
//! - Category listing is deterministic: insertion order (`rowid ASC`).

use crate::model::category::{Category, CategoryDraft, CategoryId, CategoryPatch, Position};
use crate::repo::{
    ensure_store_ready, parse_stored_uuid, MissingEntity, StoreError, StoreResult,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const CATEGORY_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    pos_x,
    pos_y,
    parent_id
FROM categories";

/// Repository interface for category CRUD operations.
pub trait CategoryRepository {
    /// Creates one category, optionally linked to a parent and/or an
    /// existing child, in one transaction.
    fn create_category(&self, session_id: &str, draft: &CategoryDraft) -> StoreResult<Category>;
    /// Loads one category by id within the session.
    fn get_category(
        &self,
        session_id: &str,
        category_id: CategoryId,
    ) -> StoreResult<Option<Category>>;
    /// Applies a partial field patch and returns the post-update category.
    fn update_category(
        &self,
        session_id: &str,
        category_id: CategoryId,
        patch: &CategoryPatch,
    ) -> StoreResult<Category>;
    /// Removes the category node and detaches all incident links.
    fn delete_category(&self, session_id: &str, category_id: CategoryId) -> StoreResult<()>;
    /// Lists every category of the session in deterministic order.
    fn list_categories(&self, session_id: &str) -> StoreResult<Vec<Category>>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create_category(&self, session_id: &str, draft: &CategoryDraft) -> StoreResult<Category> {
        let category_id: CategoryId = Uuid::new_v4();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO categories (id, session_id, name, description, pos_x, pos_y, parent_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                category_id.to_string(),
                session_id,
                draft.name.as_str(),
                draft.description.as_str(),
                draft.position.map(|position| position.x),
                draft.position.map(|position| position.y),
                draft.parent_id.map(|id| id.to_string()),
            ],
        )?;

        if let Some(child_id) = draft.child_id {
            let changed = tx.execute(
                "UPDATE categories
                 SET parent_id = ?3,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                   AND session_id = ?2;",
                params![
                    child_id.to_string(),
                    session_id,
                    category_id.to_string()
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(MissingEntity::Category(child_id)));
            }
        }
        tx.commit()?;

        Ok(Category {
            id: category_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            position: draft.position,
            parent_id: draft.parent_id,
        })
    }

    fn get_category(
        &self,
        session_id: &str,
        category_id: CategoryId,
    ) -> StoreResult<Option<Category>> {
        load_category(self.conn, session_id, category_id)
    }

    fn update_category(
        &self,
        session_id: &str,
        category_id: CategoryId,
        patch: &CategoryPatch,
    ) -> StoreResult<Category> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let current = load_category(&tx, session_id, category_id)?
            .ok_or(StoreError::NotFound(MissingEntity::Category(category_id)))?;

        let merged = Category {
            id: current.id,
            name: patch.name.clone().unwrap_or(current.name),
            description: patch.description.clone().unwrap_or(current.description),
            position: patch.position.or(current.position),
            parent_id: current.parent_id,
        };

        tx.execute(
            "UPDATE categories
             SET name = ?3,
                 description = ?4,
                 pos_x = ?5,
                 pos_y = ?6,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND session_id = ?2;",
            params![
                category_id.to_string(),
                session_id,
                merged.name.as_str(),
                merged.description.as_str(),
                merged.position.map(|position| position.x),
                merged.position.map(|position| position.y),
            ],
        )?;
        tx.commit()?;

        Ok(merged)
    }

    fn delete_category(&self, session_id: &str, category_id: CategoryId) -> StoreResult<()> {
        // Children and contained items are detached by the schema's
        // ON DELETE SET NULL links; they stay owned by the session.
        let changed = self.conn.execute(
            "DELETE FROM categories WHERE id = ?1 AND session_id = ?2;",
            params![category_id.to_string(), session_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(MissingEntity::Category(category_id)));
        }
        Ok(())
    }

    fn list_categories(&self, session_id: &str) -> StoreResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL}
             WHERE session_id = ?1
             ORDER BY rowid ASC;"
        ))?;

        let mut rows = stmt.query([session_id])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }
}

fn load_category(
    conn: &Connection,
    session_id: &str,
    category_id: CategoryId,
) -> StoreResult<Option<Category>> {
    let mut stmt = conn.prepare(&format!(
        "{CATEGORY_SELECT_SQL}
         WHERE id = ?1
           AND session_id = ?2;"
    ))?;

    let mut rows = stmt.query(params![category_id.to_string(), session_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_category_row(row)?));
    }
    Ok(None)
}

fn parse_category_row(row: &Row<'_>) -> StoreResult<Category> {
    let id_text: String = row.get("id")?;
    let id = parse_stored_uuid(&id_text, "categories.id")?;

    let parent_id = row
        .get::<_, Option<String>>("parent_id")?
        .map(|value| parse_stored_uuid(&value, "categories.parent_id"))
        .transpose()?;

    let position = match (
        row.get::<_, Option<f64>>("pos_x")?,
        row.get::<_, Option<f64>>("pos_y")?,
    ) {
        (Some(x), Some(y)) => Some(Position { x, y }),
        (None, None) => None,
        _ => {
            return Err(StoreError::Integrity(format!(
                "half-set position on category `{id}`"
            )));
        }
    };

    Ok(Category {
        id,
        name: row.get("name")?,
        description: row.get("description")?,
        position,
        parent_id,
    })
}
