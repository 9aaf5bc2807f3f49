//! Item repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for item nodes, their opaque payload and their
//!   containment link.
//! - Own the category membership replacement diff (`replace_category_items`)
//!   with atomic semantics.
//!
//! # Invariants
//! - All queries are scoped by the owning session.
//! - A client id maps to at most one item per session; single-item update is
//!   strict (no upsert).
//! - Changing an item's container is a move, never an add.
//! - `replace_category_items` applies its whole delete/update/create plan in
//!   a single transaction and is idempotent at the membership level.

use crate::model::category::CategoryId;
use crate::model::item::{Item, ItemDraft, ItemKey};
use crate::repo::{
    encode_properties, ensure_store_ready, parse_stored_properties, parse_stored_uuid,
    MissingEntity, StoreError, StoreResult,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    internal_id,
    client_id,
    properties,
    category_id
FROM items";

/// Repository interface for item CRUD and membership operations.
pub trait ItemRepository {
    /// Creates one item, optionally contained in a category.
    fn create_item(
        &self,
        session_id: &str,
        draft: &ItemDraft,
        container: Option<CategoryId>,
    ) -> StoreResult<Item>;
    /// Overwrites an existing item's payload and container. Strict: fails
    /// with `NotFound` when the client id is unknown in the session.
    fn update_item(
        &self,
        session_id: &str,
        draft: &ItemDraft,
        container: Option<CategoryId>,
    ) -> StoreResult<Item>;
    /// Loads one item by client id within the session.
    fn get_item(&self, session_id: &str, item_id: &str) -> StoreResult<Option<Item>>;
    /// Lists every item of the session in deterministic order.
    fn list_items(&self, session_id: &str) -> StoreResult<Vec<Item>>;
    /// Deletes the listed items; ids not present are silently ignored.
    /// Returns the number of items actually removed.
    fn delete_items(&self, session_id: &str, item_ids: &[ItemKey]) -> StoreResult<usize>;
    /// Replaces the category's membership with `desired`: stale items are
    /// deleted, kept ids are overwritten, new ids are created or adopted.
    /// Returns the resulting items, updated first, then created.
    fn replace_category_items(
        &self,
        session_id: &str,
        category_id: CategoryId,
        desired: &[ItemDraft],
    ) -> StoreResult<Vec<Item>>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(
        &self,
        session_id: &str,
        draft: &ItemDraft,
        container: Option<CategoryId>,
    ) -> StoreResult<Item> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let item = insert_item(&tx, session_id, draft, container)?;
        tx.commit()?;
        Ok(item)
    }

    fn update_item(
        &self,
        session_id: &str,
        draft: &ItemDraft,
        container: Option<CategoryId>,
    ) -> StoreResult<Item> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let item = overwrite_item(&tx, session_id, draft, container)?;
        tx.commit()?;
        Ok(item)
    }

    fn get_item(&self, session_id: &str, item_id: &str) -> StoreResult<Option<Item>> {
        load_item(self.conn, session_id, item_id)
    }

    fn list_items(&self, session_id: &str) -> StoreResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ITEM_SELECT_SQL}
             WHERE session_id = ?1
             ORDER BY rowid ASC;"
        ))?;

        let mut rows = stmt.query([session_id])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }

    fn delete_items(&self, session_id: &str, item_ids: &[ItemKey]) -> StoreResult<usize> {
        if item_ids.is_empty() {
            return Ok(0);
        }
        delete_items_scoped(self.conn, session_id, item_ids)
    }

    fn replace_category_items(
        &self,
        session_id: &str,
        category_id: CategoryId,
        desired: &[ItemDraft],
    ) -> StoreResult<Vec<Item>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let existing_keys: BTreeSet<ItemKey> =
            contained_item_keys(&tx, session_id, category_id)?
                .into_iter()
                .collect();
        let desired_keys: BTreeSet<&str> =
            desired.iter().map(|draft| draft.id.as_str()).collect();

        let stale: Vec<ItemKey> = existing_keys
            .iter()
            .filter(|key| !desired_keys.contains(key.as_str()))
            .cloned()
            .collect();
        let deleted = if stale.is_empty() {
            0
        } else {
            delete_items_scoped(&tx, session_id, &stale)?
        };

        let mut result = Vec::with_capacity(desired.len());
        let mut created = 0usize;
        let mut updated = 0usize;

        for draft in desired.iter().filter(|draft| existing_keys.contains(&draft.id)) {
            result.push(overwrite_item(&tx, session_id, draft, Some(category_id))?);
            updated += 1;
        }
        for draft in desired.iter().filter(|draft| !existing_keys.contains(&draft.id)) {
            // The id may already exist elsewhere in the session (another
            // category or the orphan pool); adopt that item instead of
            // colliding with the per-session id constraint.
            let item = match load_item(&tx, session_id, &draft.id)? {
                Some(_) => {
                    updated += 1;
                    overwrite_item(&tx, session_id, draft, Some(category_id))?
                }
                None => {
                    created += 1;
                    insert_item(&tx, session_id, draft, Some(category_id))?
                }
            };
            result.push(item);
        }
        tx.commit()?;

        info!(
            "event=category_reconcile module=item_repo status=ok category={category_id} \
             created={created} updated={updated} deleted={deleted}"
        );

        Ok(result)
    }
}

fn insert_item(
    conn: &Connection,
    session_id: &str,
    draft: &ItemDraft,
    container: Option<CategoryId>,
) -> StoreResult<Item> {
    if load_item(conn, session_id, &draft.id)?.is_some() {
        return Err(StoreError::Integrity(format!(
            "item `{}` already exists in the session",
            draft.id
        )));
    }

    let internal_id = Uuid::new_v4();
    let payload = encode_properties(&draft.properties)?;
    conn.execute(
        "INSERT INTO items (internal_id, session_id, client_id, properties, category_id)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            internal_id.to_string(),
            session_id,
            draft.id.as_str(),
            payload,
            container.map(|id| id.to_string()),
        ],
    )?;

    Ok(Item {
        internal_id,
        id: draft.id.clone(),
        properties: draft.properties.clone(),
        category_id: container,
    })
}

fn overwrite_item(
    conn: &Connection,
    session_id: &str,
    draft: &ItemDraft,
    container: Option<CategoryId>,
) -> StoreResult<Item> {
    let existing = load_item(conn, session_id, &draft.id)?
        .ok_or_else(|| StoreError::NotFound(MissingEntity::Item(draft.id.clone())))?;

    let payload = encode_properties(&draft.properties)?;
    conn.execute(
        "UPDATE items
         SET properties = ?3,
             category_id = ?4,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE session_id = ?1
           AND client_id = ?2;",
        params![
            session_id,
            draft.id.as_str(),
            payload,
            container.map(|id| id.to_string()),
        ],
    )?;

    Ok(Item {
        internal_id: existing.internal_id,
        id: draft.id.clone(),
        properties: draft.properties.clone(),
        category_id: container,
    })
}

fn load_item(conn: &Connection, session_id: &str, item_id: &str) -> StoreResult<Option<Item>> {
    let mut stmt = conn.prepare(&format!(
        "{ITEM_SELECT_SQL}
         WHERE session_id = ?1
           AND client_id = ?2;"
    ))?;

    let mut rows = stmt.query(params![session_id, item_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_item_row(row)?));
    }
    Ok(None)
}

fn contained_item_keys(
    conn: &Connection,
    session_id: &str,
    category_id: CategoryId,
) -> StoreResult<Vec<ItemKey>> {
    let mut stmt = conn.prepare(
        "SELECT client_id
         FROM items
         WHERE session_id = ?1
           AND category_id = ?2
         ORDER BY rowid ASC;",
    )?;

    let mut rows = stmt.query(params![session_id, category_id.to_string()])?;
    let mut keys = Vec::new();
    while let Some(row) = rows.next()? {
        keys.push(row.get::<_, String>(0)?);
    }
    Ok(keys)
}

fn delete_items_scoped(
    conn: &Connection,
    session_id: &str,
    item_ids: &[ItemKey],
) -> StoreResult<usize> {
    let placeholders = vec!["?"; item_ids.len()].join(", ");
    let sql = format!(
        "DELETE FROM items WHERE session_id = ? AND client_id IN ({placeholders});"
    );

    let mut bind_values: Vec<Value> = Vec::with_capacity(item_ids.len() + 1);
    bind_values.push(Value::Text(session_id.to_string()));
    bind_values.extend(item_ids.iter().map(|id| Value::Text(id.clone())));

    let changed = conn.execute(&sql, params_from_iter(bind_values))?;
    Ok(changed)
}

fn parse_item_row(row: &Row<'_>) -> StoreResult<Item> {
    let internal_id_text: String = row.get("internal_id")?;
    let internal_id = parse_stored_uuid(&internal_id_text, "items.internal_id")?;

    let category_id = row
        .get::<_, Option<String>>("category_id")?
        .map(|value| parse_stored_uuid(&value, "items.category_id"))
        .transpose()?;

    let payload: String = row.get("properties")?;
    let properties = parse_stored_properties(&payload, "items.properties")?;

    Ok(Item {
        internal_id,
        id: row.get("client_id")?,
        properties,
        category_id,
    })
}
