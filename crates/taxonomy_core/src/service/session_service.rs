//! Session use-case service and tree reconstruction.
//!
//! # Responsibility
//! - Bootstrap sessions and reconstruct the client-facing nested view.
//! - Build the category arena and parent index once per read, then emit the
//!   nested tree from it.
//!
//! # Invariants
//! - The root set is every category without a live parent link, which covers
//!   true roots and categories whose parent was deleted.
//! - An item whose container is unknown to the arena surfaces as an orphan
//!   instead of disappearing.

use crate::model::category::{Category, CategoryId};
use crate::model::item::Item;
use crate::model::session::Session;
use crate::model::tree::{ItemView, SessionSnapshot, TreeNode};
use crate::repo::category_repo::CategoryRepository;
use crate::repo::item_repo::ItemRepository;
use crate::repo::session_repo::SessionRepository;
use crate::repo::StoreResult;
use crate::service::resolve_session;
use std::collections::{HashMap, HashSet};

/// Session use-case facade.
pub struct SessionService<S: SessionRepository, C: CategoryRepository, I: ItemRepository> {
    sessions: S,
    categories: C,
    items: I,
}

impl<S: SessionRepository, C: CategoryRepository, I: ItemRepository> SessionService<S, C, I> {
    /// Creates a service from repository implementations.
    pub fn new(sessions: S, categories: C, items: I) -> Self {
        Self {
            sessions,
            categories,
            items,
        }
    }

    /// Creates one session with its bootstrapped root category.
    pub fn create_session(&self) -> StoreResult<Session> {
        self.sessions.create_session()
    }

    /// Reconstructs the full client-facing view of one session: the nested
    /// category tree plus the orphan item list.
    pub fn get_session_data(&self, session_id: &str) -> StoreResult<SessionSnapshot> {
        resolve_session(&self.sessions, session_id)?;
        let categories = self.categories.list_categories(session_id)?;
        let items = self.items.list_items(session_id)?;
        Ok(assemble_snapshot(categories, items))
    }
}

/// Builds the nested view from flat category and item lists.
///
/// Single pass over each list: an arena shell per category, a parent index
/// for child wiring, then recursive emission from the root set. Input order
/// (the repositories' deterministic order) is preserved for siblings and
/// contained items.
fn assemble_snapshot(categories: Vec<Category>, items: Vec<Item>) -> SessionSnapshot {
    let order: Vec<CategoryId> = categories.iter().map(|category| category.id).collect();
    let known: HashSet<CategoryId> = order.iter().copied().collect();

    let mut shells: HashMap<CategoryId, (Category, Vec<ItemView>)> =
        HashMap::with_capacity(categories.len());
    let mut children_of: HashMap<CategoryId, Vec<CategoryId>> = HashMap::new();
    let mut has_parent: HashSet<CategoryId> = HashSet::new();

    for category in categories {
        if let Some(parent_id) = category.parent_id {
            // A parent outside the arena (or a self-link in corrupt data)
            // is ignored; the category then surfaces as a root.
            if known.contains(&parent_id) && parent_id != category.id {
                children_of.entry(parent_id).or_default().push(category.id);
                has_parent.insert(category.id);
            }
        }
        shells.insert(category.id, (category, Vec::new()));
    }

    let mut orphan_items = Vec::new();
    for item in items {
        let view = ItemView {
            id: item.id,
            properties: item.properties,
        };
        match item.category_id.and_then(|id| shells.get_mut(&id)) {
            Some((_, contained)) => contained.push(view),
            None => orphan_items.push(view),
        }
    }

    let mut roots = Vec::new();
    for id in &order {
        if !has_parent.contains(id) {
            if let Some(node) = emit_node(*id, &mut shells, &children_of) {
                roots.push(node);
            }
        }
    }

    SessionSnapshot {
        roots,
        orphan_items,
    }
}

fn emit_node(
    id: CategoryId,
    shells: &mut HashMap<CategoryId, (Category, Vec<ItemView>)>,
    children_of: &HashMap<CategoryId, Vec<CategoryId>>,
) -> Option<TreeNode> {
    // `remove` doubles as the visited set; a shell is emitted at most once.
    let (category, items) = shells.remove(&id)?;
    let children = children_of
        .get(&id)
        .map(|child_ids| {
            child_ids
                .iter()
                .filter_map(|child_id| emit_node(*child_id, shells, children_of))
                .collect()
        })
        .unwrap_or_default();

    Some(TreeNode {
        id: category.id,
        name: category.name,
        description: category.description,
        position: category.position,
        items,
        children,
    })
}
