//! Client-facing read model for one session.
//!
//! # Responsibility
//! - Define the nested tree plus orphan list returned by session reads.
//!
//! # Invariants
//! - Every category of the session appears exactly once: nested under its
//!   parent, or as a root when it has none.
//! - Orphan items never appear inside a tree node.

use crate::model::category::{CategoryId, Position};
use crate::model::item::ItemKey;
use crate::model::properties::Properties;
use serde::Serialize;

/// Display record for one item: the client id merged with its payload.
///
/// Serializes flat, so boundary layers see `{"id": ..., <properties...>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    /// Client-assigned id.
    pub id: ItemKey,
    /// Deserialized payload, flattened next to `id`.
    #[serde(flatten)]
    pub properties: Properties,
}

/// One category with its nested children and contained items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub position: Option<Position>,
    pub items: Vec<ItemView>,
    pub children: Vec<TreeNode>,
}

/// Full reconstructed view of one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Top-level categories: true roots plus any category whose parent was
    /// deleted.
    pub roots: Vec<TreeNode>,
    /// Items owned by the session but contained by no category.
    pub orphan_items: Vec<ItemView>,
}

impl SessionSnapshot {
    /// Finds a node anywhere in the tree by category id.
    pub fn find(&self, id: CategoryId) -> Option<&TreeNode> {
        fn walk(nodes: &[TreeNode], id: CategoryId) -> Option<&TreeNode> {
            for node in nodes {
                if node.id == id {
                    return Some(node);
                }
                if let Some(found) = walk(&node.children, id) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.roots, id)
    }
}
