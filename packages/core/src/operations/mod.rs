//! Structural Edit Operations
//!
//! This module defines the atomic, serializable edit records produced by the
//! restructure planner and replayed by [`crate::store::BlockStore::apply`],
//! plus the [`OperationLog`] emitter that assembles them into paired do/undo
//! sequences.
//!
//! Sibling position is always expressed by reference (`previous_id` /
//! `next_id`), never by numeric index: references stay stable when a log is
//! spliced or replayed against a tree whose indices have shifted.

pub mod log;

pub use log::OperationLog;

use serde::{Deserialize, Serialize};

use crate::models::BlockNode;

/// The four structural edit actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpAction {
    /// Create the subtree in `data` at the referenced position
    Insert,
    /// Re-parent an existing node to the referenced position
    Move,
    /// Remove the node (and its subtree) from the tree
    Delete,
    /// Replace the node's content and properties from the snapshot in `data`
    Update,
}

/// A node snapshot with recursively captured children.
///
/// Used as the `data` payload of insert/delete/update operations. For update
/// operations the snapshot is a single node (children empty); insert and
/// delete carry whatever subtree was created or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSubtree {
    /// The snapshotted node (its `children` id vector is rebuilt on insert)
    pub node: BlockNode,
    /// Child subtrees in document order
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BlockSubtree>,
}

impl BlockSubtree {
    /// Snapshot of a single node with no children captured
    pub fn leaf(node: BlockNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// Total number of nodes in the snapshot
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(BlockSubtree::node_count)
            .sum::<usize>()
    }
}

/// Atomic, write-once structural edit record.
///
/// Position resolution at apply time: `previous_id` (insert after it) wins;
/// otherwise `next_id` (insert before it); otherwise the head of `parent_id`'s
/// children. A move or insert op therefore stays valid as long as one of its
/// reference nodes still exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Edit action
    pub action: OpAction,

    /// Id of the affected node
    pub id: String,

    /// Snapshot payload (insert/delete/update)
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BlockSubtree>,

    /// Sibling to land immediately after
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_id: Option<String>,

    /// Sibling to land immediately before (used when there is no previous)
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_id: Option<String>,

    /// Destination parent
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Operation {
    /// Insert the given subtree at the referenced position.
    pub fn insert(
        data: BlockSubtree,
        previous_id: Option<String>,
        next_id: Option<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            action: OpAction::Insert,
            id: data.node.id.clone(),
            data: Some(data),
            previous_id,
            next_id,
            parent_id: Some(parent_id.into()),
        }
    }

    /// Move an existing node to the referenced position.
    pub fn move_to(
        id: impl Into<String>,
        previous_id: Option<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            action: OpAction::Move,
            id: id.into(),
            data: None,
            previous_id,
            next_id: None,
            parent_id: Some(parent_id.into()),
        }
    }

    /// Delete a node; the snapshot preserves what was removed so the mirrored
    /// insert can restore it.
    pub fn delete(data: BlockSubtree) -> Self {
        Self {
            action: OpAction::Delete,
            id: data.node.id.clone(),
            data: Some(data),
            previous_id: None,
            next_id: None,
            parent_id: None,
        }
    }

    /// Replace a node's content and properties from a full-content snapshot.
    pub fn update(snapshot: BlockNode) -> Self {
        Self {
            action: OpAction::Update,
            id: snapshot.id.clone(),
            data: Some(BlockSubtree::leaf(snapshot)),
            previous_id: None,
            next_id: None,
            parent_id: None,
        }
    }
}
