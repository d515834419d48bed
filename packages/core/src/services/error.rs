//! Service Layer Error Types
//!
//! Errors for the drop classifier and the restructure planner. Every variant
//! here is raised *before* the planner mutates anything: an illegal drop
//! produces no operations and leaves the tree untouched.

use thiserror::Error;

use crate::models::ListSubtype;
use crate::store::StoreError;

/// Rejections and failures of a restructure pass
#[derive(Error, Debug)]
pub enum RestructureError {
    /// The drag selection was empty
    #[error("Drop rejected: no source nodes selected")]
    EmptySelection,

    /// A selected node contains the drop target
    #[error("Drop rejected: source {source_id} contains the target {target_id}")]
    SelfContainment {
        source_id: String,
        target_id: String,
    },

    /// The drop target is part of the dragged selection
    #[error("Drop rejected: target {id} is part of the selection")]
    TargetInSelection { id: String },

    /// Source nodes must be contiguous siblings in document order
    #[error("Drop rejected: selection is not a contiguous sibling range (node {id})")]
    NonContiguousSelection { id: String },

    /// A selection must be all list items or no list items
    #[error("Drop rejected: selection mixes list items with other blocks")]
    MixedSelection,

    /// List items can only sit next to list items of the same subtype
    #[error("Drop rejected: list subtype mismatch (expected {expected:?}, got {actual:?})")]
    SubtypeMismatch {
        expected: ListSubtype,
        actual: ListSubtype,
    },

    /// The target cannot accept this drop (document root, list boundary, ...)
    #[error("Drop rejected: invalid target {id}: {reason}")]
    InvalidTarget { id: String, reason: String },

    /// The target sits inside an embedded-query container
    #[error("Drop rejected: target {id} is inside an embedded query")]
    EmbeddedTarget { id: String },

    /// Tree access failed (missing nodes, malformed references)
    #[error(transparent)]
    Store(#[from] StoreError),
}
