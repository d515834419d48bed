//! Drop Classification
//!
//! The resolved placement intent of a drag gesture and the precondition wall
//! in front of the planner. Geometric hit-testing (which edge of which block
//! the pointer is over) happens upstream in the UI layer; by the time a
//! [`DragSession`] reaches this module it is already a symbolic description
//! of the gesture.
//!
//! Every rejection happens before any mutation: a drop that fails validation
//! produces no operations and leaves the tree exactly as it was.

use crate::models::BlockKind;
use crate::services::error::RestructureError;
use crate::store::BlockStore;

/// Placement of a drop relative to the target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPlacement {
    /// Splice the sources immediately before the target
    Before,
    /// Splice the sources immediately after the target
    After,
    /// Wrap target and sources in a SuperBlock, sources first
    NestLeft,
    /// Wrap target and sources in a SuperBlock, target first
    NestRight,
}

impl DropPlacement {
    /// True for the placements that synthesize a SuperBlock
    pub fn is_cross_axis(&self) -> bool {
        matches!(self, DropPlacement::NestLeft | DropPlacement::NestRight)
    }
}

/// One drag gesture, scoped to a single planning pass.
///
/// `same_container` is false when the sources were picked up in a different
/// open view than the one receiving the drop; such moves are committed
/// do-only (see `RestructurePlanner`).
#[derive(Debug, Clone)]
pub struct DragSession {
    /// Dragged nodes, contiguous siblings in document order
    pub source_ids: Vec<String>,
    /// Node the drop resolved against
    pub target_id: String,
    /// Resolved placement intent
    pub placement: DropPlacement,
    /// False when the gesture crossed open views
    pub same_container: bool,
}

impl DragSession {
    pub fn new(
        source_ids: Vec<String>,
        target_id: impl Into<String>,
        placement: DropPlacement,
    ) -> Self {
        Self {
            source_ids,
            target_id: target_id.into(),
            placement,
            same_container: true,
        }
    }

    /// Mark the session as crossing open views.
    pub fn across_views(mut self) -> Self {
        self.same_container = false;
        self
    }
}

/// Check every precondition of a drop, mutating nothing.
///
/// # Errors
///
/// See [`RestructureError`]; the planner calls this first and refuses to run
/// on any failure.
pub fn validate_drop(store: &BlockStore, session: &DragSession) -> Result<(), RestructureError> {
    if session.source_ids.is_empty() {
        return Err(RestructureError::EmptySelection);
    }

    let target = store.get(&session.target_id)?;
    for id in &session.source_ids {
        store.get(id)?;
    }

    if session.source_ids.contains(&session.target_id) {
        return Err(RestructureError::TargetInSelection {
            id: session.target_id.clone(),
        });
    }

    for id in &session.source_ids {
        if store.is_descendant(id, &session.target_id) {
            return Err(RestructureError::SelfContainment {
                source_id: id.clone(),
                target_id: session.target_id.clone(),
            });
        }
    }

    if target.is_document() {
        return Err(RestructureError::InvalidTarget {
            id: target.id.clone(),
            reason: "cannot drop beside a document root".to_string(),
        });
    }

    if store.is_inside_query_embed(&session.target_id) {
        return Err(RestructureError::EmbeddedTarget {
            id: session.target_id.clone(),
        });
    }

    // Selection must be a contiguous sibling range in document order
    let first = &session.source_ids[0];
    let parent_id = store.parent_id(first).map(str::to_string).ok_or_else(|| {
        RestructureError::InvalidTarget {
            id: first.clone(),
            reason: "cannot drag a document root".to_string(),
        }
    })?;
    let siblings = store.children(&parent_id);
    let start = siblings
        .iter()
        .position(|c| c == first)
        .ok_or_else(|| RestructureError::NonContiguousSelection { id: first.clone() })?;
    for (offset, id) in session.source_ids.iter().enumerate() {
        match siblings.get(start + offset) {
            Some(sibling) if sibling == id => {}
            _ => {
                return Err(RestructureError::NonContiguousSelection { id: id.clone() });
            }
        }
    }

    // All list items or none, and one subtype throughout
    let item_subtypes: Vec<_> = session
        .source_ids
        .iter()
        .filter_map(|id| store.node(id))
        .map(|n| match n.kind {
            BlockKind::ListItem { subtype } => Some(subtype),
            _ => None,
        })
        .collect();
    let item_count = item_subtypes.iter().filter(|s| s.is_some()).count();
    if item_count != 0 && item_count != item_subtypes.len() {
        return Err(RestructureError::MixedSelection);
    }
    let source_subtype = item_subtypes.first().copied().flatten();
    if let Some(expected) = source_subtype {
        if item_subtypes.iter().any(|s| *s != Some(expected)) {
            let actual = item_subtypes
                .iter()
                .flatten()
                .find(|s| **s != expected)
                .copied()
                .unwrap_or(expected);
            return Err(RestructureError::SubtypeMismatch { expected, actual });
        }
    }

    // List items as neighbors of a list item: subtypes must match; anything
    // else beside a list item would break the list/item pairing invariant
    if let BlockKind::ListItem { subtype: target_subtype } = target.kind {
        match source_subtype {
            None => {
                return Err(RestructureError::InvalidTarget {
                    id: target.id.clone(),
                    reason: "only list items can sit beside a list item".to_string(),
                });
            }
            Some(subtype) if subtype != target_subtype => {
                return Err(RestructureError::SubtypeMismatch {
                    expected: target_subtype,
                    actual: subtype,
                });
            }
            Some(_) => {}
        }
        if session.placement.is_cross_axis() {
            return Err(RestructureError::InvalidTarget {
                id: target.id.clone(),
                reason: "cannot wrap a list item in a super-block".to_string(),
            });
        }
    }

    Ok(())
}
