//! Container Normalizer
//!
//! Post-conditions applied after every restructure: ordered lists get their
//! children renumbered, and a Document root emptied by a cross-document move
//! receives a synthesized empty Leaf so a document is never structurally
//! empty.
//!
//! Super-block collapse, the third normalization, lives in
//! [`crate::utils::structure`] because the planner splices its ready-made
//! operation fragment rather than re-deriving it.

use crate::models::{BlockKind, ListSubtype};
use crate::operations::Operation;
use crate::store::{BlockStore, StoreError};
use crate::utils::structure;

/// Recompute the 1-based display index of every child of an ordered list.
///
/// Children whose stored index already matches their position are skipped,
/// so a second pass with no intervening structural change emits nothing.
/// Non-ordered lists are left untouched.
///
/// Returns `(do_updates, undo_updates)`: full-content snapshots after and
/// before the renumbering, both in forward child order. The caller decides
/// where the undo half lands in its log; it must never be the final undo
/// step (see `RestructurePlanner`).
pub fn renumber_list(
    store: &mut BlockStore,
    list_id: &str,
) -> Result<(Vec<Operation>, Vec<Operation>), StoreError> {
    let list = store.get(list_id)?;
    if !matches!(
        list.kind,
        BlockKind::List {
            subtype: ListSubtype::Ordered
        }
    ) {
        return Ok((Vec::new(), Vec::new()));
    }

    let children = list.children.clone();
    let mut do_updates = Vec::new();
    let mut undo_updates = Vec::new();

    for (position, child_id) in children.iter().enumerate() {
        let expected = (position + 1) as i64;
        let before = store.snapshot_node(child_id)?;
        if before.list_index() == Some(expected) {
            continue;
        }
        store.node_mut(child_id)?.set_list_index(expected);
        let after = store.snapshot_node(child_id)?;

        do_updates.push(Operation::update(after));
        undo_updates.push(Operation::update(before));
    }

    if !do_updates.is_empty() {
        tracing::debug!(
            list_id,
            changed = do_updates.len(),
            "renumbered ordered list"
        );
    }
    Ok((do_updates, undo_updates))
}

/// Keep an emptied Document root non-empty by synthesizing one empty Leaf.
///
/// Returns the paired insert/delete when the guard fired, None when the root
/// still has content. The insert belongs at the head of the do log, the
/// deletion at the head of the undo log.
pub fn ensure_root_not_empty(
    store: &mut BlockStore,
    doc_id: &str,
) -> Result<Option<(Operation, Operation)>, StoreError> {
    let doc = store.get(doc_id)?;
    if !doc.is_document() || !doc.children.is_empty() {
        return Ok(None);
    }

    let leaf = structure::synthesize_empty_leaf();
    let leaf_id = leaf.id.clone();
    store.insert_node(leaf, doc_id, None)?;
    let snapshot = store.snapshot(&leaf_id)?;
    tracing::debug!(doc_id, leaf_id, "synthesized empty leaf for emptied root");

    Ok(Some((
        Operation::insert(snapshot.clone(), None, None, doc_id),
        Operation::delete(snapshot),
    )))
}
