//! Document-structure utilities
//!
//! Container synthesis and collapse primitives shared by the planner and the
//! normalizer. These are the only places auxiliary containers (wrapper lists,
//! super-blocks, the empty-root leaf) come into existence.

use crate::models::{BlockKind, BlockNode, ListSubtype, SuperBlockLayout};
use crate::operations::Operation;
use crate::store::{BlockStore, StoreError};

/// Fresh List container of the given subtype.
pub fn synthesize_list(subtype: ListSubtype) -> BlockNode {
    BlockNode::new(BlockKind::List { subtype }, "")
}

/// Fresh SuperBlock container with the given layout.
pub fn synthesize_super_block(layout: SuperBlockLayout) -> BlockNode {
    BlockNode::new(BlockKind::SuperBlock { layout }, "")
}

/// Fresh empty Leaf, used to keep an emptied Document root non-empty.
pub fn synthesize_empty_leaf() -> BlockNode {
    BlockNode::new(BlockKind::Leaf, "")
}

/// Collapse a SuperBlock that has been reduced to a single child.
///
/// The surviving child is promoted to the super-block's former position and
/// the wrapper is deleted. Returns the paired two-operation fragments, the
/// undo half in apply order: re-insert the wrapper, then re-nest the child.
///
/// # Errors
///
/// `NotCollapsible` when the node is not a SuperBlock or does not have
/// exactly one child.
pub fn collapse_super_block(
    store: &mut BlockStore,
    sb_id: &str,
) -> Result<([Operation; 2], [Operation; 2]), StoreError> {
    let sb = store.get(sb_id)?;
    if !sb.is_super_block() || sb.children.len() != 1 {
        return Err(StoreError::NotCollapsible {
            id: sb_id.to_string(),
        });
    }
    let child = sb.children[0].clone();
    let sb_prev = store.previous_sibling(sb_id);
    let sb_parent = store
        .parent_id(sb_id)
        .ok_or_else(|| StoreError::Detached {
            id: sb_id.to_string(),
        })?
        .to_string();

    // Promote the child right after the wrapper, then drop the wrapper; the
    // child ends up exactly in the wrapper's former position.
    store.move_node(&child, &sb_parent, Some(sb_id))?;
    let snapshot = store.remove_subtree(sb_id)?;

    // When the wrapper had no previous sibling, the promoted child itself is
    // the stable reference for re-inserting the wrapper in front.
    let reinsert_next = if sb_prev.is_none() {
        Some(child.clone())
    } else {
        None
    };

    Ok((
        [
            Operation::move_to(child.clone(), Some(sb_id.to_string()), sb_parent.clone()),
            Operation::delete(snapshot.clone()),
        ],
        [
            Operation::insert(snapshot, sb_prev, reinsert_next, sb_parent),
            Operation::move_to(child, None, sb_id.to_string()),
        ],
    ))
}

/// The highest ancestor that removing `id`'s subtree would leave childless.
///
/// Walks up while each parent is a prunable container (List, ListItem,
/// SuperBlock) whose only child is the current node. Returns None when the
/// immediate parent keeps other children.
pub fn find_topmost_solo_ancestor(store: &BlockStore, id: &str) -> Option<String> {
    let mut current = id.to_string();
    let mut topmost = None;
    while let Some(parent_id) = store.parent_id(&current) {
        let parent = store.node(parent_id)?;
        let prunable = matches!(
            parent.kind,
            BlockKind::List { .. } | BlockKind::ListItem { .. } | BlockKind::SuperBlock { .. }
        );
        if prunable && parent.children.len() == 1 && parent.children[0] == current {
            topmost = Some(parent.id.clone());
            current = parent.id.clone();
        } else {
            break;
        }
    }
    topmost
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sb_with_children(store: &mut BlockStore, doc: &str, count: usize) -> (String, Vec<String>) {
        let sb = synthesize_super_block(SuperBlockLayout::Row);
        let sb_id = sb.id.clone();
        store.insert_node(sb, doc, None).unwrap();
        let mut ids = Vec::new();
        let mut prev: Option<String> = None;
        for i in 0..count {
            let leaf = BlockNode::new(BlockKind::Leaf, format!("child {i}"));
            let id = leaf.id.clone();
            store.insert_node(leaf, &sb_id, prev.as_deref()).unwrap();
            prev = Some(id.clone());
            ids.push(id);
        }
        (sb_id, ids)
    }

    #[test]
    fn test_collapse_promotes_sole_child() {
        let mut store = BlockStore::new();
        let doc = store.create_document();
        let before = BlockNode::new(BlockKind::Leaf, "before");
        let before_id = before.id.clone();
        store.insert_node(before, &doc, None).unwrap();
        let (sb_id, children) = sb_with_children(&mut store, &doc, 1);
        store.move_node(&sb_id, &doc, Some(&before_id)).unwrap();

        let pre = store.clone();
        let (do_frag, undo_frag) = collapse_super_block(&mut store, &sb_id).unwrap();

        assert!(!store.contains(&sb_id));
        assert_eq!(store.children(&doc), &[before_id, children[0].clone()]);

        // The fragment replays to the same states in both directions
        let mut replay = pre.clone();
        replay.apply_all(&do_frag).unwrap();
        assert_eq!(replay, store);
        replay.apply_all(&undo_frag).unwrap();
        assert_eq!(replay, pre);
    }

    #[test]
    fn test_collapse_at_head_of_parent() {
        let mut store = BlockStore::new();
        let doc = store.create_document();
        let (sb_id, children) = sb_with_children(&mut store, &doc, 1);

        let pre = store.clone();
        let (_, undo_frag) = collapse_super_block(&mut store, &sb_id).unwrap();
        assert_eq!(store.children(&doc), &[children[0].clone()]);

        let mut replay = store.clone();
        replay.apply_all(&undo_frag).unwrap();
        assert_eq!(replay, pre);
    }

    #[test]
    fn test_collapse_rejects_healthy_super_block() {
        let mut store = BlockStore::new();
        let doc = store.create_document();
        let (sb_id, _) = sb_with_children(&mut store, &doc, 2);
        assert!(matches!(
            collapse_super_block(&mut store, &sb_id),
            Err(StoreError::NotCollapsible { .. })
        ));
    }

    #[test]
    fn test_topmost_solo_ancestor_chain() {
        let mut store = BlockStore::new();
        let doc = store.create_document();

        // doc > list > item > inner list (each link solo)
        let list = synthesize_list(ListSubtype::Unordered);
        let list_id = list.id.clone();
        store.insert_node(list, &doc, None).unwrap();
        let item = BlockNode::new(
            BlockKind::ListItem {
                subtype: ListSubtype::Unordered,
            },
            "",
        );
        let item_id = item.id.clone();
        store.insert_node(item, &list_id, None).unwrap();
        let inner = synthesize_list(ListSubtype::Ordered);
        let inner_id = inner.id.clone();
        store.insert_node(inner, &item_id, None).unwrap();

        assert_eq!(
            find_topmost_solo_ancestor(&store, &inner_id),
            Some(list_id.clone()),
            "the cut widens through the solo item to the outer list"
        );

        // A sibling next to the inner list stops the walk immediately
        let sibling = BlockNode::new(BlockKind::Leaf, "keeps the item alive");
        store.insert_node(sibling, &item_id, Some(&inner_id)).unwrap();
        assert_eq!(find_topmost_solo_ancestor(&store, &inner_id), None);
    }
}
