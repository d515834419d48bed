//! Integration Tests for Planner Drop Scenarios
//!
//! Exercises the canonical drop shapes end to end: plain sibling moves,
//! wrapper-list synthesis, super-block creation and collapse. Each test
//! checks the produced operation logs against the expected shape and then
//! replays both directions to confirm the logs reconstruct the right states.

use blocktree_core::models::{BlockKind, BlockNode, ListSubtype, SuperBlockLayout};
use blocktree_core::operations::OpAction;
use blocktree_core::services::{DragSession, DropPlacement, RestructurePlanner};
use blocktree_core::store::BlockStore;

/// Helper to create an attached leaf
fn leaf(store: &mut BlockStore, parent: &str, content: &str, after: Option<&str>) -> String {
    let node = BlockNode::new(BlockKind::Leaf, content);
    let id = node.id.clone();
    store.insert_node(node, parent, after).unwrap();
    id
}

/// Helper to create an attached list container
fn list(store: &mut BlockStore, parent: &str, subtype: ListSubtype, after: Option<&str>) -> String {
    let node = BlockNode::new(BlockKind::List { subtype }, "");
    let id = node.id.clone();
    store.insert_node(node, parent, after).unwrap();
    id
}

/// Helper to create an attached list item
fn item(
    store: &mut BlockStore,
    list_id: &str,
    subtype: ListSubtype,
    content: &str,
    after: Option<&str>,
) -> String {
    let node = BlockNode::new(BlockKind::ListItem { subtype }, content);
    let id = node.id.clone();
    store.insert_node(node, list_id, after).unwrap();
    id
}

/// Replay both logs and check they reconstruct post- and pre-state exactly
fn assert_round_trip(
    pre: &BlockStore,
    post: &BlockStore,
    plan: &blocktree_core::services::RestructurePlan,
) {
    let mut forward = pre.clone();
    forward.apply_all(&plan.do_ops).unwrap();
    assert_eq!(&forward, post, "do log must reproduce the planner's result");

    let undo_ops = plan.undo_ops.as_ref().expect("plan should be reversible");
    let mut backward = post.clone();
    backward.apply_all(undo_ops).unwrap();
    assert_eq!(&backward, pre, "undo log must restore the pre-state");
}

/// Scenario A: drag a single leaf behind a sibling - one move op each way.
#[test]
fn test_single_leaf_after_sibling() {
    let mut store = BlockStore::new();
    let doc = store.create_document();
    let a = leaf(&mut store, &doc, "A", None);
    let b = leaf(&mut store, &doc, "B", Some(&a));
    let c = leaf(&mut store, &doc, "C", Some(&b));

    let pre = store.clone();
    let session = DragSession::new(vec![c.clone()], a.clone(), DropPlacement::After);
    let plan = RestructurePlanner::plan(&mut store, &session).unwrap();

    assert_eq!(store.children(&doc), &[a.clone(), c.clone(), b.clone()]);
    assert_eq!(plan.focus_id, c);

    // Exactly one move, positioned by reference to A
    assert_eq!(plan.do_ops.len(), 1);
    assert_eq!(plan.do_ops[0].action, OpAction::Move);
    assert_eq!(plan.do_ops[0].id, c);
    assert_eq!(plan.do_ops[0].previous_id.as_deref(), Some(a.as_str()));

    // The mirror restores C's original previous sibling
    let undo_ops = plan.undo_ops.as_ref().unwrap();
    assert_eq!(undo_ops.len(), 1);
    assert_eq!(undo_ops[0].action, OpAction::Move);
    assert_eq!(undo_ops[0].previous_id.as_deref(), Some(b.as_str()));

    assert_round_trip(&pre, &store, &plan);
}

/// Scenario B: the only item of a list dragged beside a leaf - wrapper list
/// synthesized, emptied list deleted, undo rebuilds the original list first.
#[test]
fn test_lone_list_item_beside_leaf() {
    let mut store = BlockStore::new();
    let doc = store.create_document();
    let l1 = list(&mut store, &doc, ListSubtype::Unordered, None);
    let i1 = item(&mut store, &l1, ListSubtype::Unordered, "item", None);
    let a = leaf(&mut store, &doc, "A", Some(&l1));

    let pre = store.clone();
    let session = DragSession::new(vec![i1.clone()], a.clone(), DropPlacement::After);
    let plan = RestructurePlanner::plan(&mut store, &session).unwrap();

    // 1. A wrapper list now sits after A, holding the item
    assert_eq!(store.children(&doc).len(), 2);
    let l2 = store.children(&doc)[1].clone();
    assert_ne!(l2, l1, "a fresh wrapper list was synthesized");
    assert_eq!(
        store.get(&l2).unwrap().list_subtype(),
        Some(ListSubtype::Unordered)
    );
    assert_eq!(store.children(&l2), &[i1.clone()]);

    // 2. The emptied original list is gone
    assert!(!store.contains(&l1));

    // 3. Do log: synthesize wrapper, move item, delete emptied list
    let actions: Vec<OpAction> = plan.do_ops.iter().map(|o| o.action).collect();
    assert_eq!(
        actions,
        vec![OpAction::Insert, OpAction::Move, OpAction::Delete]
    );
    assert_eq!(plan.do_ops[0].id, l2);
    assert_eq!(plan.do_ops[1].id, i1);
    assert_eq!(plan.do_ops[2].id, l1);

    // 4. Undo log: reinsert the original list, restore the item into it,
    //    then delete the wrapper
    let undo_ops = plan.undo_ops.as_ref().unwrap();
    let undo_actions: Vec<OpAction> = undo_ops.iter().map(|o| o.action).collect();
    assert_eq!(
        undo_actions,
        vec![OpAction::Insert, OpAction::Move, OpAction::Delete]
    );
    assert_eq!(undo_ops[0].id, l1);
    assert_eq!(undo_ops[1].id, i1);
    assert_eq!(undo_ops[2].id, l2);

    assert_round_trip(&pre, &store, &plan);
}

/// Scenario C: nest-right of a top-level leaf - a row super-block replaces
/// the target with children [target, source].
#[test]
fn test_nest_right_creates_row_super_block() {
    let mut store = BlockStore::new();
    let doc = store.create_document();
    let d = leaf(&mut store, &doc, "D", None);
    let c = leaf(&mut store, &doc, "C", Some(&d));

    let pre = store.clone();
    let session = DragSession::new(vec![c.clone()], d.clone(), DropPlacement::NestRight);
    let plan = RestructurePlanner::plan(&mut store, &session).unwrap();

    // The super-block took D's position and owns [D, C]
    assert_eq!(store.children(&doc).len(), 1);
    let sb = store.children(&doc)[0].clone();
    assert_eq!(
        store.get(&sb).unwrap().kind,
        BlockKind::SuperBlock {
            layout: SuperBlockLayout::Row
        }
    );
    assert_eq!(store.children(&sb), &[d.clone(), c.clone()]);

    // First op synthesizes the super-block, undo ends by deleting it
    assert_eq!(plan.do_ops[0].action, OpAction::Insert);
    assert_eq!(plan.do_ops[0].id, sb);
    let undo_ops = plan.undo_ops.as_ref().unwrap();
    assert_eq!(undo_ops.last().unwrap().action, OpAction::Delete);
    assert_eq!(undo_ops.last().unwrap().id, sb);

    assert_round_trip(&pre, &store, &plan);
}

/// Nest-left mirrors scenario C with the sources in front of the target.
#[test]
fn test_nest_left_orders_sources_first() {
    let mut store = BlockStore::new();
    let doc = store.create_document();
    let d = leaf(&mut store, &doc, "D", None);
    let c = leaf(&mut store, &doc, "C", Some(&d));

    let pre = store.clone();
    let session = DragSession::new(vec![c.clone()], d.clone(), DropPlacement::NestLeft);
    let plan = RestructurePlanner::plan(&mut store, &session).unwrap();

    let sb = store.children(&doc)[0].clone();
    assert_eq!(store.children(&sb), &[c.clone(), d.clone()]);

    assert_round_trip(&pre, &store, &plan);
}

/// Scenario D: dragging the second-to-last child out of a super-block
/// collapses it; undo recreates the wrapper and re-nests before restoring.
#[test]
fn test_super_block_collapse_on_departure() {
    let mut store = BlockStore::new();
    let doc = store.create_document();
    let sb_node = BlockNode::new(
        BlockKind::SuperBlock {
            layout: SuperBlockLayout::Row,
        },
        "",
    );
    let sb = sb_node.id.clone();
    store.insert_node(sb_node, &doc, None).unwrap();
    let x = leaf(&mut store, &sb, "X", None);
    let y = leaf(&mut store, &sb, "Y", Some(&x));
    let z = leaf(&mut store, &doc, "Z", Some(&sb));

    let pre = store.clone();
    let session = DragSession::new(vec![y.clone()], z.clone(), DropPlacement::After);
    let plan = RestructurePlanner::plan(&mut store, &session).unwrap();

    // The wrapper is gone and X was promoted to its former position
    assert!(!store.contains(&sb));
    assert_eq!(store.children(&doc), &[x.clone(), z.clone(), y.clone()]);

    // Undo: recreate the super-block and re-nest X before restoring Y
    let undo_ops = plan.undo_ops.as_ref().unwrap();
    assert_eq!(undo_ops[0].action, OpAction::Insert);
    assert_eq!(undo_ops[0].id, sb);
    assert_eq!(undo_ops[1].action, OpAction::Move);
    assert_eq!(undo_ops[1].id, x);
    assert_eq!(undo_ops[2].id, y);

    assert_round_trip(&pre, &store, &plan);
}

/// List items merging into an ordered list renumber both lists' survivors.
#[test]
fn test_ordered_merge_renumbers_both_lists() {
    let mut store = BlockStore::new();
    let doc = store.create_document();
    let l1 = list(&mut store, &doc, ListSubtype::Ordered, None);
    let a1 = item(&mut store, &l1, ListSubtype::Ordered, "a1", None);
    let a2 = item(&mut store, &l1, ListSubtype::Ordered, "a2", Some(&a1));
    let l2 = list(&mut store, &doc, ListSubtype::Ordered, Some(&l1));
    let b1 = item(&mut store, &l2, ListSubtype::Ordered, "b1", None);
    let b2 = item(&mut store, &l2, ListSubtype::Ordered, "b2", Some(&b1));

    // Establish the display indices the lists carry before the drag
    for list_id in [&l1, &l2] {
        blocktree_core::services::normalizer::renumber_list(&mut store, list_id).unwrap();
    }

    let pre = store.clone();
    // Drag b1 between a1 and a2
    let session = DragSession::new(vec![b1.clone()], a1.clone(), DropPlacement::After);
    let plan = RestructurePlanner::plan(&mut store, &session).unwrap();

    assert_eq!(store.children(&l1), &[a1.clone(), b1.clone(), a2.clone()]);
    assert_eq!(store.get(&a1).unwrap().list_index(), Some(1));
    assert_eq!(store.get(&b1).unwrap().list_index(), Some(2));
    assert_eq!(store.get(&a2).unwrap().list_index(), Some(3));
    assert_eq!(store.get(&b2).unwrap().list_index(), Some(1));

    // Update undos are present but never the final undo step
    let undo_ops = plan.undo_ops.as_ref().unwrap();
    assert!(undo_ops.iter().any(|o| o.action == OpAction::Update));
    assert_ne!(undo_ops.last().unwrap().action, OpAction::Update);

    assert_round_trip(&pre, &store, &plan);
}

/// An illegal drop leaves the tree untouched and produces no operations.
#[test]
fn test_rejected_drop_mutates_nothing() {
    let mut store = BlockStore::new();
    let doc = store.create_document();
    let l1 = list(&mut store, &doc, ListSubtype::Unordered, None);
    let i1 = item(&mut store, &l1, ListSubtype::Unordered, "inner", None);

    let pre = store.clone();
    // The list contains the target: self-containment
    let session = DragSession::new(vec![l1.clone()], i1, DropPlacement::After);
    let result = RestructurePlanner::plan(&mut store, &session);

    assert!(result.is_err());
    assert_eq!(store, pre, "rejected drops must not touch the tree");
}
