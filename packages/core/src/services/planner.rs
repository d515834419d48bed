//! Restructure Planner
//!
//! Turns one validated drag gesture into a minimal, reversible sequence of
//! structural edits. The planner mutates the live tree as it goes and records
//! every mutation as a do/undo operation pair in an [`OperationLog`]; the
//! finished log replays deterministically in either direction.
//!
//! # Algorithm shape
//!
//! 1. Determine or synthesize the destination parent (existing container, or
//!    a fresh SuperBlock / wrapper List), recording the creation as an
//!    insert mirrored by a delete.
//! 2. Move the sources under the destination in reverse document order, each
//!    with the same sibling anchor. Every successive insertion lands before
//!    the previous one, so the original relative order is preserved without
//!    index arithmetic.
//! 3. Settle the emptied source container: collapse a one-child SuperBlock,
//!    prune an emptied List (widening the cut via the topmost solo
//!    ancestor), or leave plain containers as they are.
//! 4. Renumber every ordered list whose membership changed. The undo halves
//!    of these updates go to the *front* of the undo log: if renumbering
//!    were the final undo step, a later incremental undo would re-derive
//!    stale numbers.
//! 5. Guard an emptied Document root with a synthesized empty Leaf, spliced
//!    at the head of both logs.
//!
//! Cross-document moves (or gestures that crossed open views) suppress the
//! undo log entirely; the commit is marked non-reversible and other views
//! reconcile through the `NodesRelocated` broadcast.

use crate::models::{BlockKind, ListSubtype, SuperBlockLayout};
use crate::operations::{Operation, OperationLog};
use crate::services::classifier::{self, DragSession, DropPlacement};
use crate::services::error::RestructureError;
use crate::services::normalizer;
use crate::store::{BlockStore, StoreError};
use crate::utils::structure;

/// Output of one planning pass.
///
/// The tree has already been mutated when a plan is returned; the logs exist
/// for the transaction manager (undo/redo) and for subscribed views
/// (replay).
#[derive(Debug, Clone)]
pub struct RestructurePlan {
    /// Operations that reproduce the restructure on a copy of the pre-state
    pub do_ops: Vec<Operation>,
    /// Operations that reverse it; None for non-reversible cross-view moves
    pub undo_ops: Option<Vec<Operation>>,
    /// Node that should receive editing focus after commit
    pub focus_id: String,
    /// The moved source nodes, for cross-view reconciliation
    pub moved_ids: Vec<String>,
    /// True when the move crossed document roots or open views
    pub cross_document: bool,
}

/// Original position of a source node, captured before any mutation.
struct Origin {
    id: String,
    previous: Option<String>,
    parent: String,
}

/// The structural restructure engine.
///
/// Stateless; one [`plan`](RestructurePlanner::plan) call handles one
/// gesture. The caller serializes gestures per store - the planner reads and
/// mutates shared tree state without internal locking.
pub struct RestructurePlanner;

impl RestructurePlanner {
    /// Plan and perform the restructure described by `session`.
    ///
    /// Validates every precondition first; an illegal drop returns an error
    /// with the tree untouched. On success the tree holds the post-state and
    /// the returned plan carries the paired logs.
    ///
    /// # Errors
    ///
    /// [`RestructureError`] for rejected drops; `StoreError` pass-throughs
    /// only on trees that were already malformed.
    pub fn plan(
        store: &mut BlockStore,
        session: &DragSession,
    ) -> Result<RestructurePlan, RestructureError> {
        classifier::validate_drop(store, session)?;

        let origins: Vec<Origin> = session
            .source_ids
            .iter()
            .map(|id| {
                let parent = store
                    .parent_id(id)
                    .map(str::to_string)
                    .ok_or_else(|| StoreError::Detached { id: id.clone() })?;
                Ok(Origin {
                    id: id.clone(),
                    previous: store.previous_sibling(id),
                    parent,
                })
            })
            .collect::<Result<_, StoreError>>()?;

        let source_parent = origins[0].parent.clone();
        let source_doc = store.document_root_of(&source_parent);
        let target_doc = store.document_root_of(&session.target_id);
        let cross_document = !session.same_container || source_doc != target_doc;

        let mut log = OperationLog::new();
        let mut renumber: Vec<String> = Vec::new();

        if session.placement.is_cross_axis() {
            Self::plan_cross_axis(store, session, &origins, &mut log, &mut renumber)?;
        } else {
            Self::plan_same_axis(store, session, &origins, &mut log, &mut renumber)?;
        }

        Self::settle_source_container(store, &source_parent, &mut log, &mut renumber)?;

        // Ordered lists whose membership changed, each renumbered once
        let mut seen: Vec<String> = Vec::new();
        for list_id in renumber {
            if seen.contains(&list_id) || !store.contains(&list_id) {
                continue;
            }
            let (do_updates, undo_updates) = normalizer::renumber_list(store, &list_id)?;
            log.record_renumber(do_updates, undo_updates);
            seen.push(list_id);
        }

        // A cross-document move can drain the source document completely
        if let Some(doc_id) = &source_doc {
            if let Some((insert, delete)) = normalizer::ensure_root_not_empty(store, doc_id)? {
                log.record_root_guard(insert, delete);
            }
        }

        let (do_ops, undo_ops) = log.finish();
        tracing::debug!(
            sources = session.source_ids.len(),
            target = %session.target_id,
            placement = ?session.placement,
            cross_document,
            do_ops = do_ops.len(),
            "planned restructure"
        );
        if cross_document {
            tracing::debug!("cross-document move: transaction downgraded to do-only");
        }

        Ok(RestructurePlan {
            do_ops,
            undo_ops: (!cross_document).then_some(undo_ops),
            focus_id: session.source_ids[0].clone(),
            moved_ids: session.source_ids.clone(),
            cross_document,
        })
    }

    /// Before/after placement: splice the sources beside the target in its
    /// existing parent, synthesizing a wrapper List when list items land in
    /// a non-list context.
    fn plan_same_axis(
        store: &mut BlockStore,
        session: &DragSession,
        origins: &[Origin],
        log: &mut OperationLog,
        renumber: &mut Vec<String>,
    ) -> Result<(), RestructureError> {
        let target_id = &session.target_id;
        let drop_after = matches!(session.placement, DropPlacement::After);
        let target_parent = store
            .parent_id(target_id)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Detached {
                id: target_id.clone(),
            })?;

        // Anchor sibling the spliced content lands after; None means the
        // head of the parent, which is exactly "before the target" when the
        // target is the first child
        let mut anchor = if drop_after {
            Some(target_id.clone())
        } else {
            store.previous_sibling(target_id)
        };
        let mut next_ref = None;
        if !drop_after {
            match &anchor {
                None => next_ref = Some(target_id.clone()),
                // "Before the target" where the selection already ends right
                // in front of it: anchor on the selection's own predecessor,
                // a node that is not about to move
                Some(a) if session.source_ids.contains(a) => {
                    anchor = origins[0].previous.clone();
                }
                Some(_) => {}
            }
        }

        let source_item_subtype = match store.get(&origins[0].id)?.kind {
            BlockKind::ListItem { subtype } => Some(subtype),
            _ => None,
        };
        let target_is_item = store.get(target_id)?.is_list_item();

        let (dest_parent, dest_anchor) = match source_item_subtype {
            // List items merge into the target's own list...
            Some(_) if target_is_item => (target_parent, anchor),
            // ...or get a wrapper List synthesized at the drop position
            Some(subtype) => {
                let list = structure::synthesize_list(subtype);
                let list_id = list.id.clone();
                store.insert_node(list, &target_parent, anchor.as_deref())?;
                let snapshot = store.snapshot(&list_id)?;
                log.record(
                    Operation::insert(snapshot.clone(), anchor, next_ref, target_parent),
                    Operation::delete(snapshot),
                );
                (list_id, None)
            }
            None => (target_parent, anchor),
        };

        Self::move_sources(store, origins, &dest_parent, dest_anchor.as_deref(), log)?;

        if Self::is_ordered_list(store, &dest_parent) {
            renumber.push(dest_parent);
        }
        Ok(())
    }

    /// Nest-left/right placement: a fresh SuperBlock replaces the target in
    /// place and receives the target plus the sources as children.
    fn plan_cross_axis(
        store: &mut BlockStore,
        session: &DragSession,
        origins: &[Origin],
        log: &mut OperationLog,
        renumber: &mut Vec<String>,
    ) -> Result<(), RestructureError> {
        let target_id = session.target_id.clone();
        let nest_left = matches!(session.placement, DropPlacement::NestLeft);
        let target_parent = store
            .parent_id(&target_id)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Detached {
                id: target_id.clone(),
            })?;
        let target_prev = store.previous_sibling(&target_id);
        let next_ref = target_prev.is_none().then(|| target_id.clone());

        let sb = structure::synthesize_super_block(SuperBlockLayout::Row);
        let sb_id = sb.id.clone();
        store.insert_node(sb, &target_parent, target_prev.as_deref())?;
        let sb_snapshot = store.snapshot(&sb_id)?;
        log.record(
            Operation::insert(
                sb_snapshot.clone(),
                target_prev.clone(),
                next_ref,
                target_parent.clone(),
            ),
            Operation::delete(sb_snapshot),
        );

        // Nesting order decides undo order: restores run in reverse record
        // order, and a restore must find its original predecessor already in
        // place. When the first source originally followed the target, the
        // target nests last so it is restored first; otherwise it nests
        // first (covering the mirrored adjacency, target-after-selection).
        let sources_first = origins[0].previous.as_deref() == Some(target_id.as_str());

        if !sources_first {
            store.move_node(&target_id, &sb_id, None)?;
            log.record(
                Operation::move_to(target_id.clone(), None, sb_id.clone()),
                Operation::move_to(
                    target_id.clone(),
                    target_prev.clone(),
                    target_parent.clone(),
                ),
            );
        }

        // Nest-right: sources land after the target; nest-left: before it
        let source_anchor = if sources_first || nest_left {
            None
        } else {
            Some(target_id.clone())
        };

        // The block the target anchors against when it nests last
        let first_kind = store.get(&origins[0].id)?.kind;
        let source_block = if let BlockKind::ListItem { subtype } = first_kind {
            // List items never become direct super-block children; they get
            // a wrapper List nested beside the target instead
            let list = structure::synthesize_list(subtype);
            let list_id = list.id.clone();
            store.insert_node(list, &sb_id, source_anchor.as_deref())?;
            let snapshot = store.snapshot(&list_id)?;
            log.record(
                Operation::insert(snapshot.clone(), source_anchor, None, sb_id.clone()),
                Operation::delete(snapshot),
            );
            Self::move_sources(store, origins, &list_id, None, log)?;
            renumber.push(list_id.clone());
            list_id
        } else {
            Self::move_sources(store, origins, &sb_id, source_anchor.as_deref(), log)?;
            origins[origins.len() - 1].id.clone()
        };

        if sources_first {
            let target_anchor = nest_left.then_some(source_block);
            store.move_node(&target_id, &sb_id, target_anchor.as_deref())?;
            log.record(
                Operation::move_to(target_id.clone(), target_anchor, sb_id),
                Operation::move_to(target_id, target_prev, target_parent),
            );
        }
        Ok(())
    }

    /// Move every source under `dest_parent` after `anchor`, in reverse
    /// document order, recording each move with its restore mirror.
    fn move_sources(
        store: &mut BlockStore,
        origins: &[Origin],
        dest_parent: &str,
        anchor: Option<&str>,
        log: &mut OperationLog,
    ) -> Result<(), RestructureError> {
        for origin in origins.iter().rev() {
            store.move_node(&origin.id, dest_parent, anchor)?;
            log.record(
                Operation::move_to(
                    origin.id.clone(),
                    anchor.map(str::to_string),
                    dest_parent.to_string(),
                ),
                Operation::move_to(
                    origin.id.clone(),
                    origin.previous.clone(),
                    origin.parent.clone(),
                ),
            );
        }
        Ok(())
    }

    /// Inspect the container the sources left behind and restore its
    /// invariants: collapse, prune, or leave alone.
    fn settle_source_container(
        store: &mut BlockStore,
        source_parent: &str,
        log: &mut OperationLog,
        renumber: &mut Vec<String>,
    ) -> Result<(), RestructureError> {
        let parent = store.get(source_parent)?;
        let parent_kind = parent.kind;
        let remaining = parent.children.len();

        match (parent_kind, remaining) {
            (BlockKind::SuperBlock { .. }, 1) => {
                let (do_frag, undo_frag) = structure::collapse_super_block(store, source_parent)?;
                log.record_fragment(do_frag, undo_frag);
            }
            (BlockKind::List { .. } | BlockKind::SuperBlock { .. }, 0) => {
                Self::prune_emptied_container(store, source_parent, log, renumber)?;
            }
            // An emptied Document root is handled by the root guard; plain
            // containers keep their shape
            _ => {}
        }

        if store.contains(source_parent) && Self::is_ordered_list(store, source_parent) {
            renumber.push(source_parent.to_string());
        }
        Ok(())
    }

    /// Delete an emptied container, widening the cut to the topmost ancestor
    /// the removal leaves childless, then re-check the surroundings.
    fn prune_emptied_container(
        store: &mut BlockStore,
        container_id: &str,
        log: &mut OperationLog,
        renumber: &mut Vec<String>,
    ) -> Result<(), RestructureError> {
        let doomed = structure::find_topmost_solo_ancestor(store, container_id)
            .unwrap_or_else(|| container_id.to_string());
        let doomed_prev = store.previous_sibling(&doomed);
        let doomed_next = if doomed_prev.is_none() {
            store.next_sibling(&doomed)
        } else {
            None
        };
        let doomed_parent = store
            .parent_id(&doomed)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Detached { id: doomed.clone() })?;

        let snapshot = store.remove_subtree(&doomed)?;
        log.record(
            Operation::delete(snapshot.clone()),
            Operation::insert(snapshot, doomed_prev, doomed_next, doomed_parent.clone()),
        );

        // The cut can leave a super-block degenerate or shift an ordered
        // list's membership
        let former_parent = store.get(&doomed_parent)?;
        if former_parent.is_super_block() && former_parent.children.len() == 1 {
            let (do_frag, undo_frag) = structure::collapse_super_block(store, &doomed_parent)?;
            log.record_fragment(do_frag, undo_frag);
        } else if Self::is_ordered_list(store, &doomed_parent) {
            renumber.push(doomed_parent);
        }
        Ok(())
    }

    fn is_ordered_list(store: &BlockStore, id: &str) -> bool {
        store.node(id).is_some_and(|n| {
            matches!(
                n.kind,
                BlockKind::List {
                    subtype: ListSubtype::Ordered
                }
            )
        })
    }
}
