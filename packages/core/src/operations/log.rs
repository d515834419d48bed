//! Operation Log Emitter
//!
//! Accumulates do/undo operation pairs during a planning pass and produces
//! the two final ordered sequences handed to the transaction manager.
//!
//! The do log is emitted in the order the planner mutated the live tree, so
//! replaying it against a copy of the pre-state is always safe. The undo log
//! is assembled from three segments:
//!
//! 1. the root-guard deletion (head of the sequence),
//! 2. normalizer update snapshots (front segment - renumbering must never be
//!    the final undo step, see `RestructurePlanner`),
//! 3. per-operation mirrors, recorded in do-order and reversed wholesale.
//!
//! The wholesale reversal is what makes structural mirrors compose: the
//! mirror of "delete the emptied wrapper" must re-insert the wrapper before
//! the mirrors of the moves that re-populate it, and recording mirrors
//! pairwise in do-order puts them there after one reversal.

use super::Operation;

/// Accumulator for the paired do/undo logs of one planning pass.
#[derive(Debug, Default)]
pub struct OperationLog {
    do_ops: Vec<Operation>,
    /// Mirrors of `do_ops`, same order; reversed wholesale in [`finish`]
    undo_mirrors: Vec<Operation>,
    /// Normalizer update undos; stay in front of the reversed mirrors
    undo_updates: Vec<Operation>,
    /// Root-guard deletion; head of the final undo sequence
    undo_head: Vec<Operation>,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one do operation together with its mirror.
    pub fn record(&mut self, do_op: Operation, undo_op: Operation) {
        self.do_ops.push(do_op);
        self.undo_mirrors.push(undo_op);
    }

    /// Splice a pre-built fragment whose undo half is already in final
    /// (apply) order, e.g. the super-block collapse pair.
    pub fn record_fragment<const N: usize>(
        &mut self,
        do_ops: [Operation; N],
        undo_in_apply_order: [Operation; N],
    ) {
        self.do_ops.extend(do_ops);
        // Stored as mirrors, so the wholesale reversal in finish() restores
        // the fragment's apply order at the right spot.
        self.undo_mirrors.extend(undo_in_apply_order.into_iter().rev());
    }

    /// Append renumbering updates: do-direction forward, undo snapshots into
    /// the front segment (never appended to the undo tail).
    pub fn record_renumber(&mut self, do_updates: Vec<Operation>, undo_updates: Vec<Operation>) {
        self.do_ops.extend(do_updates);
        self.undo_updates.extend(undo_updates);
    }

    /// Splice the empty-root guard: the synthesized leaf insertion lands at
    /// the head of the do log, its deletion at the head of the undo log.
    pub fn record_root_guard(&mut self, insert: Operation, delete: Operation) {
        self.do_ops.insert(0, insert);
        self.undo_head.insert(0, delete);
    }

    /// True when no operation has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.do_ops.is_empty()
    }

    /// Assemble the final `(do_ops, undo_ops)` sequences.
    pub fn finish(self) -> (Vec<Operation>, Vec<Operation>) {
        let OperationLog {
            do_ops,
            mut undo_mirrors,
            undo_updates,
            undo_head,
        } = self;

        undo_mirrors.reverse();

        let mut undo_ops = undo_head;
        undo_ops.extend(undo_updates);
        undo_ops.extend(undo_mirrors);

        (do_ops, undo_ops)
    }
}
