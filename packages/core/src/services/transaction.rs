//! Transaction Commit Facility
//!
//! Records committed restructure plans, maintains the undo/redo stacks, and
//! broadcasts [`DocumentEvent`]s to subscribed views.
//!
//! The planner has already mutated the live tree when a plan reaches
//! [`TransactionManager::commit`]; commit therefore records and broadcasts
//! but does not re-apply. Undo and redo, by contrast, *do* replay their logs
//! through [`BlockStore::apply`], because they run long after the planning
//! pass against whatever the current state is.
//!
//! A plan without an undo log (cross-document move) commits non-reversibly:
//! it never reaches the undo stack, and subscribers are told which nodes
//! relocated so other live views can reconcile their copies.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::operations::Operation;
use crate::services::planner::RestructurePlan;
use crate::store::events::DocumentEvent;
use crate::store::{BlockStore, StoreError};

/// Broadcast buffer size; slow subscribers see `Lagged` past this depth
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Errors from undo/redo replay
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Replay failed: {0}")]
    Replay(#[from] StoreError),
}

/// One committed, reversible restructure.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub do_ops: Vec<Operation>,
    pub undo_ops: Vec<Operation>,
    pub committed_at: DateTime<Utc>,
}

/// Commit facility with undo/redo stacks and event broadcast.
pub struct TransactionManager {
    undo_stack: Vec<TransactionRecord>,
    redo_stack: Vec<TransactionRecord>,
    event_tx: broadcast::Sender<DocumentEvent>,
    client_id: Option<String>,
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionManager {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            event_tx,
            client_id: None,
        }
    }

    /// Tag outgoing events with an originating client id so subscribers can
    /// skip events they caused themselves.
    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Subscribe to committed/reverted/reapplied transactions.
    ///
    /// Synchronous subscribers can drain with `try_recv`; no runtime is
    /// required on the sending side.
    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.event_tx.subscribe()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Record a committed plan and broadcast it.
    ///
    /// Reversible plans land on the undo stack and clear the redo stack.
    /// Non-reversible plans (no undo log) are broadcast only, together with
    /// a `NodesRelocated` notice for other live views.
    pub fn commit(&mut self, plan: RestructurePlan) {
        let reversible = plan.undo_ops.is_some();
        self.emit(DocumentEvent::TransactionCommitted {
            ops: plan.do_ops.clone(),
            reversible,
            source_client_id: self.client_id.clone(),
        });

        match plan.undo_ops {
            Some(undo_ops) => {
                self.undo_stack.push(TransactionRecord {
                    do_ops: plan.do_ops,
                    undo_ops,
                    committed_at: Utc::now(),
                });
                self.redo_stack.clear();
            }
            None => {
                tracing::debug!("non-reversible transaction: skipping undo stack");
            }
        }

        if plan.cross_document {
            self.emit(DocumentEvent::NodesRelocated {
                ids: plan.moved_ids,
                source_client_id: self.client_id.clone(),
            });
        }
    }

    /// Roll back the most recent reversible transaction.
    pub fn undo(&mut self, store: &mut BlockStore) -> Result<(), TransactionError> {
        let record = self.undo_stack.pop().ok_or(TransactionError::NothingToUndo)?;
        store.apply_all(&record.undo_ops)?;
        self.emit(DocumentEvent::TransactionReverted {
            ops: record.undo_ops.clone(),
            source_client_id: self.client_id.clone(),
        });
        self.redo_stack.push(record);
        Ok(())
    }

    /// Replay the most recently undone transaction forward again.
    pub fn redo(&mut self, store: &mut BlockStore) -> Result<(), TransactionError> {
        let record = self.redo_stack.pop().ok_or(TransactionError::NothingToRedo)?;
        store.apply_all(&record.do_ops)?;
        self.emit(DocumentEvent::TransactionReapplied {
            ops: record.do_ops.clone(),
            source_client_id: self.client_id.clone(),
        });
        self.undo_stack.push(record);
        Ok(())
    }

    fn emit(&self, event: DocumentEvent) {
        tracing::debug!(event_type = event.event_type(), "emitting document event");
        // A send error just means nobody is subscribed right now
        let _ = self.event_tx.send(event);
    }
}
