//! Document Events
//!
//! Domain events emitted by the transaction manager when a restructure is
//! committed, undone, or redone. They follow the observer pattern: any other
//! live view of a document (a renderer, a second editor pane, a persistence
//! layer) subscribes to the broadcast channel and reconciles itself from the
//! operation payloads, instead of being mutated as a side channel.
//!
//! # Event Flow
//!
//! 1. The planner mutates the tree and produces an operation log
//! 2. `TransactionManager::commit` records the transaction
//! 3. A `DocumentEvent` is emitted via a tokio broadcast channel
//! 4. Subscribers replay or reconcile against the payload
//!
//! The channel is the only asynchronous surface of the crate; senders never
//! block and subscribers may drain with `try_recv` from synchronous code.

use serde::{Deserialize, Serialize};

use crate::operations::Operation;

/// Domain events broadcast after tree state changes.
///
/// `source_client_id` identifies the originating editor so a subscriber can
/// skip events it caused itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DocumentEvent {
    /// A restructure transaction was committed
    #[serde(rename = "transactionCommitted")]
    TransactionCommitted {
        ops: Vec<Operation>,
        /// False for cross-document moves, which cannot be undone
        reversible: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        source_client_id: Option<String>,
    },

    /// A committed transaction was rolled back by replaying its undo log
    #[serde(rename = "transactionReverted")]
    TransactionReverted {
        ops: Vec<Operation>,
        #[serde(skip_serializing_if = "Option::is_none")]
        source_client_id: Option<String>,
    },

    /// An undone transaction was replayed forward again
    #[serde(rename = "transactionReapplied")]
    TransactionReapplied {
        ops: Vec<Operation>,
        #[serde(skip_serializing_if = "Option::is_none")]
        source_client_id: Option<String>,
    },

    /// Nodes moved across document boundaries; other live views holding
    /// copies of these nodes must drop or refresh them
    #[serde(rename = "nodesRelocated")]
    NodesRelocated {
        ids: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        source_client_id: Option<String>,
    },
}

impl DocumentEvent {
    /// Stable string tag for logging and routing
    pub fn event_type(&self) -> &str {
        match self {
            DocumentEvent::TransactionCommitted { .. } => "transaction:committed",
            DocumentEvent::TransactionReverted { .. } => "transaction:reverted",
            DocumentEvent::TransactionReapplied { .. } => "transaction:reapplied",
            DocumentEvent::NodesRelocated { .. } => "nodes:relocated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_tags() {
        let event = DocumentEvent::NodesRelocated {
            ids: vec!["a".into()],
            source_client_id: None,
        };
        assert_eq!(event.event_type(), "nodes:relocated");

        let event = DocumentEvent::TransactionCommitted {
            ops: vec![],
            reversible: true,
            source_client_id: Some("editor-1".into()),
        };
        assert_eq!(event.event_type(), "transaction:committed");
    }

    /// Contract test: events serialize internally tagged so subscribers see
    /// a flat object with a `type` discriminator.
    #[test]
    fn test_event_serialization_contract() {
        let event = DocumentEvent::NodesRelocated {
            ids: vec!["node-1".into(), "node-2".into()],
            source_client_id: Some("editor-2".into()),
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();

        assert_eq!(parsed.get("type").unwrap(), "nodesRelocated");
        assert_eq!(parsed.get("sourceClientId").unwrap(), "editor-2");
        assert_eq!(parsed.get("ids").unwrap().as_array().unwrap().len(), 2);
        assert!(
            parsed.get("nodesRelocated").is_none(),
            "Should NOT be nested under a variant key"
        );
    }
}
