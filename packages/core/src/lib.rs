//! BlockTree Core Restructure Engine
//!
//! This crate turns drag-and-drop gestures on a block-based document tree
//! into minimal, reversible sequences of structural edits: paired do/undo
//! operation logs whose replay deterministically reconstructs tree states.
//!
//! # Architecture
//!
//! - **Arena tree model**: documents live in an id-keyed [`store::BlockStore`],
//!   fully separate from any presentation layer; renderers subscribe to
//!   committed operations instead of being mutated as a side channel
//! - **Synchronous planning**: one gesture, one planning pass, no I/O; the
//!   caller serializes restructures per store
//! - **Transactional edits**: every restructure commits as a do/undo pair;
//!   cross-document moves downgrade to do-only
//!
//! # Modules
//!
//! - [`models`] - block node data structures
//! - [`operations`] - operation records and the do/undo log emitter
//! - [`store`] - the in-memory arena and operation replay
//! - [`services`] - planner, classifier, normalizer, transactions, reference text
//! - [`utils`] - container synthesis and collapse utilities

pub mod models;
pub mod operations;
pub mod services;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use models::*;
pub use operations::{BlockSubtree, OpAction, Operation, OperationLog};
pub use services::*;
pub use store::{events::DocumentEvent, BlockStore, StoreError};
