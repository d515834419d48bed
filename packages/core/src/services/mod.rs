//! Business Services
//!
//! This module contains the restructure engine's services:
//!
//! - `RestructurePlanner` - turns drag gestures into paired operation logs
//! - `classifier` - drop classification and precondition validation
//! - `normalizer` - ordered-list renumbering and the empty-root guard
//! - `TransactionManager` - commit facility with undo/redo and broadcast
//! - `reftext` - display text / query payload for node references
//!
//! Services coordinate between the block store and callers, implementing the
//! restructure rules and orchestrating multi-step edits.

pub mod classifier;
pub mod error;
pub mod normalizer;
pub mod planner;
pub mod reftext;
pub mod transaction;

pub use classifier::{validate_drop, DragSession, DropPlacement};
pub use error::RestructureError;
pub use planner::{RestructurePlan, RestructurePlanner};
pub use reftext::RefPayload;
pub use transaction::{TransactionError, TransactionManager, TransactionRecord};
