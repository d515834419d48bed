//! Data Models
//!
//! This module contains the core data structures used throughout BlockTree:
//!
//! - `BlockNode` - typed node in the block document tree
//! - `BlockKind` / `ListSubtype` / `SuperBlockLayout` - node discriminators
//!
//! Kind-specific display state (ordered-list indices, task check marks) uses
//! the Pure JSON approach: it lives in the `properties` field of the node.

mod node;

pub use node::{BlockKind, BlockNode, ListSubtype, SuperBlockLayout, ValidationError};
