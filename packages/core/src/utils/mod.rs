//! Shared Utilities
//!
//! Document-structure helpers used by the planner and the normalizer.

pub mod structure;

pub use structure::{
    collapse_super_block, find_topmost_solo_ancestor, synthesize_empty_leaf, synthesize_list,
    synthesize_super_block,
};
