//! In-Memory Block Store
//!
//! Id-keyed arena holding the live document trees. The store is the only
//! place structural links (`parent_id`, `children`) are rewired; the planner
//! and the transaction manager go through its primitives.
//!
//! A store may host several `Document` roots at once (each open document is
//! one root), which is what makes cross-document moves expressible as plain
//! re-parenting.
//!
//! Replay: [`BlockStore::apply`] interprets [`Operation`] records against the
//! current tree, resolving sibling references (`previous_id` / `next_id`) at
//! apply time. No sibling reference means "insert at the beginning" of the
//! destination parent.

pub mod events;

use std::collections::HashMap;

use thiserror::Error;

use crate::models::{BlockKind, BlockNode};
use crate::operations::{BlockSubtree, OpAction, Operation};

/// Errors raised by store primitives and operation replay
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    #[error("Node already exists: {id}")]
    DuplicateNode { id: String },

    #[error("Node {id} has no parent")]
    Detached { id: String },

    #[error("Operation on node {id} is missing its data payload")]
    MissingData { id: String },

    #[error("Operation on node {id} has no resolvable position")]
    UnresolvedPosition { id: String },

    #[error("Container {id} is not collapsible")]
    NotCollapsible { id: String },
}

/// Arena of block nodes hosting one or more document trees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockStore {
    nodes: HashMap<String, BlockNode>,
    /// Document root ids, in creation order
    documents: Vec<String>,
}

impl BlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty Document root and return its id.
    pub fn create_document(&mut self) -> String {
        let doc = BlockNode::new(BlockKind::Document, "");
        let id = doc.id.clone();
        self.nodes.insert(id.clone(), doc);
        self.documents.push(id.clone());
        id
    }

    /// Ids of all Document roots in this store
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&BlockNode> {
        self.nodes.get(id)
    }

    /// Fetch a node, failing with `NodeNotFound` when absent.
    pub fn get(&self, id: &str) -> Result<&BlockNode, StoreError> {
        self.nodes.get(id).ok_or_else(|| StoreError::NodeNotFound {
            id: id.to_string(),
        })
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut BlockNode, StoreError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| StoreError::NodeNotFound {
                id: id.to_string(),
            })
    }

    /// Mutable access for in-crate services (the normalizer rewrites display
    /// state in place before snapshotting it into update operations).
    pub(crate) fn node_mut(&mut self, id: &str) -> Result<&mut BlockNode, StoreError> {
        self.get_mut(id)
    }

    /// Ordered child ids of a node (empty for missing nodes)
    pub fn children(&self, id: &str) -> &[String] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent_id(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).and_then(|n| n.parent_id.as_deref())
    }

    /// Sibling immediately before `id` in its parent's children
    pub fn previous_sibling(&self, id: &str) -> Option<String> {
        let parent = self.parent_id(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p].clone())
    }

    /// Sibling immediately after `id` in its parent's children
    pub fn next_sibling(&self, id: &str) -> Option<String> {
        let parent = self.parent_id(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|c| c == id)?;
        siblings.get(pos + 1).cloned()
    }

    /// Walk ancestors of `id`, nearest first (excludes `id` itself)
    pub fn ancestors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a BlockNode> {
        let mut current = self.parent_id(id).map(str::to_string);
        std::iter::from_fn(move || {
            let node = self.nodes.get(current.as_deref()?)?;
            current = node.parent_id.clone();
            Some(node)
        })
    }

    /// True when `id` lives strictly inside the subtree rooted at `root`
    pub fn is_descendant(&self, root: &str, id: &str) -> bool {
        self.ancestors(id).any(|a| a.id == root)
    }

    /// The Document root owning `id` (the node itself if it is a Document)
    pub fn document_root_of(&self, id: &str) -> Option<String> {
        let node = self.nodes.get(id)?;
        if node.is_document() {
            return Some(node.id.clone());
        }
        self.ancestors(id)
            .find(|a| a.is_document())
            .map(|a| a.id.clone())
    }

    /// True when a strict ancestor of `id` is an embedded-query container
    pub fn is_inside_query_embed(&self, id: &str) -> bool {
        self.ancestors(id)
            .any(|a| matches!(a.kind, BlockKind::QueryEmbed))
    }

    /// Total number of nodes in the arena
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add a detached node as a child of `parent_id`, after the sibling
    /// `after` (or at the beginning when `after` is None).
    pub fn insert_node(
        &mut self,
        node: BlockNode,
        parent_id: &str,
        after: Option<&str>,
    ) -> Result<(), StoreError> {
        if self.contains(&node.id) {
            return Err(StoreError::DuplicateNode {
                id: node.id.clone(),
            });
        }
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        if let Err(e) = self.attach(&id, parent_id, after) {
            self.nodes.remove(&id);
            return Err(e);
        }
        Ok(())
    }

    /// Wire an existing, detached node under `parent_id` after `after`.
    pub fn attach(
        &mut self,
        id: &str,
        parent_id: &str,
        after: Option<&str>,
    ) -> Result<(), StoreError> {
        if !self.contains(id) {
            return Err(StoreError::NodeNotFound { id: id.to_string() });
        }
        let position = {
            let parent = self.get(parent_id)?;
            match after {
                Some(after_id) => {
                    parent
                        .children
                        .iter()
                        .position(|c| c == after_id)
                        .ok_or_else(|| StoreError::UnresolvedPosition { id: id.to_string() })?
                        + 1
                }
                None => 0,
            }
        };
        let parent_id = parent_id.to_string();
        self.get_mut(&parent_id)?
            .children
            .insert(position, id.to_string());
        self.get_mut(id)?.parent_id = Some(parent_id);
        Ok(())
    }

    /// Unwire a node from its parent, leaving it detached in the arena.
    pub fn detach(&mut self, id: &str) -> Result<(), StoreError> {
        let parent_id = self
            .parent_id(id)
            .map(str::to_string)
            .ok_or_else(|| StoreError::Detached { id: id.to_string() })?;
        let parent = self.get_mut(&parent_id)?;
        parent.children.retain(|c| c != id);
        self.get_mut(id)?.parent_id = None;
        Ok(())
    }

    /// Re-parent a node: detach then attach at the new position.
    ///
    /// `after = None` means insert at the beginning of the new parent's
    /// children.
    pub fn move_node(
        &mut self,
        id: &str,
        parent_id: &str,
        after: Option<&str>,
    ) -> Result<(), StoreError> {
        self.detach(id)?;
        self.attach(id, parent_id, after)
    }

    /// Recursive snapshot of the subtree rooted at `id`.
    pub fn snapshot(&self, id: &str) -> Result<BlockSubtree, StoreError> {
        let node = self.get(id)?.clone();
        let children = node
            .children
            .iter()
            .map(|c| self.snapshot(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BlockSubtree { node, children })
    }

    /// Single-node snapshot (children not captured), used for update mirrors.
    pub fn snapshot_node(&self, id: &str) -> Result<BlockNode, StoreError> {
        Ok(self.get(id)?.clone())
    }

    /// Materialize a snapshot under `parent_id` after `after`.
    pub fn insert_subtree(
        &mut self,
        subtree: BlockSubtree,
        parent_id: &str,
        after: Option<&str>,
    ) -> Result<(), StoreError> {
        let BlockSubtree { mut node, children } = subtree;
        if self.contains(&node.id) {
            return Err(StoreError::DuplicateNode {
                id: node.id.clone(),
            });
        }
        let id = node.id.clone();
        // Structural links are rebuilt from the snapshot's nesting
        node.children.clear();
        node.parent_id = None;
        self.nodes.insert(id.clone(), node);
        if let Err(e) = self.attach(&id, parent_id, after) {
            self.nodes.remove(&id);
            return Err(e);
        }

        let mut previous: Option<String> = None;
        for child in children {
            let child_id = child.node.id.clone();
            self.insert_subtree(child, &id, previous.as_deref())?;
            previous = Some(child_id);
        }
        Ok(())
    }

    /// Remove the subtree rooted at `id`, returning its snapshot.
    pub fn remove_subtree(&mut self, id: &str) -> Result<BlockSubtree, StoreError> {
        let snapshot = self.snapshot(id)?;
        self.detach(id)?;
        self.drop_subtree(id);
        Ok(snapshot)
    }

    fn drop_subtree(&mut self, id: &str) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.drop_subtree(&child);
            }
        }
    }

    /// Resolve an operation's sibling references against the current tree.
    ///
    /// `previous_id` wins; `next_id` is the fallback when the position had no
    /// previous sibling; `parent_id` alone means the beginning of that parent.
    fn resolve_position(&self, op: &Operation) -> Result<(String, Option<String>), StoreError> {
        if let Some(prev) = op.previous_id.as_deref() {
            if self.contains(prev) {
                let parent = self
                    .parent_id(prev)
                    .ok_or_else(|| StoreError::Detached {
                        id: prev.to_string(),
                    })?
                    .to_string();
                return Ok((parent, Some(prev.to_string())));
            }
        }
        if let Some(next) = op.next_id.as_deref() {
            if self.contains(next) {
                let parent = self
                    .parent_id(next)
                    .ok_or_else(|| StoreError::Detached {
                        id: next.to_string(),
                    })?
                    .to_string();
                return Ok((parent, self.previous_sibling(next)));
            }
        }
        if let Some(parent) = op.parent_id.as_deref() {
            if self.contains(parent) {
                return Ok((parent.to_string(), None));
            }
        }
        Err(StoreError::UnresolvedPosition { id: op.id.clone() })
    }

    /// Replay a single operation against the current tree.
    pub fn apply(&mut self, op: &Operation) -> Result<(), StoreError> {
        match op.action {
            OpAction::Insert => {
                let data = op.data.clone().ok_or_else(|| StoreError::MissingData {
                    id: op.id.clone(),
                })?;
                let (parent, after) = self.resolve_position(op)?;
                self.insert_subtree(data, &parent, after.as_deref())
            }
            OpAction::Move => {
                let (parent, after) = self.resolve_position(op)?;
                self.move_node(&op.id, &parent, after.as_deref())
            }
            OpAction::Delete => {
                self.remove_subtree(&op.id)?;
                Ok(())
            }
            OpAction::Update => {
                let data = op.data.as_ref().ok_or_else(|| StoreError::MissingData {
                    id: op.id.clone(),
                })?;
                let node = self.get_mut(&op.id)?;
                node.content = data.node.content.clone();
                node.properties = data.node.properties.clone();
                // Snapshot-faithful replay: the recorded timestamp travels
                // with the snapshot so do/undo replays converge exactly.
                node.modified_at = data.node.modified_at;
                Ok(())
            }
        }
    }

    /// Replay a whole log in order.
    pub fn apply_all(&mut self, ops: &[Operation]) -> Result<(), StoreError> {
        tracing::debug!(op_count = ops.len(), "replaying operation log");
        for op in ops {
            self.apply(op)?;
        }
        Ok(())
    }
}
