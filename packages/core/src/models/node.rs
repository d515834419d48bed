//! Block Node Data Structures
//!
//! This module defines the core `BlockNode` struct and related types for
//! BlockTree's document model.
//!
//! # Architecture
//!
//! - **Typed kinds**: a node is a Document root, a content Leaf, a List or
//!   ListItem (ordered/unordered/task), a SuperBlock layout container, or a
//!   QueryEmbed
//! - **Arena ownership**: nodes reference their parent and children by stable
//!   id; the owning arena is [`crate::store::BlockStore`], never a rendered
//!   UI tree
//! - **Properties bag**: kind-specific display state (ordered-list index,
//!   task check state) lives in the `properties` JSON object
//!
//! # Examples
//!
//! ```rust
//! use blocktree_core::models::{BlockKind, BlockNode, ListSubtype};
//!
//! // A plain content leaf
//! let leaf = BlockNode::new(BlockKind::Leaf, "Hello world");
//! assert!(leaf.validate().is_ok());
//!
//! // An ordered list item carrying its 1-based display index
//! let mut item = BlockNode::new(
//!     BlockKind::ListItem { subtype: ListSubtype::Ordered },
//!     "First step",
//! );
//! item.set_list_index(1);
//! assert_eq!(item.list_index(), Some(1));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for BlockNode structure
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("Invalid child reference: {0}")]
    InvalidChild(String),

    #[error("Properties validation failed: {0}")]
    InvalidProperties(String),
}

/// List flavor shared by a List container and the ListItems it owns.
///
/// A ListItem's subtype must always match its owning List's subtype; the
/// planner synthesizes wrapper Lists rather than ever violating this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListSubtype {
    /// Numbered list; children carry a 1-based display index in `properties`
    Ordered,
    /// Bulleted list
    Unordered,
    /// Checkbox list; children carry a check state in `properties`
    Task,
}

/// Layout direction of a SuperBlock container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SuperBlockLayout {
    /// Children are laid out side by side
    Row,
    /// Children are stacked
    Col,
}

/// Discriminated node kind.
///
/// Serialized internally tagged (`{"type": "listItem", "subtype": "ordered"}`)
/// so consumers see a flat object rather than a nested variant key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BlockKind {
    /// A document root; a store may host several open documents
    Document,
    /// Plain content block (paragraph, heading, code, ...)
    Leaf,
    /// List container; owns ListItems of the matching subtype
    List { subtype: ListSubtype },
    /// List member; parent must be a List of the matching subtype
    ListItem { subtype: ListSubtype },
    /// Structural grouping of two or more children, laid out per `layout`
    SuperBlock { layout: SuperBlockLayout },
    /// Embedded query result container; its contents are not restructurable
    QueryEmbed,
}

impl BlockKind {
    /// Subtype of a List or ListItem, None for other kinds
    pub fn list_subtype(&self) -> Option<ListSubtype> {
        match self {
            BlockKind::List { subtype } | BlockKind::ListItem { subtype } => Some(*subtype),
            _ => None,
        }
    }

    /// True for kinds that exist to hold children rather than content
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            BlockKind::Document
                | BlockKind::List { .. }
                | BlockKind::ListItem { .. }
                | BlockKind::SuperBlock { .. }
                | BlockKind::QueryEmbed
        )
    }
}

/// A node in the block document tree.
///
/// # Fields
///
/// - `id`: stable unique identifier (UUID v4 string), immutable once created
/// - `kind`: discriminated block kind, see [`BlockKind`]
/// - `content`: primary markdown content (empty for pure containers)
/// - `parent_id`: back-reference to the owning parent (None for Document roots)
/// - `children`: ordered child ids; order is document order
/// - `created_at` / `modified_at`: timestamps
/// - `properties`: JSON object for kind-specific display state
///
/// Structural links (`parent_id`, `children`) are maintained by
/// [`crate::store::BlockStore`]; code outside the store and the planner never
/// rewires them directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockNode {
    /// Unique identifier (UUID v4 string)
    pub id: String,

    /// Discriminated node kind
    pub kind: BlockKind,

    /// Primary markdown content of the node
    pub content: String,

    /// Parent node id (None means this node is a Document root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Ordered child ids (document order)
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub modified_at: DateTime<Utc>,

    /// Kind-specific display state (Pure JSON bag)
    pub properties: serde_json::Value,
}

impl BlockNode {
    /// Create a new node with an auto-generated UUID and empty properties.
    ///
    /// The node starts detached: `parent_id` is None and `children` is empty.
    /// Attachment happens through [`crate::store::BlockStore`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use blocktree_core::models::{BlockKind, BlockNode, SuperBlockLayout};
    ///
    /// let sb = BlockNode::new(
    ///     BlockKind::SuperBlock { layout: SuperBlockLayout::Row },
    ///     "",
    /// );
    /// assert!(sb.kind.is_container());
    /// ```
    pub fn new(kind: BlockKind, content: impl Into<String>) -> Self {
        Self::new_with_id(Uuid::new_v4().to_string(), kind, content)
    }

    /// Create a new node with an explicit id.
    ///
    /// Used when replaying an `insert` operation whose snapshot carries the
    /// original id, and by tests that want deterministic ids.
    pub fn new_with_id(id: impl Into<String>, kind: BlockKind, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind,
            content: content.into(),
            parent_id: None,
            children: Vec::new(),
            created_at: now,
            modified_at: now,
            properties: json!({}),
        }
    }

    /// Subtype of this node if it is a List or ListItem
    pub fn list_subtype(&self) -> Option<ListSubtype> {
        self.kind.list_subtype()
    }

    /// True if this node is a ListItem of any subtype
    pub fn is_list_item(&self) -> bool {
        matches!(self.kind, BlockKind::ListItem { .. })
    }

    /// True if this node is a List of any subtype
    pub fn is_list(&self) -> bool {
        matches!(self.kind, BlockKind::List { .. })
    }

    /// True if this node is a SuperBlock
    pub fn is_super_block(&self) -> bool {
        matches!(self.kind, BlockKind::SuperBlock { .. })
    }

    /// True if this node is a Document root
    pub fn is_document(&self) -> bool {
        matches!(self.kind, BlockKind::Document)
    }

    /// 1-based display index of an ordered ListItem, if one has been assigned.
    ///
    /// The index is recomputed by the container normalizer after structural
    /// change, never hand-maintained.
    pub fn list_index(&self) -> Option<i64> {
        self.properties.get("index").and_then(|v| v.as_i64())
    }

    /// Assign the 1-based display index and bump `modified_at`.
    pub fn set_list_index(&mut self, index: i64) {
        self.properties["index"] = json!(index);
        self.modified_at = Utc::now();
    }

    /// Check state of a task ListItem (None when never set)
    pub fn task_checked(&self) -> Option<bool> {
        self.properties.get("checked").and_then(|v| v.as_bool())
    }

    /// Set the check state of a task ListItem and bump `modified_at`.
    pub fn set_task_checked(&mut self, checked: bool) {
        self.properties["checked"] = json!(checked);
        self.modified_at = Utc::now();
    }

    /// Validate node structure and required fields.
    ///
    /// Content is allowed to be empty: containers have no content of their
    /// own, and blank leaves are valid during editing.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `id` is empty
    /// - `properties` is not a JSON object
    /// - the node references itself as parent or child
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if !self.properties.is_object() {
            return Err(ValidationError::InvalidProperties(
                "properties must be a JSON object".to_string(),
            ));
        }

        if let Some(parent_id) = &self.parent_id {
            if parent_id == &self.id {
                return Err(ValidationError::InvalidParent(
                    "node cannot be its own parent".to_string(),
                ));
            }
        }

        if self.children.iter().any(|c| c == &self.id) {
            return Err(ValidationError::InvalidChild(
                "node cannot be its own child".to_string(),
            ));
        }

        Ok(())
    }
}
