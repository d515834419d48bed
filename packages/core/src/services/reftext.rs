//! Reference Text Service
//!
//! Display text for node references: given a node id, produce the plain-text
//! form of its first contentful block, or the query payload of an embedded
//! query. Consumed by drop handlers that build reference insertions, and by
//! anything rendering a compact preview of a node.
//!
//! Also extracts `blocktree://` references from markdown content, in both
//! link form (`[label](blocktree://<id>)`) and bare-URI form.

use std::collections::HashSet;
use std::sync::OnceLock;

use pulldown_cmark::{Event, Parser};
use regex::Regex;

use crate::models::BlockKind;
use crate::store::{BlockStore, StoreError};

/// What a reference to a node resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefPayload {
    /// Plain display text
    Text(String),
    /// Query string of an embedded-query container
    Query(String),
}

/// Resolve the reference payload for a node.
///
/// Embedded queries yield their query string; every other kind yields the
/// stripped text of its first contentful descendant (empty string when the
/// subtree holds no text at all).
pub fn ref_payload(store: &BlockStore, id: &str) -> Result<RefPayload, StoreError> {
    let node = store.get(id)?;
    if matches!(node.kind, BlockKind::QueryEmbed) {
        let query = node
            .properties
            .get("query")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        return Ok(RefPayload::Query(query.to_string()));
    }
    Ok(RefPayload::Text(display_text(store, id)?))
}

/// Plain display text of a node: its own content, or the first contentful
/// descendant's when the node is a pure container.
pub fn display_text(store: &BlockStore, id: &str) -> Result<String, StoreError> {
    let node = store.get(id)?;
    if !node.content.is_empty() {
        return Ok(plain_text(&node.content));
    }
    for child in &node.children {
        let text = display_text(store, child)?;
        if !text.is_empty() {
            return Ok(text);
        }
    }
    Ok(String::new())
}

/// Strip markdown formatting down to plain text.
///
/// Walks the pulldown-cmark event stream instead of pattern-replacing, so
/// nested emphasis, links and code spans all reduce correctly.
pub fn plain_text(markdown: &str) -> String {
    let mut out = String::new();
    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Matches `blocktree://<uuid>` in link targets or bare in text
const REF_PATTERN: &str =
    r"blocktree://([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})";

/// Extract the ids of all `blocktree://` references in `content`.
///
/// Duplicates are removed; order follows first occurrence.
pub fn extract_refs(content: &str) -> Vec<String> {
    static REF_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = REF_REGEX.get_or_init(|| Regex::new(REF_PATTERN).expect("valid ref pattern"));

    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for cap in regex.captures_iter(content) {
        if let Some(id) = cap.get(1) {
            let id = id.as_str().to_lowercase();
            if seen.insert(id.clone()) {
                refs.push(id);
            }
        }
    }
    refs
}
