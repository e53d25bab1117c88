//! Component marker discovery.
//!
//! Walks sibling lists with an explicit [`Cursor`]. When an open marker
//! carries a `prerenderId`, the search for its end marker continues from the
//! same cursor, and the walk resumes right after the end marker: prerendered
//! content between the two is never scanned.
//!
//! # Example
//!
//! ```ignore
//! let mut ids = DescriptorIds::new();
//! let roots = discover_components(&dom, body, ComponentKind::Server, false, &mut ids)?;
//! ```

use super::comment::{ComponentComment, MarkerPayload, marker_payload};
use super::error::ScanError;
use crate::descriptor::{ComponentDescriptor, ComponentKind, DescriptorIds};
use crate::dom::{Dom, NodeId};

// =============================================================================
// Cursor
// =============================================================================

/// Position inside one sibling list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(usize);

impl Cursor {
    pub const fn start() -> Self {
        Self(0)
    }

    pub fn current(self, siblings: &[NodeId]) -> Option<NodeId> {
        siblings.get(self.0).copied()
    }

    pub const fn advance(self) -> Self {
        Self(self.0 + 1)
    }
}

// =============================================================================
// Public entry points
// =============================================================================

/// Discover every `kind` descriptor under `root`, sorted by ordering key.
///
/// With `direct_children_only`, only `root`'s own child list is examined.
pub fn discover_components(
    dom: &Dom,
    root: NodeId,
    kind: ComponentKind,
    direct_children_only: bool,
    ids: &mut DescriptorIds,
) -> Result<Vec<ComponentDescriptor>, ScanError> {
    scan(dom, root, Some(kind), direct_children_only, ids)
}

/// Discover descriptors of both kinds in one pass.
///
/// Server descriptors come first (by sequence), then webassembly ones (by
/// creation order).
pub fn discover_all(
    dom: &Dom,
    root: NodeId,
    direct_children_only: bool,
    ids: &mut DescriptorIds,
) -> Result<Vec<ComponentDescriptor>, ScanError> {
    scan(dom, root, None, direct_children_only, ids)
}

fn scan(
    dom: &Dom,
    root: NodeId,
    kind: Option<ComponentKind>,
    direct_only: bool,
    ids: &mut DescriptorIds,
) -> Result<Vec<ComponentDescriptor>, ScanError> {
    let mut scanner = Scanner {
        dom,
        kind,
        direct_only,
        ids,
        found: Vec::new(),
    };
    scanner.scan_children(root)?;

    let mut found = scanner.found;
    found.sort_by_key(ComponentDescriptor::id);
    crate::debug!("scan"; "{} component(s) under {}", found.len(), root);
    Ok(found)
}

// =============================================================================
// Scanner
// =============================================================================

struct Scanner<'a> {
    dom: &'a Dom,
    /// `None` = emit both kinds
    kind: Option<ComponentKind>,
    direct_only: bool,
    ids: &'a mut DescriptorIds,
    found: Vec<ComponentDescriptor>,
}

impl Scanner<'_> {
    fn scan_children(&mut self, parent: NodeId) -> Result<(), ScanError> {
        let dom = self.dom;
        let siblings = dom.children(parent);
        let mut cursor = Cursor::start();

        while let Some(node) = cursor.current(siblings) {
            cursor = match self.match_marker(siblings, cursor)? {
                Some((comment, next)) => {
                    if self.kind.is_none_or(|kind| kind == comment.kind()) {
                        let descriptor = comment.into_descriptor(self.ids)?;
                        self.found.push(descriptor);
                    }
                    next
                }
                None => {
                    if !self.direct_only && dom.has_children(node) {
                        self.scan_children(node)?;
                    }
                    cursor.advance()
                }
            };
        }
        Ok(())
    }

    /// Try to read an open marker at `cursor`.
    ///
    /// Returns the paired comment and the cursor just past it (past the end
    /// marker for prerendered blocks), or `None` if the node is not a marker.
    fn match_marker(
        &self,
        siblings: &[NodeId],
        cursor: Cursor,
    ) -> Result<Option<(ComponentComment, Cursor)>, ScanError> {
        let Some(start) = cursor.current(siblings) else {
            return Ok(None);
        };
        let Some(text) = self.dom.comment_text(start) else {
            return Ok(None);
        };
        let Some(json) = marker_payload(text) else {
            return Ok(None);
        };

        let marker = match MarkerPayload::parse(text, json)? {
            MarkerPayload::Open(marker) => marker,
            MarkerPayload::End { .. } => {
                return Err(ScanError::parse(
                    text,
                    "missing component type (end marker without a start marker)",
                ));
            }
        };

        if self.dom.parent(start).is_some_and(|p| self.dom.is_document(p)) {
            return Err(ScanError::Structural {
                comment: text.to_string(),
            });
        }

        let (end, next) = match &marker.prerender_id {
            Some(id) => {
                let (end, next) = find_end_marker(self.dom, siblings, cursor.advance(), id)?;
                (Some(end), next)
            }
            None => (None, cursor.advance()),
        };

        Ok(Some((ComponentComment { marker, start, end }, next)))
    }
}

/// Consume siblings from `cursor` until the end marker for `prerender_id`.
///
/// Anything that is not exactly `{"prerenderId": <id>}` is skipped, including
/// end markers for other ids.
fn find_end_marker(
    dom: &Dom,
    siblings: &[NodeId],
    mut cursor: Cursor,
    prerender_id: &str,
) -> Result<(NodeId, Cursor), ScanError> {
    while let Some(node) = cursor.current(siblings) {
        cursor = cursor.advance();

        let Some(text) = dom.comment_text(node) else {
            continue;
        };
        let Some(json) = marker_payload(text) else {
            continue;
        };
        if MarkerPayload::parse(text, json).is_ok_and(|p| p.closes(prerender_id)) {
            return Ok((node, cursor));
        }
    }

    Err(ScanError::Unterminated {
        prerender_id: prerender_id.to_string(),
    })
}
