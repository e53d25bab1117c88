//! Arena document model.
//!
//! A small mutable DOM standing in for the browser document the boot core
//! walks. Nodes live in one `Vec` and are addressed by [`NodeId`]; removing a
//! node detaches it (and its subtree) without invalidating other ids.
//!
//! ```text
//! Document
//! └── Element <body>
//!     ├── Comment  "Blazor:{...}"     <- start marker
//!     ├── Element  <p>                <- prerendered content
//!     └── Comment  "Blazor:{...}"     <- end marker
//! ```
//!
//! # Modules
//!
//! - `parse` - Markup to `Dom` conversion via `tl`

mod parse;

pub use parse::DomParseError;

/// Index of a node inside a [`Dom`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index (stable for the lifetime of the `Dom`).
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    /// Comment body without the `<!--` / `-->` delimiters.
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Mutable arena DOM.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<NodeData>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create an empty document. The document node is always `NodeId(0)`.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse markup into a new document.
    pub fn parse(html: &str) -> Result<Self, DomParseError> {
        parse::parse_html(html)
    }

    /// The document root.
    pub const fn document(&self) -> NodeId {
        NodeId(0)
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Append a new node under `parent`, returning its id.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append an element without attributes.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.append(
            parent,
            NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: Vec::new(),
            },
        )
    }

    /// Append a comment node. `text` is the body between `<!--` and `-->`.
    pub fn append_comment(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, NodeKind::Comment(text.into()))
    }

    /// Append a text node.
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.append(parent, NodeKind::Text(text.into()))
    }

    /// Copy the children of `other`'s node `from` (recursively) under `parent`.
    ///
    /// Used to splice a streamed fragment into an existing document.
    pub fn import_children(&mut self, parent: NodeId, other: &Dom, from: NodeId) {
        for &child in other.children(from) {
            let copied = self.append(parent, other.kind(child).clone());
            self.import_children(copied, other, child);
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Detach `node` (and its subtree) from its parent.
    ///
    /// The node stays in the arena so outstanding ids remain valid, but it is
    /// no longer reachable from the document.
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    /// Detach every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Replace the body of a comment node. Returns `false` for other node kinds.
    ///
    /// This is how a DOM-merging layer updates a marker in place while keeping
    /// the node itself as the component's anchor.
    pub fn set_comment_text(&mut self, node: NodeId, text: impl Into<String>) -> bool {
        match &mut self.nodes[node.0].kind {
            NodeKind::Comment(body) => {
                *body = text.into();
                true
            }
            _ => false,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn has_children(&self, node: NodeId) -> bool {
        !self.nodes[node.0].children.is_empty()
    }

    /// Comment body, if `node` is a comment.
    pub fn comment_text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Comment(text) => Some(text),
            _ => None,
        }
    }

    /// Tag name, if `node` is an element.
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Whether `node` is the document node.
    pub fn is_document(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Document)
    }

    /// Whether `node` is `ancestor` or lies inside its subtree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    /// First element with the given tag, depth-first from the document.
    pub fn find_element(&self, tag: &str) -> Option<NodeId> {
        let mut stack = vec![self.document()];
        while let Some(node) = stack.pop() {
            if self.tag(node) == Some(tag) {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        None
    }

    /// Number of nodes reachable from the document (document included).
    pub fn reachable_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.document()];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend_from_slice(self.children(node));
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_contains() {
        let mut dom = Dom::new();
        let body = dom.append_element(dom.document(), "BODY");
        let comment = dom.append_comment(body, "hello");

        assert_eq!(dom.tag(body), Some("body"));
        assert_eq!(dom.comment_text(comment), Some("hello"));
        assert_eq!(dom.parent(comment), Some(body));
        assert!(dom.contains(dom.document(), comment));
        assert!(!dom.contains(comment, body));
    }

    #[test]
    fn test_remove_detaches_subtree() {
        let mut dom = Dom::new();
        let body = dom.append_element(dom.document(), "body");
        let div = dom.append_element(body, "div");
        let inner = dom.append_text(div, "x");

        dom.remove(div);
        assert!(dom.children(body).is_empty());
        assert!(!dom.contains(dom.document(), inner));
        // Detached subtree keeps its own structure
        assert!(dom.contains(div, inner));
        assert_eq!(dom.reachable_len(), 2);
    }

    #[test]
    fn test_set_comment_text_only_on_comments() {
        let mut dom = Dom::new();
        let body = dom.append_element(dom.document(), "body");
        let comment = dom.append_comment(body, "old");

        assert!(dom.set_comment_text(comment, "new"));
        assert_eq!(dom.comment_text(comment), Some("new"));
        assert!(!dom.set_comment_text(body, "nope"));
    }

    #[test]
    fn test_import_children() {
        let mut fragment = Dom::new();
        let wrapper = fragment.append_element(fragment.document(), "div");
        fragment.append_comment(wrapper, "c");

        let mut dom = Dom::new();
        let body = dom.append_element(dom.document(), "body");
        dom.import_children(body, &fragment, fragment.document());

        let div = dom.children(body)[0];
        assert_eq!(dom.tag(div), Some("div"));
        assert_eq!(dom.comment_text(dom.children(div)[0]), Some("c"));
    }
}
