//! Node arena.
//!
//! All nodes of one compilation unit live in a single `Vec`; handles are
//! plain `u32` indices. The arena is append-only while a provider builds it
//! and immutable afterwards, which is what lets function type values carry
//! bare `NodeIndex` handles across the lifetime of an analysis.

use serde::Serialize;

use jsty_common::Span;

use crate::node::NodeKind;

/// Handle into an [`AstArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        NodeIndex::NONE
    }
}

/// A node: kind plus source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// Arena of AST nodes for one source file.
#[derive(Clone, Debug, Default)]
pub struct AstArena {
    nodes: Vec<Node>,
    root: NodeIndex,
}

impl AstArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeIndex::NONE,
        }
    }

    /// Append a node and return its handle.
    pub fn add(&mut self, kind: NodeKind, span: Span) -> NodeIndex {
        let idx = NodeIndex(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        idx
    }

    /// Fetch a node; `None` for out-of-range or sentinel handles.
    pub fn get(&self, idx: NodeIndex) -> Option<&Node> {
        if idx.is_none() {
            return None;
        }
        self.nodes.get(idx.0 as usize)
    }

    /// Fetch a node's kind; panics on an invalid handle.
    ///
    /// Only for callers that have already validated the handle, e.g. the
    /// builder's own back-references.
    pub fn kind(&self, idx: NodeIndex) -> &NodeKind {
        &self.nodes[idx.0 as usize].kind
    }

    /// Fetch a node's span, or a dummy span for invalid handles.
    pub fn span(&self, idx: NodeIndex) -> Span {
        self.get(idx).map_or(Span::dummy(), |n| n.span)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The `Program` node of this unit, if one was designated.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn set_root(&mut self, root: NodeIndex) {
        self.root = root;
    }

    /// Overwrite a node's span. Providers call this while the arena is
    /// still being built; invalid handles are ignored.
    pub fn set_span(&mut self, idx: NodeIndex, span: Span) {
        if let Some(node) = self.nodes.get_mut(idx.0 as usize) {
            node.span = span;
        }
    }

    /// Iterate all node handles in allocation order.
    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.nodes.len() as u32).map(NodeIndex)
    }
}
