//! Node type and related structures.
//!
//! Every node of the class tree carries:
//! - A stable identifier (its slot in the tree arena)
//! - Its fully qualified name and the label shown inside its circle
//! - The complete, immutable child list fixed at construction
//! - Fold state packed into a flag byte
//! - The geometry written by the most recent relayout pass

use std::fmt;

use crate::layout::NodeLayout;

/// Stable node identifier.
///
/// The id is the node's slot in the owning [`Tree`](super::Tree). Nodes are
/// never added or removed after construction, so an id stays valid for the
/// lifetime of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The unnamed default package every tree is rooted in.
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// What a node stands for in the source hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The unnamed default package.
    Root,
    /// A package, possibly several merged single-child packages.
    Package,
    /// A class or an inner class.
    Class,
}

/// Node state flags packed into a single byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    flags: u8,
}

impl NodeState {
    const FOLDED: u8 = 0b0000_0001;

    /// Create a new default node state (unfolded).
    #[inline]
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    /// Check if the node is folded.
    #[inline]
    pub fn is_folded(self) -> bool {
        self.flags & Self::FOLDED != 0
    }

    /// Set the folded state.
    #[inline]
    pub fn set_folded(&mut self, folded: bool) {
        if folded {
            self.flags |= Self::FOLDED;
        } else {
            self.flags &= !Self::FOLDED;
        }
    }
}

/// One class, package or grouping node.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub(crate) id: NodeId,
    pub(crate) full_name: String,
    pub(crate) label: String,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) depth: u32,
    pub(crate) children: Vec<NodeId>,
    pub(crate) state: NodeState,
    pub(crate) layout: NodeLayout,
}

impl TreeNode {
    pub(crate) fn new(
        id: NodeId,
        full_name: String,
        label: String,
        kind: NodeKind,
        parent: Option<NodeId>,
        depth: u32,
    ) -> Self {
        Self {
            id,
            full_name,
            label,
            kind,
            parent,
            depth,
            children: Vec::new(),
            state: NodeState::new(),
            layout: NodeLayout::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Fully qualified name, unique within the tree (`my.company.SomeClass$Inner`).
    #[inline]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Name relative to the parent, drawn inside the node's circle.
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Distance from the root (root = 0).
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }

    /// Structural leaf: the node has no children at all.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn is_folded(&self) -> bool {
        self.state.is_folded()
    }

    /// Leaf as displayed: structural leaf or folded.
    #[inline]
    pub fn is_currently_leaf(&self) -> bool {
        self.is_leaf() || self.is_folded()
    }

    /// The complete child list, regardless of fold state.
    #[inline]
    pub fn all_children(&self) -> &[NodeId] {
        &self.children
    }

    /// The visible child list: empty while folded.
    #[inline]
    pub fn current_children(&self) -> &[NodeId] {
        if self.is_folded() {
            &[]
        } else {
            &self.children
        }
    }

    /// Geometry from the last relayout pass in which this node was visible.
    #[inline]
    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId::from(42);
        assert_eq!(u32::from(id), 42);
        assert_eq!(id.index(), 42);
        assert_eq!(format!("{}", id), "Node(42)");
    }

    #[test]
    fn test_node_id_conversion() {
        let id: NodeId = 123.into();
        let raw: u32 = id.into();
        assert_eq!(raw, 123);
    }

    #[test]
    fn test_node_state_folded() {
        let mut state = NodeState::new();
        assert!(!state.is_folded());

        state.set_folded(true);
        assert!(state.is_folded());

        state.set_folded(true);
        assert!(state.is_folded());

        state.set_folded(false);
        assert!(!state.is_folded());
    }

    #[test]
    fn test_folded_node_hides_children() {
        let mut node = TreeNode::new(
            NodeId(1),
            "my.company".into(),
            "my.company".into(),
            NodeKind::Package,
            Some(NodeId::ROOT),
            1,
        );
        node.children = vec![NodeId(2), NodeId(3)];
        assert!(!node.is_currently_leaf());
        assert_eq!(node.current_children(), &[NodeId(2), NodeId(3)]);

        node.state.set_folded(true);
        assert!(node.is_currently_leaf());
        assert!(node.current_children().is_empty());
        assert_eq!(node.all_children().len(), 2);
    }

    #[test]
    fn test_leaf_is_always_currently_leaf() {
        let node = TreeNode::new(
            NodeId(1),
            "pkg.SomeClass".into(),
            "SomeClass".into(),
            NodeKind::Class,
            Some(NodeId::ROOT),
            1,
        );
        assert!(node.is_leaf());
        assert!(node.is_currently_leaf());
        assert!(!node.is_folded());
    }
}
