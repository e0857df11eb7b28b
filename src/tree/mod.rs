//! Structural class tree.
//!
//! The tree is an arena of [`TreeNode`]s indexed by [`NodeId`], built once
//! from class names and never reshaped afterwards. Fold state is a per-node
//! flag, so the visible projection (`current_children`) is always derived
//! from the full tree instead of being kept as a second copy.

mod builder;
mod node;

use std::collections::{HashMap, HashSet};

pub use builder::build_from_class_names;
pub use node::{NodeId, NodeKind, NodeState, TreeNode};

use crate::error::TreeError;

/// Arena-backed class/package tree with a flat name index.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    by_name: HashMap<String, NodeId>,
}

impl Tree {
    /// Build a tree from fully qualified class names.
    pub fn from_class_names<I, S>(class_names: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        build_from_class_names(class_names)
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes including the root.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds at least its root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.index())
    }

    /// Node by id. Ids handed out by this tree are always valid.
    #[inline]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.index()]
    }

    /// Check that `id` belongs to this tree.
    pub fn check(&self, id: NodeId) -> Result<NodeId, TreeError> {
        if id.index() < self.nodes.len() {
            Ok(id)
        } else {
            Err(TreeError::NotFound(id.to_string()))
        }
    }

    /// Resolve a fully qualified name through the flat name index. The root
    /// is indexed under `""`.
    pub fn get_by_name(&self, full_name: &str) -> Result<NodeId, TreeError> {
        self.by_name
            .get(full_name)
            .copied()
            .ok_or_else(|| TreeError::NotFound(full_name.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }

    /// Visible nodes in pre-order, root first.
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).current_children().iter().rev());
        }
        order
    }

    /// Visible nodes in post-order (children before their parent).
    pub fn visible_post_order(&self) -> Vec<NodeId> {
        // Reversed pre-order of the mirrored tree is a post-order.
        let mut post = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            post.push(id);
            stack.extend(self.node(id).current_children().iter());
        }
        post.reverse();
        post
    }

    /// Full names of the visible leaves (structural leaves and folded nodes),
    /// in pre-order. The root never counts as a leaf here.
    pub fn visible_leaf_names(&self) -> Vec<&str> {
        self.visible_nodes()
            .into_iter()
            .map(|id| self.node(id))
            .filter(|node| !node.is_root() && node.is_currently_leaf())
            .map(TreeNode::full_name)
            .collect()
    }

    /// Nodes whose subtree (including themselves) contains one of `targets`.
    pub(crate) fn subtrees_containing(&self, targets: &HashSet<NodeId>) -> HashSet<NodeId> {
        let mut marked = HashSet::new();
        for &target in targets {
            let mut current = Some(target);
            while let Some(id) = current {
                if !marked.insert(id) {
                    break;
                }
                current = self.node(id).parent();
            }
        }
        marked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Tree {
        Tree::from_class_names(["my.company.first.A", "my.company.first.B", "my.company.second.C", "my.other.D"])
            .unwrap()
    }

    #[test]
    fn test_get_by_name_unknown() {
        let tree = tree();
        assert_eq!(
            tree.get_by_name("my.unknown"),
            Err(TreeError::NotFound("my.unknown".to_owned()))
        );
        assert_eq!(tree.get_by_name(""), Ok(tree.root()));
        assert!(tree.check(NodeId(999)).is_err());
        assert!(tree.check(tree.root()).is_ok());
    }

    #[test]
    fn test_visible_orders() {
        let mut tree = tree();
        let first = tree.get_by_name("my.company.first").unwrap();
        tree.node_mut(first).state.set_folded(true);

        let pre: Vec<&str> = tree
            .visible_nodes()
            .into_iter()
            .map(|id| tree.node(id).full_name())
            .collect();
        assert_eq!(
            pre,
            ["", "my", "my.company", "my.company.first", "my.company.second", "my.company.second.C", "my.other", "my.other.D"]
        );

        let post: Vec<&str> = tree
            .visible_post_order()
            .into_iter()
            .map(|id| tree.node(id).full_name())
            .collect();
        assert_eq!(
            post,
            ["my.company.first", "my.company.second.C", "my.company.second", "my.company", "my.other.D", "my.other", "my", ""]
        );
    }

    #[test]
    fn test_visible_leaf_names() {
        let mut tree = tree();
        assert_eq!(
            tree.visible_leaf_names(),
            ["my.company.first.A", "my.company.first.B", "my.company.second.C", "my.other.D"]
        );

        let company = tree.get_by_name("my.company").unwrap();
        tree.node_mut(company).state.set_folded(true);
        assert_eq!(tree.visible_leaf_names(), ["my.company", "my.other.D"]);
    }

    #[test]
    fn test_subtrees_containing() {
        let tree = tree();
        let a = tree.get_by_name("my.company.first.A").unwrap();
        let marked = tree.subtrees_containing(&HashSet::from([a]));
        let mut names: Vec<&str> = marked.iter().map(|&id| tree.node(id).full_name()).collect();
        names.sort();
        assert_eq!(names, ["", "my", "my.company", "my.company.first", "my.company.first.A"]);
    }
}
