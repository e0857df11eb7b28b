//! Builds the class tree from fully qualified class names.
//!
//! # Algorithm
//!
//! 1. **Trie insertion**: every name is split into package segments (`.`)
//!    and class segments (`$` for inner classes) and inserted into a trie.
//! 2. **Compression + emission**: a depth-first walk emits arena nodes.
//!    A package whose only child is another package is merged with it, so
//!    `your` → `company` becomes the single node `your.company`.

use std::collections::HashMap;

use tracing::debug;

use super::Tree;
use super::node::{NodeId, NodeKind, TreeNode};
use crate::error::TreeError;

/// Trie node used while collecting class names.
struct RawNode {
    segment: String,
    kind: NodeKind,
    /// Children indices (into the raw vec), in first-seen order.
    children: Vec<usize>,
    /// (segment, is_class) → index, for deduplication.
    lookup: HashMap<(String, bool), usize>,
}

impl RawNode {
    fn new(segment: &str, kind: NodeKind) -> Self {
        Self {
            segment: segment.to_owned(),
            kind,
            children: Vec::new(),
            lookup: HashMap::new(),
        }
    }
}

/// Build a [`Tree`] from fully qualified class names.
///
/// Names that occur more than once are inserted once. Names with empty
/// segments (`a..B`, `a.B$`, ``) are rejected, and so is a name that uses a
/// class as a package (`a.B` next to `a.B.C`).
pub fn build_from_class_names<I, S>(class_names: I) -> Result<Tree, TreeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut raw = vec![RawNode::new("", NodeKind::Root)];
    let mut class_count = 0usize;

    for name in class_names {
        insert_class_name(&mut raw, name.as_ref())?;
        class_count += 1;
    }

    let mut nodes = Vec::with_capacity(raw.len());
    emit(&raw, 0, None, "", 0, &mut nodes);

    let by_name = nodes
        .iter()
        .map(|node| (node.full_name.clone(), node.id))
        .collect();

    debug!(class_count, node_count = nodes.len(), "built class tree");
    Ok(Tree { nodes, by_name })
}

fn insert_class_name(raw: &mut Vec<RawNode>, name: &str) -> Result<(), TreeError> {
    let invalid = || TreeError::InvalidClassName(name.to_owned());

    let (packages, class_part) = match name.rsplit_once('.') {
        Some((packages, class_part)) => (Some(packages), class_part),
        None => (None, name),
    };

    let package_segments: Vec<&str> = packages.map(|p| p.split('.').collect()).unwrap_or_default();
    let class_segments: Vec<&str> = class_part.split('$').collect();

    if package_segments.iter().chain(&class_segments).any(|s| s.is_empty()) {
        return Err(invalid());
    }

    let mut current = 0;
    for segment in package_segments {
        current = child_for(raw, current, segment, NodeKind::Package).ok_or_else(invalid)?;
    }
    for segment in class_segments {
        current = child_for(raw, current, segment, NodeKind::Class).ok_or_else(invalid)?;
    }
    Ok(())
}

/// Find or create the child of `parent` named `segment`.
///
/// Returns `None` if a sibling of the other kind already uses the segment.
/// Both would end up with the same full name (`a.B` as class and package).
fn child_for(raw: &mut Vec<RawNode>, parent: usize, segment: &str, kind: NodeKind) -> Option<usize> {
    let is_class = kind == NodeKind::Class;
    if let Some(&existing) = raw[parent].lookup.get(&(segment.to_owned(), is_class)) {
        return Some(existing);
    }
    if raw[parent].lookup.contains_key(&(segment.to_owned(), !is_class)) {
        return None;
    }
    let idx = raw.len();
    raw.push(RawNode::new(segment, kind));
    raw[parent].children.push(idx);
    raw[parent].lookup.insert((segment.to_owned(), is_class), idx);
    Some(idx)
}

/// Emit arena nodes depth-first, merging single-package chains.
fn emit(
    raw: &[RawNode],
    raw_idx: usize,
    parent: Option<(NodeId, NodeKind)>,
    parent_full_name: &str,
    depth: u32,
    nodes: &mut Vec<TreeNode>,
) -> NodeId {
    let mut current = raw_idx;
    let mut label = raw[current].segment.clone();

    if raw[current].kind == NodeKind::Package {
        while let &[only_child] = raw[current].children.as_slice() {
            if raw[only_child].kind != NodeKind::Package {
                break;
            }
            label.push('.');
            label.push_str(&raw[only_child].segment);
            current = only_child;
        }
    }

    let kind = raw[current].kind;
    let full_name = match parent {
        None => String::new(),
        Some((_, NodeKind::Root)) => label.clone(),
        Some((_, NodeKind::Class)) => format!("{parent_full_name}${label}"),
        Some(_) => format!("{parent_full_name}.{label}"),
    };

    let id = NodeId(nodes.len() as u32);
    nodes.push(TreeNode::new(
        id,
        full_name.clone(),
        label,
        kind,
        parent.map(|(parent_id, _)| parent_id),
        depth,
    ));

    let children: Vec<NodeId> = raw[current]
        .children
        .iter()
        .map(|&child| emit(raw, child, Some((id, kind)), &full_name, depth + 1, nodes))
        .collect();
    nodes[id.index()].children = children;

    id
}
