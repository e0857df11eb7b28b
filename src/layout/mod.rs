//! Geometry engine for the visible tree.
//!
//! A relayout pass is a pure function of the visible projection of the tree
//! and a [`LayoutParams`] snapshot:
//!
//! 1. **Bottom-up sizing** (post-order): currently-leaf nodes get a circle
//!    around their centered label; inner nodes pack their current children
//!    and reserve space for their label at the top.
//! 2. **Top-down composition** (pre-order): relative child offsets are added
//!    to the parent's absolute center, starting from the root at (0, 0).
//!
//! Nodes hidden below a folded ancestor are not touched and keep whatever
//! layout they had when they were last visible.

mod circle;
pub mod pack;
pub mod style;

use serde::Serialize;
use tracing::trace;

pub use style::{
    AverageGlyphWidth, LayoutParams, StyleProvider, StyleSettings, TextMeasure, VisualizationStyles,
};

use crate::tree::{NodeId, Tree};
use circle::{RelativeGeometry, inner_geometry, leaf_geometry};

/// Axis-aligned label box, stored by its center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LabelBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LabelBox {
    pub fn centered(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn corners(&self) -> [[f64; 2]; 4] {
        let (hw, hh) = (self.width / 2.0, self.height / 2.0);
        [
            [self.x - hw, self.y - hh],
            [self.x + hw, self.y - hh],
            [self.x - hw, self.y + hh],
            [self.x + hw, self.y + hh],
        ]
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Absolute geometry of a node after a relayout pass.
///
/// Coordinates grow rightwards and downwards, with the root centered at the
/// origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NodeLayout {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub label: LabelBox,
}

/// Compute layouts for every visible node, in pre-order.
pub fn compute_layout(
    tree: &Tree,
    params: &LayoutParams,
    measure: &dyn TextMeasure,
) -> Vec<(NodeId, NodeLayout)> {
    let mut relative: Vec<Option<RelativeGeometry>> = vec![None; tree.len()];

    for id in tree.visible_post_order() {
        let node = tree.node(id);
        let geometry = if node.is_root() && tree.is_empty() {
            RelativeGeometry {
                radius: params.circle_padding,
                label: LabelBox::default(),
                child_offsets: Vec::new(),
            }
        } else if node.is_currently_leaf() {
            leaf_geometry(measure.text_width(node.label(), params.node_font_size), params)
        } else {
            let children: Vec<(NodeId, f64)> = node
                .current_children()
                .iter()
                .map(|&child| {
                    let radius = relative[child.index()].as_ref().map_or(0.0, |g| g.radius);
                    (child, radius)
                })
                .collect();
            let label_width =
                (!node.is_root()).then(|| measure.text_width(node.label(), params.node_font_size));
            inner_geometry(&children, label_width, params)
        };
        relative[id.index()] = Some(geometry);
    }

    let mut centers: Vec<[f64; 2]> = vec![[0.0, 0.0]; tree.len()];
    let mut layouts = Vec::with_capacity(tree.len());
    for id in tree.visible_nodes() {
        let Some(geometry) = relative[id.index()].as_ref() else {
            continue;
        };
        let [x, y] = centers[id.index()];
        for &(child, [dx, dy]) in &geometry.child_offsets {
            centers[child.index()] = [x + dx, y + dy];
        }
        layouts.push((
            id,
            NodeLayout {
                x,
                y,
                radius: geometry.radius,
                label: geometry.label.translated(x, y),
            },
        ));
    }

    trace!(visible = layouts.len(), "computed layout");
    layouts
}

/// Compute the layout of the visible tree and write it into the nodes.
///
/// Returns the number of nodes laid out.
pub fn apply_layout(tree: &mut Tree, params: &LayoutParams, measure: &dyn TextMeasure) -> usize {
    let layouts = compute_layout(tree, params, measure);
    let count = layouts.len();
    for (id, layout) in layouts {
        tree.node_mut(id).layout = layout;
    }
    count
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn laid_out(names: &[&str], padding: f64, font_size: f64) -> Tree {
        let mut tree = Tree::from_class_names(names.iter().copied()).unwrap();
        let params = LayoutParams::new(padding, font_size).unwrap();
        apply_layout(&mut tree, &params, &AverageGlyphWidth::default());
        tree
    }

    fn distance(a: &NodeLayout, b: &NodeLayout) -> f64 {
        (a.x - b.x).hypot(a.y - b.y)
    }

    /// Checks every geometric invariant on the visible tree.
    pub(crate) fn assert_valid_layout(tree: &Tree, padding: f64) {
        for id in tree.visible_nodes() {
            let node = tree.node(id);
            let layout = node.layout();

            for [x, y] in layout.label.corners() {
                assert!(
                    (x - layout.x).hypot(y - layout.y) <= layout.radius + EPS,
                    "label of {:?} leaves its circle",
                    node.full_name()
                );
            }

            let children = node.current_children();
            for (i, &a) in children.iter().enumerate() {
                let la = tree.node(a).layout();
                assert!(
                    distance(layout, la) + la.radius <= layout.radius - padding + EPS,
                    "{:?} is not within {:?}",
                    tree.node(a).full_name(),
                    node.full_name()
                );
                for &b in &children[i + 1..] {
                    let lb = tree.node(b).layout();
                    assert!(
                        distance(la, lb) >= la.radius + lb.radius + padding - EPS,
                        "{:?} and {:?} are too close",
                        tree.node(a).full_name(),
                        tree.node(b).full_name()
                    );
                }
            }
        }
    }

    #[test]
    fn test_padding_invariants() {
        let tree = laid_out(
            &[
                "com.pkg1.SomeClass1$SomeInnerClass",
                "com.pkg1.SomeClass2$SomeInnerClass1",
                "com.pkg1.SomeClass2$SomeInnerClass2",
                "com.pkg2.SomeClass",
            ],
            1.5,
            10.0,
        );
        assert_valid_layout(&tree, 1.5);
    }

    #[test]
    fn test_sibling_padding_with_many_siblings() {
        let tree = laid_out(
            &[
                "pkg1.SomeClass1$SomeInnerClass1",
                "pkg1.SomeClass1$SomeInnerClass2",
                "pkg1.SomeClass1$SomeInnerClass3",
                "pkg1.SomeClass2",
                "pkg1.SomeClass3",
                "pkg2.SomeClass",
            ],
            20.0,
            10.0,
        );
        assert_valid_layout(&tree, 20.0);
    }

    #[test]
    fn test_leaf_labels_in_the_middle() {
        let tree = laid_out(&["pkg1.SomeClass1", "pkg1.SomeClass2$SomeInnerClass", "pkg3"], 1.5, 10.0);
        for id in tree.visible_nodes() {
            let node = tree.node(id);
            if node.is_currently_leaf() && !node.is_root() {
                let layout = node.layout();
                assert!((layout.label.x - layout.x).abs() < EPS);
                assert!((layout.label.y - layout.y).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_inner_labels_at_the_top() {
        let tree = laid_out(&["pkg1.SomeClass1", "pkg1.SomeClass2$SomeInnerClass"], 1.5, 10.0);
        for id in tree.visible_nodes() {
            let node = tree.node(id);
            if node.is_currently_leaf() || node.is_root() {
                continue;
            }
            let layout = node.layout();
            assert!(layout.label.y <= layout.y + EPS);
            for &child in node.current_children() {
                let child_layout = tree.node(child).layout();
                assert!(layout.label.bottom() < child_layout.y - child_layout.radius);
            }
        }
    }

    #[test]
    fn test_absolute_positions_compose() {
        let tree = laid_out(&["a.b.C", "a.b.D", "a.e.F"], 2.0, 10.0);
        let root = tree.node(tree.root()).layout();
        assert_eq!((root.x, root.y), (0.0, 0.0));
        let c = tree.node(tree.get_by_name("a.b.C").unwrap()).layout();
        let ab = tree.node(tree.get_by_name("a.b").unwrap()).layout();
        assert!(distance(c, ab) + c.radius <= ab.radius);
    }

    #[test]
    fn test_folded_node_is_laid_out_as_leaf() {
        let mut tree = Tree::from_class_names(["a.b.C", "a.b.D", "a.e.F"]).unwrap();
        let ab = tree.get_by_name("a.b").unwrap();
        let params = LayoutParams::new(2.0, 10.0).unwrap();
        apply_layout(&mut tree, &params, &AverageGlyphWidth::default());
        let unfolded_radius = tree.node(ab).layout().radius;

        tree.node_mut(ab).state.set_folded(true);
        let count = apply_layout(&mut tree, &params, &AverageGlyphWidth::default());
        // root, a, a.b, a.e, a.e.F
        assert_eq!(count, 5);
        let folded = tree.node(ab).layout();
        assert!(folded.radius < unfolded_radius);
        assert!((folded.label.y - folded.y).abs() < EPS);
        assert_valid_layout(&tree, 2.0);
    }

    #[test]
    fn test_empty_tree() {
        let tree = laid_out(&[], 1.5, 10.0);
        let root = tree.node(tree.root()).layout();
        assert_eq!(root.label, LabelBox::default());
        assert_eq!(root.radius, 1.5);
    }
}
