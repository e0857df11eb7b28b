//! Per-node circle sizing and label placement.
//!
//! Geometry here is relative: a node's own center is the origin and its
//! children are returned as offsets from it. The caller composes offsets
//! top-down into absolute positions.

use super::LabelBox;
use super::pack::pack_siblings;
use super::style::LayoutParams;
use crate::tree::NodeId;

/// Gap between an inner node's label and the circles below it, as a fraction
/// of the font size (added to half the circle padding).
const LABEL_GAP_RATIO: f64 = 0.2;

/// Iterations of the ternary search for the parent center (interval shrinks
/// by a third each time).
const CENTER_SEARCH_ITERATIONS: usize = 100;

/// Extra radius added to each padded circle before packing so that rounding
/// in the tangent computation never eats into the padding.
const PACK_SLACK_RATIO: f64 = 1e-9;

/// Geometry of one node relative to its own center.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RelativeGeometry {
    pub radius: f64,
    pub label: LabelBox,
    pub child_offsets: Vec<(NodeId, [f64; 2])>,
}

/// A currently-leaf node: label centered, circle just large enough to hold it.
pub(crate) fn leaf_geometry(label_width: f64, params: &LayoutParams) -> RelativeGeometry {
    let label = LabelBox::centered(0.0, 0.0, label_width, params.node_font_size);
    let radius = (label.width / 2.0).hypot(label.height / 2.0) + params.circle_padding / 2.0;
    RelativeGeometry {
        radius,
        label,
        child_offsets: Vec::new(),
    }
}

/// An inner node: pack the children, put the label above them and pick a
/// tight enclosing circle that keeps every child `circle_padding` away from
/// the boundary. The center is fixed horizontally on the middle of the
/// children and only searched vertically.
///
/// `label_width` is `None` for the unlabeled root.
pub(crate) fn inner_geometry(
    children: &[(NodeId, f64)],
    label_width: Option<f64>,
    params: &LayoutParams,
) -> RelativeGeometry {
    let padding = params.circle_padding;

    let padded: Vec<f64> = children
        .iter()
        .map(|&(_, r)| {
            let padded = r + padding / 2.0;
            padded + PACK_SLACK_RATIO * padded.max(1.0)
        })
        .collect();
    let centers = pack_siblings(&padded);

    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut top = f64::INFINITY;
    let mut bottom = f64::NEG_INFINITY;
    for (&(_, r), c) in children.iter().zip(&centers) {
        min_x = min_x.min(c[0] - r);
        max_x = max_x.max(c[0] + r);
        top = top.min(c[1] - r);
        bottom = bottom.max(c[1] + r);
    }
    let cx = (min_x + max_x) / 2.0;

    let label = label_width.map(|width| {
        let height = params.node_font_size;
        let gap = padding / 2.0 + params.node_font_size * LABEL_GAP_RATIO;
        LabelBox::centered(cx, top - gap - height / 2.0, width, height)
    });

    let radius_at = |cy: f64| -> f64 {
        let children_extent = children
            .iter()
            .zip(&centers)
            .map(|(&(_, r), c)| (c[0] - cx).hypot(c[1] - cy) + r + padding)
            .fold(0.0, f64::max);
        let label_extent = label.map_or(0.0, |label| {
            label
                .corners()
                .iter()
                .map(|&[x, y]| (x - cx).hypot(y - cy) + padding / 2.0)
                .fold(0.0, f64::max)
        });
        children_extent.max(label_extent)
    };

    // The radius is convex in the center's y, so a ternary search finds the
    // minimum. The label must stay in the upper half.
    let mut lo = label.map_or(top, |label| label.y);
    let mut hi = bottom.max(lo);
    for _ in 0..CENTER_SEARCH_ITERATIONS {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if radius_at(m1) <= radius_at(m2) {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    let cy = (lo + hi) / 2.0;

    RelativeGeometry {
        radius: radius_at(cy),
        label: label
            .map(|label| label.translated(-cx, -cy))
            .unwrap_or_default(),
        child_offsets: children
            .iter()
            .zip(&centers)
            .map(|(&(id, _), c)| (id, [c[0] - cx, c[1] - cy]))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    fn params(padding: f64, font_size: f64) -> LayoutParams {
        LayoutParams::new(padding, font_size).unwrap()
    }

    fn offset_of(geometry: &RelativeGeometry, id: NodeId) -> [f64; 2] {
        geometry
            .child_offsets
            .iter()
            .find(|(child, _)| *child == id)
            .map(|(_, offset)| *offset)
            .unwrap()
    }

    #[test]
    fn test_leaf_label_is_centered_and_contained() {
        let geometry = leaf_geometry(60.0, &params(2.0, 10.0));
        assert_eq!(geometry.label.x, 0.0);
        assert_eq!(geometry.label.y, 0.0);
        for [x, y] in geometry.label.corners() {
            assert!(x.hypot(y) <= geometry.radius + EPS);
        }
        assert!(geometry.child_offsets.is_empty());
    }

    #[rstest]
    #[case(0.0, 10.0)]
    #[case(1.5, 10.0)]
    #[case(20.0, 10.0)]
    #[case(3.0, 30.0)]
    fn test_inner_node_keeps_padding(#[case] padding: f64, #[case] font_size: f64) {
        let p = params(padding, font_size);
        let children = [(NodeId(1), 12.0), (NodeId(2), 30.0), (NodeId(3), 5.0), (NodeId(4), 12.0)];
        let geometry = inner_geometry(&children, Some(40.0), &p);

        for &(id, r) in &children {
            let [x, y] = offset_of(&geometry, id);
            assert!(x.hypot(y) + r <= geometry.radius - padding + EPS);
        }
        for (i, &(a, ra)) in children.iter().enumerate() {
            for &(b, rb) in &children[i + 1..] {
                let [ax, ay] = offset_of(&geometry, a);
                let [bx, by] = offset_of(&geometry, b);
                assert!((ax - bx).hypot(ay - by) >= ra + rb + padding - EPS);
            }
        }
        for [x, y] in geometry.label.corners() {
            assert!(x.hypot(y) <= geometry.radius + EPS);
        }
    }

    #[test]
    fn test_label_sits_above_all_children() {
        let children = [(NodeId(1), 8.0), (NodeId(2), 8.0), (NodeId(3), 8.0)];
        let geometry = inner_geometry(&children, Some(30.0), &params(1.5, 10.0));
        assert!(geometry.label.y <= 0.0);
        for &(id, r) in &children {
            let [_, y] = offset_of(&geometry, id);
            assert!(geometry.label.bottom() < y - r);
        }
    }

    #[test]
    fn test_single_child_label_directly_above() {
        let geometry = inner_geometry(&[(NodeId(7), 20.0)], Some(200.0), &params(0.0, 30.0));
        let [x, y] = offset_of(&geometry, NodeId(7));
        assert!((geometry.label.x - x).abs() < EPS);
        assert!(geometry.label.bottom() < y - 20.0);
        assert!((geometry.label.height - 30.0).abs() < EPS);
    }

    #[test]
    fn test_unlabeled_root() {
        let children = [(NodeId(1), 10.0), (NodeId(2), 10.0)];
        let geometry = inner_geometry(&children, None, &params(2.0, 10.0));
        assert_eq!(geometry.label, LabelBox::default());
        // Two touching circles: the tightest enclosing radius is 2r + p/2 + p.
        assert!(geometry.radius <= 10.0 * 2.0 + 1.0 + 2.0 + 1e-6);
    }
}
