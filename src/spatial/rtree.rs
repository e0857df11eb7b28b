//! R-tree based spatial index over laid-out circles, using the rstar crate.
//!
//! Provides O(log n) spatial queries for:
//! - Deepest circle containing a point (hit testing)
//! - Circles intersecting a rectangle (viewport culling)

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::tree::NodeId;

/// A visible node's circle in the spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeCircle {
    /// The node identifier.
    pub id: NodeId,
    /// Center X coordinate.
    pub x: f64,
    /// Center Y coordinate.
    pub y: f64,
    /// Circle radius.
    pub radius: f64,
    /// Tree depth, used to prefer inner circles on overlapping hits.
    pub depth: u32,
}

impl NodeCircle {
    /// Create a new NodeCircle.
    pub fn new(id: NodeId, x: f64, y: f64, radius: f64, depth: u32) -> Self {
        Self {
            id,
            x,
            y,
            radius,
            depth,
        }
    }
}

impl RTreeObject for NodeCircle {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.x - self.radius, self.y - self.radius],
            [self.x + self.radius, self.y + self.radius],
        )
    }
}

impl PointDistance for NodeCircle {
    /// Squared distance from the point to the disc (0 inside).
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let to_center = (self.x - point[0]).hypot(self.y - point[1]);
        let outside = (to_center - self.radius).max(0.0);
        outside * outside
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        (self.x - point[0]).hypot(self.y - point[1]) <= self.radius
    }
}

/// Spatial index for the visible circles of the last relayout pass.
///
/// Uses an R*-tree, bulk loaded after every pass.
pub struct SpatialIndex {
    tree: RTree<NodeCircle>,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Deepest circle containing the point.
    pub fn at_point(&self, x: f64, y: f64) -> Option<NodeId> {
        self.tree
            .locate_all_at_point(&[x, y])
            .max_by_key(|circle| circle.depth)
            .map(|circle| circle.id)
    }

    /// Find all circles whose bounding box intersects a rectangle.
    pub fn in_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<NodeId> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|circle| circle.id)
            .collect()
    }

    /// Rebuild the index from scratch.
    ///
    /// This is more efficient than incremental inserts for bulk updates.
    pub fn rebuild(&mut self, circles: Vec<NodeCircle>) {
        self.tree = RTree::bulk_load(circles);
    }

    /// Get the number of circles in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.len())
            .finish()
    }
}
