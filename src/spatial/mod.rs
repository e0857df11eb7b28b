//! Spatial indexing for O(log n) hit testing.
//!
//! This module provides an R-tree based spatial index over the circles of
//! the visible nodes, rebuilt after every relayout pass.

mod rtree;

pub use rtree::{NodeCircle, SpatialIndex};
