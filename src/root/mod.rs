//! Tree owner, fold state machine and listener hub.
//!
//! All state changes are synchronous. Geometry is the only deferred work:
//! fold operations and explicit requests enqueue relayout passes on the
//! [`RelayoutScheduler`], and the host executes them later with
//! [`Root::run_pending_relayouts`]. A pass always lays out the fold state in
//! effect when it runs, not the one in effect when it was requested.
//!
//! Fold transitions come in two flavours:
//! - `fold` / `unfold` notify `on_fold` and request one relayout.
//! - `toggle_fold` (a user click) does not notify `on_fold`; it notifies
//!   `on_fold_finished` once the relayout it requested has run.
//!
//! Bulk folds notify `on_fold` per folded node and leave relayout to the
//! caller.

mod listener;
mod scheduler;

use std::collections::HashSet;
use std::rc::Rc;

use tracing::{debug, trace, warn};

pub use listener::TreeListener;
pub use scheduler::{PassSummary, RelayoutCompletion, RelayoutScheduler};

use crate::error::{LayoutError, TreeError};
use crate::layout::{AverageGlyphWidth, LayoutParams, StyleProvider, TextMeasure, apply_layout};
use crate::spatial::{NodeCircle, SpatialIndex};
use crate::tree::{NodeId, Tree, TreeNode};
use listener::ListenerSet;

/// Owner of the class tree and everything that reacts to its fold state.
pub struct Root {
    tree: Tree,
    styles: Rc<dyn StyleProvider>,
    measure: Box<dyn TextMeasure>,
    listeners: ListenerSet,
    scheduler: RelayoutScheduler,
    hits: SpatialIndex,
}

impl Root {
    /// Take ownership of a finished tree. Labels are measured with
    /// [`AverageGlyphWidth`].
    pub fn new(tree: Tree, styles: Rc<dyn StyleProvider>) -> Self {
        Self::with_measure(tree, styles, Box::new(AverageGlyphWidth::default()))
    }

    pub fn with_measure(tree: Tree, styles: Rc<dyn StyleProvider>, measure: Box<dyn TextMeasure>) -> Self {
        debug!(nodes = tree.len(), "root created");
        Self {
            tree,
            styles,
            measure,
            listeners: ListenerSet::default(),
            scheduler: RelayoutScheduler::new(),
            hits: SpatialIndex::new(),
        }
    }

    /// Build the tree from fully qualified class names and take ownership.
    pub fn from_class_names<I, S>(class_names: I, styles: Rc<dyn StyleProvider>) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(Tree::from_class_names(class_names)?, styles))
    }

    #[inline]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> Result<&TreeNode, TreeError> {
        self.tree.get(id).ok_or_else(|| TreeError::NotFound(id.to_string()))
    }

    /// Look a node up by its fully qualified name.
    pub fn get_by_name(&self, full_name: &str) -> Result<&TreeNode, TreeError> {
        self.tree.get_by_name(full_name).map(|id| self.tree.node(id))
    }

    pub fn add_listener(&mut self, listener: Box<dyn TreeListener>) {
        self.listeners.add(listener);
    }

    // =========================================================================
    // Fold State Machine
    // =========================================================================

    /// Fold an unfolded inner node.
    ///
    /// Returns `Ok(false)` without side effects for leaves, the root and
    /// nodes that are already folded.
    pub fn fold(&mut self, id: NodeId) -> Result<bool, TreeError> {
        self.change_fold_and_notify(id, true)
    }

    /// Unfold a folded node. Same contract as [`fold`](Self::fold).
    pub fn unfold(&mut self, id: NodeId) -> Result<bool, TreeError> {
        self.change_fold_and_notify(id, false)
    }

    /// Flip the fold state as a user interaction would.
    ///
    /// Returns the completion of the relayout that will show the change, or
    /// `None` if the node cannot be folded. `on_fold_finished` fires once,
    /// right after that relayout has run.
    pub fn toggle_fold(&mut self, id: NodeId) -> Result<Option<RelayoutCompletion>, TreeError> {
        self.tree.check(id)?;
        let folded = !self.tree.node(id).is_folded();
        if !self.set_folded(id, folded) {
            return Ok(None);
        }
        debug!(node = %self.tree.node(id).full_name(), folded, "fold toggled");
        Ok(Some(self.scheduler.request_with_fold_finished()))
    }

    fn change_fold_and_notify(&mut self, id: NodeId, folded: bool) -> Result<bool, TreeError> {
        self.tree.check(id)?;
        if !self.set_folded(id, folded) {
            return Ok(false);
        }
        debug!(node = %self.tree.node(id).full_name(), folded, "fold changed");
        self.listeners.notify_fold(self.tree.node(id));
        self.scheduler.request();
        Ok(true)
    }

    /// Set the fold flag of a foldable node. Returns whether anything changed.
    fn set_folded(&mut self, id: NodeId, folded: bool) -> bool {
        let node = self.tree.node_mut(id);
        if node.is_root() || node.is_leaf() || node.is_folded() == folded {
            return false;
        }
        node.state.set_folded(folded);
        true
    }

    /// Fold without requesting a relayout, notifying `on_fold`.
    fn fold_silently(&mut self, id: NodeId) -> bool {
        if !self.set_folded(id, true) {
            return false;
        }
        trace!(node = %self.tree.node(id).full_name(), "bulk fold");
        self.listeners.notify_fold(self.tree.node(id));
        true
    }

    // =========================================================================
    // Bulk Folds
    // =========================================================================

    /// Fold the topmost foldable node on every path from the root.
    ///
    /// Descendants of a folded node are never folded. Notifies `on_fold` in
    /// top-down discovery order and requests no relayout. Returns the number
    /// of nodes folded.
    pub fn fold_all_nodes(&mut self) -> usize {
        let mut folded = 0;
        let mut stack: Vec<NodeId> = self.current_children_rev(self.tree.root());
        while let Some(id) = stack.pop() {
            let node = self.tree.node(id);
            if node.is_leaf() || node.is_folded() {
                continue;
            }
            if self.fold_silently(id) {
                folded += 1;
            }
        }
        debug!(folded, "folded all top-level nodes");
        folded
    }

    /// Fold every inner node, children before their parents.
    ///
    /// Unlike [`fold_all_nodes`](Self::fold_all_nodes) this leaves nested
    /// nodes folded as well, so unfolding a package later reveals folded
    /// sub-packages. Notifies `on_fold` per newly folded node and requests
    /// no relayout.
    pub fn fold_all_nodes_recursively(&mut self) -> usize {
        let mut order = Vec::with_capacity(self.tree.len());
        let mut stack = vec![self.tree.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.tree.node(id).all_children().iter());
        }

        let mut folded = 0;
        for id in order.into_iter().rev() {
            if self.fold_silently(id) {
                folded += 1;
            }
        }
        debug!(folded, "folded all nodes recursively");
        folded
    }

    /// Fold the shallowest nodes whose subtree contains none of `required`.
    ///
    /// Walking down from the root, a node whose subtree (itself included)
    /// contains a required node is descended into; any other node is folded
    /// and its subtree skipped. An empty `required` folds nothing. Notifies
    /// `on_fold` per folded node and requests no relayout.
    pub fn fold_nodes_with_minimum_depth_that_have_not_descendants(
        &mut self,
        required: &HashSet<NodeId>,
    ) -> usize {
        let required: HashSet<NodeId> = required
            .iter()
            .copied()
            .filter(|&id| {
                let known = self.tree.get(id).is_some();
                if !known {
                    warn!(node = %id, "ignoring unknown required node");
                }
                known
            })
            .collect();
        if required.is_empty() {
            return 0;
        }

        let keep_open = self.tree.subtrees_containing(&required);
        let mut folded = 0;
        let mut stack = vec![self.tree.root()];
        while let Some(id) = stack.pop() {
            if keep_open.contains(&id) {
                stack.extend(self.current_children_rev(id));
            } else if self.fold_silently(id) {
                folded += 1;
            }
        }
        debug!(folded, required = required.len(), "folded nodes without required descendants");
        folded
    }

    fn current_children_rev(&self, id: NodeId) -> Vec<NodeId> {
        self.tree.node(id).current_children().iter().rev().copied().collect()
    }

    // =========================================================================
    // Relayout Scheduling
    // =========================================================================

    /// Request a relayout of the visible tree, coalescing with a pending one.
    pub fn relayout_completely(&mut self) -> RelayoutCompletion {
        self.scheduler.request()
    }

    /// Request a relayout pass of its own, regardless of pending ones.
    pub fn enforce_complete_relayout(&mut self) -> RelayoutCompletion {
        self.scheduler.enforce()
    }

    /// Completion of the newest requested pass; resolved if nothing is queued.
    pub fn update_completion(&self) -> RelayoutCompletion {
        self.scheduler.latest_completion()
    }

    pub fn has_pending_relayout(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Run the oldest queued pass, if any.
    ///
    /// Style parameters are read now. Invalid styles fail the pass: layouts
    /// stay as they were, no listener is notified and the completion
    /// resolves with the error.
    pub fn run_next_relayout(&mut self) -> Option<Result<PassSummary, LayoutError>> {
        let pass = self.scheduler.start_next()?;
        trace!(pass = pass.id, enforced = pass.enforced, requests = pass.requests, "relayout started");

        let result = LayoutParams::from_provider(self.styles.as_ref()).map(|params| {
            let laid_out = apply_layout(&mut self.tree, &params, self.measure.as_ref());
            self.rebuild_hit_index();
            PassSummary {
                pass: pass.id,
                requests: pass.requests,
                laid_out,
            }
        });

        match &result {
            Ok(_) => {
                self.listeners.notify_layout_changed();
                for _ in 0..pass.fold_finished {
                    self.listeners.notify_fold_finished();
                }
            }
            Err(err) => warn!(pass = pass.id, %err, "relayout failed"),
        }

        self.scheduler.finish(pass, result);
        Some(result)
    }

    /// Run every queued pass in order. Returns the number of passes run.
    pub fn run_pending_relayouts(&mut self) -> usize {
        let mut ran = 0;
        while self.run_next_relayout().is_some() {
            ran += 1;
        }
        ran
    }

    // =========================================================================
    // Hit Testing
    // =========================================================================

    fn rebuild_hit_index(&mut self) {
        let circles = self
            .tree
            .visible_nodes()
            .into_iter()
            .map(|id| {
                let node = self.tree.node(id);
                let layout = node.layout();
                NodeCircle::new(id, layout.x, layout.y, layout.radius, node.depth())
            })
            .collect();
        self.hits.rebuild(circles);
    }

    /// Deepest visible node whose circle contains the point, as of the last
    /// successful pass.
    pub fn node_at(&self, x: f64, y: f64) -> Option<NodeId> {
        self.hits.at_point(x, y)
    }

    /// Visible nodes whose bounding square intersects the rectangle.
    pub fn nodes_in_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<NodeId> {
        self.hits.in_rect(min_x, min_y, max_x, max_y)
    }
}

impl std::fmt::Debug for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Root")
            .field("nodes", &self.tree.len())
            .field("listeners", &self.listeners.len())
            .field("scheduler", &self.scheduler)
            .field("hits", &self.hits)
            .finish()
    }
}
