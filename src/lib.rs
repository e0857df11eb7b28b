//! Foldpack - WASM Module
//!
//! This module provides the core tree, fold state machine and circle-packing
//! geometry for the Foldpack class/package visualization. It is compiled to
//! WebAssembly and exposes a JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `tree`: Arena-backed class/package tree built from class names
//! - `root`: Tree owner, fold state machine, listeners and relayout scheduling
//! - `layout`: Circle packing and label placement for the visible tree
//! - `spatial`: R-tree spatial indexing for O(log n) hit testing
//!
//! Relayouts are deferred. Fold operations only queue a pass; the host calls
//! `runPendingRelayouts` from its event loop (for example once per animation
//! frame) and redraws when `onLayoutChanged` fires.

use std::collections::HashSet;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

pub mod error;
pub mod layout;
pub mod root;
pub mod spatial;
pub mod tree;

use error::{LayoutError, ListenerError, TreeError};
use layout::{StyleSettings, VisualizationStyles};
use root::{Root, TreeListener};
use tree::{NodeId, TreeNode};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Main entry point for the fold tree.
///
/// Nodes are addressed by their fully qualified names (`com.example`,
/// `com.example.Foo$Bar`). The unnamed root is addressed by `""`.
#[wasm_bindgen]
pub struct FoldTreeWasm {
    root: Root,
    styles: Rc<VisualizationStyles>,
}

#[wasm_bindgen]
impl FoldTreeWasm {
    /// Build the tree from fully qualified class names.
    #[wasm_bindgen(constructor)]
    pub fn new(class_names: Vec<String>) -> Result<FoldTreeWasm, JsError> {
        let styles = Rc::new(VisualizationStyles::new());
        let root = Root::from_class_names(&class_names, styles.clone())?;
        Ok(Self { root, styles })
    }

    /// Number of nodes including the root.
    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> usize {
        self.root.tree().len()
    }

    // =========================================================================
    // Folding
    // =========================================================================

    /// Fold a node. Returns false if it was already folded or is a leaf.
    pub fn fold(&mut self, name: &str) -> Result<bool, JsError> {
        let id = self.resolve(name)?;
        Ok(self.root.fold(id)?)
    }

    /// Unfold a node. Returns false if it was not folded.
    pub fn unfold(&mut self, name: &str) -> Result<bool, JsError> {
        let id = self.resolve(name)?;
        Ok(self.root.unfold(id)?)
    }

    /// Toggle a node as a click would. `onFoldFinished` fires after the
    /// relayout that shows the change. Returns false for leaves.
    #[wasm_bindgen(js_name = toggleFold)]
    pub fn toggle_fold(&mut self, name: &str) -> Result<bool, JsError> {
        let id = self.resolve(name)?;
        Ok(self.root.toggle_fold(id)?.is_some())
    }

    /// Fold the topmost foldable node on every path. Does not relayout.
    #[wasm_bindgen(js_name = foldAllNodes)]
    pub fn fold_all_nodes(&mut self) -> usize {
        self.root.fold_all_nodes()
    }

    /// Fold every inner node. Does not relayout.
    #[wasm_bindgen(js_name = foldAllNodesRecursively)]
    pub fn fold_all_nodes_recursively(&mut self) -> usize {
        self.root.fold_all_nodes_recursively()
    }

    /// Fold the shallowest nodes that contain none of the named nodes.
    ///
    /// Fails on an unknown name without folding anything. Does not relayout.
    #[wasm_bindgen(js_name = foldNodesWithMinimumDepthThatHaveNotDescendants)]
    pub fn fold_nodes_with_minimum_depth_that_have_not_descendants(
        &mut self,
        names: Vec<String>,
    ) -> Result<usize, JsError> {
        let required = names
            .iter()
            .map(|name| self.resolve(name))
            .collect::<Result<HashSet<NodeId>, TreeError>>()?;
        Ok(self
            .root
            .fold_nodes_with_minimum_depth_that_have_not_descendants(&required))
    }

    // =========================================================================
    // Relayout
    // =========================================================================

    /// Queue a relayout, coalescing with a pending one.
    #[wasm_bindgen(js_name = relayoutCompletely)]
    pub fn relayout_completely(&mut self) {
        self.root.relayout_completely();
    }

    /// Queue a relayout pass of its own.
    #[wasm_bindgen(js_name = enforceCompleteRelayout)]
    pub fn enforce_complete_relayout(&mut self) {
        self.root.enforce_complete_relayout();
    }

    #[wasm_bindgen(js_name = hasPendingRelayout)]
    pub fn has_pending_relayout(&self) -> bool {
        self.root.has_pending_relayout()
    }

    /// Run every queued pass. Returns the number of passes run.
    ///
    /// All passes run even if one fails; the first failure is returned.
    #[wasm_bindgen(js_name = runPendingRelayouts)]
    pub fn run_pending_relayouts(&mut self) -> Result<usize, JsError> {
        let mut ran = 0;
        let mut failure: Option<LayoutError> = None;
        while let Some(result) = self.root.run_next_relayout() {
            ran += 1;
            if let Err(err) = result {
                failure.get_or_insert(err);
            }
        }
        match failure {
            Some(err) => Err(err.into()),
            None => Ok(ran),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[wasm_bindgen(js_name = isFolded)]
    pub fn is_folded(&self, name: &str) -> Result<bool, JsError> {
        Ok(self.node(name)?.is_folded())
    }

    #[wasm_bindgen(js_name = isCurrentlyLeaf)]
    pub fn is_currently_leaf(&self, name: &str) -> Result<bool, JsError> {
        Ok(self.node(name)?.is_currently_leaf())
    }

    /// Full names of the visible children of a node.
    #[wasm_bindgen(js_name = getCurrentChildren)]
    pub fn get_current_children(&self, name: &str) -> Result<Vec<String>, JsError> {
        let node = self.node(name)?;
        Ok(self.names(node.current_children().iter().copied()))
    }

    /// Layout of a node as `{x, y, radius, label: {x, y, width, height}}`.
    #[wasm_bindgen(js_name = getLayout)]
    pub fn get_layout(&self, name: &str) -> Result<JsValue, JsError> {
        let node = self.node(name)?;
        Ok(serde_wasm_bindgen::to_value(node.layout())?)
    }

    /// Full names of the visible nodes in drawing order (parents first).
    #[wasm_bindgen(js_name = visibleNodes)]
    pub fn visible_nodes(&self) -> Vec<String> {
        self.names(self.root.tree().visible_nodes())
    }

    /// Deepest visible node at a point, as of the last relayout.
    #[wasm_bindgen(js_name = nodeAt)]
    pub fn node_at(&self, x: f64, y: f64) -> Option<String> {
        self.root
            .node_at(x, y)
            .map(|id| self.root.tree().node(id).full_name().to_owned())
    }

    // =========================================================================
    // Styles
    // =========================================================================

    /// Takes effect on the next relayout pass.
    #[wasm_bindgen(js_name = setCirclePadding)]
    pub fn set_circle_padding(&mut self, padding: f64) {
        self.styles.set_circle_padding(padding);
    }

    /// Takes effect on the next relayout pass.
    #[wasm_bindgen(js_name = setNodeFontSize)]
    pub fn set_node_font_size(&mut self, font_size: f64) {
        self.styles.set_node_font_size(font_size);
    }

    /// Apply `{circlePadding?, nodeFontSize?}`; missing keys are kept.
    #[wasm_bindgen(js_name = setStyles)]
    pub fn set_styles(&mut self, settings: JsValue) -> Result<(), JsError> {
        let settings: StyleSettings = serde_wasm_bindgen::from_value(settings)?;
        self.styles.apply(&settings);
        Ok(())
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Register a listener object.
    ///
    /// Any of `onFold(name)`, `onFoldFinished()` and `onLayoutChanged()` may
    /// be present; missing ones are skipped. Exceptions thrown by a callback
    /// are logged and do not affect other listeners.
    #[wasm_bindgen(js_name = addListener)]
    pub fn add_listener(&mut self, listener: JsValue) {
        self.root.add_listener(Box::new(JsListener { target: listener }));
    }
}

impl FoldTreeWasm {
    fn resolve(&self, name: &str) -> Result<NodeId, TreeError> {
        self.root.get_by_name(name).map(TreeNode::id)
    }

    fn node(&self, name: &str) -> Result<&TreeNode, TreeError> {
        let id = self.resolve(name)?;
        self.root.node(id)
    }

    fn names(&self, ids: impl IntoIterator<Item = NodeId>) -> Vec<String> {
        ids.into_iter()
            .map(|id| self.root.tree().node(id).full_name().to_owned())
            .collect()
    }
}

/// Adapter from a plain JavaScript object to [`TreeListener`].
struct JsListener {
    target: JsValue,
}

impl JsListener {
    /// Invoke `target[method](...args)` if it is a function.
    fn call(&self, method: &str, args: &[JsValue]) -> Result<(), ListenerError> {
        let callback = js_sys::Reflect::get(&self.target, &JsValue::from_str(method))
            .map_err(|err| ListenerError::new(describe(method, &err)))?;
        let Ok(function) = callback.dyn_into::<js_sys::Function>() else {
            return Ok(());
        };
        let result = match args {
            [] => function.call0(&self.target),
            [arg] => function.call1(&self.target, arg),
            _ => function.apply(&self.target, &args.iter().collect::<js_sys::Array>()),
        };
        result
            .map(|_| ())
            .map_err(|err| ListenerError::new(describe(method, &err)))
    }
}

fn describe(method: &str, err: &JsValue) -> String {
    let message = err.as_string().unwrap_or_else(|| format!("{err:?}"));
    format!("{method}: {message}")
}

impl TreeListener for JsListener {
    fn on_fold(&mut self, node: &TreeNode) -> Result<(), ListenerError> {
        self.call("onFold", &[JsValue::from_str(node.full_name())])
    }

    fn on_fold_finished(&mut self) -> Result<(), ListenerError> {
        self.call("onFoldFinished", &[])
    }

    fn on_layout_changed(&mut self) -> Result<(), ListenerError> {
        self.call("onLayoutChanged", &[])
    }
}
