//! Listener capabilities and isolated dispatch.
//!
//! A listener implements any subset of the three callbacks; the default
//! bodies do nothing, so a listener that only cares about layout changes
//! implements `on_layout_changed` and nothing else.

use tracing::warn;

use crate::error::ListenerError;
use crate::tree::TreeNode;

/// Observer of fold and layout events.
pub trait TreeListener {
    /// A node changed its fold state through `fold`, `unfold` or a bulk fold.
    fn on_fold(&mut self, _node: &TreeNode) -> Result<(), ListenerError> {
        Ok(())
    }

    /// A user toggle finished, including the relayout it triggered.
    fn on_fold_finished(&mut self) -> Result<(), ListenerError> {
        Ok(())
    }

    /// A relayout pass wrote new geometry into the visible nodes.
    fn on_layout_changed(&mut self) -> Result<(), ListenerError> {
        Ok(())
    }
}

/// The registered listeners, notified in registration order.
#[derive(Default)]
pub(crate) struct ListenerSet {
    listeners: Vec<Box<dyn TreeListener>>,
}

impl ListenerSet {
    pub fn add(&mut self, listener: Box<dyn TreeListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn notify_fold(&mut self, node: &TreeNode) {
        self.dispatch("on_fold", |listener| listener.on_fold(node));
    }

    pub fn notify_fold_finished(&mut self) {
        self.dispatch("on_fold_finished", |listener| listener.on_fold_finished());
    }

    pub fn notify_layout_changed(&mut self) {
        self.dispatch("on_layout_changed", |listener| listener.on_layout_changed());
    }

    /// A failing listener is logged and skipped; the others still run.
    fn dispatch<F>(&mut self, event: &str, mut call: F)
    where
        F: FnMut(&mut dyn TreeListener) -> Result<(), ListenerError>,
    {
        for (index, listener) in self.listeners.iter_mut().enumerate() {
            if let Err(err) = call(listener.as_mut()) {
                warn!(event, listener = index, %err, "listener failed");
            }
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.listeners.len())
            .finish()
    }
}
