//! Error types for tree lookup, geometry and listener dispatch.

use thiserror::Error;

/// Errors raised by tree construction and lookups.
///
/// These indicate programming errors on the caller's side (asking for a node
/// that does not exist, feeding a malformed class name) and are propagated
/// rather than absorbed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("node not found: {0}")]
    NotFound(String),

    #[error("invalid class name: {0:?}")]
    InvalidClassName(String),
}

/// Errors raised by a relayout pass.
///
/// The geometry never fails for valid style parameters, so any of these
/// means the style source is misconfigured.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum LayoutError {
    #[error("circle padding must be finite and non-negative, got {0}")]
    InvalidPadding(f64),

    #[error("node font size must be finite and positive, got {0}")]
    InvalidFontSize(f64),
}

/// Failure reported by a single listener callback.
///
/// Dispatch logs it and moves on to the next listener.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
