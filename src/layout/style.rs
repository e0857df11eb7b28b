//! Style parameters consumed by the geometry engine.
//!
//! The style source is read-only from the layout's point of view: a relayout
//! pass snapshots padding and font size into [`LayoutParams`] when it starts,
//! so setters only take effect on the next pass.

use std::cell::Cell;

use serde::Deserialize;

use crate::error::LayoutError;

/// Default space between sibling circles and between a child and its parent.
pub const DEFAULT_CIRCLE_PADDING: f64 = 1.5;
/// Default height of node labels.
pub const DEFAULT_NODE_FONT_SIZE: f64 = 10.0;

/// Source of the style parameters a relayout pass depends on.
pub trait StyleProvider {
    fn circle_padding(&self) -> f64;
    fn node_font_size(&self) -> f64;
}

/// Runtime-adjustable styles with interior mutability, so one instance can
/// be shared between the host and the [`Root`](crate::root::Root).
#[derive(Debug)]
pub struct VisualizationStyles {
    circle_padding: Cell<f64>,
    node_font_size: Cell<f64>,
}

impl VisualizationStyles {
    pub fn new() -> Self {
        Self {
            circle_padding: Cell::new(DEFAULT_CIRCLE_PADDING),
            node_font_size: Cell::new(DEFAULT_NODE_FONT_SIZE),
        }
    }

    pub fn set_circle_padding(&self, padding: f64) {
        self.circle_padding.set(padding);
    }

    pub fn reset_circle_padding(&self) {
        self.circle_padding.set(DEFAULT_CIRCLE_PADDING);
    }

    pub fn set_node_font_size(&self, font_size: f64) {
        self.node_font_size.set(font_size);
    }

    pub fn reset_node_font_size(&self) {
        self.node_font_size.set(DEFAULT_NODE_FONT_SIZE);
    }

    /// Overwrite the values present in `settings`, keep the others.
    pub fn apply(&self, settings: &StyleSettings) {
        if let Some(padding) = settings.circle_padding {
            self.set_circle_padding(padding);
        }
        if let Some(font_size) = settings.node_font_size {
            self.set_node_font_size(font_size);
        }
    }
}

impl Default for VisualizationStyles {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleProvider for VisualizationStyles {
    fn circle_padding(&self) -> f64 {
        self.circle_padding.get()
    }

    fn node_font_size(&self) -> f64 {
        self.node_font_size.get()
    }
}

/// Partial style update, as passed in from JavaScript.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleSettings {
    pub circle_padding: Option<f64>,
    pub node_font_size: Option<f64>,
}

/// Validated style snapshot for a single pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub circle_padding: f64,
    pub node_font_size: f64,
}

impl LayoutParams {
    pub fn new(circle_padding: f64, node_font_size: f64) -> Result<Self, LayoutError> {
        if !circle_padding.is_finite() || circle_padding < 0.0 {
            return Err(LayoutError::InvalidPadding(circle_padding));
        }
        if !node_font_size.is_finite() || node_font_size <= 0.0 {
            return Err(LayoutError::InvalidFontSize(node_font_size));
        }
        Ok(Self {
            circle_padding,
            node_font_size,
        })
    }

    pub fn from_provider(styles: &dyn StyleProvider) -> Result<Self, LayoutError> {
        Self::new(styles.circle_padding(), styles.node_font_size())
    }
}

/// Measures the rendered width of a label.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font_size: f64) -> f64;
}

/// Width estimate from an average glyph width relative to the font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageGlyphWidth {
    /// Glyph width as a fraction of the font size (default: 0.6).
    pub ratio: f64,
}

impl Default for AverageGlyphWidth {
    fn default() -> Self {
        Self { ratio: 0.6 }
    }
}

impl TextMeasure for AverageGlyphWidth {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_reset() {
        let styles = VisualizationStyles::new();
        assert_eq!(styles.circle_padding(), DEFAULT_CIRCLE_PADDING);
        assert_eq!(styles.node_font_size(), DEFAULT_NODE_FONT_SIZE);

        styles.set_circle_padding(20.0);
        styles.set_node_font_size(30.0);
        assert_eq!(styles.circle_padding(), 20.0);
        assert_eq!(styles.node_font_size(), 30.0);

        styles.reset_circle_padding();
        styles.reset_node_font_size();
        assert_eq!(styles.circle_padding(), DEFAULT_CIRCLE_PADDING);
        assert_eq!(styles.node_font_size(), DEFAULT_NODE_FONT_SIZE);
    }

    #[test]
    fn test_apply_partial_settings() {
        let styles = VisualizationStyles::new();
        styles.apply(&StyleSettings {
            circle_padding: Some(4.0),
            node_font_size: None,
        });
        assert_eq!(styles.circle_padding(), 4.0);
        assert_eq!(styles.node_font_size(), DEFAULT_NODE_FONT_SIZE);
    }

    #[test]
    fn test_params_validation() {
        assert!(LayoutParams::new(0.0, 10.0).is_ok());
        assert_eq!(LayoutParams::new(-1.0, 10.0), Err(LayoutError::InvalidPadding(-1.0)));
        assert_eq!(LayoutParams::new(1.0, 0.0), Err(LayoutError::InvalidFontSize(0.0)));
        assert!(LayoutParams::new(f64::NAN, 10.0).is_err());
        assert!(LayoutParams::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_average_glyph_width() {
        let measure = AverageGlyphWidth::default();
        assert_eq!(measure.text_width("", 10.0), 0.0);
        assert!((measure.text_width("abcde", 10.0) - 30.0).abs() < 1e-12);
    }
}
