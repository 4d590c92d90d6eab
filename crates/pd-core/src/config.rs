//! Editor tunables.
//!
//! Every magic number the tools and overlay rely on lives here so the
//! shell can override them from a JSON settings blob. Screen-space values
//! carry a `_px` suffix and are divided by the viewport zoom at use sites.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid editor config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid editor config: {0}")]
    Invalid(String),
}

/// Configuration for the editing engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Grid pitch in scene units.
    pub grid_size: f64,
    /// Size of a dropped "Rectangle" token.
    pub rect_size: (f64, f64),
    /// Size of a dropped "Ellipse" token.
    pub ellipse_size: (f64, f64),
    /// Default font size of new labels, in points.
    pub label_font_size: f64,
    /// Label font size limits used by "scale selected".
    pub label_font_min: f64,
    pub label_font_max: f64,
    /// Side of a resize handle square, in pixels.
    pub handle_size_px: f64,
    /// Extra hit slop around handles, in pixels.
    pub handle_slop_px: f64,
    /// Distance from the top edge to the rotate handle, in pixels.
    pub rotate_offset_px: f64,
    /// Hit slop for thin strokes, in pixels.
    pub hit_slop_px: f64,
    /// Eraser cursor radius, in pixels.
    pub eraser_radius_px: f64,
    /// Minimum pointer travel before the pen records another point.
    pub pen_jitter: f64,
    /// Lines shorter than this are discarded on release.
    pub min_line_length: f64,
    /// Arc start points closer than this to the center are rejected.
    pub arc_min_radius: f64,
    /// Radius of the arc tool's center/start/end markers, in pixels.
    pub marker_radius_px: f64,
    /// Scale clamp applied by resize handles and "scale selected".
    pub scale_min: f64,
    pub scale_max: f64,
    /// Stroke width of drawn items.
    pub stroke_width: f64,
    /// Flattening tolerance for polyline approximations.
    pub flatten_tolerance: f64,
    /// Degrees of rotation per wheel notch with the rotate modifier.
    pub wheel_rotate_step: f64,
    /// Relative zoom/scale change per wheel notch.
    pub wheel_zoom_step: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            rect_size: (120.0, 80.0),
            ellipse_size: (120.0, 80.0),
            label_font_size: 14.0,
            label_font_min: 6.0,
            label_font_max: 96.0,
            handle_size_px: 10.0,
            handle_slop_px: 2.0,
            rotate_offset_px: 24.0,
            hit_slop_px: 4.0,
            eraser_radius_px: 12.0,
            pen_jitter: 2.0,
            min_line_length: 1.0,
            arc_min_radius: 1.0,
            marker_radius_px: 3.0,
            scale_min: 0.1,
            scale_max: 10.0,
            stroke_width: 2.0,
            flatten_tolerance: 0.25,
            wheel_rotate_step: 10.0,
            wheel_zoom_step: 0.1,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON object; missing keys keep defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "grid_size must be positive, got {}",
                self.grid_size
            )));
        }
        if !(self.scale_min > 0.0 && self.scale_min <= self.scale_max) {
            return Err(ConfigError::Invalid(format!(
                "scale limits out of order: {}..{}",
                self.scale_min, self.scale_max
            )));
        }
        if self.label_font_min > self.label_font_max {
            return Err(ConfigError::Invalid(format!(
                "label font limits out of order: {}..{}",
                self.label_font_min, self.label_font_max
            )));
        }
        if self.flatten_tolerance <= 0.0 {
            return Err(ConfigError::Invalid("flatten_tolerance must be positive".into()));
        }
        Ok(())
    }

    /// Clamp a scale factor into the configured range.
    pub fn clamp_scale(&self, s: f64) -> f64 {
        s.clamp(self.scale_min, self.scale_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "grid_size": 10.0 }"#).unwrap();
        assert_eq!(config.grid_size, 10.0);
        assert_eq!(config.rect_size, (120.0, 80.0));
        assert_eq!(config.rotate_offset_px, 24.0);
    }

    #[test]
    fn rejects_zero_grid() {
        let err = EditorConfig::from_json(r#"{ "grid_size": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = EditorConfig::from_json("{ grid_size: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn clamp_scale_uses_limits() {
        let config = EditorConfig::default();
        assert_eq!(config.clamp_scale(0.01), 0.1);
        assert_eq!(config.clamp_scale(42.0), 10.0);
        assert_eq!(config.clamp_scale(1.5), 1.5);
    }
}
