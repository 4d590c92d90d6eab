//! Pan/zoom state of the view onto the infinite scene.

use kurbo::{Affine, Point, Vec2};

pub const MIN_ZOOM: f64 = 0.05;
pub const MAX_ZOOM: f64 = 40.0;

/// `pan` is in screen pixels, `zoom` is pixels per scene unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan: Vec2,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn screen_to_scene(&self, screen: Point) -> Point {
        ((screen.to_vec2() - self.pan) / self.zoom).to_point()
    }

    pub fn scene_to_screen(&self, scene: Point) -> Point {
        (scene.to_vec2() * self.zoom + self.pan).to_point()
    }

    /// Convert a screen-space length (pixels) to scene units.
    pub fn screen_dist_to_scene(&self, px: f64) -> f64 {
        px / self.zoom
    }

    /// Scene → screen affine, for renderers.
    pub fn affine(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    /// Multiply the zoom by `factor`, keeping `anchor` (screen space) fixed.
    pub fn zoom_about(&mut self, anchor: Point, factor: f64) {
        let scene_anchor = self.screen_to_scene(anchor);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = anchor.to_vec2() - scene_anchor.to_vec2() * self.zoom;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Back to the origin at 100 %.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
