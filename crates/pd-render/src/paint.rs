//! Scene → Vello drawing commands.
//!
//! Items are stroked in scene space under the viewport affine; the
//! transform overlay is drawn afterwards in screen space so its handles
//! keep a fixed pixel size at any zoom.

use kurbo::{Affine, Circle, Line, Point, Rect, Size, Stroke};
use pd_core::model::{Item, ItemKind, Scene};
use pd_core::viewport::Viewport;
use peniko::{Blob, Color, Fill, Image, ImageFormat};
use std::sync::Arc;
use vello::Scene as VelloScene;

const INK: Color = Color::from_rgba8(20, 20, 20, 255);
const PREVIEW_INK: Color = Color::from_rgba8(90, 90, 90, 200);
const GRID_INK: Color = Color::from_rgba8(235, 235, 235, 255);
const AXIS_INK: Color = Color::from_rgba8(210, 210, 210, 255);
const OVERLAY_INK: Color = Color::from_rgba8(40, 120, 255, 180);
const HANDLE_FILL: Color = Color::from_rgba8(255, 255, 255, 255);

/// Render-facing copy of the transform overlay geometry, in scene space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayShape {
    /// TL, TR, BR, BL of the target's mapped bounding box.
    pub quad: [Point; 4],
    pub handles: [Point; 8],
    pub rotate_handle: Point,
    /// Handle side length in screen pixels.
    pub handle_size_px: f64,
}

/// Paint all visible items back to front, then the overlay (if any).
///
/// Call once per frame with a freshly-cleared `VelloScene`.
pub fn paint_scene(
    out: &mut VelloScene,
    scene: &Scene,
    viewport: &Viewport,
    overlay: Option<&OverlayShape>,
    tolerance: f64,
) {
    for item in scene.paint_order() {
        if item.visible {
            paint_item(out, item, viewport, tolerance);
        }
    }
    if let Some(shape) = overlay {
        paint_overlay(out, shape, viewport);
    }
}

fn paint_item(out: &mut VelloScene, item: &Item, viewport: &Viewport, tolerance: f64) {
    let transform = viewport.affine() * item.scene_transform();

    match &item.kind {
        ItemKind::Pixmap { image, .. } => {
            let data: Arc<dyn AsRef<[u8]> + Send + Sync> = Arc::new(image.rgba.clone());
            let img = Image::new(Blob::new(data), ImageFormat::Rgba8, image.width, image.height);
            let corner = Affine::translate((
                -(image.width as f64) / 2.0,
                -(image.height as f64) / 2.0,
            ));
            out.draw_image(&img, transform * corner);
        }
        ItemKind::Label { text, .. } => {
            // Glyph shaping belongs to the shell's text stack.
            log::trace!("LABEL {} {:?} at {:?}", item.id, text, item.pos);
        }
        _ => {
            let path = item.kind.local_path(tolerance);
            let mut stroke = Stroke::new(item.stroke_width);
            let ink = if item.transient {
                stroke = stroke.with_dashes(0.0, [4.0, 4.0]);
                PREVIEW_INK
            } else {
                INK
            };
            out.stroke(&stroke, transform, ink, None, &path);
        }
    }
}

fn paint_overlay(out: &mut VelloScene, shape: &OverlayShape, viewport: &Viewport) {
    let screen = |p: Point| viewport.scene_to_screen(p);
    let frame = Stroke::new(1.5);

    for i in 0..4 {
        let edge = Line::new(screen(shape.quad[i]), screen(shape.quad[(i + 1) % 4]));
        out.stroke(&frame, Affine::IDENTITY, OVERLAY_INK, None, &edge);
    }

    let side = shape.handle_size_px;
    for &h in &shape.handles {
        let square = Rect::from_center_size(screen(h), Size::new(side, side));
        out.fill(Fill::NonZero, Affine::IDENTITY, HANDLE_FILL, None, &square);
        out.stroke(&frame, Affine::IDENTITY, OVERLAY_INK, None, &square);
    }

    let knob = Circle::new(screen(shape.rotate_handle), side / 2.0);
    out.fill(Fill::NonZero, Affine::IDENTITY, HANDLE_FILL, None, &knob);
    out.stroke(&frame, Affine::IDENTITY, OVERLAY_INK, None, &knob);
}

/// Grid lines and axes covering the visible part of the scene.
pub fn paint_grid(out: &mut VelloScene, viewport: &Viewport, screen: Size, grid: f64) {
    if grid <= 0.0 {
        return;
    }
    let tl = viewport.screen_to_scene(Point::ORIGIN);
    let br = viewport.screen_to_scene(Point::new(screen.width, screen.height));
    // Lines closer than 4px merge into noise.
    if grid * viewport.zoom < 4.0 {
        return;
    }

    let hairline = Stroke::new(1.0);
    let to_screen = viewport.affine();

    let mut x = (tl.x / grid).floor() * grid;
    while x <= br.x {
        let line = Line::new(to_screen * Point::new(x, tl.y), to_screen * Point::new(x, br.y));
        out.stroke(&hairline, Affine::IDENTITY, GRID_INK, None, &line);
        x += grid;
    }
    let mut y = (tl.y / grid).floor() * grid;
    while y <= br.y {
        let line = Line::new(to_screen * Point::new(tl.x, y), to_screen * Point::new(br.x, y));
        out.stroke(&hairline, Affine::IDENTITY, GRID_INK, None, &line);
        y += grid;
    }

    let axis = Stroke::new(2.0);
    let x_axis = Line::new(to_screen * Point::new(tl.x, 0.0), to_screen * Point::new(br.x, 0.0));
    let y_axis = Line::new(to_screen * Point::new(0.0, tl.y), to_screen * Point::new(0.0, br.y));
    out.stroke(&axis, Affine::IDENTITY, AXIS_INK, None, &x_axis);
    out.stroke(&axis, Affine::IDENTITY, AXIS_INK, None, &y_axis);
}
