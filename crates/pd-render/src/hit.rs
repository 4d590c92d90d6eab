//! Hit testing: point, rectangle and eraser-disc queries against a scene.
//!
//! Walks items front-to-back (reverse paint order). Transient previews
//! and hidden items never hit.

use pd_core::geometry::rects_overlap;
use pd_core::id::ItemId;
use pd_core::model::{Item, Scene};
use pd_core::{Point, Rect};

fn hittable(item: &Item) -> bool {
    item.visible && !item.transient
}

/// Find the topmost selectable item under `p`.
/// `slop` widens thin strokes; returns `None` on empty canvas.
pub fn hit_test(scene: &Scene, p: Point, slop: f64, tolerance: f64) -> Option<ItemId> {
    scene
        .paint_order()
        .into_iter()
        .rev()
        .filter(|it| hittable(it) && it.selectable)
        // cheap reject before building the flattened shape
        .filter(|it| it.scene_bbox().inflate(slop, slop).contains(p))
        .find(|it| it.hit_shape(tolerance).contains(p, slop))
        .map(|it| it.id)
}

/// All selectable items whose scene bounding box intersects `rect`.
/// Used for rubber-band selection.
pub fn hit_test_rect(scene: &Scene, rect: Rect) -> Vec<ItemId> {
    scene
        .items()
        .filter(|it| hittable(it) && it.selectable)
        .filter(|it| rects_overlap(it.scene_bbox(), rect))
        .map(|it| it.id)
        .collect()
}

/// All persistent items whose shape touches the disc at `center`.
/// Used by the eraser.
pub fn items_in_circle(scene: &Scene, center: Point, radius: f64, tolerance: f64) -> Vec<ItemId> {
    let query = Rect::from_center_size(center, (2.0 * radius, 2.0 * radius));
    scene
        .items()
        .filter(|it| hittable(it))
        .filter(|it| rects_overlap(it.scene_bbox(), query))
        .filter(|it| it.hit_shape(tolerance).intersects_circle(center, radius))
        .map(|it| it.id)
        .collect()
}
