//! Export view: resolved scene-space geometry for rasterizers and vector
//! writers.
//!
//! Only visible, persistent items appear. Previews, gesture markers and
//! the transform overlay never do (the overlay is not a scene item).

use crate::id::ItemId;
use crate::model::{Item, ItemKind, Scene};
use kurbo::{Point, Rect};
use serde::Serialize;

/// Margin added around the exported drawing, in scene units.
pub const EXPORT_MARGIN: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportGeometry {
    Segment { a: Point, b: Point },
    /// Closed outline; the last point is not repeated.
    Polygon { points: Vec<Point> },
    /// Open polyline approximation of a curve.
    Polyline { points: Vec<Point> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportItem {
    pub id: ItemId,
    pub tag: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    pub geometry: ExportGeometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Scene position of the bounding-box center.
    pub center: Point,
    pub rotation: f64,
}

/// Every visible persistent item, back to front.
pub fn export_scene(scene: &Scene, tolerance: f64) -> Vec<ExportItem> {
    scene
        .paint_order()
        .into_iter()
        .filter(|it| it.visible && !it.transient)
        .map(|it| export_item(it, tolerance))
        .collect()
}

fn export_item(item: &Item, tolerance: f64) -> ExportItem {
    let geometry = match &item.kind {
        ItemKind::Line { a, b } => ExportGeometry::Segment {
            a: item.map_to_scene(*a),
            b: item.map_to_scene(*b),
        },
        ItemKind::Pixmap { .. } | ItemKind::Label { .. } => ExportGeometry::Polygon {
            points: item.scene_corners().to_vec(),
        },
        ItemKind::Rectangle { .. } | ItemKind::Ellipse { .. } => {
            let mut points = item.scene_polyline(tolerance);
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            ExportGeometry::Polygon { points }
        }
        ItemKind::FreehandPath { .. } | ItemKind::Arc { .. } => ExportGeometry::Polyline {
            points: item.scene_polyline(tolerance),
        },
    };
    let (asset, text) = match &item.kind {
        ItemKind::Pixmap { asset, .. } => (Some(asset.clone()), None),
        ItemKind::Label { text, .. } => (None, Some(text.clone())),
        _ => (None, None),
    };
    ExportItem {
        id: item.id,
        tag: item.kind.tag(),
        asset,
        geometry,
        text,
        center: item.map_to_scene(item.origin()),
        rotation: item.transform.rotation,
    }
}

/// Scene bounds of the exported drawing plus [`EXPORT_MARGIN`], or `None`
/// for an empty drawing.
pub fn export_bounds(scene: &Scene) -> Option<Rect> {
    scene
        .persistent_items()
        .filter(|it| it.visible)
        .map(Item::scene_bbox)
        .reduce(|a, b| a.union(b))
        .map(|r| r.inflate(EXPORT_MARGIN, EXPORT_MARGIN))
}

/// The export view as JSON.
pub fn to_json(scene: &Scene, tolerance: f64) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&export_scene(scene, tolerance))
}
