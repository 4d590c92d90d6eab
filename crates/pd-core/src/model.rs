//! Item model and the scene that owns items.
//!
//! An [`Item`] is one entity on the canvas. Its geometry lives in local
//! coordinates; the scene mapping is `pos · T` where `T` rotates and then
//! scales non-uniformly about the local bounding-box center (the
//! transform origin). The origin is recomputed whenever the geometry
//! changes, so scaling and rotating always pivot at the shape's center.
//!
//! The [`Scene`] keeps items in insertion order (paint order, refined by
//! an explicit `z`), the current selection, and a synchronous change log.
//! Every mutating call records a [`SceneChange`]; the page drains the log
//! right after each mutation to keep dependent state (the transform
//! overlay) glued to its target.

use crate::asset::Pixmap;
use crate::geometry::{self, EPSILON, HitShape};
use crate::id::ItemId;
use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape, Size, Vec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Average glyph advance as a fraction of the font size.
const LABEL_ADVANCE: f64 = 0.6;
/// Line height as a fraction of the font size.
const LABEL_LINE_HEIGHT: f64 = 1.2;
/// Document margin around label text.
const LABEL_MARGIN: f64 = 4.0;
/// Tolerance used for local bounds of curved items.
const BOUNDS_TOLERANCE: f64 = 0.1;

// ─── Path data ───────────────────────────────────────────────────────────

/// A single freehand path command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCmd {
    MoveTo(Point),
    LineTo(Point),
    /// control, end
    QuadTo(Point, Point),
}

impl PathCmd {
    fn translated(self, v: Vec2) -> Self {
        match self {
            PathCmd::MoveTo(p) => PathCmd::MoveTo(p + v),
            PathCmd::LineTo(p) => PathCmd::LineTo(p + v),
            PathCmd::QuadTo(c, e) => PathCmd::QuadTo(c + v, e + v),
        }
    }
}

/// Build a kurbo path from freehand commands.
pub fn commands_to_path(commands: &[PathCmd]) -> BezPath {
    let mut bez = BezPath::new();
    for cmd in commands {
        match *cmd {
            PathCmd::MoveTo(p) => bez.move_to(p),
            PathCmd::LineTo(p) => bez.line_to(p),
            PathCmd::QuadTo(c, e) => bez.quad_to(c, e),
        }
    }
    bez
}

// ─── Transform state ─────────────────────────────────────────────────────

/// Rotation (degrees) and non-uniform scale, applied about the item's
/// bounding-box center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl TransformState {
    /// Rebuild the local affine from scratch: rotate, then scale in the
    /// rotated frame, pivoting at `origin`.
    pub fn affine_about(&self, origin: Point) -> Affine {
        let o = origin.to_vec2();
        Affine::translate(o)
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
            * Affine::translate(-o)
    }
}

// ─── Item kinds ──────────────────────────────────────────────────────────

/// The closed set of item variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    /// Palette image, centered on its position.
    Pixmap { asset: String, image: Pixmap },
    /// Text label, growing right/down from its position.
    Label { text: String, font_size: f64 },
    /// Straight segment in local coordinates.
    Line { a: Point, b: Point },
    /// Rectangle centered on its position.
    Rectangle { width: f64, height: f64 },
    /// Ellipse centered on its position.
    Ellipse { rx: f64, ry: f64 },
    /// Smoothed pen stroke.
    FreehandPath { commands: Vec<PathCmd> },
    /// Circular arc; angles in degrees, see [`geometry`] for conventions.
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        sweep: f64,
    },
}

impl ItemKind {
    /// Type tag used by the export view and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            ItemKind::Pixmap { .. } => "Pixmap",
            ItemKind::Label { .. } => "Label",
            ItemKind::Line { .. } => "Line",
            ItemKind::Rectangle { .. } => "Rectangle",
            ItemKind::Ellipse { .. } => "Ellipse",
            ItemKind::FreehandPath { .. } => "FreehandPath",
            ItemKind::Arc { .. } => "Arc",
        }
    }

    /// Open strokes are hit-tested by distance rather than containment.
    pub fn is_stroke(&self) -> bool {
        matches!(
            self,
            ItemKind::Line { .. } | ItemKind::FreehandPath { .. } | ItemKind::Arc { .. }
        )
    }

    /// The kurbo arc equivalent to an `Arc` item. kurbo measures angles
    /// the same way but sweeps toward increasing angle, so the sign flips.
    pub fn kurbo_arc(center: Point, radius: f64, start_angle: f64, sweep: f64) -> kurbo::Arc {
        kurbo::Arc {
            center,
            radii: Vec2::new(radius, radius),
            start_angle: start_angle.to_radians(),
            sweep_angle: -sweep.to_radians(),
            x_rotation: 0.0,
        }
    }

    /// Shape outline in local coordinates (no stroke width).
    pub fn local_path(&self, tolerance: f64) -> BezPath {
        match self {
            ItemKind::Pixmap { image, .. } => {
                Rect::from_center_size(Point::ORIGIN, (image.width as f64, image.height as f64))
                    .to_path(tolerance)
            }
            ItemKind::Label { .. } => self.label_rect().to_path(tolerance),
            ItemKind::Line { a, b } => {
                let mut bez = BezPath::new();
                bez.move_to(*a);
                bez.line_to(*b);
                bez
            }
            ItemKind::Rectangle { width, height } => {
                Rect::from_center_size(Point::ORIGIN, (*width, *height)).to_path(tolerance)
            }
            ItemKind::Ellipse { rx, ry } => {
                kurbo::Ellipse::new(Point::ORIGIN, (*rx, *ry), 0.0).to_path(tolerance)
            }
            ItemKind::FreehandPath { commands } => commands_to_path(commands),
            ItemKind::Arc {
                center,
                radius,
                start_angle,
                sweep,
            } => Self::kurbo_arc(*center, *radius, *start_angle, *sweep).to_path(tolerance),
        }
    }

    fn label_rect(&self) -> Rect {
        let ItemKind::Label { text, font_size } = self else {
            return Rect::ZERO;
        };
        let lines = text.split('\n');
        let (count, widest) = lines.fold((0usize, 0usize), |(n, w), line| {
            (n + 1, w.max(line.chars().count()))
        });
        let width = widest as f64 * font_size * LABEL_ADVANCE + 2.0 * LABEL_MARGIN;
        let height = count.max(1) as f64 * font_size * LABEL_LINE_HEIGHT + 2.0 * LABEL_MARGIN;
        Rect::from_origin_size(Point::ORIGIN, Size::new(width, height))
    }

    /// Shift local geometry by `v`. Centered variants are unaffected.
    fn translate(&mut self, v: Vec2) {
        match self {
            ItemKind::Line { a, b } => {
                *a += v;
                *b += v;
            }
            ItemKind::FreehandPath { commands } => {
                for cmd in commands.iter_mut() {
                    *cmd = cmd.translated(v);
                }
            }
            ItemKind::Arc { center, .. } => *center += v,
            ItemKind::Pixmap { .. }
            | ItemKind::Label { .. }
            | ItemKind::Rectangle { .. }
            | ItemKind::Ellipse { .. } => {}
        }
    }
}

// ─── Items ───────────────────────────────────────────────────────────────

/// One canvas entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Scene-space position of the local coordinate origin.
    pub pos: Point,
    pub transform: TransformState,
    /// Transform origin; always the local bounding-box center.
    origin: Point,
    pub selectable: bool,
    pub movable: bool,
    pub visible: bool,
    /// Preview/marker items owned by an in-progress gesture.
    pub transient: bool,
    /// Explicit stacking value; ties keep insertion order.
    pub z: f64,
    pub stroke_width: f64,
}

impl Item {
    pub fn new(kind: ItemKind) -> Self {
        let mut item = Self {
            id: ItemId::fresh(),
            kind,
            pos: Point::ORIGIN,
            transform: TransformState::default(),
            origin: Point::ORIGIN,
            selectable: true,
            movable: true,
            visible: true,
            transient: false,
            z: 0.0,
            stroke_width: 2.0,
        };
        item.refresh_origin();
        item
    }

    /// A non-selectable preview owned by a gesture.
    pub fn new_transient(kind: ItemKind) -> Self {
        let mut item = Self::new(kind);
        item.transient = true;
        item.selectable = false;
        item.movable = false;
        item
    }

    pub fn with_pos(mut self, pos: Point) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = width;
        self.refresh_origin();
        self
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    fn refresh_origin(&mut self) {
        self.origin = self.bounding_box().center();
    }

    /// Replace the geometry, re-centering the transform origin.
    pub fn set_kind(&mut self, kind: ItemKind) {
        self.kind = kind;
        self.refresh_origin();
    }

    /// Re-express stroke geometry relative to `anchor` and move the item
    /// there, leaving its scene appearance unchanged.
    pub fn normalize_to_anchor(&mut self, anchor: Point) {
        let shift = anchor - self.pos;
        self.kind.translate(-shift);
        self.pos = anchor;
        self.refresh_origin();
    }

    /// Local bounding box, including half the stroke for outlined shapes.
    pub fn bounding_box(&self) -> Rect {
        let hw = self.stroke_width / 2.0;
        match &self.kind {
            ItemKind::Pixmap { image, .. } => {
                Rect::from_center_size(Point::ORIGIN, (image.width as f64, image.height as f64))
            }
            ItemKind::Label { .. } => self.kind.label_rect(),
            ItemKind::Line { a, b } => Rect::from_points(*a, *b).inflate(hw, hw),
            ItemKind::Rectangle { width, height } => {
                Rect::from_center_size(Point::ORIGIN, (*width, *height)).inflate(hw, hw)
            }
            ItemKind::Ellipse { rx, ry } => {
                Rect::from_center_size(Point::ORIGIN, (2.0 * rx, 2.0 * ry)).inflate(hw, hw)
            }
            ItemKind::FreehandPath { .. } | ItemKind::Arc { .. } => {
                let points = flatten_points(&self.kind.local_path(BOUNDS_TOLERANCE), BOUNDS_TOLERANCE);
                geometry::points_bbox(&points)
                    .unwrap_or(Rect::ZERO)
                    .inflate(hw, hw)
            }
        }
    }

    pub fn transform(&self) -> TransformState {
        self.transform
    }

    /// Local → scene affine.
    pub fn scene_transform(&self) -> Affine {
        Affine::translate(self.pos.to_vec2()) * self.transform.affine_about(self.origin)
    }

    pub fn map_to_scene(&self, local: Point) -> Point {
        self.scene_transform() * local
    }

    /// Scene → local; `None` when the transform is singular.
    pub fn map_from_scene(&self, scene: Point) -> Option<Point> {
        let affine = self.scene_transform();
        if affine.determinant().abs() < EPSILON {
            return None;
        }
        Some(affine.inverse() * scene)
    }

    /// Bounding box corners mapped to scene space: TL, TR, BR, BL.
    pub fn scene_corners(&self) -> [Point; 4] {
        let r = self.bounding_box();
        let t = self.scene_transform();
        [
            t * Point::new(r.x0, r.y0),
            t * Point::new(r.x1, r.y0),
            t * Point::new(r.x1, r.y1),
            t * Point::new(r.x0, r.y1),
        ]
    }

    /// Axis-aligned scene bounds of the transformed bounding box.
    pub fn scene_bbox(&self) -> Rect {
        self.scene_transform().transform_rect_bbox(self.bounding_box())
    }

    /// Scene-space outline.
    pub fn scene_path(&self, tolerance: f64) -> BezPath {
        self.scene_transform() * self.kind.local_path(tolerance)
    }

    /// Polyline approximation of the scene-space outline. Closed shapes
    /// repeat their first point at the end.
    pub fn scene_polyline(&self, tolerance: f64) -> Vec<Point> {
        flatten_points(&self.scene_path(tolerance), tolerance)
    }

    /// Shape used for hit testing and erasing.
    pub fn hit_shape(&self, tolerance: f64) -> HitShape {
        if self.kind.is_stroke() {
            let t = self.transform;
            let hw = self.stroke_width / 2.0;
            if (t.scale_x.abs() - t.scale_y.abs()).abs() < EPSILON {
                return HitShape::Stroked {
                    points: self.scene_polyline(tolerance),
                    half_width: hw * t.scale_x.abs(),
                };
            }
            // Outline the stroke locally, then map it, so the hit area
            // stretches with the painted stroke.
            let local_tolerance = tolerance / t.scale_x.abs().max(t.scale_y.abs()).max(1.0);
            let centerline = flatten_points(&self.kind.local_path(local_tolerance), local_tolerance);
            let affine = self.scene_transform();
            let pieces = geometry::stroke_pieces(&centerline, hw)
                .into_iter()
                .map(|piece| piece.into_iter().map(|p| affine * p).collect())
                .collect();
            HitShape::Pieces(pieces)
        } else {
            let mut ring = match &self.kind {
                // Text boxes and images hit on their full box.
                ItemKind::Label { .. } | ItemKind::Pixmap { .. } => self.scene_corners().to_vec(),
                _ => self.scene_polyline(tolerance),
            };
            if ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
            }
            HitShape::Filled(ring)
        }
    }
}

/// Flatten a path to its vertices, closing subpaths explicitly.
fn flatten_points(path: &BezPath, tolerance: f64) -> Vec<Point> {
    let mut out = Vec::new();
    let mut start = None;
    kurbo::flatten(path.elements().iter().copied(), tolerance, |el| match el {
        PathEl::MoveTo(p) => {
            start = Some(p);
            out.push(p);
        }
        PathEl::LineTo(p) => out.push(p),
        PathEl::ClosePath => {
            if let Some(s) = start {
                if out.last() != Some(&s) {
                    out.push(s);
                }
            }
        }
        PathEl::QuadTo(_, p) | PathEl::CurveTo(_, _, p) => out.push(p),
    });
    out
}

// ─── Scene ───────────────────────────────────────────────────────────────

/// A mutation recorded by the scene, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneChange {
    Added(ItemId),
    Removed(ItemId),
    Moved(ItemId),
    TransformSet(ItemId),
    GeometrySet(ItemId),
    SelectionChanged,
    Cleared,
}

/// Up to a handful of selected items without allocating.
pub type Selection = SmallVec<[ItemId; 4]>;

/// The unbounded coordinate space of one page.
#[derive(Debug, Default)]
pub struct Scene {
    items: Vec<Item>,
    selection: Selection,
    changes: Vec<SceneChange>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert an item on top of the paint order.
    pub fn add(&mut self, item: Item) -> ItemId {
        let id = item.id;
        self.items.push(item);
        self.changes.push(SceneChange::Added(id));
        id
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let idx = self.items.iter().position(|it| it.id == id)?;
        let item = self.items.remove(idx);
        self.changes.push(SceneChange::Removed(id));
        if let Some(pos) = self.selection.iter().position(|s| *s == id) {
            self.selection.remove(pos);
            self.changes.push(SceneChange::SelectionChanged);
        }
        Some(item)
    }

    /// Remove everything. Returns the number of items dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.items.len();
        self.items.clear();
        let had_selection = !self.selection.is_empty();
        self.selection.clear();
        self.changes.push(SceneChange::Cleared);
        if had_selection {
            self.changes.push(SceneChange::SelectionChanged);
        }
        n
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|it| it.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|it| it.id == id)
    }

    /// Items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Items back-to-front: stable by `z`, then insertion order.
    pub fn paint_order(&self) -> Vec<&Item> {
        let mut ordered: Vec<&Item> = self.items.iter().collect();
        ordered.sort_by(|a, b| a.z.total_cmp(&b.z));
        ordered
    }

    pub fn persistent_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|it| !it.transient)
    }

    pub fn transient_ids(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|it| it.transient)
            .map(|it| it.id)
            .collect()
    }

    pub fn set_pos(&mut self, id: ItemId, pos: Point) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        if item.pos == pos {
            return true;
        }
        item.pos = pos;
        self.changes.push(SceneChange::Moved(id));
        true
    }

    pub fn set_transform(&mut self, id: ItemId, transform: TransformState) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        item.transform = transform;
        self.changes.push(SceneChange::TransformSet(id));
        true
    }

    pub fn set_kind(&mut self, id: ItemId, kind: ItemKind) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        item.set_kind(kind);
        self.changes.push(SceneChange::GeometrySet(id));
        true
    }

    pub fn set_z(&mut self, id: ItemId, z: f64) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        item.z = z;
        true
    }

    /// Promote a gesture preview to a regular, selectable item anchored
    /// at `anchor`.
    pub fn persist(&mut self, id: ItemId, anchor: Point) -> bool {
        let Some(item) = self.get_mut(id) else {
            return false;
        };
        item.transient = false;
        item.selectable = true;
        item.movable = true;
        item.normalize_to_anchor(anchor);
        self.changes.push(SceneChange::GeometrySet(id));
        true
    }

    pub fn selection(&self) -> &[ItemId] {
        &self.selection
    }

    /// Replace the selection. Unknown, transient and non-selectable ids
    /// are dropped; duplicates collapse. Records a change only when the
    /// selection actually differs.
    pub fn set_selection(&mut self, ids: &[ItemId]) {
        let mut next = Selection::new();
        for &id in ids {
            let ok = self
                .get(id)
                .is_some_and(|it| it.selectable && !it.transient);
            if ok && !next.contains(&id) {
                next.push(id);
            }
        }
        if next != self.selection {
            self.selection = next;
            self.changes.push(SceneChange::SelectionChanged);
        }
    }

    /// Take the change log.
    pub fn drain_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.changes)
    }
}
