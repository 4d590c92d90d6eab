//! Tool system for canvas interactions.
//!
//! Each tool translates pointer events into [`SceneMutation`]s that the
//! [`Page`](crate::page::Page) applies in order. Tools only read the scene
//! (through [`ToolContext`]); every preview or marker they show is a
//! transient item they add and later remove or persist themselves.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Select | Line | Arc |
//! |----------|--------|------|-----|
//! | **Alt** | Move without snapping | Free start/end points | Free center/start |
//! | **Shift** | Toggle / extend selection | Lock to 45° | Counter-clockwise |
//! | **Ctrl/⌘** | - | - | Major arc |

use crate::input::InputEvent;
use crate::overlay::{HandleDrag, TransformOverlay};
use kurbo::{Point, Rect};
use pd_core::config::EditorConfig;
use pd_core::geometry::{
    ArcDirection, angle_between, arc_point, arc_sweep, constrain_to_cardinal45, snap_unless,
};
use pd_core::id::ItemId;
use pd_core::model::{Item, ItemKind, PathCmd, Scene, Selection, TransformState};
use pd_core::viewport::Viewport;
use pd_render::hit::{hit_test, hit_test_rect, items_in_circle};

/// The active tool determines how pointer events are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ToolKind {
    #[default]
    Select,
    Line,
    Pen,
    Eraser,
    Arc,
}

/// Read-only view of the page handed to tools.
pub struct ToolContext<'a> {
    pub scene: &'a Scene,
    pub overlay: Option<&'a TransformOverlay>,
    pub viewport: &'a Viewport,
    pub config: &'a EditorConfig,
}

/// A mutation requested by a tool, applied by the page.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneMutation {
    AddItem(Box<Item>),
    SetGeometry { id: ItemId, kind: ItemKind },
    MoveItem { id: ItemId, pos: Point },
    SetTransform { id: ItemId, transform: TransformState },
    /// Turn a preview into a regular item anchored at `anchor`.
    Persist { id: ItemId, anchor: Point },
    RemoveItem { id: ItemId },
    Select { ids: Selection },
}

/// Trait for tools that handle input and produce mutations.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle a pointer event, returning zero or more mutations.
    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<SceneMutation>;

    /// Abandon the current gesture and remove every transient item the
    /// tool owns. Safe to call when idle.
    fn cancel(&mut self) -> Vec<SceneMutation>;
}

pub fn make_tool(kind: ToolKind) -> Box<dyn Tool> {
    match kind {
        ToolKind::Select => Box::new(SelectTool::new()),
        ToolKind::Line => Box::new(LineTool::new()),
        ToolKind::Pen => Box::new(PenTool::new()),
        ToolKind::Eraser => Box::new(EraserTool::new()),
        ToolKind::Arc => Box::new(ArcTool::new()),
    }
}

fn add(item: Item) -> (ItemId, SceneMutation) {
    (item.id, SceneMutation::AddItem(Box::new(item)))
}

/// Small circle used for gesture markers and the eraser cursor.
fn marker(at: Point, radius: f64) -> Item {
    Item::new_transient(ItemKind::Ellipse {
        rx: radius,
        ry: radius,
    })
    .with_stroke_width(1.0)
    .with_pos(at)
}

fn removals(ids: impl IntoIterator<Item = ItemId>) -> Vec<SceneMutation> {
    ids.into_iter()
        .map(|id| SceneMutation::RemoveItem { id })
        .collect()
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
enum SelectGesture {
    #[default]
    Idle,
    Moving {
        press: Point,
        origins: Vec<(ItemId, Point)>,
    },
    Handle(HandleDrag),
    RubberBand {
        start: Point,
        extend: bool,
        band: ItemId,
    },
}

#[derive(Debug, Default)]
pub struct SelectTool {
    gesture: SelectGesture,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    fn press(&mut self, p: Point, event: &InputEvent, ctx: &ToolContext) -> Vec<SceneMutation> {
        let mods = event.modifiers();
        let config = ctx.config;

        if let Some(overlay) = ctx.overlay
            && let Some(hit) = overlay.hit_handle(p, ctx.viewport, config)
            && let Some(drag) = HandleDrag::begin(hit, overlay, ctx.scene, p)
        {
            log::debug!("handle drag {hit:?} on {}", overlay.target());
            self.gesture = SelectGesture::Handle(drag);
            return vec![];
        }

        let slop = ctx.viewport.screen_dist_to_scene(config.hit_slop_px);
        let current = ctx.scene.selection();

        if let Some(hit) = hit_test(ctx.scene, p, slop, config.flatten_tolerance) {
            let mut next: Selection = current.iter().copied().collect();
            if mods.extend_selection {
                if let Some(i) = next.iter().position(|id| *id == hit) {
                    next.remove(i);
                } else {
                    next.push(hit);
                }
            } else if !next.contains(&hit) {
                next = Selection::from_slice(&[hit]);
            }

            let origins = next
                .iter()
                .filter_map(|id| ctx.scene.get(*id))
                .filter(|it| it.movable)
                .map(|it| (it.id, it.pos))
                .collect();
            self.gesture = SelectGesture::Moving { press: p, origins };

            if next.as_slice() == current {
                return vec![];
            }
            return vec![SceneMutation::Select { ids: next }];
        }

        let mut out = Vec::new();
        if !mods.extend_selection && !current.is_empty() {
            out.push(SceneMutation::Select {
                ids: Selection::new(),
            });
        }
        let (band, add_band) = add(
            Item::new_transient(ItemKind::Rectangle {
                width: 0.0,
                height: 0.0,
            })
            .with_stroke_width(1.0)
            .with_pos(p),
        );
        out.push(add_band);
        self.gesture = SelectGesture::RubberBand {
            start: p,
            extend: mods.extend_selection,
            band,
        };
        out
    }

    fn drag(&mut self, p: Point, event: &InputEvent, ctx: &ToolContext) -> Vec<SceneMutation> {
        match &self.gesture {
            SelectGesture::Idle => vec![],
            SelectGesture::Moving { press, origins } => {
                let delta = p - *press;
                let bypass = event.modifiers().bypass_snap;
                origins
                    .iter()
                    .map(|(id, orig)| SceneMutation::MoveItem {
                        id: *id,
                        pos: snap_unless(*orig + delta, ctx.config.grid_size, bypass),
                    })
                    .collect()
            }
            SelectGesture::Handle(drag) => vec![SceneMutation::SetTransform {
                id: drag.target(),
                transform: drag.update(p, ctx.config),
            }],
            SelectGesture::RubberBand { start, band, .. } => {
                let rect = Rect::from_points(*start, p);
                vec![
                    SceneMutation::SetGeometry {
                        id: *band,
                        kind: ItemKind::Rectangle {
                            width: rect.width(),
                            height: rect.height(),
                        },
                    },
                    SceneMutation::MoveItem {
                        id: *band,
                        pos: rect.center(),
                    },
                ]
            }
        }
    }

    fn release(&mut self, p: Point, ctx: &ToolContext) -> Vec<SceneMutation> {
        match std::mem::take(&mut self.gesture) {
            SelectGesture::RubberBand {
                start,
                extend,
                band,
            } => {
                let mut out = vec![SceneMutation::RemoveItem { id: band }];
                let rect = Rect::from_points(start, p);
                // A plain click on empty canvas selects nothing.
                if rect.width() > 0.0 || rect.height() > 0.0 {
                    let mut ids: Selection = if extend {
                        ctx.scene.selection().iter().copied().collect()
                    } else {
                        Selection::new()
                    };
                    ids.extend(hit_test_rect(ctx.scene, rect));
                    log::debug!("rubber band {rect:?} selected {} item(s)", ids.len());
                    out.push(SceneMutation::Select { ids });
                }
                out
            }
            SelectGesture::Moving { .. } | SelectGesture::Handle(_) | SelectGesture::Idle => vec![],
        }
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<SceneMutation> {
        match event {
            InputEvent::PointerDown { pos, .. } => self.press(*pos, event, ctx),
            InputEvent::PointerMove { pos, .. } => self.drag(*pos, event, ctx),
            InputEvent::PointerUp { pos, .. } => self.release(*pos, ctx),
            _ => vec![],
        }
    }

    fn cancel(&mut self) -> Vec<SceneMutation> {
        match std::mem::take(&mut self.gesture) {
            SelectGesture::RubberBand { band, .. } => removals([band]),
            _ => vec![],
        }
    }
}

// ─── Line Tool ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct LineTool {
    /// Snapped start point and the preview segment.
    current: Option<(Point, ItemId)>,
}

impl LineTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The angle lock works on the raw pointer; the grid would pull the
    /// end point off the locked ray.
    fn end_point(start: Point, p: Point, event: &InputEvent, config: &EditorConfig) -> Point {
        let mods = event.modifiers();
        if mods.constrain_angle {
            constrain_to_cardinal45(start, p)
        } else {
            snap_unless(p, config.grid_size, mods.bypass_snap)
        }
    }
}

impl Tool for LineTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Line
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<SceneMutation> {
        let config = ctx.config;
        match event {
            InputEvent::PointerDown { pos, .. } => {
                let mut out = self.cancel();
                let start = snap_unless(*pos, config.grid_size, event.modifiers().bypass_snap);
                let (id, add_preview) = add(
                    Item::new_transient(ItemKind::Line { a: start, b: start })
                        .with_stroke_width(config.stroke_width),
                );
                self.current = Some((start, id));
                out.push(add_preview);
                out
            }
            InputEvent::PointerMove { pos, .. } => {
                let Some((start, id)) = self.current else {
                    return vec![];
                };
                let end = Self::end_point(start, *pos, event, config);
                log::trace!("line preview {start:?} -> {end:?}");
                vec![SceneMutation::SetGeometry {
                    id,
                    kind: ItemKind::Line { a: start, b: end },
                }]
            }
            InputEvent::PointerUp { pos, .. } => {
                let Some((start, id)) = self.current.take() else {
                    return vec![];
                };
                let end = Self::end_point(start, *pos, event, config);
                if start.distance(end) < config.min_line_length {
                    log::debug!("line shorter than {} dropped", config.min_line_length);
                    return removals([id]);
                }
                log::debug!("line {id} {start:?} -> {end:?}");
                vec![
                    SceneMutation::SetGeometry {
                        id,
                        kind: ItemKind::Line { a: start, b: end },
                    },
                    SceneMutation::Persist { id, anchor: start },
                ]
            }
            _ => vec![],
        }
    }

    fn cancel(&mut self) -> Vec<SceneMutation> {
        removals(self.current.take().map(|(_, id)| id))
    }
}

// ─── Pen Tool (freehand) ─────────────────────────────────────────────────

#[derive(Debug)]
struct Stroke {
    id: ItemId,
    commands: Vec<PathCmd>,
    last_raw: Point,
    /// Grid point the finished stroke is positioned on.
    anchor: Point,
}

#[derive(Debug, Default)]
pub struct PenTool {
    stroke: Option<Stroke>,
}

impl PenTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for PenTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pen
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<SceneMutation> {
        match event {
            InputEvent::PointerDown { pos, .. } => {
                let mut out = self.cancel();
                let commands = vec![PathCmd::MoveTo(*pos)];
                let anchor = snap_unless(*pos, ctx.config.grid_size, event.modifiers().bypass_snap);
                let (id, add_preview) = add(
                    Item::new_transient(ItemKind::FreehandPath {
                        commands: commands.clone(),
                    })
                    .with_stroke_width(ctx.config.stroke_width),
                );
                self.stroke = Some(Stroke {
                    id,
                    commands,
                    last_raw: *pos,
                    anchor,
                });
                out.push(add_preview);
                out
            }
            InputEvent::PointerMove { pos, .. } => {
                let Some(stroke) = &mut self.stroke else {
                    return vec![];
                };
                if pos.distance(stroke.last_raw) <= ctx.config.pen_jitter {
                    return vec![];
                }
                // Midpoint smoothing: the curve trails the cursor by half a step.
                let prev = stroke.last_raw;
                stroke.commands.push(PathCmd::QuadTo(prev, prev.midpoint(*pos)));
                stroke.last_raw = *pos;
                vec![SceneMutation::SetGeometry {
                    id: stroke.id,
                    kind: ItemKind::FreehandPath {
                        commands: stroke.commands.clone(),
                    },
                }]
            }
            InputEvent::PointerUp { pos, .. } => {
                let Some(mut stroke) = self.stroke.take() else {
                    return vec![];
                };
                if stroke.commands.len() < 2 {
                    log::debug!("pen stroke without movement dropped");
                    return removals([stroke.id]);
                }
                // Close on the release point, which may sit inside the
                // jitter threshold of the last sample.
                stroke.commands.push(PathCmd::LineTo(*pos));
                log::debug!("pen stroke {} with {} commands", stroke.id, stroke.commands.len());
                vec![
                    SceneMutation::SetGeometry {
                        id: stroke.id,
                        kind: ItemKind::FreehandPath {
                            commands: stroke.commands,
                        },
                    },
                    SceneMutation::Persist {
                        id: stroke.id,
                        anchor: stroke.anchor,
                    },
                ]
            }
            _ => vec![],
        }
    }

    fn cancel(&mut self) -> Vec<SceneMutation> {
        removals(self.stroke.take().map(|s| s.id))
    }
}

// ─── Eraser Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct EraserTool {
    cursor: Option<ItemId>,
    pressed: bool,
}

impl EraserTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the cursor circle under the pointer at a fixed on-screen size,
    /// re-creating it if something removed it from the scene.
    fn track(&mut self, p: Point, radius: f64, ctx: &ToolContext) -> Vec<SceneMutation> {
        match self.cursor.filter(|id| ctx.scene.contains(*id)) {
            Some(id) => vec![
                SceneMutation::SetGeometry {
                    id,
                    kind: ItemKind::Ellipse {
                        rx: radius,
                        ry: radius,
                    },
                },
                SceneMutation::MoveItem { id, pos: p },
            ],
            None => {
                let (id, add_cursor) = add(marker(p, radius));
                self.cursor = Some(id);
                vec![add_cursor]
            }
        }
    }

    fn erase(&self, p: Point, radius: f64, ctx: &ToolContext) -> Vec<SceneMutation> {
        let hits = items_in_circle(ctx.scene, p, radius, ctx.config.flatten_tolerance);
        if !hits.is_empty() {
            log::debug!("eraser removed {} item(s) at {p:?}", hits.len());
        }
        removals(hits)
    }
}

impl Tool for EraserTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Eraser
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<SceneMutation> {
        let Some(p) = event.position() else {
            return vec![];
        };
        let radius = ctx.viewport.screen_dist_to_scene(ctx.config.eraser_radius_px);
        let mut out = self.track(p, radius, ctx);

        match event {
            InputEvent::PointerDown { .. } => {
                self.pressed = true;
                out.extend(self.erase(p, radius, ctx));
            }
            InputEvent::PointerMove { .. } if self.pressed => {
                out.extend(self.erase(p, radius, ctx));
            }
            InputEvent::PointerUp { .. } => self.pressed = false,
            _ => {}
        }
        out
    }

    fn cancel(&mut self) -> Vec<SceneMutation> {
        self.pressed = false;
        removals(self.cursor.take())
    }
}

// ─── Arc Tool ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Sweeping {
    center: Point,
    radius: f64,
    start_angle: f64,
    center_marker: ItemId,
    start_marker: ItemId,
    end_marker: ItemId,
    guide: ItemId,
    preview: ItemId,
}

#[derive(Debug, Clone, Copy, Default)]
enum ArcStage {
    #[default]
    Idle,
    Centered {
        center: Point,
        center_marker: ItemId,
    },
    Sweeping(Sweeping),
}

/// Three-click arc: center, start point, end direction.
#[derive(Debug, Default)]
pub struct ArcTool {
    stage: ArcStage,
}

impl ArcTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0 = waiting for the center, 1 = waiting for the start point,
    /// 2 = sweeping toward the end.
    pub fn stage(&self) -> u8 {
        match self.stage {
            ArcStage::Idle => 0,
            ArcStage::Centered { .. } => 1,
            ArcStage::Sweeping(_) => 2,
        }
    }

    fn sweep_for(center: Point, start_angle: f64, p: Point, event: &InputEvent) -> f64 {
        let mods = event.modifiers();
        let direction = if mods.reverse_arc {
            ArcDirection::CounterClockwise
        } else {
            ArcDirection::Clockwise
        };
        arc_sweep(start_angle, angle_between(p, center), direction, mods.major_arc)
    }

    fn arc_kind(s: &Sweeping, sweep: f64) -> ItemKind {
        ItemKind::Arc {
            center: s.center,
            radius: s.radius,
            start_angle: s.start_angle,
            sweep,
        }
    }

    fn click(&mut self, p: Point, event: &InputEvent, ctx: &ToolContext) -> Vec<SceneMutation> {
        let config = ctx.config;
        let snapped = snap_unless(p, config.grid_size, event.modifiers().bypass_snap);
        let marker_r = ctx.viewport.screen_dist_to_scene(config.marker_radius_px);

        match self.stage {
            ArcStage::Idle => {
                let (center_marker, add_marker) = add(marker(snapped, marker_r));
                self.stage = ArcStage::Centered {
                    center: snapped,
                    center_marker,
                };
                log::debug!("arc center {snapped:?}");
                vec![add_marker]
            }
            ArcStage::Centered {
                center,
                center_marker,
            } => {
                let radius = snapped.distance(center);
                if radius < config.arc_min_radius {
                    log::debug!("arc start on top of center ignored");
                    return vec![];
                }
                let start_angle = angle_between(snapped, center);
                let (guide, add_guide) = add(
                    Item::new_transient(ItemKind::Ellipse {
                        rx: radius,
                        ry: radius,
                    })
                    .with_stroke_width(1.0)
                    .with_pos(center),
                );
                let (start_marker, add_start) = add(marker(snapped, marker_r));
                let (end_marker, add_end) = add(marker(snapped, marker_r));
                let (preview, add_preview) = add(
                    Item::new_transient(ItemKind::Arc {
                        center,
                        radius,
                        start_angle,
                        sweep: Self::sweep_for(center, start_angle, snapped, event),
                    })
                    .with_stroke_width(config.stroke_width),
                );
                self.stage = ArcStage::Sweeping(Sweeping {
                    center,
                    radius,
                    start_angle,
                    center_marker,
                    start_marker,
                    end_marker,
                    guide,
                    preview,
                });
                log::debug!("arc radius {radius} start {start_angle}°");
                vec![add_guide, add_start, add_end, add_preview]
            }
            ArcStage::Sweeping(s) => {
                let sweep = Self::sweep_for(s.center, s.start_angle, p, event);
                self.stage = ArcStage::Idle;
                log::debug!("arc {} sweep {sweep}°", s.preview);
                let mut out = vec![
                    SceneMutation::SetGeometry {
                        id: s.preview,
                        kind: Self::arc_kind(&s, sweep),
                    },
                    SceneMutation::Persist {
                        id: s.preview,
                        anchor: s.center,
                    },
                ];
                out.extend(removals([s.center_marker, s.start_marker, s.end_marker, s.guide]));
                out
            }
        }
    }
}

impl Tool for ArcTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Arc
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<SceneMutation> {
        match event {
            InputEvent::PointerDown { pos, .. } => self.click(*pos, event, ctx),
            InputEvent::PointerMove { pos, .. } => {
                let ArcStage::Sweeping(s) = self.stage else {
                    return vec![];
                };
                let sweep = Self::sweep_for(s.center, s.start_angle, *pos, event);
                let end = arc_point(s.center, s.radius, s.start_angle, sweep, 1.0);
                log::trace!("arc preview sweep {sweep}°");
                vec![
                    SceneMutation::SetGeometry {
                        id: s.preview,
                        kind: Self::arc_kind(&s, sweep),
                    },
                    SceneMutation::MoveItem {
                        id: s.end_marker,
                        pos: end,
                    },
                ]
            }
            _ => vec![],
        }
    }

    fn cancel(&mut self) -> Vec<SceneMutation> {
        match std::mem::take(&mut self.stage) {
            ArcStage::Idle => vec![],
            ArcStage::Centered { center_marker, .. } => removals([center_marker]),
            ArcStage::Sweeping(s) => removals([
                s.center_marker,
                s.start_marker,
                s.end_marker,
                s.guide,
                s.preview,
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyState;
    use pretty_assertions::assert_eq;

    /// Minimal page stand-in: applies mutations straight to a scene.
    struct Harness {
        scene: Scene,
        viewport: Viewport,
        config: EditorConfig,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                scene: Scene::new(),
                viewport: Viewport::default(),
                config: EditorConfig::default(),
            }
        }

        fn run(&mut self, tool: &mut dyn Tool, event: InputEvent) -> Vec<SceneMutation> {
            let ctx = ToolContext {
                scene: &self.scene,
                overlay: None,
                viewport: &self.viewport,
                config: &self.config,
            };
            let out = tool.handle(&event, &ctx);
            self.apply(out.clone());
            out
        }

        fn apply(&mut self, mutations: Vec<SceneMutation>) {
            for m in mutations {
                match m {
                    SceneMutation::AddItem(item) => {
                        self.scene.add(*item);
                    }
                    SceneMutation::SetGeometry { id, kind } => {
                        self.scene.set_kind(id, kind);
                    }
                    SceneMutation::MoveItem { id, pos } => {
                        self.scene.set_pos(id, pos);
                    }
                    SceneMutation::SetTransform { id, transform } => {
                        self.scene.set_transform(id, transform);
                    }
                    SceneMutation::Persist { id, anchor } => {
                        self.scene.persist(id, anchor);
                    }
                    SceneMutation::RemoveItem { id } => {
                        self.scene.remove(id);
                    }
                    SceneMutation::Select { ids } => self.scene.set_selection(&ids),
                }
            }
        }
    }

    fn shift() -> KeyState {
        KeyState {
            shift: true,
            ..KeyState::NONE
        }
    }

    #[test]
    fn select_tool_drag_snaps_to_grid() {
        let mut h = Harness::new();
        let id = h.scene.add(
            Item::new(ItemKind::Rectangle {
                width: 40.0,
                height: 40.0,
            })
            .with_pos(Point::new(100.0, 100.0)),
        );
        let mut tool = SelectTool::new();

        let out = h.run(&mut tool, InputEvent::press(100.0, 100.0));
        assert_eq!(out.len(), 1, "press selects");
        assert_eq!(h.scene.selection(), &[id]);

        let out = h.run(&mut tool, InputEvent::drag(113.0, 96.0));
        assert_eq!(
            out,
            vec![SceneMutation::MoveItem {
                id,
                pos: Point::new(120.0, 100.0)
            }]
        );

        let bypass = KeyState {
            alt: true,
            ..KeyState::NONE
        };
        h.run(&mut tool, InputEvent::drag(113.0, 96.0).with_keys(bypass));
        assert_eq!(h.scene.get(id).unwrap().pos, Point::new(113.0, 96.0));
    }

    #[test]
    fn select_tool_shift_click_toggles() {
        let mut h = Harness::new();
        let a = h.scene.add(
            Item::new(ItemKind::Rectangle {
                width: 20.0,
                height: 20.0,
            })
            .with_pos(Point::new(0.0, 0.0)),
        );
        let b = h.scene.add(
            Item::new(ItemKind::Rectangle {
                width: 20.0,
                height: 20.0,
            })
            .with_pos(Point::new(100.0, 0.0)),
        );
        let mut tool = SelectTool::new();
        h.run(&mut tool, InputEvent::press(0.0, 0.0));
        h.run(&mut tool, InputEvent::release(0.0, 0.0));
        h.run(&mut tool, InputEvent::press(100.0, 0.0).with_keys(shift()));
        h.run(&mut tool, InputEvent::release(100.0, 0.0).with_keys(shift()));
        assert_eq!(h.scene.selection(), &[a, b]);

        h.run(&mut tool, InputEvent::press(0.0, 0.0).with_keys(shift()));
        assert_eq!(h.scene.selection(), &[b]);
    }

    #[test]
    fn rubber_band_selects_overlapping_items() {
        let mut h = Harness::new();
        let a = h.scene.add(Item::new(ItemKind::Ellipse { rx: 10.0, ry: 10.0 }));
        let _far = h.scene.add(
            Item::new(ItemKind::Ellipse { rx: 10.0, ry: 10.0 }).with_pos(Point::new(500.0, 500.0)),
        );
        let mut tool = SelectTool::new();

        h.run(&mut tool, InputEvent::press(-50.0, -50.0));
        assert_eq!(h.scene.transient_ids().len(), 1, "band preview shown");
        h.run(&mut tool, InputEvent::drag(5.0, 5.0));
        h.run(&mut tool, InputEvent::release(5.0, 5.0));

        assert_eq!(h.scene.selection(), &[a]);
        assert!(h.scene.transient_ids().is_empty());
    }

    #[test]
    fn line_tool_discards_clicks() {
        let mut h = Harness::new();
        let mut tool = LineTool::new();
        h.run(&mut tool, InputEvent::press(0.0, 0.0));
        h.run(&mut tool, InputEvent::release(4.0, 4.0));
        assert!(h.scene.is_empty());
    }

    #[test]
    fn line_tool_persists_at_start_anchor() {
        let mut h = Harness::new();
        let mut tool = LineTool::new();
        h.run(&mut tool, InputEvent::press(21.0, 39.0));
        h.run(&mut tool, InputEvent::drag(78.0, 41.0));
        h.run(&mut tool, InputEvent::release(78.0, 41.0));

        assert_eq!(h.scene.len(), 1);
        let line = h.scene.items().next().unwrap();
        assert!(!line.transient && line.selectable);
        assert_eq!(line.pos, Point::new(20.0, 40.0));
        assert_eq!(
            line.kind,
            ItemKind::Line {
                a: Point::ORIGIN,
                b: Point::new(60.0, 0.0)
            }
        );
    }

    #[test]
    fn line_tool_constrains_to_45_degrees() {
        let mut h = Harness::new();
        let mut tool = LineTool::new();
        h.run(&mut tool, InputEvent::press(0.0, 0.0));
        h.run(&mut tool, InputEvent::drag(100.0, 10.0).with_keys(shift()));
        let preview = h.scene.items().next().unwrap();
        let ItemKind::Line { b, .. } = preview.kind else {
            panic!("expected line preview");
        };
        assert!(b.y.abs() < 1e-9);
        assert!((b.x - 10100f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn pen_tool_smooths_with_midpoints() {
        let mut h = Harness::new();
        let mut tool = PenTool::new();
        h.run(&mut tool, InputEvent::press(0.0, 0.0));
        h.run(&mut tool, InputEvent::drag(1.0, 0.0)); // under the jitter threshold
        h.run(&mut tool, InputEvent::drag(10.0, 0.0));
        h.run(&mut tool, InputEvent::drag(20.0, 10.0));
        h.run(&mut tool, InputEvent::release(20.0, 10.0));

        let path = h.scene.items().next().unwrap();
        assert!(!path.transient);
        assert_eq!(
            path.kind,
            ItemKind::FreehandPath {
                commands: vec![
                    PathCmd::MoveTo(Point::new(0.0, 0.0)),
                    PathCmd::QuadTo(Point::new(0.0, 0.0), Point::new(5.0, 0.0)),
                    PathCmd::QuadTo(Point::new(10.0, 0.0), Point::new(15.0, 5.0)),
                    PathCmd::LineTo(Point::new(20.0, 10.0)),
                ]
            }
        );
    }

    #[test]
    fn pen_tool_drops_dots() {
        let mut h = Harness::new();
        let mut tool = PenTool::new();
        h.run(&mut tool, InputEvent::press(0.0, 0.0));
        h.run(&mut tool, InputEvent::release(0.0, 0.0));
        assert!(h.scene.is_empty());
    }

    #[test]
    fn pen_tool_ends_on_release_point() {
        let mut h = Harness::new();
        let mut tool = PenTool::new();
        h.run(&mut tool, InputEvent::press(0.0, 0.0));
        h.run(&mut tool, InputEvent::drag(10.0, 0.0));
        // Within the jitter threshold of the last sample.
        h.run(&mut tool, InputEvent::drag(11.5, 0.0));
        h.run(&mut tool, InputEvent::release(11.5, 0.0));

        let path = h.scene.items().next().unwrap();
        let polyline = path.scene_polyline(0.1);
        let end = polyline[polyline.len() - 1];
        assert!(end.distance(Point::new(11.5, 0.0)) < 1e-9, "{end:?}");
    }

    #[test]
    fn pen_tool_positions_stroke_on_grid() {
        let mut h = Harness::new();
        let mut tool = PenTool::new();
        h.run(&mut tool, InputEvent::press(7.0, 3.0));
        h.run(&mut tool, InputEvent::drag(30.0, 3.0));
        h.run(&mut tool, InputEvent::release(30.0, 3.0));

        let path = h.scene.items().next().unwrap();
        assert_eq!(path.pos, Point::new(0.0, 0.0));
        // The ink stays where it was drawn.
        let polyline = path.scene_polyline(0.1);
        assert!(polyline[0].distance(Point::new(7.0, 3.0)) < 1e-9);

        let alt = KeyState {
            alt: true,
            ..KeyState::NONE
        };
        h.run(&mut tool, InputEvent::press(7.0, 3.0).with_keys(alt));
        h.run(&mut tool, InputEvent::drag(30.0, 3.0).with_keys(alt));
        h.run(&mut tool, InputEvent::release(30.0, 3.0).with_keys(alt));
        let bypassed = h.scene.items().nth(1).unwrap();
        assert_eq!(bypassed.pos, Point::new(7.0, 3.0));
    }

    #[test]
    fn pen_tool_cancel_discards_stroke() {
        let mut h = Harness::new();
        let mut tool = PenTool::new();
        h.run(&mut tool, InputEvent::press(0.0, 0.0));
        h.run(&mut tool, InputEvent::drag(40.0, 0.0));
        assert_eq!(h.scene.transient_ids().len(), 1);

        let out = tool.cancel();
        h.apply(out);
        assert!(h.scene.is_empty());
        // Nothing left to finish.
        assert!(h.run(&mut tool, InputEvent::release(40.0, 0.0)).is_empty());
        assert!(tool.cancel().is_empty());
    }

    #[test]
    fn eraser_only_removes_while_pressed() {
        let mut h = Harness::new();
        let line = h.scene.add(Item::new(ItemKind::Line {
            a: Point::new(-100.0, 0.0),
            b: Point::new(100.0, 0.0),
        }));
        let mut tool = EraserTool::new();

        h.run(&mut tool, InputEvent::drag(0.0, 5.0));
        assert!(h.scene.contains(line), "hover does not erase");
        assert_eq!(h.scene.transient_ids().len(), 1, "cursor shown");

        h.run(&mut tool, InputEvent::press(0.0, 40.0));
        assert!(h.scene.contains(line), "out of reach");
        h.run(&mut tool, InputEvent::drag(0.0, 5.0));
        assert!(!h.scene.contains(line));

        h.apply(tool.cancel());
        assert!(h.scene.is_empty());
    }

    #[test]
    fn arc_tool_walks_three_stages() {
        let mut h = Harness::new();
        let mut tool = ArcTool::new();

        h.run(&mut tool, InputEvent::press(0.0, 0.0));
        assert_eq!(tool.stage(), 1);
        h.run(&mut tool, InputEvent::press(0.4, 0.4));
        assert_eq!(tool.stage(), 1, "start on the center is rejected");
        h.run(&mut tool, InputEvent::press(50.0, 0.0).with_keys(KeyState {
            alt: true,
            ..KeyState::NONE
        }));
        assert_eq!(tool.stage(), 2);
        assert_eq!(h.scene.transient_ids().len(), 5);

        h.run(&mut tool, InputEvent::drag(0.0, 50.0));
        h.run(&mut tool, InputEvent::press(0.0, 50.0));
        assert_eq!(tool.stage(), 0);
        assert!(h.scene.transient_ids().is_empty());
        assert_eq!(h.scene.len(), 1);

        let arc = h.scene.items().next().unwrap();
        assert_eq!(arc.pos, Point::ORIGIN);
        assert_eq!(
            arc.kind,
            ItemKind::Arc {
                center: Point::ORIGIN,
                radius: 50.0,
                start_angle: 0.0,
                sweep: -90.0
            }
        );
    }

    #[test]
    fn arc_modifiers_pick_direction_and_major() {
        let mut h = Harness::new();
        let mut tool = ArcTool::new();
        h.run(&mut tool, InputEvent::press(0.0, 0.0));
        h.run(&mut tool, InputEvent::press(60.0, 0.0));

        let ccw = shift();
        h.run(&mut tool, InputEvent::press(0.0, 60.0).with_keys(ccw));
        let ItemKind::Arc { sweep, .. } = h.scene.items().next().unwrap().kind else {
            panic!("expected arc");
        };
        assert_eq!(sweep, 270.0);

        h.run(&mut tool, InputEvent::press(0.0, 0.0));
        h.run(&mut tool, InputEvent::press(60.0, 0.0));
        let major = KeyState {
            ctrl: true,
            ..KeyState::NONE
        };
        h.run(&mut tool, InputEvent::press(0.0, 60.0).with_keys(major));
        let ItemKind::Arc { sweep, .. } = h.scene.items().nth(1).unwrap().kind else {
            panic!("expected arc");
        };
        assert_eq!(sweep, 270.0);
    }

    #[test]
    fn arc_cancel_disposes_every_marker() {
        let mut h = Harness::new();
        let mut tool = ArcTool::new();
        h.run(&mut tool, InputEvent::press(0.0, 0.0));
        h.run(&mut tool, InputEvent::press(40.0, 0.0));
        h.run(&mut tool, InputEvent::drag(0.0, 40.0));
        assert_eq!(h.scene.len(), 5);

        h.apply(tool.cancel());
        assert!(h.scene.is_empty());
        assert_eq!(tool.stage(), 0);
        assert!(tool.cancel().is_empty());
    }
}
