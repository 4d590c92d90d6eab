//! Page engine: one scene, its view, the active tool and the overlay.
//!
//! The page is the only writer of its scene. Every input event flows
//! through [`Page::handle_event`]; tool output is applied one mutation at a
//! time and after each one the scene's change log is drained, so the
//! transform overlay is refreshed right after its target changes and
//! never lags a frame behind.
//!
//! Invariant: the overlay exists iff exactly one item is selected.

use crate::input::{InputEvent, InputModifiers, PointerButton};
use crate::overlay::TransformOverlay;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{SceneMutation, Tool, ToolContext, ToolKind, make_tool};
use kurbo::Point;
use pd_core::asset::{AssetLoader, asset_filename, load_or_placeholder};
use pd_core::config::EditorConfig;
use pd_core::geometry::{normalize_degrees, snap_unless};
use pd_core::id::ItemId;
use pd_core::model::{Item, ItemKind, Scene, SceneChange};
use pd_core::viewport::Viewport;
use pd_render::paint::OverlayShape;

/// Wheel delta of one notch.
const WHEEL_NOTCH: f64 = 120.0;

type SelectionListener = Box<dyn FnMut(&[ItemId])>;

pub struct Page {
    pub name: String,
    scene: Scene,
    viewport: Viewport,
    config: EditorConfig,
    tool: Box<dyn Tool>,
    overlay: Option<TransformOverlay>,
    listeners: Vec<SelectionListener>,
    /// Scene point grabbed by a pan drag.
    pan_anchor: Option<Point>,
    /// Space held: primary drags pan instead of reaching the tool.
    space_down: bool,
}

impl Page {
    pub fn new(name: impl Into<String>, config: EditorConfig) -> Self {
        Self {
            name: name.into(),
            scene: Scene::new(),
            viewport: Viewport::default(),
            config,
            tool: make_tool(ToolKind::Select),
            overlay: None,
            listeners: Vec::new(),
            pan_anchor: None,
            space_down: false,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tool_kind(&self) -> ToolKind {
        self.tool.kind()
    }

    pub fn overlay(&self) -> Option<&TransformOverlay> {
        self.overlay.as_ref()
    }

    /// Overlay geometry for the painter.
    pub fn overlay_shape(&self) -> Option<OverlayShape> {
        self.overlay.as_ref().map(|o| o.shape(&self.config))
    }

    pub fn selection(&self) -> &[ItemId] {
        self.scene.selection()
    }

    /// Register a callback fired with the new selection whenever it
    /// changes.
    pub fn on_selection_changed(&mut self, listener: impl FnMut(&[ItemId]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: InputEvent) {
        match &event {
            InputEvent::PointerDown { pos, button, .. }
                if *button != PointerButton::Primary || self.space_down =>
            {
                self.pan_anchor = Some(*pos);
            }
            InputEvent::PointerMove { pos, .. } if self.pan_anchor.is_some() => {
                if let Some(anchor) = self.pan_anchor {
                    // Keep the grabbed scene point under the pointer.
                    self.viewport.pan_by((*pos - anchor) * self.viewport.zoom);
                    self.refresh_overlay();
                }
            }
            InputEvent::PointerUp { .. } if self.pan_anchor.is_some() => {
                self.pan_anchor = None;
            }
            InputEvent::PointerDown { .. }
            | InputEvent::PointerMove { .. }
            | InputEvent::PointerUp { .. } => {
                let ctx = ToolContext {
                    scene: &self.scene,
                    overlay: self.overlay.as_ref(),
                    viewport: &self.viewport,
                    config: &self.config,
                };
                let mutations = self.tool.handle(&event, &ctx);
                self.apply(mutations);
            }
            InputEvent::Wheel { pos, delta, keys } => self.wheel(*pos, *delta, keys.alt, keys.shift),
            InputEvent::Key { .. } if event.is_space() => self.space_down = true,
            InputEvent::Key { key, keys } => {
                if let Some(action) = ShortcutMap::resolve(key, *keys) {
                    self.run_shortcut(action);
                }
            }
            InputEvent::KeyUp { .. } => {
                if event.is_space() {
                    self.space_down = false;
                }
            }
            InputEvent::FocusLost => {
                self.pan_anchor = None;
                self.space_down = false;
                self.cancel_gesture();
            }
        }
    }

    fn wheel(&mut self, pos: Point, delta: f64, rotate: bool, scale: bool) {
        let notches = delta / WHEEL_NOTCH;
        let has_selection = !self.scene.selection().is_empty();
        if rotate && has_selection {
            self.rotate_selected(notches * self.config.wheel_rotate_step);
        } else if scale && has_selection {
            self.scale_selected(1.0 + self.config.wheel_zoom_step * notches);
        } else {
            let factor = (1.0 + self.config.wheel_zoom_step * notches).max(f64::EPSILON);
            let anchor = self.viewport.scene_to_screen(pos);
            self.viewport.zoom_about(anchor, factor);
            log::trace!("zoom {:.3}", self.viewport.zoom);
            self.refresh_overlay();
        }
    }

    pub fn run_shortcut(&mut self, action: ShortcutAction) {
        log::debug!("shortcut {action:?} on page {:?}", self.name);
        match action {
            ShortcutAction::Tool(kind) => self.set_tool(kind),
            ShortcutAction::AddText => {
                self.add_text();
            }
            ShortcutAction::DeleteSelected => self.delete_selected(),
            ShortcutAction::ClearAll => self.clear(),
            ShortcutAction::ScaleSelected(factor) => self.scale_selected(factor),
            ShortcutAction::ResetView => self.reset_view(),
            ShortcutAction::Cancel => self.cancel_gesture(),
        }
    }

    /// Abandon the active gesture and dispose of its transient items.
    pub fn cancel_gesture(&mut self) {
        let mutations = self.tool.cancel();
        self.apply(mutations);
    }

    /// Cancel the current gesture, then switch tools.
    pub fn set_tool(&mut self, kind: ToolKind) {
        self.cancel_gesture();
        if self.tool.kind() != kind {
            log::debug!("page {:?}: tool {:?} -> {kind:?}", self.name, self.tool.kind());
            self.tool = make_tool(kind);
        }
    }

    // ─── Mutation pipeline ───────────────────────────────────────────────

    /// Apply mutations in order, syncing dependents after each one.
    pub fn apply(&mut self, mutations: Vec<SceneMutation>) {
        for mutation in mutations {
            match mutation {
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
            self.sync();
        }
    }

    /// Drain the scene's change log and bring the overlay and selection
    /// listeners up to date.
    fn sync(&mut self) {
        let changes = self.scene.drain_changes();
        if changes.is_empty() {
            return;
        }

        if changes.contains(&SceneChange::SelectionChanged) {
            self.sync_overlay_to_selection();
            let selection = self.scene.selection();
            for listener in &mut self.listeners {
                listener(selection);
            }
            return;
        }

        let Some(target) = self.overlay.as_ref().map(TransformOverlay::target) else {
            return;
        };
        let touched = changes.iter().any(|c| match c {
            SceneChange::Moved(id)
            | SceneChange::TransformSet(id)
            | SceneChange::GeometrySet(id)
            | SceneChange::Removed(id) => *id == target,
            SceneChange::Cleared => true,
            SceneChange::Added(_) | SceneChange::SelectionChanged => false,
        });
        if touched {
            self.refresh_overlay();
        }
    }

    fn sync_overlay_to_selection(&mut self) {
        let single = match self.scene.selection() {
            [id] => Some(*id),
            _ => None,
        };
        let Some(id) = single else {
            self.destroy_overlay();
            return;
        };
        if self.overlay.as_ref().is_some_and(|o| o.target() == id) {
            self.refresh_overlay();
        } else {
            self.overlay = TransformOverlay::create(&self.scene, id, &self.viewport, &self.config);
            log::debug!("overlay attached to {id}");
        }
    }

    fn refresh_overlay(&mut self) {
        let alive = match &mut self.overlay {
            Some(overlay) => overlay.refresh(&self.scene, &self.viewport, &self.config),
            None => true,
        };
        if !alive {
            self.destroy_overlay();
        }
    }

    /// Detach the overlay. Idempotent.
    pub fn destroy_overlay(&mut self) {
        if let Some(overlay) = self.overlay.take() {
            log::debug!("overlay detached from {}", overlay.target());
        }
    }

    // ─── Drop source ─────────────────────────────────────────────────────

    /// Create the item for a palette token dropped at `point`, select it
    /// and attach the overlay.
    ///
    /// `"Text"`, `"Rectangle"` and `"Ellipse"` are built in; any other tag
    /// is an image resolved through `assets`, with a placeholder when it
    /// cannot be loaded.
    pub fn drop_item(
        &mut self,
        tag: &str,
        point: Point,
        modifiers: InputModifiers,
        assets: &dyn AssetLoader,
    ) -> ItemId {
        let config = &self.config;
        let kind = match tag {
            "Text" => ItemKind::Label {
                text: "m".into(),
                font_size: config.label_font_size,
            },
            "Rectangle" => ItemKind::Rectangle {
                width: config.rect_size.0,
                height: config.rect_size.1,
            },
            "Ellipse" => ItemKind::Ellipse {
                rx: config.ellipse_size.0 / 2.0,
                ry: config.ellipse_size.1 / 2.0,
            },
            other => {
                let name = asset_filename(other).unwrap_or(other);
                ItemKind::Pixmap {
                    asset: name.to_string(),
                    image: load_or_placeholder(assets, name),
                }
            }
        };
        let pos = snap_unless(point, config.grid_size, modifiers.bypass_snap);
        let item = Item::new(kind)
            .with_stroke_width(config.stroke_width)
            .with_pos(pos);
        let id = item.id;
        log::debug!("dropped {tag:?} as {id} at {pos:?}");
        self.apply(vec![
            SceneMutation::AddItem(Box::new(item)),
            SceneMutation::Select {
                ids: [id].into_iter().collect(),
            },
        ]);
        id
    }

    // ─── Shell actions ───────────────────────────────────────────────────

    pub fn delete_selected(&mut self) {
        let doomed: Vec<_> = self
            .scene
            .selection()
            .iter()
            .map(|&id| SceneMutation::RemoveItem { id })
            .collect();
        self.apply(doomed);
    }

    /// Remove every item, abandoning any gesture first.
    pub fn clear(&mut self) {
        self.cancel_gesture();
        let n = self.scene.clear();
        log::debug!("page {:?} cleared ({n} items)", self.name);
        self.sync();
    }

    /// Add an unselected "F" label at the scene origin.
    pub fn add_text(&mut self) -> ItemId {
        let item = Item::new(ItemKind::Label {
            text: "F".into(),
            font_size: self.config.label_font_size,
        });
        let id = item.id;
        self.apply(vec![SceneMutation::AddItem(Box::new(item))]);
        id
    }

    /// Grow or shrink every selected item. Labels change font size within
    /// the label limits; other items scale uniformly within the scale
    /// limits.
    pub fn scale_selected(&mut self, factor: f64) {
        let config = &self.config;
        let mutations: Vec<_> = self
            .scene
            .selection()
            .iter()
            .filter_map(|&id| self.scene.get(id))
            .map(|item| match &item.kind {
                ItemKind::Label { text, font_size } => SceneMutation::SetGeometry {
                    id: item.id,
                    kind: ItemKind::Label {
                        text: text.clone(),
                        font_size: (font_size * factor)
                            .clamp(config.label_font_min, config.label_font_max),
                    },
                },
                _ => {
                    let mut transform = item.transform();
                    transform.scale_x = config.clamp_scale(transform.scale_x * factor);
                    transform.scale_y = config.clamp_scale(transform.scale_y * factor);
                    SceneMutation::SetTransform {
                        id: item.id,
                        transform,
                    }
                }
            })
            .collect();
        self.apply(mutations);
    }

    /// Rotate every selected item by `degrees` about its own center.
    pub fn rotate_selected(&mut self, degrees: f64) {
        let mutations: Vec<_> = self
            .scene
            .selection()
            .iter()
            .filter_map(|&id| self.scene.get(id))
            .map(|item| {
                let mut transform = item.transform();
                transform.rotation = normalize_degrees(transform.rotation + degrees);
                SceneMutation::SetTransform {
                    id: item.id,
                    transform,
                }
            })
            .collect();
        self.apply(mutations);
    }

    /// Replace a label's text. Returns `false` if `id` is not a label on
    /// this page.
    pub fn set_label_text(&mut self, id: ItemId, text: impl Into<String>) -> bool {
        let Some(ItemKind::Label { font_size, .. }) = self.scene.get(id).map(|it| &it.kind) else {
            return false;
        };
        let kind = ItemKind::Label {
            text: text.into(),
            font_size: *font_size,
        };
        self.apply(vec![SceneMutation::SetGeometry { id, kind }]);
        true
    }

    /// Back to the origin at 100 %.
    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.refresh_overlay();
    }
}
