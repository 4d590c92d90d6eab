//! Transform overlay: the oriented box, eight resize handles and the
//! rotate handle drawn around a single selected item.
//!
//! The overlay is not a scene item. It lives beside the scene on the
//! [`Page`](crate::page::Page), is rebuilt from its target after every
//! mutation, and is dropped when the selection stops being a single item.
//! Handle hit areas are sized in screen pixels so they stay grabbable at
//! any zoom.

use kurbo::{Affine, Point, Vec2};
use pd_core::config::EditorConfig;
use pd_core::geometry::{EPSILON, angle_between, centroid, normalize_degrees};
use pd_core::id::ItemId;
use pd_core::model::{Scene, TransformState};
use pd_core::viewport::Viewport;
use pd_render::paint::OverlayShape;

/// Compass role of a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleRole {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl HandleRole {
    pub const ALL: [HandleRole; 8] = [
        HandleRole::N,
        HandleRole::S,
        HandleRole::E,
        HandleRole::W,
        HandleRole::NE,
        HandleRole::NW,
        HandleRole::SE,
        HandleRole::SW,
    ];

    fn index(self) -> usize {
        match self {
            HandleRole::N => 0,
            HandleRole::S => 1,
            HandleRole::E => 2,
            HandleRole::W => 3,
            HandleRole::NE => 4,
            HandleRole::NW => 5,
            HandleRole::SE => 6,
            HandleRole::SW => 7,
        }
    }

    pub fn scales_x(self) -> bool {
        !matches!(self, HandleRole::N | HandleRole::S)
    }

    pub fn scales_y(self) -> bool {
        !matches!(self, HandleRole::E | HandleRole::W)
    }
}

/// Which part of the overlay a press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleHit {
    Resize(HandleRole),
    Rotate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformOverlay {
    target: ItemId,
    /// TL, TR, BR, BL in scene space.
    quad: [Point; 4],
    handles: [Point; 8],
    rotate_handle: Point,
}

impl TransformOverlay {
    /// Attach to `target`. `None` if it is not in the scene.
    pub fn create(
        scene: &Scene,
        target: ItemId,
        viewport: &Viewport,
        config: &EditorConfig,
    ) -> Option<Self> {
        let mut overlay = Self {
            target,
            quad: [Point::ORIGIN; 4],
            handles: [Point::ORIGIN; 8],
            rotate_handle: Point::ORIGIN,
        };
        overlay.refresh(scene, viewport, config).then_some(overlay)
    }

    /// Recompute the quad and every handle from the target's current
    /// bounding box and transform. Returns `false` if the target is gone.
    pub fn refresh(&mut self, scene: &Scene, viewport: &Viewport, config: &EditorConfig) -> bool {
        let Some(item) = scene.get(self.target) else {
            return false;
        };
        let quad = item.scene_corners();
        let [tl, tr, br, bl] = quad;
        let n = tl.midpoint(tr);

        for role in HandleRole::ALL {
            self.handles[role.index()] = match role {
                HandleRole::N => n,
                HandleRole::S => br.midpoint(bl),
                HandleRole::E => tr.midpoint(br),
                HandleRole::W => bl.midpoint(tl),
                HandleRole::NE => tr,
                HandleRole::NW => tl,
                HandleRole::SE => br,
                HandleRole::SW => bl,
            };
        }

        let edge = tr - tl;
        let len = edge.hypot();
        let mut normal = if len < EPSILON {
            Vec2::new(0.0, -1.0)
        } else {
            Vec2::new(-edge.y, edge.x) / len
        };
        // Point away from the shape so the handle never lands inside it.
        if normal.dot(n - centroid(&quad)) < 0.0 {
            normal = -normal;
        }
        self.rotate_handle = n + normal * viewport.screen_dist_to_scene(config.rotate_offset_px);
        self.quad = quad;
        true
    }

    pub fn target(&self) -> ItemId {
        self.target
    }

    pub fn quad(&self) -> [Point; 4] {
        self.quad
    }

    pub fn center(&self) -> Point {
        centroid(&self.quad)
    }

    pub fn handle(&self, role: HandleRole) -> Point {
        self.handles[role.index()]
    }

    pub fn handles(&self) -> impl Iterator<Item = (HandleRole, Point)> + '_ {
        HandleRole::ALL.into_iter().map(|r| (r, self.handle(r)))
    }

    pub fn rotate_handle(&self) -> Point {
        self.rotate_handle
    }

    /// Rotate handle first, then resize handles in [`HandleRole::ALL`]
    /// order.
    pub fn hit_handle(&self, p: Point, viewport: &Viewport, config: &EditorConfig) -> Option<HandleHit> {
        let half = viewport.screen_dist_to_scene(config.handle_size_px / 2.0 + config.handle_slop_px);
        let within = |h: Point| (p.x - h.x).abs() <= half && (p.y - h.y).abs() <= half;

        if within(self.rotate_handle) {
            return Some(HandleHit::Rotate);
        }
        self.handles()
            .find(|(_, h)| within(*h))
            .map(|(role, _)| HandleHit::Resize(role))
    }

    /// Geometry handed to the painter.
    pub fn shape(&self, config: &EditorConfig) -> OverlayShape {
        OverlayShape {
            quad: self.quad,
            handles: self.handles,
            rotate_handle: self.rotate_handle,
            handle_size_px: config.handle_size_px,
        }
    }
}

// ─── Handle drags ────────────────────────────────────────────────────────

/// An in-progress drag on one of the overlay's handles.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleDrag {
    Resize {
        target: ItemId,
        role: HandleRole,
        /// Scene → local mapping frozen at press time.
        press_inverse: Affine,
        center_local: Point,
        reference: Vec2,
        press_transform: TransformState,
    },
    Rotate {
        target: ItemId,
        center: Point,
        press_angle: f64,
        press_transform: TransformState,
    },
}

impl HandleDrag {
    /// Record press-time state. `None` if the target is gone or its
    /// transform cannot be inverted.
    pub fn begin(hit: HandleHit, overlay: &TransformOverlay, scene: &Scene, p: Point) -> Option<Self> {
        let target = overlay.target();
        let item = scene.get(target)?;
        let press_transform = item.transform();

        match hit {
            HandleHit::Resize(role) => {
                let affine = item.scene_transform();
                if affine.determinant().abs() < EPSILON {
                    return None;
                }
                let press_inverse = affine.inverse();
                let center_local = item.bounding_box().center();
                Some(Self::Resize {
                    target,
                    role,
                    press_inverse,
                    center_local,
                    reference: press_inverse * p - center_local,
                    press_transform,
                })
            }
            HandleHit::Rotate => {
                let center = overlay.center();
                Some(Self::Rotate {
                    target,
                    center,
                    press_angle: angle_between(p, center),
                    press_transform,
                })
            }
        }
    }

    pub fn target(&self) -> ItemId {
        match self {
            Self::Resize { target, .. } | Self::Rotate { target, .. } => *target,
        }
    }

    /// The target transform for pointer position `p`, rebuilt from the
    /// press-time state.
    pub fn update(&self, p: Point, config: &EditorConfig) -> TransformState {
        match self {
            Self::Resize {
                role,
                press_inverse,
                center_local,
                reference,
                press_transform,
                ..
            } => {
                let current = *press_inverse * p - *center_local;
                let ratio = |cur: f64, reference: f64| {
                    if reference.abs() > EPSILON { cur / reference } else { 1.0 }
                };
                let sx = if role.scales_x() { ratio(current.x, reference.x) } else { 1.0 };
                let sy = if role.scales_y() { ratio(current.y, reference.y) } else { 1.0 };
                TransformState {
                    rotation: press_transform.rotation,
                    scale_x: config.clamp_scale(press_transform.scale_x * sx),
                    scale_y: config.clamp_scale(press_transform.scale_y * sy),
                }
            }
            Self::Rotate {
                center,
                press_angle,
                press_transform,
                ..
            } => {
                let current = angle_between(p, *center);
                TransformState {
                    rotation: normalize_degrees(press_transform.rotation + current - press_angle),
                    ..*press_transform
                }
            }
        }
    }
}
