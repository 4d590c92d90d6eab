//! Grid snapping, angle math and small shape predicates.
//!
//! Leaf module: everything else in the workspace builds on these helpers.
//!
//! ## Angle convention
//!
//! Angles are degrees measured in scene coordinates: 0° lies on +X and
//! angles grow toward +Y (`atan2(dy, dx)`). Signed arc sweeps follow the
//! on-screen reading instead: a negative sweep turns clockwise as seen
//! by the user, which in scene coordinates means *increasing* angle. The
//! renderer converts both to the backend's convention at draw time.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Magnitudes below this are treated as zero.
pub const EPSILON: f64 = 1e-6;

// ─── Grid ────────────────────────────────────────────────────────────────

/// Round each coordinate to the nearest multiple of `grid`.
///
/// Ties round half away from zero (`f64::round`), so with a grid of 20
/// the value 10 snaps to 20 and -10 snaps to -20. A non-positive or
/// non-finite grid leaves the point untouched.
pub fn snap(p: Point, grid: f64) -> Point {
    if !(grid.is_finite() && grid > 0.0) {
        return p;
    }
    Point::new(snap_scalar(p.x, grid), snap_scalar(p.y, grid))
}

fn snap_scalar(v: f64, grid: f64) -> f64 {
    (v / grid).round() * grid
}

/// `snap`, unless the bypass modifier is held.
pub fn snap_unless(p: Point, grid: f64, bypass: bool) -> Point {
    if bypass { p } else { snap(p, grid) }
}

// ─── Angles ──────────────────────────────────────────────────────────────

/// Angle of `p` as seen from `center`, in degrees within (-180, 180].
pub fn angle_between(p: Point, center: Point) -> f64 {
    let a = (p.y - center.y).atan2(p.x - center.x).to_degrees();
    if a <= -180.0 { a + 360.0 } else { a }
}

/// Normalize an angle into [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if r >= 360.0 { 0.0 } else { r }
}

/// Sweep from `start` to `end` in the internal convention, in [0, 360).
pub fn ccw_span(start_deg: f64, end_deg: f64) -> f64 {
    normalize_degrees(end_deg - start_deg)
}

/// Direction an arc is drawn in, as seen on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArcDirection {
    #[default]
    Clockwise,
    CounterClockwise,
}

/// Signed sweep for an arc from `start_deg` toward `end_deg`.
///
/// Clockwise gives `-ccw_span`, counter-clockwise `360 - ccw_span`.
/// `major` flips to the complementary arc by adding or subtracting a
/// full turn. The magnitude of the result is always in (0, 360]: an arc
/// whose ends coincide becomes a full turn in the requested direction.
pub fn arc_sweep(start_deg: f64, end_deg: f64, direction: ArcDirection, major: bool) -> f64 {
    let span = ccw_span(start_deg, end_deg);
    let mut sweep = match direction {
        ArcDirection::Clockwise => -span,
        ArcDirection::CounterClockwise => 360.0 - span,
    };
    if major {
        sweep = if sweep > 0.0 { sweep - 360.0 } else { sweep + 360.0 };
    }
    if sweep.abs() < EPSILON {
        sweep = match direction {
            ArcDirection::Clockwise => -360.0,
            ArcDirection::CounterClockwise => 360.0,
        };
    }
    sweep
}

/// Point reached after fraction `t` of an arc's sweep.
pub fn arc_point(center: Point, radius: f64, start_deg: f64, sweep_deg: f64, t: f64) -> Point {
    let angle = (start_deg - t * sweep_deg).to_radians();
    center + Vec2::from_angle(angle) * radius
}

/// Keep `|p1 - p0|` but snap the direction to the nearest multiple of 45°.
pub fn constrain_to_cardinal45(p0: Point, p1: Point) -> Point {
    let d = p1 - p0;
    let len = d.hypot();
    if len < EPSILON {
        return p1;
    }
    let step = std::f64::consts::FRAC_PI_4;
    let angle = (d.atan2() / step).round() * step;
    p0 + Vec2::from_angle(angle) * len
}

// ─── Distances & predicates ──────────────────────────────────────────────

/// Distance from `p` to the closed segment `a`–`b`.
pub fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq < EPSILON * EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Smallest distance from `p` to any segment of an open polyline.
///
/// A single point degenerates to point distance; an empty polyline is
/// infinitely far away.
pub fn polyline_distance(p: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => p.distance(*only),
        _ => points
            .windows(2)
            .map(|w| segment_distance(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Even-odd point-in-polygon test. The polygon is implicitly closed.
pub fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = pj.x + (p.y - pj.y) / (pi.y - pj.y) * (pi.x - pj.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Vertex average of a polygon.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::ORIGIN;
    }
    let sum = points
        .iter()
        .fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
    (sum / points.len() as f64).to_point()
}

/// Closed-interval overlap of two rectangles. Degenerate (zero-area)
/// rectangles still overlap anything they touch.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    let (a, b) = (a.abs(), b.abs());
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Axis-aligned bounds of a point set; `None` when empty.
pub fn points_bbox(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

// ─── Hit shapes ──────────────────────────────────────────────────────────

/// Scene-space shape used for hit testing and erasing.
#[derive(Debug, Clone, PartialEq)]
pub enum HitShape {
    /// Closed, filled polygon (rectangles, ellipses, images, text boxes).
    Filled(Vec<Point>),
    /// Open polyline with a stroke half-width (lines, paths, arcs).
    Stroked { points: Vec<Point>, half_width: f64 },
    /// Union of convex polygons. Strokes under non-uniform scale, where
    /// the outline is no longer a constant distance from the centerline.
    Pieces(Vec<Vec<Point>>),
}

impl HitShape {
    /// Whether a disc of `radius` around `center` touches this shape.
    pub fn intersects_circle(&self, center: Point, radius: f64) -> bool {
        match self {
            HitShape::Filled(poly) => polygon_touches_circle(poly, center, radius),
            HitShape::Stroked { points, half_width } => {
                polyline_distance(center, points) <= radius + half_width
            }
            HitShape::Pieces(pieces) => pieces
                .iter()
                .any(|poly| polygon_touches_circle(poly, center, radius)),
        }
    }

    /// Point containment with a slop distance.
    pub fn contains(&self, p: Point, slop: f64) -> bool {
        self.intersects_circle(p, slop)
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            HitShape::Filled(poly) => points_bbox(poly),
            HitShape::Stroked { points, half_width } => {
                points_bbox(points).map(|r| r.inflate(*half_width, *half_width))
            }
            HitShape::Pieces(pieces) => pieces
                .iter()
                .filter_map(|poly| points_bbox(poly))
                .reduce(|a, b| a.union(b)),
        }
    }
}

fn polygon_touches_circle(poly: &[Point], center: Point, radius: f64) -> bool {
    if point_in_polygon(center, poly) {
        return true;
    }
    let Some(first) = poly.first() else {
        return false;
    };
    let mut ring = poly.to_vec();
    ring.push(*first);
    polyline_distance(center, &ring) <= radius
}

/// Outline of a round-capped, round-joined stroke along `points` as
/// convex pieces: one quad per segment and one octagon per vertex. The
/// octagons circumscribe the round caps.
pub fn stroke_pieces(points: &[Point], half_width: f64) -> Vec<Vec<Point>> {
    let r = half_width / (std::f64::consts::PI / 8.0).cos();
    let cap = |c: Point| -> Vec<Point> {
        (0..8)
            .map(|i| {
                let a = std::f64::consts::FRAC_PI_4 * i as f64 + std::f64::consts::PI / 8.0;
                c + Vec2::from_angle(a) * r
            })
            .collect()
    };

    let mut pieces: Vec<Vec<Point>> = points.iter().map(|p| cap(*p)).collect();
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let d = b - a;
        let len = d.hypot();
        if len < EPSILON {
            continue;
        }
        let n = Vec2::new(-d.y, d.x) * (half_width / len);
        pieces.push(vec![a + n, b + n, b - n, a - n]);
    }
    pieces
}
