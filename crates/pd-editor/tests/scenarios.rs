//! Integration tests: end-to-end gestures through the page engine
//! (pd-editor + pd-render + pd-core).

use kurbo::Point;
use pd_core::asset::MemoryAssets;
use pd_core::config::EditorConfig;
use pd_core::export::{ExportGeometry, export_scene};
use pd_core::model::ItemKind;
use pd_editor::input::{InputEvent, InputModifiers, KeyState};
use pd_editor::page::Page;
use pd_editor::tools::ToolKind;
use pretty_assertions::assert_eq;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn page() -> Page {
    init_logs();
    Page::new("Page 1", EditorConfig::default())
}

const SHIFT: KeyState = KeyState {
    shift: true,
    ..KeyState::NONE
};

// ─── Palette drop ───────────────────────────────────────────────────────

#[test]
fn rectangle_drop_snaps_selects_and_shows_handles() {
    let mut page = page();
    let id = page.drop_item(
        "Rectangle",
        Point::new(103.0, 57.0),
        InputModifiers::NONE,
        &MemoryAssets::new(),
    );

    let item = page.scene().get(id).unwrap();
    assert_eq!(item.pos, Point::new(100.0, 60.0));
    assert_eq!(
        item.kind,
        ItemKind::Rectangle {
            width: 120.0,
            height: 80.0
        }
    );
    assert_eq!(page.selection(), &[id]);

    let overlay = page.overlay().expect("overlay attached");
    assert_eq!(overlay.target(), id);
    // Eight resize handles plus the rotate handle.
    assert_eq!(overlay.handles().count() + 1, 9);
}

#[test]
fn bypass_modifier_skips_snapping() {
    let mut page = page();
    let bypass = InputModifiers {
        bypass_snap: true,
        ..InputModifiers::NONE
    };
    let id = page.drop_item("Ellipse", Point::new(103.0, 57.0), bypass, &MemoryAssets::new());
    assert_eq!(page.scene().get(id).unwrap().pos, Point::new(103.0, 57.0));
}

// ─── Line ───────────────────────────────────────────────────────────────

#[test]
fn constrained_short_line_is_kept() {
    let mut page = page();
    page.set_tool(ToolKind::Line);

    page.handle_event(InputEvent::press(0.0, 0.0));
    page.handle_event(InputEvent::drag(5.0, 5.0).with_keys(SHIFT));

    let preview = page.scene().items().next().unwrap();
    assert!(preview.transient);
    let ItemKind::Line { b, .. } = preview.kind else {
        panic!("expected line preview");
    };
    assert!(b.distance(Point::new(5.0, 5.0)) < 1e-9);

    page.handle_event(InputEvent::release(5.0, 5.0).with_keys(SHIFT));
    assert_eq!(page.scene().len(), 1);
    let line = page.scene().items().next().unwrap();
    assert!(!line.transient);
    let ItemKind::Line { a, b } = line.kind else {
        panic!("expected line");
    };
    let length = line.map_to_scene(a).distance(line.map_to_scene(b));
    assert!((length - 50f64.sqrt()).abs() < 1e-9);
    // Drawn items are not selected.
    assert!(page.selection().is_empty());
}

// ─── Arc ────────────────────────────────────────────────────────────────

#[test]
fn three_click_arc_defaults_to_clockwise() {
    init_logs();
    // A 10-unit grid keeps (50, 0) on a grid point.
    let config = EditorConfig {
        grid_size: 10.0,
        ..EditorConfig::default()
    };
    let mut page = Page::new("Page 1", config);
    page.set_tool(ToolKind::Arc);

    page.handle_event(InputEvent::press(0.0, 0.0));
    page.handle_event(InputEvent::release(0.0, 0.0));
    page.handle_event(InputEvent::press(50.0, 0.0));
    page.handle_event(InputEvent::release(50.0, 0.0));
    page.handle_event(InputEvent::drag(0.0, 50.0));

    // Mid-gesture: markers and preview exist but never reach the export.
    assert_eq!(page.scene().transient_ids().len(), 5);
    assert!(export_scene(page.scene(), 0.25).is_empty());

    page.handle_event(InputEvent::press(0.0, 50.0));
    page.handle_event(InputEvent::release(0.0, 50.0));
    assert!(page.scene().transient_ids().is_empty());

    let arc = page.scene().items().next().unwrap();
    assert_eq!(
        arc.kind,
        ItemKind::Arc {
            center: Point::ORIGIN,
            radius: 50.0,
            start_angle: 0.0,
            sweep: -90.0
        }
    );

    let exported = export_scene(page.scene(), 0.1);
    let ExportGeometry::Polyline { points } = &exported[0].geometry else {
        panic!("expected polyline");
    };
    assert!(points[0].distance(Point::new(50.0, 0.0)) < 1e-6);
    assert!(points[points.len() - 1].distance(Point::new(0.0, 50.0)) < 1e-6);
}

#[test]
fn escape_mid_arc_leaves_nothing_behind() {
    let mut page = page();
    page.set_tool(ToolKind::Arc);
    page.handle_event(InputEvent::press(0.0, 0.0));
    page.handle_event(InputEvent::press(60.0, 0.0));
    page.handle_event(InputEvent::drag(0.0, 60.0));

    page.handle_event(InputEvent::Key {
        key: "Escape".into(),
        keys: KeyState::NONE,
    });
    assert!(page.scene().is_empty());

    // The next click starts a fresh arc at stage 0.
    page.handle_event(InputEvent::press(20.0, 20.0));
    assert_eq!(page.scene().transient_ids().len(), 1);
}

#[test]
fn focus_loss_cancels_line_preview() {
    let mut page = page();
    page.set_tool(ToolKind::Line);
    page.handle_event(InputEvent::press(0.0, 0.0));
    page.handle_event(InputEvent::drag(80.0, 0.0));
    page.handle_event(InputEvent::FocusLost);
    assert!(page.scene().is_empty());
}

// ─── Eraser ─────────────────────────────────────────────────────────────

fn draw_line(page: &mut Page, a: Point, b: Point) {
    page.set_tool(ToolKind::Line);
    page.handle_event(InputEvent::press(a.x, a.y));
    page.handle_event(InputEvent::drag(b.x, b.y));
    page.handle_event(InputEvent::release(b.x, b.y));
}

#[test]
fn eraser_deletes_exactly_what_it_touches() {
    let mut page = page();
    draw_line(&mut page, Point::new(-100.0, 0.0), Point::new(100.0, 0.0));
    draw_line(&mut page, Point::new(-100.0, 40.0), Point::new(100.0, 40.0));
    let ids: Vec<_> = page.scene().items().map(|it| it.id).collect();
    assert_eq!(ids.len(), 2);

    page.set_tool(ToolKind::Eraser);
    // Radius 12 plus the 1-unit stroke half-width reaches y = 40 from y = 28
    // but not y = 0.
    page.handle_event(InputEvent::press(0.0, 28.0));
    assert!(page.scene().contains(ids[0]));
    assert!(!page.scene().contains(ids[1]));

    page.handle_event(InputEvent::release(0.0, 28.0));
    page.handle_event(InputEvent::drag(0.0, 0.0));
    assert!(page.scene().contains(ids[0]), "hovering never erases");

    page.handle_event(InputEvent::press(0.0, 0.0));
    assert!(!page.scene().contains(ids[0]));

    // Only the eraser cursor is left, and switching tools removes it.
    assert_eq!(page.scene().len(), 1);
    page.set_tool(ToolKind::Select);
    assert!(page.scene().is_empty());
}

// ─── Pen ────────────────────────────────────────────────────────────────

#[test]
fn pen_stroke_reaches_last_cursor_position() {
    let mut page = page();
    page.set_tool(ToolKind::Pen);
    page.handle_event(InputEvent::press(0.0, 0.0));
    for i in 1..=10 {
        page.handle_event(InputEvent::drag(i as f64 * 10.0, (i % 2) as f64 * 10.0));
    }
    page.handle_event(InputEvent::release(100.0, 0.0));

    let path = page.scene().items().next().unwrap();
    let polyline = path.scene_polyline(0.1);
    assert!(polyline[0].distance(Point::ORIGIN) < 1e-9);
    assert!(polyline[polyline.len() - 1].distance(Point::new(100.0, 0.0)) < 1e-9);
}

#[test]
fn unfinished_pen_stroke_is_discarded() {
    let mut page = page();
    page.set_tool(ToolKind::Pen);
    page.handle_event(InputEvent::press(0.0, 0.0));
    page.handle_event(InputEvent::drag(30.0, 10.0));
    page.handle_event(InputEvent::FocusLost);
    assert!(page.scene().is_empty());

    page.handle_event(InputEvent::press(0.0, 0.0));
    page.handle_event(InputEvent::drag(30.0, 10.0));
    page.set_tool(ToolKind::Select);
    assert!(page.scene().is_empty());
    assert_eq!(page.tool_kind(), ToolKind::Select);
}
