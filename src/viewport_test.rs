#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// --- defaults / construction ---

#[test]
fn viewport_default_is_identity() {
    let vp = Viewport::default();
    assert_eq!(vp.x, 0.0);
    assert_eq!(vp.y, 0.0);
    assert_eq!(vp.zoom, 1.0);
}

#[test]
fn viewport_new_clamps_zoom() {
    assert_eq!(Viewport::new(0.0, 0.0, 0.0).zoom, MIN_ZOOM);
    assert_eq!(Viewport::new(0.0, 0.0, 100.0).zoom, MAX_ZOOM);
    assert_eq!(Viewport::new(0.0, 0.0, f64::NAN).zoom, 1.0);
}

#[test]
fn centered_on_origin_puts_origin_mid_canvas() {
    let vp = Viewport::centered_on_origin(CanvasSize::new(800.0, 600.0));
    let screen = vp.world_to_screen(Point::new(0.0, 0.0));
    assert!(point_approx_eq(screen, Point::new(400.0, 300.0)));
}

#[test]
fn centered_on_cell_puts_cell_center_mid_canvas() {
    let size = CanvasSize::new(800.0, 600.0);
    let vp = Viewport::centered_on_cell(3, -2, size, 2.0);
    let cell_center = Point::new(-2.0 * CELL_SIZE + 75.0, 3.0 * CELL_SIZE + 75.0);
    let screen = vp.world_to_screen(cell_center);
    assert!(point_approx_eq(screen, Point::new(400.0, 300.0)));
    assert_eq!(vp.zoom, 2.0);
}

// --- transforms ---

#[test]
fn screen_to_world_with_pan_and_zoom() {
    let vp = Viewport { x: 100.0, y: -50.0, zoom: 2.0 };
    let world = vp.screen_to_world(Point::new(300.0, 150.0));
    assert!(point_approx_eq(world, Point::new(100.0, 100.0)));
}

#[test]
fn world_to_screen_inverts_screen_to_world() {
    let vp = Viewport { x: 37.5, y: -812.0, zoom: 0.35 };
    let screen = Point::new(123.0, 456.0);
    let back = vp.world_to_screen(vp.screen_to_world(screen));
    assert!(point_approx_eq(back, screen));
}

#[test]
fn pan_by_is_one_to_one_in_screen_pixels() {
    let mut vp = Viewport { x: 10.0, y: 20.0, zoom: 3.0 };
    vp.pan_by(5.0, -7.0);
    assert_eq!(vp.x, 15.0);
    assert_eq!(vp.y, 13.0);
    assert_eq!(vp.zoom, 3.0);
}

// --- zoom_at ---

#[test]
fn zoom_at_keeps_point_under_cursor_fixed() {
    let mut vp = Viewport::default();
    let cursor = Point::new(100.0, 100.0);
    let world_before = vp.screen_to_world(cursor);
    vp.zoom_at(cursor, 1.1);
    assert!(approx_eq(vp.zoom, 1.1));
    assert!(point_approx_eq(vp.world_to_screen(world_before), cursor));
    assert!(point_approx_eq(world_before, Point::new(100.0, 100.0)));
}

#[test]
fn zoom_at_clamps_and_still_anchors() {
    let mut vp = Viewport { x: -40.0, y: 25.0, zoom: 3.9 };
    let cursor = Point::new(250.0, 80.0);
    let world_before = vp.screen_to_world(cursor);
    vp.zoom_at(cursor, 1.1);
    assert_eq!(vp.zoom, MAX_ZOOM);
    assert!(point_approx_eq(vp.world_to_screen(world_before), cursor));
}

#[test]
fn zoom_at_out_respects_min_zoom() {
    let mut vp = Viewport { x: 0.0, y: 0.0, zoom: MIN_ZOOM };
    vp.zoom_at(Point::new(10.0, 10.0), 1.0 / 1.1);
    assert_eq!(vp.zoom, MIN_ZOOM);
    assert!(approx_eq(vp.x, 0.0));
}

// --- visible_world_rect ---

#[test]
fn visible_world_rect_at_unit_zoom() {
    let vp = Viewport { x: -1500.0, y: -1500.0, zoom: 1.0 };
    let rect = vp.visible_world_rect(CanvasSize::new(800.0, 600.0));
    assert_eq!(rect.left, 1500.0);
    assert_eq!(rect.top, 1500.0);
    assert_eq!(rect.right, 2300.0);
    assert_eq!(rect.bottom, 2100.0);
}

#[test]
fn visible_world_rect_scales_with_zoom() {
    let vp = Viewport { x: 0.0, y: 0.0, zoom: 0.5 };
    let rect = vp.visible_world_rect(CanvasSize::new(800.0, 600.0));
    assert_eq!(rect.right, 1600.0);
    assert_eq!(rect.bottom, 1200.0);
}

// --- CanvasRect ---

#[test]
fn canvas_rect_edges_and_local_points() {
    let rect = CanvasRect::new(20.0, 30.0, 800.0, 600.0);
    assert_eq!(rect.right(), 820.0);
    assert_eq!(rect.bottom(), 630.0);
    assert_eq!(rect.to_local(Point::new(120.0, 130.0)), Point::new(100.0, 100.0));
    assert_eq!(rect.size(), CanvasSize::new(800.0, 600.0));
}
