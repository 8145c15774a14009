//! Zooming keeps the logical point under the anchor fixed.

use rxnview_canvas::{InteractionController, Key};
use rxnview_core::{CanvasConfig, Point};

const EPS: f64 = 1e-9;

#[test]
fn test_zoom_by_two_at_anchor() {
    let mut ctrl = InteractionController::new(CanvasConfig::default(), 800.0, 600.0).unwrap();
    ctrl.space_mut().set_scale(2.0, Point::zero());
    let anchor = Point::new(100.0, 100.0);
    let before = ctrl.space().to_logical(anchor);
    assert!((before.x - 50.0).abs() < EPS && (before.y - 50.0).abs() < EPS);

    ctrl.space_mut().zoom(2.0, anchor);
    let after = ctrl.space().to_logical(anchor);
    assert!((after.x - 50.0).abs() < EPS, "x drifted to {}", after.x);
    assert!((after.y - 50.0).abs() < EPS, "y drifted to {}", after.y);
}

#[test]
fn test_wheel_round_trip_returns_to_start() {
    let mut ctrl = InteractionController::new(CanvasConfig::default(), 800.0, 600.0).unwrap();
    let anchor = Point::new(230.0, 170.0);
    let origin = ctrl.space().origin();

    ctrl.wheel(3.0, anchor);
    ctrl.wheel(-3.0, anchor);
    assert!((ctrl.space().scale() - 1.0).abs() < 1e-9);
    assert!((ctrl.space().origin().x - origin.x).abs() < 1e-6);
    assert!((ctrl.space().origin().y - origin.y).abs() < 1e-6);
}

#[test]
fn test_zoom_keys_use_viewport_center() {
    let mut ctrl = InteractionController::new(CanvasConfig::default(), 800.0, 600.0).unwrap();
    let center = ctrl.space().device_center();
    let before = ctrl.space().to_logical(center);

    assert!(ctrl.key_down(Key::ZoomIn.into()));
    let after = ctrl.space().to_logical(center);
    assert!((before.x - after.x).abs() < EPS && (before.y - after.y).abs() < EPS);

    assert!(ctrl.key_down(Key::ResetZoom.into()));
    assert!((ctrl.space().scale() - 1.0).abs() < EPS);
    assert!(!ctrl.key_down(Key::ResetZoom.into()));
}

#[test]
fn test_zoom_stops_at_configured_limits() {
    let mut ctrl = InteractionController::new(CanvasConfig::default(), 800.0, 600.0).unwrap();
    let anchor = Point::new(10.0, 10.0);
    for _ in 0..100 {
        ctrl.wheel(1.0, anchor);
    }
    let max = ctrl.config().viewport.max_scale;
    assert!((ctrl.space().scale() - max).abs() < EPS);
    assert!(!ctrl.wheel(1.0, anchor));
}
