use rxnview_canvas::CoordinateSpace;
use rxnview_core::{Bounds, CanvasError, Point, ViewportConfig};

const EPS: f64 = 1e-9;

fn assert_close(a: Point, b: Point) {
    assert!(
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS,
        "expected {}, got {}",
        b,
        a
    );
}

#[test]
fn test_round_trip_with_pan_zoom_and_dpi() {
    let mut space = CoordinateSpace::new(800.0, 600.0);
    space.set_dpi_scale(2.0).unwrap();
    space.pan(Point::new(37.0, -12.0));
    space.zoom(1.7, Point::new(120.0, 80.0));

    for p in [
        Point::new(0.0, 0.0),
        Point::new(-250.5, 1e4),
        Point::new(3.25, 7.75),
    ] {
        assert_close(space.to_logical(space.to_device(p)), p);
    }
}

#[test]
fn test_zoom_anchor_scenario() {
    let mut space = CoordinateSpace::new(800.0, 600.0);
    space.set_scale(2.0, Point::zero());
    space.set_origin(Point::zero());
    assert_close(space.to_logical(Point::new(100.0, 100.0)), Point::new(50.0, 50.0));

    assert!(space.zoom(2.0, Point::new(100.0, 100.0)));
    assert_close(space.to_logical(Point::new(100.0, 100.0)), Point::new(50.0, 50.0));
    assert!((space.scale() - 4.0).abs() < EPS);
}

#[test]
fn test_zoom_clamps_to_range() {
    let config = ViewportConfig::default();
    let mut space = CoordinateSpace::from_config(&config, 800.0, 600.0).unwrap();
    space.zoom(1000.0, Point::new(10.0, 10.0));
    assert!((space.scale() - config.max_scale).abs() < EPS);
    assert!(!space.zoom(2.0, Point::new(10.0, 10.0)));

    space.zoom(1e-6, Point::new(10.0, 10.0));
    assert!((space.scale() - config.min_scale).abs() < EPS);
}

#[test]
fn test_invalid_factors_ignored() {
    let mut space = CoordinateSpace::new(800.0, 600.0);
    let before = space.clone();
    assert!(!space.zoom(0.0, Point::zero()));
    assert!(!space.zoom(-2.0, Point::zero()));
    assert!(!space.zoom(f64::NAN, Point::zero()));
    assert_eq!(space, before);
}

#[test]
fn test_scale_limits_rejected_when_invalid() {
    let mut space = CoordinateSpace::new(800.0, 600.0);
    assert!(matches!(
        space.set_scale_limits(0.0, 4.0),
        Err(CanvasError::OutOfRange { .. })
    ));
    assert!(space.set_scale_limits(5.0, 4.0).is_err());
    assert!(space.set_scale_limits(0.5, 4.0).is_ok());
}

#[test]
fn test_pan_limits_clamp_origin() {
    let mut space = CoordinateSpace::new(100.0, 100.0);
    space
        .set_pan_limits(Some(Bounds::new(0.0, 0.0, 500.0, 500.0)))
        .unwrap();
    space.pan(Point::new(50.0, 50.0));
    assert_close(space.origin(), Point::zero());

    space.set_origin(Point::new(450.0, 10.0));
    assert_close(space.origin(), Point::new(400.0, 10.0));
}

#[test]
fn test_fit_to_bounds_contains_content() {
    let mut space = CoordinateSpace::new(800.0, 600.0);
    let content = Bounds::new(100.0, 50.0, 300.0, 150.0);
    assert!(space.fit_to_bounds(&content, 20.0));

    let device = space.bounds_to_device(&content);
    assert!(device.min_x >= 20.0 - 1e-6, "left edge {}", device.min_x);
    assert!(device.max_x <= 780.0 + 1e-6, "right edge {}", device.max_x);
    assert!(device.min_y >= 20.0 - 1e-6, "top edge {}", device.min_y);
    assert!(device.max_y <= 580.0 + 1e-6, "bottom edge {}", device.max_y);
    assert_close(space.to_device(content.center()), space.device_center());
}

#[test]
fn test_visible_bounds_follow_pan() {
    let mut space = CoordinateSpace::new(800.0, 600.0);
    space.pan(Point::new(-100.0, -50.0));
    assert_eq!(space.visible_bounds(), Bounds::new(100.0, 50.0, 900.0, 650.0));
}
