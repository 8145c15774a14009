use rxnview_canvas::{HandleRole, HitTolerance, SceneGraph, ZOrder};
use rxnview_core::{Bounds, CanvasConfig, CanvasError, ElementKind, Point};

fn two_nodes() -> (SceneGraph, rxnview_core::ElementId, rxnview_core::ElementId) {
    let mut scene = SceneGraph::new();
    let a = scene
        .add_node("A", Bounds::from_origin_size(0.0, 0.0, 50.0, 50.0))
        .unwrap();
    let b = scene
        .add_node("B", Bounds::from_origin_size(100.0, 100.0, 50.0, 50.0))
        .unwrap();
    (scene, a, b)
}

#[test]
fn test_index_consistent_after_every_mutation() {
    let (mut scene, a, b) = two_nodes();
    assert!(scene.index_is_consistent());

    let r = scene.add_reaction("r", vec![a], vec![b]).unwrap();
    assert!(scene.index_is_consistent());

    scene.set_position(a, Point::new(200.0, 0.0)).unwrap();
    assert!(scene.index_is_consistent());

    scene.resize(b, Bounds::new(100.0, 100.0, 180.0, 170.0)).unwrap();
    assert!(scene.index_is_consistent());

    let handle = scene.reaction(r).unwrap().handles()[0].1;
    scene.move_handle(handle, Point::new(120.0, 40.0)).unwrap();
    assert!(scene.index_is_consistent());

    scene.remove(a).unwrap();
    assert!(scene.index_is_consistent());
    assert!(!scene.contains(r));
}

#[test]
fn test_reaction_rejects_degenerate_and_missing_endpoints() {
    let (mut scene, a, _) = two_nodes();
    assert!(matches!(
        scene.add_reaction("self", vec![a], vec![a]),
        Err(CanvasError::DegenerateGeometry { .. })
    ));
    assert!(matches!(
        scene.add_reaction("empty", vec![], vec![a]),
        Err(CanvasError::DegenerateGeometry { .. })
    ));
    assert!(matches!(
        scene.add_reaction("dangling", vec![a], vec![rxnview_core::ElementId(999)]),
        Err(CanvasError::InvalidReference { .. })
    ));
    assert_eq!(scene.len(), 2);
}

#[test]
fn test_default_handle_positions() {
    let (mut scene, a, b) = two_nodes();
    let r = scene.add_reaction("r", vec![a], vec![b]).unwrap();
    let edge = scene.reaction(r).unwrap();
    assert_eq!(edge.centroid(), Point::new(75.0, 75.0));

    let species_a = edge
        .handle_for(HandleRole::Species {
            node: a,
            is_source: true,
        })
        .unwrap();
    let source = edge.handle_for(HandleRole::SourceCentroid).unwrap();
    let target = edge.handle_for(HandleRole::TargetCentroid).unwrap();

    use rxnview_canvas::Draggable;
    assert_eq!(scene.handle(species_a).unwrap().position(), Point::new(50.0, 50.0));
    assert_eq!(scene.handle(source).unwrap().position(), Point::new(50.0, 50.0));
    assert_eq!(scene.handle(target).unwrap().position(), Point::new(100.0, 100.0));
}

#[test]
fn test_compartment_children_follow_and_stay_inside() {
    let mut scene = SceneGraph::new();
    let c = scene
        .add_compartment("cell", Bounds::from_origin_size(0.0, 0.0, 400.0, 300.0))
        .unwrap();
    let n = scene
        .add_node("n", Bounds::from_origin_size(350.0, 250.0, 40.0, 40.0))
        .unwrap();
    scene.set_compartment(n, Some(c)).unwrap();
    assert_eq!(scene.node(n).unwrap().compartment, Some(c));

    scene.set_position(c, Point::new(100.0, 100.0)).unwrap();
    assert_eq!(
        scene.node(n).unwrap().rect.origin(),
        Point::new(450.0, 350.0)
    );

    // Dragging the child outside its compartment is clamped.
    scene.set_position(n, Point::new(1000.0, 1000.0)).unwrap();
    let rect = scene.node(n).unwrap().rect;
    assert!(scene.compartment(c).unwrap().rect.contains_bounds(&rect));
}

#[test]
fn test_compartment_resize_pulls_children_in() {
    let mut scene = SceneGraph::new();
    let c = scene
        .add_compartment("cell", Bounds::from_origin_size(0.0, 0.0, 800.0, 600.0))
        .unwrap();
    let n = scene
        .add_node("n", Bounds::from_origin_size(700.0, 500.0, 50.0, 50.0))
        .unwrap();
    scene.set_compartment(n, Some(c)).unwrap();

    let applied = scene.resize(c, Bounds::new(0.0, 0.0, 400.0, 300.0)).unwrap();
    assert_eq!(applied, Bounds::new(0.0, 0.0, 400.0, 300.0));
    let child = scene.node(n).unwrap().rect;
    assert!(applied.contains_bounds(&child), "{} outside {}", child, applied);
    assert!((child.width() - 50.0).abs() < 1e-9);
}

#[test]
fn test_zero_area_resize_keeps_previous() {
    let (mut scene, a, _) = two_nodes();
    let err = scene.resize(a, Bounds::new(10.0, 10.0, 10.0, 60.0)).unwrap_err();
    assert!(matches!(err, CanvasError::DegenerateGeometry { .. }));
    assert_eq!(
        scene.node(a).unwrap().rect,
        Bounds::from_origin_size(0.0, 0.0, 50.0, 50.0)
    );
}

#[test]
fn test_scene_bounds_clamp_moves() {
    let mut config = CanvasConfig::default();
    config.scene.bounds = Some(Bounds::new(0.0, 0.0, 500.0, 500.0));
    let mut scene = SceneGraph::with_config(config).unwrap();
    let a = scene
        .add_node("A", Bounds::from_origin_size(0.0, 0.0, 50.0, 50.0))
        .unwrap();
    scene.set_position(a, Point::new(480.0, -30.0)).unwrap();
    assert_eq!(scene.node(a).unwrap().rect.origin(), Point::new(450.0, 0.0));
}

#[test]
fn test_hit_test_prefers_topmost() {
    let mut scene = SceneGraph::new();
    let c = scene
        .add_compartment("cell", Bounds::from_origin_size(0.0, 0.0, 400.0, 300.0))
        .unwrap();
    let n = scene
        .add_node("n", Bounds::from_origin_size(10.0, 10.0, 50.0, 50.0))
        .unwrap();
    let tol = HitTolerance::uniform(2.0);

    assert_eq!(scene.hit_test(&Point::new(20.0, 20.0), &tol), Some(n));
    assert_eq!(scene.hit_test(&Point::new(200.0, 200.0), &tol), Some(c));
    assert_eq!(scene.hit_test(&Point::new(900.0, 900.0), &tol), None);
    assert_eq!(scene.query_point(&Point::new(20.0, 20.0)), vec![n, c]);
    assert!(scene.get(n).unwrap().z_order > scene.get(c).unwrap().z_order);
    assert_eq!(scene.get(c).unwrap().z_order, ZOrder::COMPARTMENT);
}

#[test]
fn test_ties_break_by_creation_order() {
    let mut scene = SceneGraph::new();
    let first = scene
        .add_node("first", Bounds::from_origin_size(0.0, 0.0, 50.0, 50.0))
        .unwrap();
    let second = scene
        .add_node("second", Bounds::from_origin_size(20.0, 20.0, 50.0, 50.0))
        .unwrap();

    assert_eq!(
        scene.hit_test(&Point::new(30.0, 30.0), &HitTolerance::uniform(0.0)),
        Some(second)
    );
    assert_eq!(
        scene.query_rect(&Bounds::new(0.0, 0.0, 100.0, 100.0)),
        vec![first, second]
    );
}

#[test]
fn test_removing_compartment_releases_children() {
    let mut scene = SceneGraph::new();
    let c = scene
        .add_compartment("cell", Bounds::from_origin_size(0.0, 0.0, 400.0, 300.0))
        .unwrap();
    let n = scene
        .add_node("n", Bounds::from_origin_size(10.0, 10.0, 50.0, 50.0))
        .unwrap();
    scene.set_compartment(n, Some(c)).unwrap();

    let removed = scene.remove(c).unwrap();
    assert_eq!(removed, vec![c]);
    assert_eq!(scene.node(n).unwrap().compartment, None);
    assert_eq!(scene.get(n).unwrap().kind(), ElementKind::Node);
}
