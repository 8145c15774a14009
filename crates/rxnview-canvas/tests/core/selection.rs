use rxnview_canvas::SceneGraph;
use rxnview_core::{Bounds, ElementKind, SelectedElement};

#[test]
fn test_select_toggle_extend() {
    let mut scene = SceneGraph::new();
    let a = scene
        .add_node("A", Bounds::from_origin_size(0.0, 0.0, 50.0, 50.0))
        .unwrap();
    let b = scene
        .add_node("B", Bounds::from_origin_size(100.0, 0.0, 50.0, 50.0))
        .unwrap();

    assert!(scene.select_only(a));
    assert!(!scene.select_only(a));
    assert!(scene.toggle(b));
    assert_eq!(scene.selected_ids(), vec![a, b]);
    assert!(scene.toggle(a));
    assert_eq!(scene.selected_ids(), vec![b]);
    assert!(scene.extend(&[a]));
    assert_eq!(scene.selected_ids().len(), 2);
    assert!(scene.deselect_all());
    assert!(!scene.deselect_all());
}

#[test]
fn test_selected_elements_carry_kind() {
    let mut scene = SceneGraph::new();
    let a = scene
        .add_node("A", Bounds::from_origin_size(0.0, 0.0, 50.0, 50.0))
        .unwrap();
    let b = scene
        .add_node("B", Bounds::from_origin_size(100.0, 100.0, 50.0, 50.0))
        .unwrap();
    let r = scene.add_reaction("r", vec![a], vec![b]).unwrap();

    scene.select_only(r);
    assert_eq!(
        scene.selected_elements(),
        vec![SelectedElement {
            id: r,
            kind: ElementKind::Reaction
        }]
    );
}

#[test]
fn test_select_all_skips_handles() {
    let mut scene = SceneGraph::new();
    let a = scene
        .add_node("A", Bounds::from_origin_size(0.0, 0.0, 50.0, 50.0))
        .unwrap();
    let b = scene
        .add_node("B", Bounds::from_origin_size(100.0, 100.0, 50.0, 50.0))
        .unwrap();
    let r = scene.add_reaction("r", vec![a], vec![b]).unwrap();

    scene.select_all();
    assert_eq!(scene.selected_ids(), vec![a, b, r]);
}

#[test]
fn test_rect_selection_additive() {
    let mut scene = SceneGraph::new();
    let a = scene
        .add_node("A", Bounds::from_origin_size(0.0, 0.0, 50.0, 50.0))
        .unwrap();
    let b = scene
        .add_node("B", Bounds::from_origin_size(300.0, 300.0, 50.0, 50.0))
        .unwrap();

    scene.select_in_rect(&Bounds::new(-10.0, -10.0, 60.0, 60.0), false);
    assert_eq!(scene.selected_ids(), vec![a]);
    scene.select_in_rect(&Bounds::new(290.0, 290.0, 310.0, 310.0), true);
    assert_eq!(scene.selected_ids(), vec![a, b]);
    scene.select_in_rect(&Bounds::new(290.0, 290.0, 310.0, 310.0), false);
    assert_eq!(scene.selected_ids(), vec![b]);
}

#[test]
fn test_removal_prunes_selection() {
    let mut scene = SceneGraph::new();
    let a = scene
        .add_node("A", Bounds::from_origin_size(0.0, 0.0, 50.0, 50.0))
        .unwrap();
    scene.select_only(a);
    scene.remove(a).unwrap();
    assert!(scene.selected_ids().is_empty());
    assert_eq!(scene.primary_selection(), None);
}
