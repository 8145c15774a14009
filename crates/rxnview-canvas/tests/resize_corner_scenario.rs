//! The configured corner size decides where a press on a selected node
//! starts a resize and where it starts a move.

use rxnview_canvas::{InteractionController, InteractionState, Key, PointerEvent, ResizeHandle};
use rxnview_core::{Bounds, CanvasConfig, ElementId, Point};

const NODE: Bounds = Bounds {
    min_x: 100.0,
    min_y: 100.0,
    max_x: 300.0,
    max_y: 200.0,
};

fn controller(corner_size: f64, scale: f64) -> (InteractionController, ElementId) {
    let mut config = CanvasConfig::default();
    config.resize.corner_size = corner_size;
    let mut ctrl = InteractionController::new(config, 800.0, 600.0).unwrap();
    ctrl.space_mut().set_scale(scale, Point::zero());
    let node = ctrl.scene_mut().add_node("S", NODE).unwrap();
    ctrl.scene_mut().select_only(node);
    (ctrl, node)
}

fn press(ctrl: &mut InteractionController, x: f64, y: f64) -> &InteractionState {
    ctrl.pointer_down(PointerEvent::primary(x, y));
    ctrl.state()
}

#[test]
fn test_corner_square_follows_corner_size() {
    for size in [4.0, 8.0, 16.0] {
        let half = size / 2.0;
        let (mut ctrl, node) = controller(size, 1.0);

        let frame = ctrl.render();
        let (_, square) = frame
            .resize_handles
            .iter()
            .find(|(h, _)| *h == ResizeHandle::SouthEast)
            .copied()
            .unwrap();
        assert_eq!(square, Bounds::new(300.0 - half, 200.0 - half, 300.0 + half, 200.0 + half));

        // Just inside the square: resize.
        let state = press(&mut ctrl, 300.0 - half + 0.5, 200.0 - half + 0.5);
        assert!(
            matches!(
                state,
                InteractionState::ResizingElement { handle: ResizeHandle::SouthEast, id, .. } if *id == node
            ),
            "size {size}: got {state}"
        );
        assert!(ctrl.key_down(Key::Escape.into()));

        // Just outside it, still on the node: move.
        let state = press(&mut ctrl, 300.0 - half - 0.5, 200.0 - half - 0.5);
        assert!(
            matches!(state, InteractionState::DraggingElements { .. }),
            "size {size}: got {state}"
        );
        assert!(ctrl.key_down(Key::Escape.into()));
        assert_eq!(ctrl.scene().get(node).unwrap().bounds(), NODE);
    }
}

#[test]
fn test_corner_size_is_in_device_pixels() {
    for size in [4.0, 8.0, 16.0] {
        let half = size / 2.0;
        let (mut ctrl, node) = controller(size, 2.0);

        // At scale 2 the top-left corner sits at device (200, 200) and the
        // square keeps its configured size.
        let at = 200.0 - half + 0.5;
        let state = press(&mut ctrl, at, at);
        assert!(
            matches!(state, InteractionState::ResizingElement { handle: ResizeHandle::NorthWest, .. }),
            "size {size}: got {state}"
        );
        ctrl.pointer_up(PointerEvent::primary(at - 20.0, at - 20.0));

        // Dragged 20 device px up-left, which is 10 logical units at scale 2.
        let resized = ctrl.scene().get(node).unwrap().bounds();
        assert!((resized.min_x - 90.0).abs() < 1e-9, "size {size}: {resized}");
        assert!((resized.min_y - 90.0).abs() < 1e-9, "size {size}: {resized}");
        assert_eq!((resized.max_x, resized.max_y), (NODE.max_x, NODE.max_y));
    }
}
