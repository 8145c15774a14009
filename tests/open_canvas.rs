use rxnview::{open_canvas, Bounds, CanvasConfig, PointerEvent};
use std::io::Write;

#[test]
fn test_open_canvas_with_defaults() {
    let mut canvas = open_canvas(None, 800.0, 600.0).unwrap();
    assert!(canvas.event_bus().is_some());
    let id = canvas
        .scene_mut()
        .add_node("atp", Bounds::from_origin_size(0.0, 0.0, 50.0, 30.0))
        .unwrap();
    canvas.pointer_down(PointerEvent::primary(10.0, 10.0));
    canvas.pointer_up(PointerEvent::primary(10.0, 10.0));
    assert_eq!(canvas.scene().selected_ids(), vec![id]);
}

#[test]
fn test_open_canvas_reads_config_file() {
    let mut config = CanvasConfig::default();
    config.viewport.max_scale = 4.0;
    config.minimap.enabled = false;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(config.to_toml_string().unwrap().as_bytes())
        .unwrap();

    let canvas = open_canvas(Some(file.path()), 800.0, 600.0).unwrap();
    assert_eq!(canvas.config().viewport.max_scale, 4.0);
    assert_eq!(canvas.space().max_scale(), 4.0);
    assert!(!canvas.minimap().is_enabled());
}

#[test]
fn test_open_canvas_rejects_invalid_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[viewport]\nmin_scale = -1.0\n").unwrap();
    assert!(open_canvas(Some(file.path()), 800.0, 600.0).is_err());
}
