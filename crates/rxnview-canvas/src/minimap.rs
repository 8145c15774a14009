//! Minimap overlay: a reduced view of the whole scene drawn in a corner of
//! the main viewport, with an indicator for the region the main view shows.
//!
//! The minimap owns its own `CoordinateSpace` mapping the scene extent into
//! its frame. Device positions passed in are main-viewport coordinates; the
//! frame offset is applied here.

use rxnview_core::{Bounds, ElementKind, MinimapConfig, Point};

use crate::render::{MinimapElement, MinimapView};
use crate::scene::SceneGraph;
use crate::viewport::CoordinateSpace;

#[derive(Debug, Clone)]
pub struct Minimap {
    config: MinimapConfig,
    frame: Bounds,
    space: CoordinateSpace,
    extent: Bounds,
    indicator: Bounds,
    /// Logical bounds as of the last sync.
    items: Vec<MinimapElement>,
    synced: Option<(u64, Bounds)>,
    dragging: bool,
}

impl Minimap {
    /// Creates a minimap for a main viewport of `main_width` x `main_height`.
    pub fn new(config: MinimapConfig, main_width: f64, main_height: f64) -> Self {
        let space = CoordinateSpace::unbounded(config.width, config.height);
        let mut minimap = Self {
            frame: Bounds::from_origin_size(0.0, 0.0, config.width, config.height),
            config,
            space,
            extent: Bounds::new(0.0, 0.0, 1.0, 1.0),
            indicator: Bounds::new(0.0, 0.0, 1.0, 1.0),
            items: Vec::new(),
            synced: None,
            dragging: false,
        };
        minimap.set_viewport_size(main_width, main_height);
        minimap
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Re-anchors the frame to the bottom-right corner of the main viewport.
    pub fn set_viewport_size(&mut self, main_width: f64, main_height: f64) {
        let (w, h, m) = (self.config.width, self.config.height, self.config.margin);
        self.frame = Bounds::from_origin_size(
            (main_width - m - w).max(0.0),
            (main_height - m - h).max(0.0),
            w,
            h,
        );
        self.space.set_viewport_size(w, h);
        self.synced = None;
    }

    /// Device rectangle occupied by the minimap in the main viewport.
    pub fn frame(&self) -> Bounds {
        self.frame
    }

    /// Logical region the minimap shows.
    pub fn extent(&self) -> Bounds {
        self.extent
    }

    /// Logical region visible in the main view.
    pub fn indicator(&self) -> Bounds {
        self.indicator
    }

    pub fn space(&self) -> &CoordinateSpace {
        &self.space
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Brings the minimap up to date with the scene and the main view.
    ///
    /// Does nothing when neither the scene revision nor the main visible
    /// region changed since the last call. While the indicator is being
    /// dragged only the indicator follows; the extent stays put so the
    /// minimap does not rescale under the pointer.
    ///
    /// Returns true if anything changed.
    pub fn sync(&mut self, scene: &SceneGraph, main: &CoordinateSpace) -> bool {
        let visible = main.visible_bounds();
        let key = (scene.revision(), visible);
        if self.synced == Some(key) {
            return false;
        }
        self.synced = Some(key);
        self.indicator = visible;
        if self.dragging {
            return true;
        }

        self.items = scene
            .objects()
            .filter(|o| matches!(o.kind(), ElementKind::Node | ElementKind::Compartment))
            .map(|o| MinimapElement {
                id: o.id,
                kind: o.kind(),
                bounds: o.bounds(),
            })
            .collect();

        self.extent = match (scene.config().scene.bounds, scene.aggregate_bounds()) {
            (Some(fixed), _) => fixed.union(&visible),
            (None, Some(content)) => content.union(&visible),
            (None, None) => visible,
        };
        self.space.fit_to_bounds(&self.extent, 0.0);
        tracing::trace!("Minimap extent {}", self.extent);
        true
    }

    /// Whether a main-viewport device point falls on the minimap.
    pub fn contains(&self, device: Point) -> bool {
        self.config.enabled && self.frame.contains_point(&device)
    }

    fn to_local(&self, device: Point) -> Point {
        device - self.frame.origin()
    }

    /// Logical point under a main-viewport device point.
    pub fn to_logical(&self, device: Point) -> Point {
        self.space.to_logical(self.to_local(device))
    }

    /// Indicator rectangle in main-viewport device coordinates.
    pub fn indicator_device(&self) -> Bounds {
        self.space
            .bounds_to_device(&self.indicator)
            .translated(self.frame.origin())
    }

    /// Starts dragging the indicator.
    ///
    /// A press outside the indicator first centers the main view on the
    /// pressed point. Returns the grab offset of the pointer from the
    /// indicator's top-left corner.
    pub fn begin_drag(&mut self, device: Point, main: &mut CoordinateSpace) -> Point {
        if !self.indicator_device().contains_point(&device) {
            main.center_on(self.to_logical(device));
            self.indicator = main.visible_bounds();
        }
        self.dragging = true;
        device - self.indicator_device().origin()
    }

    /// Moves the main view so the indicator's top-left sits under
    /// `device - grab`. Returns the new main origin.
    pub fn drag_to(&mut self, device: Point, grab: Point, main: &mut CoordinateSpace) -> Point {
        main.set_origin(self.to_logical(device - grab));
        self.indicator = main.visible_bounds();
        main.origin()
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
        self.synced = None;
    }

    /// Minimap contents for the paint surface.
    pub fn render(&self) -> MinimapView {
        let offset = self.frame.origin();
        MinimapView {
            frame: self.frame,
            items: self
                .items
                .iter()
                .map(|item| MinimapElement {
                    bounds: self.space.bounds_to_device(&item.bounds).translated(offset),
                    ..*item
                })
                .collect(),
            indicator: self.indicator_device(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn setup() -> (SceneGraph, CoordinateSpace, Minimap) {
        let mut scene = SceneGraph::new();
        scene
            .add_node("A", Bounds::from_origin_size(0.0, 0.0, 50.0, 50.0))
            .unwrap();
        scene
            .add_node("B", Bounds::from_origin_size(1500.0, 1100.0, 100.0, 100.0))
            .unwrap();
        let main = CoordinateSpace::new(800.0, 600.0);
        let minimap = Minimap::new(MinimapConfig::default(), 800.0, 600.0);
        (scene, main, minimap)
    }

    #[test]
    fn test_frame_in_bottom_right() {
        let (_, _, minimap) = setup();
        assert_eq!(minimap.frame(), Bounds::new(590.0, 440.0, 790.0, 590.0));
    }

    #[test]
    fn test_sync_only_on_change() {
        let (scene, main, mut minimap) = setup();
        assert!(minimap.sync(&scene, &main));
        assert!(!minimap.sync(&scene, &main));
        assert_eq!(minimap.extent(), Bounds::new(0.0, 0.0, 1600.0, 1200.0));

        // The whole extent fits inside the frame.
        let device_extent = minimap.space().bounds_to_device(&minimap.extent());
        assert!(device_extent.width() <= 200.0 + EPS);
        assert!(device_extent.height() <= 150.0 + EPS);
    }

    #[test]
    fn test_render_keeps_element_identity() {
        let (mut scene, main, mut minimap) = setup();
        let far = scene
            .add_node("far", Bounds::from_origin_size(90_000.0, 0.0, 50.0, 50.0))
            .unwrap();
        minimap.sync(&scene, &main);

        // A huge extent needs a scale far below the main view's minimum.
        assert!(minimap.space().scale() < 0.01);

        let view = minimap.render();
        assert_eq!(view.items.len(), 3);
        let item = view.items.iter().find(|i| i.id == far).unwrap();
        assert_eq!(item.kind, ElementKind::Node);
        assert!(view.frame.expanded(EPS).contains_bounds(&item.bounds));
    }

    #[test]
    fn test_drag_indicator_pans_main_view() {
        let (scene, mut main, mut minimap) = setup();
        minimap.sync(&scene, &main);

        let indicator = minimap.indicator_device();
        let press = indicator.origin() + Point::new(5.0, 5.0);
        let grab = minimap.begin_drag(press, &mut main);
        assert!((grab.x - 5.0).abs() < EPS && (grab.y - 5.0).abs() < EPS);

        // Moving the indicator right by 20 minimap pixels scrolls the main
        // view right by 20 / minimap scale logical units.
        let origin = minimap.drag_to(press + Point::new(20.0, 0.0), grab, &mut main);
        let expected = 20.0 / minimap.space().effective_scale();
        assert!((origin.x - expected).abs() < EPS, "origin.x should be {}, got {}", expected, origin.x);
        assert!(origin.y.abs() < EPS);
        minimap.end_drag();
    }

    #[test]
    fn test_click_outside_indicator_centers_view() {
        let (scene, mut main, mut minimap) = setup();
        minimap.sync(&scene, &main);

        let target = minimap.space().to_device(Point::new(1200.0, 900.0)) + minimap.frame().origin();
        minimap.begin_drag(target, &mut main);
        let center = main.to_logical(main.device_center());
        assert!((center.x - 1200.0).abs() < 1e-3, "center.x = {}", center.x);
        assert!((center.y - 900.0).abs() < 1e-3, "center.y = {}", center.y);
    }
}
