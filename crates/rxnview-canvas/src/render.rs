//! Frame description handed to the host paint surface.
//!
//! The engine never draws. It produces a `RenderList` with every visible
//! element in paint order, already mapped to device space, and the host
//! toolkit turns that into pixels.

use rxnview_core::{Bounds, ElementId, ElementKind, Point};

use crate::element::{Draggable, HandleRole, SceneElement, ZOrder};
use crate::interaction::{CursorHint, ResizeHandle};
use crate::scene::SceneGraph;
use crate::viewport::CoordinateSpace;

/// Device-space geometry of one item.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderShape {
    /// Fill `device_bounds`.
    Rect,
    /// One polyline per species curve, plus the centroid marker.
    Curve {
        polylines: Vec<Vec<Point>>,
        centroid: Point,
    },
    /// A handle dot with a guide line back to `base`.
    Handle { center: Point, base: Point },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    pub id: ElementId,
    pub kind: ElementKind,
    pub label: String,
    /// Logical bounds.
    pub bounds: Bounds,
    pub device_bounds: Bounds,
    pub z_order: ZOrder,
    pub selected: bool,
    pub hovered: bool,
    pub shape: RenderShape,
}

/// One node or compartment as the minimap draws it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapElement {
    pub id: ElementId,
    pub kind: ElementKind,
    pub bounds: Bounds,
}

/// Minimap contents in main-viewport device coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimapView {
    pub frame: Bounds,
    pub items: Vec<MinimapElement>,
    pub indicator: Bounds,
}

/// Everything needed to paint one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderList {
    /// Visible elements, bottom to top.
    pub items: Vec<RenderItem>,
    /// Marquee rectangle in device space.
    pub marquee: Option<Bounds>,
    /// Resize squares of the single selected resizable element.
    pub resize_handles: Vec<(ResizeHandle, Bounds)>,
    pub minimap: Option<MinimapView>,
    pub cursor: CursorHint,
}

impl RenderList {
    pub fn item(&self, id: ElementId) -> Option<&RenderItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// Seam to the host toolkit's drawing surface.
pub trait PaintSurface {
    fn paint(&mut self, frame: &RenderList);
    fn set_cursor(&mut self, hint: CursorHint);
}

/// Builds render items for everything overlapping the visible region.
///
/// Handles appear only while their reaction is selected.
pub fn collect_items(scene: &SceneGraph, space: &CoordinateSpace) -> Vec<RenderItem> {
    let visible = space.visible_bounds();
    scene
        .query_rect(&visible)
        .into_iter()
        .filter_map(|id| scene.get(id))
        .filter_map(|obj| {
            let shape = match &obj.element {
                SceneElement::Node(_) | SceneElement::Compartment(_) => RenderShape::Rect,
                SceneElement::Reaction(edge) => RenderShape::Curve {
                    polylines: edge
                        .curves()
                        .iter()
                        .map(|c| c.points.iter().map(|p| space.to_device(*p)).collect())
                        .collect(),
                    centroid: space.to_device(edge.centroid()),
                },
                SceneElement::Handle(handle) => {
                    if !scene.is_selected(handle.edge) {
                        return None;
                    }
                    let edge = scene.reaction(handle.edge).ok()?;
                    let base = match handle.role {
                        HandleRole::Species { node, is_source } => edge
                            .curves()
                            .iter()
                            .find(|c| c.node == node && c.is_source == is_source)
                            .and_then(|c| c.points.first().copied())
                            .unwrap_or(edge.centroid()),
                        _ => edge.centroid(),
                    };
                    RenderShape::Handle {
                        center: space.to_device(handle.position()),
                        base: space.to_device(base),
                    }
                }
            };
            let bounds = obj.bounds();
            Some(RenderItem {
                id: obj.id,
                kind: obj.kind(),
                label: obj.element.label().to_string(),
                bounds,
                device_bounds: space.bounds_to_device(&bounds),
                z_order: obj.z_order,
                selected: obj.selected,
                hovered: obj.hovered,
                shape,
            })
        })
        .collect()
}
