use rxnview_core::{Bounds, CanvasError, ElementId, Point};

use super::{Draggable, HitTestable, Resizable};

/// A species node: a labelled rectangle, optionally inside a compartment.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeElement {
    pub label: String,
    pub rect: Bounds,
    /// Weak back-reference to the containing compartment.
    pub compartment: Option<ElementId>,
}

impl NodeElement {
    pub fn new(label: impl Into<String>, rect: Bounds) -> Self {
        Self {
            label: label.into(),
            rect,
            compartment: None,
        }
    }

    pub fn center(&self) -> Point {
        self.rect.center()
    }
}

impl HitTestable for NodeElement {
    fn bounds(&self) -> Bounds {
        self.rect
    }

    fn hit_test(&self, point: &Point, _tolerance: f64) -> bool {
        self.rect.contains_point(point)
    }
}

impl Draggable for NodeElement {
    fn position(&self) -> Point {
        self.rect.origin()
    }

    fn set_position(&mut self, position: Point) {
        self.rect = self.rect.with_origin(position);
    }
}

impl Resizable for NodeElement {
    fn resize(&mut self, bounds: Bounds) -> Result<(), CanvasError> {
        if bounds.is_degenerate() || !bounds.is_finite() {
            return Err(CanvasError::degenerate(format!(
                "node '{}' cannot be resized to {}",
                self.label, bounds
            )));
        }
        self.rect = bounds;
        Ok(())
    }
}
