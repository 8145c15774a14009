use std::collections::BTreeSet;

use rxnview_core::{Bounds, CanvasError, ElementId, Point};

use super::{Draggable, HitTestable, Resizable};

/// A compartment rectangle drawn beneath the nodes it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct CompartmentBox {
    pub label: String,
    pub rect: Bounds,
    pub children: BTreeSet<ElementId>,
}

impl CompartmentBox {
    pub fn new(label: impl Into<String>, rect: Bounds) -> Self {
        Self {
            label: label.into(),
            rect,
            children: BTreeSet::new(),
        }
    }

    /// Proposes a new rectangle for a child when this compartment changes
    /// from `old` to its current rectangle.
    ///
    /// Children that still fit are left alone. Others keep their relative
    /// offset scaled by the size ratio, then get clamped inside. Returns
    /// `None` when the child is larger than the compartment.
    pub fn reposition_child(&self, old: &Bounds, child: &Bounds) -> Option<Bounds> {
        if self.rect.contains_bounds(child) {
            return Some(*child);
        }
        let sx = if old.width() > 0.0 {
            self.rect.width() / old.width()
        } else {
            1.0
        };
        let sy = if old.height() > 0.0 {
            self.rect.height() / old.height()
        } else {
            1.0
        };
        let rel = child.origin() - old.origin();
        let proposed = child.with_origin(self.rect.origin() + Point::new(rel.x * sx, rel.y * sy));
        proposed.fit_inside(&self.rect)
    }
}

impl HitTestable for CompartmentBox {
    fn bounds(&self) -> Bounds {
        self.rect
    }

    fn hit_test(&self, point: &Point, _tolerance: f64) -> bool {
        self.rect.contains_point(point)
    }
}

impl Draggable for CompartmentBox {
    fn position(&self) -> Point {
        self.rect.origin()
    }

    fn set_position(&mut self, position: Point) {
        self.rect = self.rect.with_origin(position);
    }
}

impl Resizable for CompartmentBox {
    fn resize(&mut self, bounds: Bounds) -> Result<(), CanvasError> {
        if bounds.is_degenerate() || !bounds.is_finite() {
            return Err(CanvasError::degenerate(format!(
                "compartment '{}' cannot be resized to {}",
                self.label, bounds
            )));
        }
        self.rect = bounds;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reposition_keeps_fitting_child() {
        let old = Bounds::new(0.0, 0.0, 400.0, 300.0);
        let mut comp = CompartmentBox::new("cell", old);
        comp.rect = Bounds::new(0.0, 0.0, 500.0, 300.0);
        let child = Bounds::from_origin_size(10.0, 10.0, 50.0, 30.0);
        assert_eq!(comp.reposition_child(&old, &child), Some(child));
    }

    #[test]
    fn test_reposition_scales_then_clamps() {
        let old = Bounds::new(0.0, 0.0, 400.0, 400.0);
        let mut comp = CompartmentBox::new("cell", old);
        comp.rect = Bounds::new(0.0, 0.0, 200.0, 200.0);

        // Offset (300, 100) scales to (150, 50); the 60-wide child then
        // overhangs and is pulled back to x = 140.
        let child = Bounds::from_origin_size(300.0, 100.0, 60.0, 30.0);
        let moved = comp.reposition_child(&old, &child).unwrap();
        assert_eq!(moved, Bounds::from_origin_size(140.0, 50.0, 60.0, 30.0));
        assert!(comp.rect.contains_bounds(&moved));
    }

    #[test]
    fn test_reposition_rejects_oversized_child() {
        let old = Bounds::new(0.0, 0.0, 400.0, 400.0);
        let mut comp = CompartmentBox::new("cell", old);
        comp.rect = Bounds::new(0.0, 0.0, 40.0, 40.0);
        let child = Bounds::from_origin_size(0.0, 0.0, 50.0, 30.0);
        assert!(comp.reposition_child(&old, &child).is_none());
    }
}
