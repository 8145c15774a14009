use rxnview_core::{Bounds, ElementId, Point};
use serde::{Deserialize, Serialize};

use super::{Draggable, HitTestable};

/// Which control point of a reaction a handle drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandleRole {
    /// The control point next to one reactant or product node.
    Species { node: ElementId, is_source: bool },
    /// The control point on the reactant side of the centroid.
    SourceCentroid,
    /// The control point on the product side of the centroid.
    TargetCentroid,
}

impl HandleRole {
    /// The centroid handle mirrored through the centroid, if any.
    pub fn mirror(self) -> Option<HandleRole> {
        match self {
            HandleRole::SourceCentroid => Some(HandleRole::TargetCentroid),
            HandleRole::TargetCentroid => Some(HandleRole::SourceCentroid),
            HandleRole::Species { .. } => None,
        }
    }
}

/// A draggable control point owned by a reaction edge.
///
/// The position always lies inside `limits`, the rectangle spanned by the
/// parent edge's endpoint nodes plus the configured margin.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionHandle {
    pub edge: ElementId,
    pub role: HandleRole,
    position: Point,
    limits: Bounds,
}

impl ReactionHandle {
    pub fn new(edge: ElementId, role: HandleRole, position: Point, limits: Bounds) -> Self {
        Self {
            edge,
            role,
            position: position.clamp_to(&limits),
            limits,
        }
    }

    pub fn limits(&self) -> Bounds {
        self.limits
    }

    /// Replaces the clamp rectangle and re-clamps the position.
    ///
    /// Returns true if the position moved.
    pub fn set_limits(&mut self, limits: Bounds) -> bool {
        self.limits = limits;
        let clamped = self.position.clamp_to(&limits);
        let moved = clamped != self.position;
        self.position = clamped;
        moved
    }
}

impl HitTestable for ReactionHandle {
    fn bounds(&self) -> Bounds {
        Bounds::around(self.position, 0.0)
    }

    fn hit_test(&self, point: &Point, tolerance: f64) -> bool {
        self.position.distance_to(point) <= tolerance
    }
}

impl Draggable for ReactionHandle {
    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        if position.is_finite() {
            self.position = position.clamp_to(&self.limits);
        }
    }
}
