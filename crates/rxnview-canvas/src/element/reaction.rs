//! Reaction edges drawn as one cubic Bezier per participating species.
//!
//! Every curve runs from just outside its node, through the node's species
//! handle and the centroid handle of its side, to the reaction centroid.
//! Handle positions live in separate `ReactionHandle` scene objects; the
//! edge keeps only their ids and the sampled polylines.

use std::collections::HashMap;

use rxnview_core::{
    cubic_bezier, distance_to_segment, ray_exit, Bounds, CanvasError, ElementId, Point,
    ReactionConfig,
};

use super::{HandleRole, HitTestable};

/// Sampled curve between one species node and the centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesCurve {
    pub node: ElementId,
    pub is_source: bool,
    pub points: Vec<Point>,
}

/// Centroid and handle clamp rectangle derived from endpoint positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLayout {
    pub centroid: Point,
    pub limits: Bounds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReactionEdge {
    pub label: String,
    sources: Vec<ElementId>,
    targets: Vec<ElementId>,
    centroid: Point,
    handles: Vec<(HandleRole, ElementId)>,
    curves: Vec<SpeciesCurve>,
}

impl ReactionEdge {
    /// Creates an edge without geometry; the scene lays it out afterwards.
    pub fn new(
        label: impl Into<String>,
        sources: Vec<ElementId>,
        targets: Vec<ElementId>,
    ) -> Result<Self, CanvasError> {
        if sources.is_empty() || targets.is_empty() {
            return Err(CanvasError::degenerate(
                "a reaction needs at least one source and one target",
            ));
        }
        for side in [&sources, &targets] {
            for (i, id) in side.iter().enumerate() {
                if side[..i].contains(id) {
                    return Err(CanvasError::degenerate(format!(
                        "node {} appears twice on the same side",
                        id
                    )));
                }
            }
        }
        Ok(Self {
            label: label.into(),
            sources,
            targets,
            centroid: Point::zero(),
            handles: Vec::new(),
            curves: Vec::new(),
        })
    }

    pub fn sources(&self) -> &[ElementId] {
        &self.sources
    }

    pub fn targets(&self) -> &[ElementId] {
        &self.targets
    }

    /// Sources followed by targets.
    pub fn endpoints(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.sources.iter().chain(self.targets.iter()).copied()
    }

    pub fn references(&self, node: ElementId) -> bool {
        self.sources.contains(&node) || self.targets.contains(&node)
    }

    pub fn centroid(&self) -> Point {
        self.centroid
    }

    pub fn handles(&self) -> &[(HandleRole, ElementId)] {
        &self.handles
    }

    pub fn handle_for(&self, role: HandleRole) -> Option<ElementId> {
        self.handles
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, id)| *id)
    }

    pub(crate) fn set_handles(&mut self, handles: Vec<(HandleRole, ElementId)>) {
        self.handles = handles;
    }

    pub fn curves(&self) -> &[SpeciesCurve] {
        &self.curves
    }

    /// Roles of every handle this edge should own, in creation order.
    pub fn handle_roles(&self) -> Vec<HandleRole> {
        let mut roles: Vec<HandleRole> = self
            .sources
            .iter()
            .map(|&node| HandleRole::Species {
                node,
                is_source: true,
            })
            .chain(self.targets.iter().map(|&node| HandleRole::Species {
                node,
                is_source: false,
            }))
            .collect();
        roles.push(HandleRole::SourceCentroid);
        roles.push(HandleRole::TargetCentroid);
        roles
    }

    /// Removes `node` from both sides. Returns the species handle ids that
    /// no longer have a node to attach to.
    pub(crate) fn detach(&mut self, node: ElementId) -> Vec<ElementId> {
        self.sources.retain(|&n| n != node);
        self.targets.retain(|&n| n != node);
        let mut orphaned = Vec::new();
        self.handles.retain(|(role, id)| match role {
            HandleRole::Species { node: n, .. } if *n == node => {
                orphaned.push(*id);
                false
            }
            _ => true,
        });
        orphaned
    }

    /// Whether the edge still has both a source and a target.
    pub fn is_connected(&self) -> bool {
        !self.sources.is_empty() && !self.targets.is_empty()
    }

    /// Computes centroid and handle limits from the endpoint rectangles.
    pub fn layout(
        &self,
        endpoints: &HashMap<ElementId, Bounds>,
        margin: f64,
    ) -> Result<EdgeLayout, CanvasError> {
        let mut rects = Vec::with_capacity(self.sources.len() + self.targets.len());
        for id in self.endpoints() {
            let rect = endpoints
                .get(&id)
                .ok_or(CanvasError::InvalidReference { id })?;
            rects.push(*rect);
        }
        if rects.is_empty() {
            return Err(CanvasError::degenerate("reaction has no endpoints"));
        }

        let first = rects[0].center();
        if rects
            .iter()
            .all(|r| r.center().distance_to(&first) <= f64::EPSILON)
        {
            return Err(CanvasError::degenerate(
                "all reaction endpoints share one center",
            ));
        }

        let sum = rects
            .iter()
            .fold(Point::zero(), |acc, r| acc + r.center());
        let centroid = sum / rects.len() as f64;
        let limits = Bounds::enclosing(rects.iter())
            .map(|b| b.expanded(margin))
            .unwrap_or_else(|| Bounds::around(centroid, margin));
        Ok(EdgeLayout { centroid, limits })
    }

    /// Initial position for each handle role given a fresh layout.
    pub fn default_handle_position(
        &self,
        role: HandleRole,
        layout: &EdgeLayout,
        endpoints: &HashMap<ElementId, Bounds>,
    ) -> Point {
        let center_of = |id: &ElementId| {
            endpoints
                .get(id)
                .map(|b| b.center())
                .unwrap_or(layout.centroid)
        };
        let source_centroid = || {
            self.sources
                .first()
                .map(|id| center_of(id).midpoint(&layout.centroid))
                .unwrap_or(layout.centroid)
        };
        match role {
            HandleRole::Species { node, .. } => center_of(&node).midpoint(&layout.centroid),
            HandleRole::SourceCentroid => source_centroid(),
            HandleRole::TargetCentroid => layout.centroid * 2.0 - source_centroid(),
        }
    }

    /// Recomputes centroid and curve polylines.
    pub(crate) fn rebuild(
        &mut self,
        layout: &EdgeLayout,
        endpoints: &HashMap<ElementId, Bounds>,
        handle_positions: &HashMap<HandleRole, Point>,
        config: &ReactionConfig,
    ) {
        self.centroid = layout.centroid;
        let centroid = layout.centroid;
        let position = |role: HandleRole| handle_positions.get(&role).copied().unwrap_or(centroid);
        let src_c = position(HandleRole::SourceCentroid);
        let dst_c = position(HandleRole::TargetCentroid);

        let species: Vec<(ElementId, bool)> = self
            .sources
            .iter()
            .map(|&n| (n, true))
            .chain(self.targets.iter().map(|&n| (n, false)))
            .collect();

        self.curves = species
            .into_iter()
            .filter_map(|(node, is_source)| {
                let rect = endpoints.get(&node)?;
                let center = rect.center();
                let handle = position(HandleRole::Species { node, is_source });
                let toward = if handle.distance_to(&center) > f64::EPSILON {
                    handle
                } else {
                    centroid
                };
                let start = ray_exit(&rect.expanded(config.node_edge_gap), center, toward);
                let side_handle = if is_source { src_c } else { dst_c };
                Some(SpeciesCurve {
                    node,
                    is_source,
                    points: cubic_bezier(start, handle, side_handle, centroid, config.curve_segments),
                })
            })
            .collect();
    }
}

impl HitTestable for ReactionEdge {
    fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::around(self.centroid, 0.0);
        for p in self.curves.iter().flat_map(|c| c.points.iter()) {
            bounds = bounds.union(&Bounds::around(*p, 0.0));
        }
        bounds
    }

    fn hit_test(&self, point: &Point, tolerance: f64) -> bool {
        if self.centroid.distance_to(point) <= tolerance {
            return true;
        }
        self.curves.iter().any(|curve| {
            curve
                .points
                .windows(2)
                .any(|seg| distance_to_segment(*point, seg[0], seg[1]) <= tolerance)
        })
    }
}
