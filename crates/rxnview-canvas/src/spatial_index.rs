//! Quadtree spatial index over element bounding boxes.
//!
//! Items are stored in the deepest node whose quad fully contains them.
//! Items that straddle quad borders, or lie outside the root quad, stay at
//! the shallowest node that contains them (the root for out-of-range
//! items), so nothing is ever dropped.
//!
//! The index answers bounding-box queries only; callers refine hits with an
//! exact geometric test and apply their own ordering.

use std::collections::HashMap;

use rxnview_core::{Bounds, ElementId, Point};

/// Quadtree node
#[derive(Debug, Clone)]
struct QuadtreeNode {
    bounds: Bounds,
    depth: usize,
    items: Vec<(ElementId, Bounds)>,
    children: Option<Box<[QuadtreeNode; 4]>>,
}

impl QuadtreeNode {
    fn new(bounds: Bounds, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, id: ElementId, item: Bounds, max_depth: usize, max_items: usize) {
        if let Some(children) = &mut self.children {
            if let Some(child) = children.iter_mut().find(|c| c.bounds.contains_bounds(&item)) {
                child.insert(id, item, max_depth, max_items);
                return;
            }
        }

        self.items.push((id, item));

        if self.children.is_none() && self.items.len() > max_items && self.depth < max_depth {
            self.subdivide(max_depth, max_items);
        }
    }

    fn subdivide(&mut self, max_depth: usize, max_items: usize) {
        let c = self.bounds.center();
        let b = self.bounds;
        let depth = self.depth + 1;
        self.children = Some(Box::new([
            QuadtreeNode::new(Bounds::new(b.min_x, b.min_y, c.x, c.y), depth),
            QuadtreeNode::new(Bounds::new(c.x, b.min_y, b.max_x, c.y), depth),
            QuadtreeNode::new(Bounds::new(b.min_x, c.y, c.x, b.max_y), depth),
            QuadtreeNode::new(Bounds::new(c.x, c.y, b.max_x, b.max_y), depth),
        ]));

        // Push down whatever now fits entirely inside a child.
        let items = std::mem::take(&mut self.items);
        for (id, item) in items {
            match self
                .children
                .as_mut()
                .and_then(|ch| ch.iter_mut().find(|c| c.bounds.contains_bounds(&item)))
            {
                Some(child) => child.insert(id, item, max_depth, max_items),
                None => self.items.push((id, item)),
            }
        }
    }

    fn remove(&mut self, id: ElementId, item: &Bounds) -> bool {
        if let Some(pos) = self.items.iter().position(|(i, _)| *i == id) {
            self.items.swap_remove(pos);
            return true;
        }
        if let Some(children) = &mut self.children {
            for child in children.iter_mut() {
                if child.bounds.contains_bounds(item) && child.remove(id, item) {
                    return true;
                }
            }
        }
        false
    }

    fn query(&self, region: &Bounds, out: &mut Vec<ElementId>) {
        out.extend(
            self.items
                .iter()
                .filter(|(_, b)| b.intersects(region))
                .map(|(id, _)| *id),
        );
        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.bounds.intersects(region) {
                    child.query(region, out);
                }
            }
        }
    }

    fn query_point(&self, point: &Point, out: &mut Vec<ElementId>) {
        out.extend(
            self.items
                .iter()
                .filter(|(_, b)| b.contains_point(point))
                .map(|(id, _)| *id),
        );
        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.bounds.contains_point(point) {
                    child.query_point(point, out);
                }
            }
        }
    }

    fn collect_stats(&self, stats: &mut SpatialIndexStats) {
        stats.total_nodes += 1;
        stats.total_items += self.items.len();
        stats.max_depth = stats.max_depth.max(self.depth);
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.collect_stats(stats);
            }
        }
    }
}

/// Statistics about the spatial index structure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpatialIndexStats {
    pub total_nodes: usize,
    pub total_items: usize,
    pub max_depth: usize,
}

/// Spatial index keyed by element id
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    root: QuadtreeNode,
    entries: HashMap<ElementId, Bounds>,
    max_depth: usize,
    max_items: usize,
}

impl SpatialIndex {
    /// Creates an index covering `bounds`, splitting a quad once it holds
    /// more than `max_items` items, down to `max_depth` levels.
    pub fn new(bounds: Bounds, max_depth: usize, max_items: usize) -> Self {
        Self {
            root: QuadtreeNode::new(bounds, 0),
            entries: HashMap::new(),
            max_depth,
            max_items: max_items.max(1),
        }
    }

    /// Inserts an item, replacing any previous entry with the same id.
    pub fn insert(&mut self, id: ElementId, bounds: &Bounds) {
        if self.entries.contains_key(&id) {
            self.remove(id);
        }
        self.entries.insert(id, *bounds);
        self.root
            .insert(id, *bounds, self.max_depth, self.max_items);
    }

    /// Removes an item. Returns false if it was not indexed.
    pub fn remove(&mut self, id: ElementId) -> bool {
        let Some(bounds) = self.entries.remove(&id) else {
            return false;
        };
        let removed = self.root.remove(id, &bounds);
        if !removed {
            tracing::warn!("Spatial index entry {} missing from tree", id);
        }
        removed
    }

    /// Re-indexes an item under new bounds. Unchanged bounds are a no-op.
    pub fn update(&mut self, id: ElementId, bounds: &Bounds) {
        if self.entries.get(&id) == Some(bounds) {
            return;
        }
        self.insert(id, bounds);
    }

    /// Ids whose bounds intersect `region` (unordered).
    pub fn query(&self, region: &Bounds) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.root.query(region, &mut out);
        out
    }

    /// Ids whose bounds contain `point` (unordered).
    pub fn query_point(&self, point: &Point) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.root.query_point(point, &mut out);
        out
    }

    /// Bounds an id is currently indexed under.
    pub fn bounds_of(&self, id: ElementId) -> Option<Bounds> {
        self.entries.get(&id).copied()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates indexed ids with their bounds.
    pub fn entries(&self) -> impl Iterator<Item = (ElementId, Bounds)> + '_ {
        self.entries.iter().map(|(id, b)| (*id, *b))
    }

    pub fn clear(&mut self) {
        self.root = QuadtreeNode::new(self.root.bounds, 0);
        self.entries.clear();
    }

    pub fn stats(&self) -> SpatialIndexStats {
        let mut stats = SpatialIndexStats::default();
        self.root.collect_stats(&mut stats);
        stats
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(Bounds::new(-10000.0, -10000.0, 10000.0, 10000.0), 8, 16)
    }
}
