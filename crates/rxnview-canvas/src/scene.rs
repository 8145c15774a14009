//! Scene graph: owns every element, keeps the spatial index in step with
//! element geometry, and enforces referential integrity between nodes,
//! compartments, reactions and their handles.
//!
//! Structural edits (adding, removing, pasting, importing) are refused
//! while an interaction holds the structure lock. Geometric edits stay
//! available so the active interaction can drive them.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use rxnview_core::{
    Bounds, CanvasConfig, CanvasError, ConfigError, ElementId, ElementKind, Point,
    SelectedElement,
};
use serde::{Deserialize, Serialize};

use crate::element::{
    CompartmentBox, Draggable, HandleRole, HitTestable, NodeElement, ReactionEdge,
    ReactionHandle, Resizable, SceneElement, SceneObject,
};
use crate::selection_manager::SelectionManager;
use crate::spatial_index::SpatialIndex;
use crate::store::ElementStore;

type SceneResult<T> = Result<T, CanvasError>;

/// Logical pick distances for the thin element kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTolerance {
    /// Maximum distance from a reaction curve segment.
    pub curve: f64,
    /// Maximum distance from a handle center.
    pub handle: f64,
}

impl HitTolerance {
    pub fn uniform(tolerance: f64) -> Self {
        Self {
            curve: tolerance,
            handle: tolerance,
        }
    }
}

/// Geometry of every node, compartment and handle at one instant.
///
/// Taken when an interaction starts and handed back to
/// [`SceneGraph::restore`] on cancel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    rects: HashMap<ElementId, Bounds>,
    handles: HashMap<ElementId, Point>,
}

impl Snapshot {
    pub fn rect_of(&self, id: ElementId) -> Option<Bounds> {
        self.rects.get(&id).copied()
    }

    pub fn handle_position(&self, id: ElementId) -> Option<Point> {
        self.handles.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.rects.len() + self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty() && self.handles.is_empty()
    }
}

/// One copied element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClipboardEntry {
    Compartment {
        label: String,
        bounds: Bounds,
    },
    Node {
        label: String,
        bounds: Bounds,
        /// Index of the copied compartment this node belongs to.
        parent: Option<usize>,
    },
}

/// Copied nodes and compartments, compartments first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clipboard {
    pub entries: Vec<ClipboardEntry>,
}

impl Clipboard {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The set of scene elements plus everything derived from them.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    store: ElementStore,
    index: SpatialIndex,
    selection: SelectionManager,
    config: CanvasConfig,
    hovered: Option<ElementId>,
    structure_locked: bool,
    revision: u64,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::build(CanvasConfig::default())
    }

    /// Creates an empty scene after running `CanvasConfig::validate`.
    pub fn with_config(config: CanvasConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CanvasConfig) -> Self {
        Self {
            store: ElementStore::new(),
            index: SpatialIndex::default(),
            selection: SelectionManager::new(),
            config,
            hovered: None,
            structure_locked: false,
            revision: 0,
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Counter bumped by every structural or geometric change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    // ---------------------------------------------------------------------
    // Structure lock
    // ---------------------------------------------------------------------

    /// Refuses structural edits until [`unlock_structure`](Self::unlock_structure).
    pub fn lock_structure(&mut self) {
        self.structure_locked = true;
    }

    pub fn unlock_structure(&mut self) {
        self.structure_locked = false;
    }

    pub fn is_structure_locked(&self) -> bool {
        self.structure_locked
    }

    fn ensure_unlocked(&self, operation: &str) -> SceneResult<()> {
        if self.structure_locked {
            tracing::debug!("Refused to {} while the structure is locked", operation);
            return Err(CanvasError::locked(operation));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------------

    pub fn get(&self, id: ElementId) -> Option<&SceneObject> {
        self.store.get(id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.store.contains(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Objects in creation order.
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.store.iter()
    }

    /// Objects bottom-to-top.
    pub fn paint_order(&self) -> Vec<&SceneObject> {
        self.store.paint_order()
    }

    fn object(&self, id: ElementId) -> SceneResult<&SceneObject> {
        self.store
            .get(id)
            .ok_or(CanvasError::InvalidReference { id })
    }

    fn mismatch(id: ElementId, expected: ElementKind, found: ElementKind) -> CanvasError {
        CanvasError::KindMismatch {
            id,
            expected,
            found,
        }
    }

    pub fn node(&self, id: ElementId) -> SceneResult<&NodeElement> {
        match &self.object(id)?.element {
            SceneElement::Node(n) => Ok(n),
            other => Err(Self::mismatch(id, ElementKind::Node, other.kind())),
        }
    }

    pub fn compartment(&self, id: ElementId) -> SceneResult<&CompartmentBox> {
        match &self.object(id)?.element {
            SceneElement::Compartment(c) => Ok(c),
            other => Err(Self::mismatch(id, ElementKind::Compartment, other.kind())),
        }
    }

    pub fn reaction(&self, id: ElementId) -> SceneResult<&ReactionEdge> {
        match &self.object(id)?.element {
            SceneElement::Reaction(r) => Ok(r),
            other => Err(Self::mismatch(id, ElementKind::Reaction, other.kind())),
        }
    }

    pub fn handle(&self, id: ElementId) -> SceneResult<&ReactionHandle> {
        match &self.object(id)?.element {
            SceneElement::Handle(h) => Ok(h),
            other => Err(Self::mismatch(id, ElementKind::Handle, other.kind())),
        }
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut NodeElement> {
        match self.store.get_mut(id).map(|o| &mut o.element) {
            Some(SceneElement::Node(n)) => Some(n),
            _ => None,
        }
    }

    fn compartment_mut(&mut self, id: ElementId) -> Option<&mut CompartmentBox> {
        match self.store.get_mut(id).map(|o| &mut o.element) {
            Some(SceneElement::Compartment(c)) => Some(c),
            _ => None,
        }
    }

    fn reaction_mut(&mut self, id: ElementId) -> Option<&mut ReactionEdge> {
        match self.store.get_mut(id).map(|o| &mut o.element) {
            Some(SceneElement::Reaction(r)) => Some(r),
            _ => None,
        }
    }

    fn handle_mut(&mut self, id: ElementId) -> Option<&mut ReactionHandle> {
        match self.store.get_mut(id).map(|o| &mut o.element) {
            Some(SceneElement::Handle(h)) => Some(h),
            _ => None,
        }
    }

    // ---------------------------------------------------------------------
    // Index maintenance
    // ---------------------------------------------------------------------

    fn reindex(&mut self, id: ElementId) {
        if let Some(obj) = self.store.get(id) {
            let bounds = obj.bounds();
            self.index.update(id, &bounds);
        }
    }

    fn remove_object(&mut self, id: ElementId, removed: &mut Vec<ElementId>) {
        if self.store.remove(id).is_some() {
            self.index.remove(id);
            removed.push(id);
        }
    }

    /// True when the index holds exactly one entry per object, under the
    /// object's current bounds, reachable through the tree.
    pub fn index_is_consistent(&self) -> bool {
        self.index.len() == self.store.len()
            && self.store.iter().all(|obj| {
                let bounds = obj.bounds();
                self.index.bounds_of(obj.id) == Some(bounds)
                    && self.index.query(&bounds).contains(&obj.id)
            })
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.index
    }

    // ---------------------------------------------------------------------
    // Reaction layout
    // ---------------------------------------------------------------------

    fn endpoint_bounds_with(
        &self,
        edge: &ReactionEdge,
        overrides: &HashMap<ElementId, Bounds>,
    ) -> SceneResult<HashMap<ElementId, Bounds>> {
        let mut map = HashMap::new();
        for id in edge.endpoints() {
            let rect = match overrides.get(&id) {
                Some(rect) => *rect,
                None => self.node(id)?.rect,
            };
            map.insert(id, rect);
        }
        Ok(map)
    }

    fn endpoint_bounds(&self, edge: &ReactionEdge) -> SceneResult<HashMap<ElementId, Bounds>> {
        self.endpoint_bounds_with(edge, &HashMap::new())
    }

    /// Reactions touching any of `nodes`, in creation order.
    fn reactions_referencing(&self, nodes: &HashSet<ElementId>) -> Vec<ElementId> {
        self.store
            .iter()
            .filter(|obj| match &obj.element {
                SceneElement::Reaction(edge) => edge.endpoints().any(|n| nodes.contains(&n)),
                _ => false,
            })
            .map(|obj| obj.id)
            .collect()
    }

    /// Recomputes centroid and clamp limits of one reaction, re-clamps its
    /// handles and rebuilds the curves. Fails without touching anything
    /// when the current endpoints give no valid layout.
    fn refresh_reaction(&mut self, id: ElementId) -> SceneResult<()> {
        let (endpoints, layout, handles) = {
            let edge = self.reaction(id)?;
            let endpoints = self.endpoint_bounds(edge)?;
            let layout = edge.layout(&endpoints, self.config.handles.clamp_margin)?;
            (endpoints, layout, edge.handles().to_vec())
        };

        let mut positions = HashMap::with_capacity(handles.len());
        for (role, hid) in handles {
            if let Some(handle) = self.handle_mut(hid) {
                if handle.set_limits(layout.limits) {
                    tracing::debug!("Handle {} re-clamped to {}", hid, handle.position());
                }
                positions.insert(role, handle.position());
            }
            self.reindex(hid);
        }

        let config = self.config.reactions.clone();
        if let Some(edge) = self.reaction_mut(id) {
            edge.rebuild(&layout, &endpoints, &positions, &config);
        }
        self.reindex(id);
        Ok(())
    }

    /// Applies new rectangles to nodes and compartments as one step.
    ///
    /// Every affected reaction is laid out against the proposed rectangles
    /// first; if any would become degenerate nothing changes.
    fn apply_geometry(
        &mut self,
        nodes: &[(ElementId, Bounds)],
        compartments: &[(ElementId, Bounds)],
    ) -> SceneResult<()> {
        for (id, rect) in nodes.iter().chain(compartments) {
            if rect.is_degenerate() || !rect.is_finite() {
                return Err(CanvasError::degenerate(format!(
                    "element {} cannot take bounds {}",
                    id, rect
                )));
            }
        }

        let overrides: HashMap<ElementId, Bounds> = nodes.iter().copied().collect();
        let moved: HashSet<ElementId> = overrides.keys().copied().collect();
        let affected = self.reactions_referencing(&moved);
        for &rid in &affected {
            let edge = self.reaction(rid)?;
            let endpoints = self.endpoint_bounds_with(edge, &overrides)?;
            edge.layout(&endpoints, self.config.handles.clamp_margin)?;
        }

        for &(id, rect) in compartments.iter().chain(nodes) {
            if let Some(shape) = self
                .store
                .get_mut(id)
                .and_then(|o| o.element.as_resizable_mut())
            {
                shape.resize(rect)?;
            }
            self.reindex(id);
        }
        for rid in affected {
            self.refresh_reaction(rid)?;
        }
        self.touch();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Structural operations
    // ---------------------------------------------------------------------

    fn placeable_rect(&self, bounds: Bounds, what: &str) -> SceneResult<Bounds> {
        if bounds.is_degenerate() || !bounds.is_finite() {
            return Err(CanvasError::degenerate(format!(
                "{} bounds {} have no area",
                what, bounds
            )));
        }
        match self.config.scene.bounds {
            Some(limit) => bounds.fit_inside(&limit).ok_or_else(|| {
                CanvasError::degenerate(format!("{} {} does not fit the scene", what, bounds))
            }),
            None => Ok(bounds),
        }
    }

    pub fn add_node(&mut self, label: impl Into<String>, bounds: Bounds) -> SceneResult<ElementId> {
        self.ensure_unlocked("add a node")?;
        let rect = self.placeable_rect(bounds, "node")?;
        let id = self
            .store
            .insert(SceneElement::Node(NodeElement::new(label, rect)))?;
        self.reindex(id);
        self.touch();
        tracing::debug!("Added node {} at {}", id, rect);
        Ok(id)
    }

    pub fn add_compartment(
        &mut self,
        label: impl Into<String>,
        bounds: Bounds,
    ) -> SceneResult<ElementId> {
        self.ensure_unlocked("add a compartment")?;
        let rect = self.placeable_rect(bounds, "compartment")?;
        let id = self
            .store
            .insert(SceneElement::Compartment(CompartmentBox::new(label, rect)))?;
        self.reindex(id);
        self.touch();
        tracing::debug!("Added compartment {} at {}", id, rect);
        Ok(id)
    }

    /// Adds a reaction between existing nodes and creates its handles.
    ///
    /// # Errors
    ///
    /// * `InvalidReference` / `KindMismatch` for an endpoint that is not a node
    /// * `DegenerateGeometry` for an empty side, a node repeated on one side,
    ///   or endpoints that all share one center
    pub fn add_reaction(
        &mut self,
        label: impl Into<String>,
        sources: Vec<ElementId>,
        targets: Vec<ElementId>,
    ) -> SceneResult<ElementId> {
        self.ensure_unlocked("add a reaction")?;
        let edge = ReactionEdge::new(label, sources, targets)?;
        self.insert_reaction(None, edge, &HashMap::new())
    }

    fn insert_reaction(
        &mut self,
        id: Option<ElementId>,
        edge: ReactionEdge,
        handle_positions: &HashMap<HandleRole, Point>,
    ) -> SceneResult<ElementId> {
        let endpoints = self.endpoint_bounds(&edge)?;
        let layout = edge.layout(&endpoints, self.config.handles.clamp_margin)?;
        let initial: Vec<(HandleRole, Point)> = edge
            .handle_roles()
            .into_iter()
            .map(|role| {
                let position = handle_positions
                    .get(&role)
                    .copied()
                    .unwrap_or_else(|| edge.default_handle_position(role, &layout, &endpoints));
                (role, position)
            })
            .collect();

        let edge_id = match id {
            Some(id) => {
                self.store
                    .insert_with_id(id, SceneElement::Reaction(edge))?;
                id
            }
            None => self.store.insert(SceneElement::Reaction(edge))?,
        };

        let mut handles = Vec::with_capacity(initial.len());
        for (role, position) in initial {
            let handle = ReactionHandle::new(edge_id, role, position, layout.limits);
            match self.store.insert(SceneElement::Handle(handle)) {
                Ok(hid) => handles.push((role, hid)),
                Err(e) => {
                    self.store.remove(edge_id);
                    for (_, hid) in handles {
                        self.store.remove(hid);
                    }
                    return Err(e);
                }
            }
        }
        if let Some(edge) = self.reaction_mut(edge_id) {
            edge.set_handles(handles);
        }
        self.refresh_reaction(edge_id)?;
        self.touch();
        tracing::debug!("Added reaction {}", edge_id);
        Ok(edge_id)
    }

    /// Moves a node into a compartment (clamping it inside) or out of one.
    pub fn set_compartment(
        &mut self,
        node: ElementId,
        compartment: Option<ElementId>,
    ) -> SceneResult<()> {
        self.ensure_unlocked("change compartment membership")?;
        let (rect, previous) = {
            let n = self.node(node)?;
            (n.rect, n.compartment)
        };
        let target_rect = match compartment {
            Some(cid) => {
                let outer = self.compartment(cid)?.rect;
                rect.fit_inside(&outer).ok_or_else(|| {
                    CanvasError::degenerate(format!(
                        "node {} does not fit inside compartment {}",
                        node, cid
                    ))
                })?
            }
            None => rect,
        };
        if target_rect != rect {
            self.apply_geometry(&[(node, target_rect)], &[])?;
        }

        if let Some(old) = previous {
            if let Some(c) = self.compartment_mut(old) {
                c.children.remove(&node);
            }
        }
        if let Some(cid) = compartment {
            if let Some(c) = self.compartment_mut(cid) {
                c.children.insert(node);
            }
        }
        if let Some(n) = self.node_mut(node) {
            n.compartment = compartment;
        }
        self.touch();
        Ok(())
    }

    /// Topmost compartment whose rectangle fully contains every one of `rects`.
    pub fn compartment_containing(&self, rects: &[Bounds]) -> Option<ElementId> {
        self.store
            .iter()
            .filter(|o| match &o.element {
                SceneElement::Compartment(c) => rects.iter().all(|r| c.rect.contains_bounds(r)),
                _ => false,
            })
            .max_by_key(|o| o.paint_key())
            .map(|o| o.id)
    }

    /// Settles nodes dropped by a drag.
    ///
    /// The group joins the topmost compartment that fully contains all of
    /// them, or returns to the base canvas when no compartment does. Every
    /// id is checked before any membership changes.
    ///
    /// # Returns
    ///
    /// The nodes whose membership changed, and their new compartment.
    pub fn assign_dropped_nodes(
        &mut self,
        nodes: &[ElementId],
    ) -> SceneResult<(Vec<ElementId>, Option<ElementId>)> {
        self.ensure_unlocked("change compartment membership")?;
        let rects = nodes
            .iter()
            .map(|&id| self.node(id).map(|n| n.rect))
            .collect::<SceneResult<Vec<_>>>()?;
        if rects.is_empty() {
            return Ok((Vec::new(), None));
        }
        let target = self.compartment_containing(&rects);
        let changed: Vec<ElementId> = nodes
            .iter()
            .copied()
            .filter(|&id| self.node(id).is_ok_and(|n| n.compartment != target))
            .collect();
        for &id in &changed {
            self.set_compartment(id, target)?;
        }
        if !changed.is_empty() {
            tracing::debug!("{} dropped node(s) now in {:?}", changed.len(), target);
        }
        Ok((changed, target))
    }

    /// Removes an element and everything that depends on it.
    ///
    /// Removing a node detaches it from its reactions; a reaction left
    /// without sources or targets goes too, along with its handles.
    /// Removing a compartment releases its children. Handles cannot be
    /// removed on their own.
    ///
    /// # Returns
    ///
    /// Every removed id, starting with `id`.
    pub fn remove(&mut self, id: ElementId) -> SceneResult<Vec<ElementId>> {
        self.ensure_unlocked("remove elements")?;
        let kind = self.object(id)?.kind();
        let mut removed = Vec::new();
        match kind {
            ElementKind::Handle => {
                return Err(Self::mismatch(id, ElementKind::Reaction, ElementKind::Handle));
            }
            ElementKind::Reaction => self.remove_reaction(id, &mut removed),
            ElementKind::Compartment => {
                let children: Vec<ElementId> = self
                    .compartment(id)
                    .map(|c| c.children.iter().copied().collect())
                    .unwrap_or_default();
                self.remove_object(id, &mut removed);
                for child in children {
                    if let Some(n) = self.node_mut(child) {
                        n.compartment = None;
                    }
                }
            }
            ElementKind::Node => {
                let parent = self.node(id).ok().and_then(|n| n.compartment);
                if let Some(cid) = parent {
                    if let Some(c) = self.compartment_mut(cid) {
                        c.children.remove(&id);
                    }
                }
                let reactions = self.reactions_referencing(&HashSet::from([id]));
                self.remove_object(id, &mut removed);
                for rid in reactions {
                    let orphaned = self
                        .reaction_mut(rid)
                        .map(|edge| edge.detach(id))
                        .unwrap_or_default();
                    for hid in orphaned {
                        self.remove_object(hid, &mut removed);
                    }
                    let connected = self.reaction(rid).is_ok_and(|e| e.is_connected());
                    if !connected || self.refresh_reaction(rid).is_err() {
                        self.remove_reaction(rid, &mut removed);
                    }
                }
            }
        }

        self.selection.prune(&self.store);
        if self.hovered.is_some_and(|h| !self.store.contains(h)) {
            self.hovered = None;
        }
        self.touch();
        tracing::debug!("Removed {} element(s) starting at {}", removed.len(), id);
        Ok(removed)
    }

    fn remove_reaction(&mut self, id: ElementId, removed: &mut Vec<ElementId>) {
        let handles: Vec<ElementId> = self
            .reaction(id)
            .map(|e| e.handles().iter().map(|(_, hid)| *hid).collect())
            .unwrap_or_default();
        for hid in handles {
            self.remove_object(hid, removed);
        }
        self.remove_object(id, removed);
    }

    /// Removes every selected element with cascades.
    pub fn remove_selected(&mut self) -> SceneResult<Vec<ElementId>> {
        self.ensure_unlocked("remove elements")?;
        let mut removed = Vec::new();
        for id in self.selected_ids() {
            if self.store.contains(id) {
                removed.extend(self.remove(id)?);
            }
        }
        Ok(removed)
    }

    pub fn clear(&mut self) -> SceneResult<()> {
        self.ensure_unlocked("clear the scene")?;
        self.store.clear();
        self.index.clear();
        self.selection = SelectionManager::new();
        self.hovered = None;
        self.touch();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Geometric operations
    // ---------------------------------------------------------------------

    /// Clamps a proposed node rectangle into its compartment and the scene.
    fn clamp_node_rect(&self, node: &NodeElement, rect: Bounds) -> Bounds {
        let mut rect = rect;
        if let Some(outer) = node
            .compartment
            .and_then(|cid| self.compartment(cid).ok())
            .map(|c| c.rect)
        {
            rect = rect.fit_inside(&outer).unwrap_or(rect);
        }
        self.clamp_to_scene(rect)
    }

    fn clamp_to_scene(&self, rect: Bounds) -> Bounds {
        match self.config.scene.bounds {
            Some(limit) => rect.fit_inside(&limit).unwrap_or(rect),
            None => rect,
        }
    }

    /// Moves the top-left corner of a node or compartment, or the center of
    /// a handle.
    pub fn set_position(&mut self, id: ElementId, position: Point) -> SceneResult<()> {
        if !position.is_finite() {
            return Err(CanvasError::degenerate("position is not finite"));
        }
        match &self.object(id)?.element {
            SceneElement::Node(node) => {
                let rect = self.clamp_node_rect(node, node.rect.with_origin(position));
                self.apply_geometry(&[(id, rect)], &[])
            }
            SceneElement::Compartment(comp) => {
                let rect = self.clamp_to_scene(comp.rect.with_origin(position));
                let delta = rect.origin() - comp.rect.origin();
                let children = self.carried_children(comp, delta);
                self.apply_geometry(&children, &[(id, rect)])
            }
            SceneElement::Handle(_) => self.move_handle(id, position).map(|_| ()),
            SceneElement::Reaction(_) => Err(Self::mismatch(
                id,
                ElementKind::Node,
                ElementKind::Reaction,
            )),
        }
    }

    fn carried_children(&self, comp: &CompartmentBox, delta: Point) -> Vec<(ElementId, Bounds)> {
        comp.children
            .iter()
            .filter_map(|&child| self.node(child).ok().map(|n| (child, n.rect.translated(delta))))
            .collect()
    }

    /// Moves several nodes and compartments at once.
    ///
    /// Nodes whose compartment is part of the move are carried by it and
    /// their own entries are ignored. With `scene.bounds` configured the
    /// free-standing members are clamped as one group, so their relative
    /// offsets survive. Nothing changes if any id is unknown or not movable.
    pub fn move_elements(&mut self, moves: &[(ElementId, Point)]) -> SceneResult<()> {
        let moving: HashSet<ElementId> = moves.iter().map(|(id, _)| *id).collect();
        let mut free_nodes = Vec::new();
        let mut contained_nodes = Vec::new();
        let mut compartments = Vec::new();

        for &(id, position) in moves {
            if !position.is_finite() {
                return Err(CanvasError::degenerate("position is not finite"));
            }
            match &self.object(id)?.element {
                SceneElement::Node(node) => match node.compartment {
                    Some(cid) if moving.contains(&cid) => {}
                    Some(_) => {
                        contained_nodes.push((id, self.clamp_node_rect(node, node.rect.with_origin(position))))
                    }
                    None => free_nodes.push((id, node.rect.with_origin(position))),
                },
                SceneElement::Compartment(comp) => {
                    compartments.push((id, comp.rect, comp.rect.with_origin(position)))
                }
                other => {
                    return Err(Self::mismatch(id, ElementKind::Node, other.kind()));
                }
            }
        }

        let shift = match self.config.scene.bounds {
            Some(limit) => {
                let group: Vec<Bounds> = free_nodes
                    .iter()
                    .map(|(_, r)| *r)
                    .chain(compartments.iter().map(|(_, _, r)| *r))
                    .collect();
                Bounds::enclosing(group.iter())
                    .and_then(|union| {
                        union
                            .fit_inside(&limit)
                            .map(|fitted| fitted.origin() - union.origin())
                    })
                    .unwrap_or_default()
            }
            None => Point::zero(),
        };

        let mut node_rects: Vec<(ElementId, Bounds)> = free_nodes
            .into_iter()
            .map(|(id, r)| (id, r.translated(shift)))
            .collect();
        node_rects.extend(contained_nodes);

        let mut comp_rects = Vec::with_capacity(compartments.len());
        for (id, old, proposed) in compartments {
            let rect = proposed.translated(shift);
            let comp = self.compartment(id)?;
            node_rects.extend(self.carried_children(comp, rect.origin() - old.origin()));
            comp_rects.push((id, rect));
        }

        self.apply_geometry(&node_rects, &comp_rects)
    }

    /// Replaces the rectangle of a node or compartment.
    ///
    /// The rectangle grows to the configured minimum size from its top-left
    /// corner. A node is clipped to its compartment. A compartment pulls
    /// children that would fall outside back in; the resize is rejected if
    /// one of them cannot fit.
    ///
    /// # Returns
    ///
    /// The rectangle actually applied.
    pub fn resize(&mut self, id: ElementId, bounds: Bounds) -> SceneResult<Bounds> {
        if bounds.is_degenerate() || !bounds.is_finite() {
            return Err(CanvasError::degenerate(format!(
                "cannot resize {} to {}",
                id, bounds
            )));
        }
        let resize = &self.config.resize;
        match &self.object(id)?.element {
            SceneElement::Node(node) => {
                let mut rect = grow_to(bounds, resize.min_node_width, resize.min_node_height);
                if let Some(cid) = node.compartment {
                    let outer = self.compartment(cid)?.rect;
                    rect = clip(rect, &outer, resize.min_node_width, resize.min_node_height)?;
                }
                if let Some(limit) = self.config.scene.bounds {
                    rect = clip(rect, &limit, resize.min_node_width, resize.min_node_height)?;
                }
                self.apply_geometry(&[(id, rect)], &[])?;
                Ok(rect)
            }
            SceneElement::Compartment(comp) => {
                let (min_w, min_h) = (resize.min_compartment_width, resize.min_compartment_height);
                let mut rect = grow_to(bounds, min_w, min_h);
                if let Some(limit) = self.config.scene.bounds {
                    rect = clip(rect, &limit, min_w, min_h)?;
                }
                let mut resized = comp.clone();
                resized.rect = rect;
                let mut children = Vec::with_capacity(comp.children.len());
                for &child in &comp.children {
                    let current = self.node(child)?.rect;
                    let placed = resized.reposition_child(&comp.rect, &current).ok_or_else(|| {
                        CanvasError::degenerate(format!(
                            "node {} no longer fits compartment {}",
                            child, id
                        ))
                    })?;
                    if placed != current {
                        children.push((child, placed));
                    }
                }
                self.apply_geometry(&children, &[(id, rect)])?;
                Ok(rect)
            }
            other => Err(Self::mismatch(id, ElementKind::Node, other.kind())),
        }
    }

    /// Moves a reaction handle, clamped to its limits. Moving a centroid
    /// handle mirrors its partner through the centroid.
    ///
    /// # Returns
    ///
    /// The clamped position.
    pub fn move_handle(&mut self, id: ElementId, position: Point) -> SceneResult<Point> {
        if !position.is_finite() {
            return Err(CanvasError::degenerate("position is not finite"));
        }
        let (edge_id, role) = {
            let h = self.handle(id)?;
            (h.edge, h.role)
        };
        let (centroid, partner) = {
            let edge = self.reaction(edge_id)?;
            (
                edge.centroid(),
                role.mirror().and_then(|r| edge.handle_for(r)),
            )
        };

        let Some(handle) = self.handle_mut(id) else {
            return Err(CanvasError::InvalidReference { id });
        };
        handle.set_position(position);
        let placed = handle.position();

        if let Some(pid) = partner {
            if let Some(mirror) = self.handle_mut(pid) {
                mirror.set_position(centroid * 2.0 - placed);
            }
        }
        self.refresh_reaction(edge_id)?;
        self.touch();
        Ok(placed)
    }

    /// Captures the geometry of every node, compartment and handle.
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for obj in self.store.iter() {
            match &obj.element {
                SceneElement::Node(n) => {
                    snapshot.rects.insert(obj.id, n.rect);
                }
                SceneElement::Compartment(c) => {
                    snapshot.rects.insert(obj.id, c.rect);
                }
                SceneElement::Handle(h) => {
                    snapshot.handles.insert(obj.id, h.position());
                }
                SceneElement::Reaction(_) => {}
            }
        }
        snapshot
    }

    /// Puts every element still present back where `snapshot` saw it.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        for (&id, &rect) in &snapshot.rects {
            let current = self.store.get(id).map(|o| o.bounds());
            if current.is_some_and(|b| b != rect) {
                if let Some(shape) = self
                    .store
                    .get_mut(id)
                    .and_then(|o| o.element.as_resizable_mut())
                {
                    if let Err(e) = shape.resize(rect) {
                        tracing::warn!("Could not restore {}: {}", id, e);
                    }
                }
                self.reindex(id);
            }
        }

        let reactions: Vec<ElementId> = self
            .store
            .iter()
            .filter(|o| o.kind() == ElementKind::Reaction)
            .map(|o| o.id)
            .collect();
        // Limits first, so saved handle positions are clamped against the
        // restored endpoints rather than the ones seen mid-drag.
        for &rid in &reactions {
            if let Err(e) = self.refresh_reaction(rid) {
                tracing::warn!("Could not restore reaction {}: {}", rid, e);
            }
        }
        for (&hid, &position) in &snapshot.handles {
            if let Some(handle) = self.handle_mut(hid) {
                handle.set_position(position);
            }
        }
        for &rid in &reactions {
            if let Err(e) = self.refresh_reaction(rid) {
                tracing::warn!("Could not restore reaction {}: {}", rid, e);
            }
        }
        self.touch();
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Ids whose bounding box contains `point`, topmost first.
    pub fn query_point(&self, point: &Point) -> Vec<ElementId> {
        let mut hits: Vec<&SceneObject> = self
            .index
            .query_point(point)
            .into_iter()
            .filter_map(|id| self.store.get(id))
            .collect();
        hits.sort_by_key(|o| Reverse(o.paint_key()));
        hits.into_iter().map(|o| o.id).collect()
    }

    /// Ids whose bounding box overlaps `rect`, in paint order.
    pub fn query_rect(&self, rect: &Bounds) -> Vec<ElementId> {
        let mut hits: Vec<&SceneObject> = self
            .index
            .query(rect)
            .into_iter()
            .filter_map(|id| self.store.get(id))
            .collect();
        hits.sort_by_key(|o| o.paint_key());
        hits.into_iter().map(|o| o.id).collect()
    }

    /// Topmost element whose exact geometry is under `point`.
    ///
    /// Handles are considered only while their reaction is selected.
    pub fn hit_test(&self, point: &Point, tolerance: &HitTolerance) -> Option<ElementId> {
        let reach = tolerance.curve.max(tolerance.handle).max(0.0);
        let mut candidates: Vec<&SceneObject> = self
            .index
            .query(&Bounds::around(*point, reach))
            .into_iter()
            .filter_map(|id| self.store.get(id))
            .collect();
        candidates.sort_by_key(|o| Reverse(o.paint_key()));
        candidates
            .into_iter()
            .find(|obj| match &obj.element {
                SceneElement::Handle(h) => {
                    self.is_selected(h.edge) && h.hit_test(point, tolerance.handle)
                }
                SceneElement::Reaction(r) => r.hit_test(point, tolerance.curve),
                other => other.hit_test(point, 0.0),
            })
            .map(|obj| obj.id)
    }

    /// Union of every element's bounds, or `None` for an empty scene.
    pub fn aggregate_bounds(&self) -> Option<Bounds> {
        let all: Vec<Bounds> = self.store.iter().map(|o| o.bounds()).collect();
        Bounds::enclosing(all.iter())
    }

    // ---------------------------------------------------------------------
    // Selection and hover
    // ---------------------------------------------------------------------

    pub fn select_only(&mut self, id: ElementId) -> bool {
        self.selection.select_only(&mut self.store, id)
    }

    pub fn select_ids(&mut self, ids: &[ElementId]) -> bool {
        self.selection.select_ids(&mut self.store, ids)
    }

    pub fn toggle(&mut self, id: ElementId) -> bool {
        self.selection.toggle(&mut self.store, id)
    }

    pub fn extend(&mut self, ids: &[ElementId]) -> bool {
        self.selection.extend(&mut self.store, ids)
    }

    pub fn select_in_rect(&mut self, rect: &Bounds, additive: bool) -> bool {
        self.selection
            .select_in_rect(&mut self.store, &self.index, rect, additive)
    }

    pub fn select_all(&mut self) -> bool {
        self.selection.select_all(&mut self.store)
    }

    pub fn deselect_all(&mut self) -> bool {
        self.selection.deselect_all(&mut self.store)
    }

    pub fn selected_ids(&self) -> Vec<ElementId> {
        self.selection.selected_ids(&self.store)
    }

    pub fn selected_elements(&self) -> Vec<SelectedElement> {
        self.selection.selected_elements(&self.store)
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selection.is_selected(&self.store, id)
    }

    pub fn primary_selection(&self) -> Option<ElementId> {
        self.selection.primary()
    }

    /// Ids a marquee over `rect` would select, without selecting them.
    pub fn marquee_candidates(&self, rect: &Bounds) -> Vec<ElementId> {
        self.selection
            .elements_in_rect(&self.store, &self.index, rect)
    }

    pub fn hovered(&self) -> Option<ElementId> {
        self.hovered
    }

    /// Moves the hover flag. Returns true if it changed.
    pub fn set_hovered(&mut self, id: Option<ElementId>) -> bool {
        let id = id.filter(|i| self.store.contains(*i));
        if self.hovered == id {
            return false;
        }
        if let Some(old) = self.hovered.and_then(|h| self.store.get_mut(h)) {
            old.hovered = false;
        }
        if let Some(new) = id.and_then(|h| self.store.get_mut(h)) {
            new.hovered = true;
        }
        self.hovered = id;
        true
    }

    // ---------------------------------------------------------------------
    // Clipboard
    // ---------------------------------------------------------------------

    /// Copies the selected nodes and compartments.
    pub fn copy_selected(&self) -> Clipboard {
        let mut entries = Vec::new();
        let mut slots: HashMap<ElementId, usize> = HashMap::new();
        for obj in self.store.iter().filter(|o| o.selected) {
            if let SceneElement::Compartment(c) = &obj.element {
                slots.insert(obj.id, entries.len());
                entries.push(ClipboardEntry::Compartment {
                    label: c.label.clone(),
                    bounds: c.rect,
                });
            }
        }
        for obj in self.store.iter().filter(|o| o.selected) {
            if let SceneElement::Node(n) = &obj.element {
                entries.push(ClipboardEntry::Node {
                    label: n.label.clone(),
                    bounds: n.rect,
                    parent: n.compartment.and_then(|c| slots.get(&c).copied()),
                });
            }
        }
        Clipboard { entries }
    }

    /// Inserts offset copies of the clipboard contents and selects them.
    ///
    /// All-or-nothing: a failing entry leaves the scene untouched.
    pub fn paste(&mut self, clipboard: &Clipboard) -> SceneResult<Vec<ElementId>> {
        self.ensure_unlocked("paste")?;
        if clipboard.is_empty() {
            return Ok(Vec::new());
        }
        let offset = Point::new(self.config.scene.paste_offset, self.config.scene.paste_offset);
        let mut work = self.clone();
        let mut created = Vec::with_capacity(clipboard.len());
        for entry in &clipboard.entries {
            let id = match entry {
                ClipboardEntry::Compartment { label, bounds } => {
                    work.add_compartment(label.clone(), bounds.translated(offset))?
                }
                ClipboardEntry::Node {
                    label,
                    bounds,
                    parent,
                } => {
                    let id = work.add_node(label.clone(), bounds.translated(offset))?;
                    if let Some(&cid) = parent.and_then(|slot| created.get(slot)) {
                        work.set_compartment(id, Some(cid))?;
                    }
                    id
                }
            };
            created.push(id);
        }
        work.select_ids(&created);
        *self = work;
        tracing::debug!("Pasted {} element(s)", created.len());
        Ok(created)
    }

    // ---------------------------------------------------------------------
    // Id-preserving upserts used by model import
    // ---------------------------------------------------------------------

    pub(crate) fn reserve_ids_through(&mut self, id: ElementId) -> SceneResult<()> {
        self.store.reserve_ids_through(id)
    }

    /// Inserts or updates a node under a fixed id. Returns true if created.
    pub(crate) fn upsert_node(
        &mut self,
        id: ElementId,
        label: &str,
        bounds: Bounds,
    ) -> SceneResult<bool> {
        match self.store.get(id).map(|o| o.kind()) {
            None => {
                if bounds.is_degenerate() || !bounds.is_finite() {
                    return Err(CanvasError::degenerate(format!(
                        "node {} bounds {} have no area",
                        id, bounds
                    )));
                }
                self.store
                    .insert_with_id(id, SceneElement::Node(NodeElement::new(label, bounds)))?;
                self.reindex(id);
                self.touch();
                Ok(true)
            }
            Some(ElementKind::Node) => {
                self.apply_geometry(&[(id, bounds)], &[])?;
                if let Some(n) = self.node_mut(id) {
                    n.label = label.to_string();
                }
                Ok(false)
            }
            Some(found) => Err(Self::mismatch(id, ElementKind::Node, found)),
        }
    }

    pub(crate) fn upsert_compartment(
        &mut self,
        id: ElementId,
        label: &str,
        bounds: Bounds,
    ) -> SceneResult<bool> {
        match self.store.get(id).map(|o| o.kind()) {
            None => {
                if bounds.is_degenerate() || !bounds.is_finite() {
                    return Err(CanvasError::degenerate(format!(
                        "compartment {} bounds {} have no area",
                        id, bounds
                    )));
                }
                self.store.insert_with_id(
                    id,
                    SceneElement::Compartment(CompartmentBox::new(label, bounds)),
                )?;
                self.reindex(id);
                self.touch();
                Ok(true)
            }
            Some(ElementKind::Compartment) => {
                self.apply_geometry(&[], &[(id, bounds)])?;
                if let Some(c) = self.compartment_mut(id) {
                    c.label = label.to_string();
                }
                Ok(false)
            }
            Some(found) => Err(Self::mismatch(id, ElementKind::Compartment, found)),
        }
    }

    /// Inserts or replaces a reaction under a fixed id. Returns true if created.
    pub(crate) fn upsert_reaction(
        &mut self,
        id: ElementId,
        edge: ReactionEdge,
        handle_positions: &HashMap<HandleRole, Point>,
    ) -> SceneResult<bool> {
        let created = match self.store.get(id).map(|o| o.kind()) {
            None => true,
            Some(ElementKind::Reaction) => {
                let mut dropped = Vec::new();
                self.remove_reaction(id, &mut dropped);
                false
            }
            Some(found) => return Err(Self::mismatch(id, ElementKind::Reaction, found)),
        };
        self.insert_reaction(Some(id), edge, handle_positions)?;
        Ok(created)
    }
}

/// Grows `rect` from its top-left corner to at least `min_w` x `min_h`.
fn grow_to(rect: Bounds, min_w: f64, min_h: f64) -> Bounds {
    Bounds::from_origin_size(
        rect.min_x,
        rect.min_y,
        rect.width().max(min_w),
        rect.height().max(min_h),
    )
}

/// Clips `rect` to `outer`, rejecting results below the minimum size.
fn clip(rect: Bounds, outer: &Bounds, min_w: f64, min_h: f64) -> SceneResult<Bounds> {
    match rect.intersection(outer) {
        Some(clipped)
            if clipped.width() + f64::EPSILON >= min_w.min(rect.width())
                && clipped.height() + f64::EPSILON >= min_h.min(rect.height())
                && !clipped.is_degenerate() =>
        {
            Ok(clipped)
        }
        _ => Err(CanvasError::degenerate(format!(
            "{} does not fit inside {}",
            rect, outer
        ))),
    }
}
