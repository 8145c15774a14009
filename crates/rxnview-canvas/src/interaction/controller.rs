//! Interaction state machine.
//!
//! Turns raw pointer, wheel and keyboard input into selection, drag,
//! resize and pan operations on the owned scene and viewport. Every active
//! interaction can be rolled back; errors from the scene are recovered here
//! and never reach the caller of a handler.

use std::collections::HashSet;
use std::sync::Arc;

use rxnview_core::{
    Bounds, CanvasConfig, CanvasError, CanvasEvent, ElementId, ElementKind, EventBus,
    EventBusError, Point,
};

use super::cursor::{CursorHint, ResizeHandle};
use super::input::{Key, KeyEvent, PointerButton, PointerEvent};
use super::state::{InteractionState, PanSource};
use crate::element::Draggable;
use crate::import::{ImportBatch, ImportMode, ImportSummary};
use crate::minimap::Minimap;
use crate::render::{self, PaintSurface, RenderList};
use crate::scene::{Clipboard, HitTolerance, SceneGraph, Snapshot};
use crate::viewport::CoordinateSpace;

/// Owns the scene, the main viewport and the minimap, and drives them from
/// input events.
///
/// Every handler returns whether the canvas needs a repaint.
pub struct InteractionController {
    scene: SceneGraph,
    space: CoordinateSpace,
    minimap: Minimap,
    config: CanvasConfig,
    state: InteractionState,
    clipboard: Clipboard,
    hover_resize: Option<ResizeHandle>,
    hover_minimap: bool,
    event_bus: Option<Arc<EventBus>>,
}

impl InteractionController {
    /// Creates a controller with an empty scene for a viewport of
    /// `width` x `height` device pixels.
    ///
    /// Fails when `config` does not pass `CanvasConfig::validate`.
    pub fn new(config: CanvasConfig, width: f64, height: f64) -> rxnview_core::Result<Self> {
        let scene = SceneGraph::with_config(config)?;
        Ok(Self::with_scene(scene, width, height)?)
    }

    /// Wraps an existing scene, taking the configuration from it.
    pub fn with_scene(
        scene: SceneGraph,
        width: f64,
        height: f64,
    ) -> Result<Self, CanvasError> {
        let config = scene.config().clone();
        Ok(Self {
            space: CoordinateSpace::from_config(&config.viewport, width, height)?,
            minimap: Minimap::new(config.minimap.clone(), width, height),
            scene,
            config,
            state: InteractionState::Idle,
            clipboard: Clipboard::default(),
            hover_resize: None,
            hover_minimap: false,
            event_bus: None,
        })
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn set_event_bus(&mut self, bus: Option<Arc<EventBus>>) {
        self.event_bus = bus;
    }

    pub fn event_bus(&self) -> Option<&Arc<EventBus>> {
        self.event_bus.as_ref()
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Direct scene access. Structural edits are refused while an
    /// interaction holds the structure lock.
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn space(&self) -> &CoordinateSpace {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut CoordinateSpace {
        &mut self.space
    }

    pub fn minimap(&self) -> &Minimap {
        &self.minimap
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Pick distances converted to logical units at the current zoom.
    pub fn tolerances(&self) -> HitTolerance {
        HitTolerance {
            curve: self.space.length_to_logical(self.config.reactions.curve_slack),
            handle: self.space.length_to_logical(self.config.handles.pick_radius()),
        }
    }

    // ---------------------------------------------------------------------
    // Pointer input
    // ---------------------------------------------------------------------

    /// Starts an interaction at the pressed point.
    pub fn pointer_down(&mut self, event: PointerEvent) -> bool {
        if !self.state.is_idle() {
            tracing::debug!("Ignoring pointer down during {}", self.state);
            return false;
        }
        let device = event.position;
        if !device.is_finite() {
            return false;
        }

        if self.minimap.contains(device) {
            self.sync_minimap();
            let previous = self.space.clone();
            let grab = self.minimap.begin_drag(device, &mut self.space);
            self.enter(InteractionState::Panning {
                source: PanSource::Minimap { grab },
                last: device,
                previous,
            });
            return true;
        }

        match event.button {
            PointerButton::Middle => {
                self.start_canvas_pan(device);
                return true;
            }
            PointerButton::Secondary => return false,
            PointerButton::Primary => {}
        }

        let logical = self.space.to_logical(device);
        let hit = self.scene.hit_test(&logical, &self.tolerances());

        if event.modifiers.alt && hit.is_none() {
            self.start_canvas_pan(device);
            return true;
        }

        if let Some((id, handle, rect)) = self.resize_square_at(device) {
            self.scene.lock_structure();
            self.enter(InteractionState::ResizingElement {
                id,
                handle,
                start_rect: rect,
                start_pointer: logical,
                current: rect,
                snapshot: self.scene.snapshot(),
            });
            return true;
        }

        let toggles = event.modifiers.toggles_selection();
        let Some(id) = hit else {
            let previous = self.scene.selected_ids();
            if !toggles {
                self.scene.deselect_all();
            }
            self.enter(InteractionState::Selecting {
                origin: logical,
                current: logical,
                additive: toggles,
                previous,
            });
            return true;
        };

        let Some(kind) = self.scene.get(id).map(|o| o.kind()) else {
            return false;
        };
        match kind {
            ElementKind::Handle => {
                let Ok(h) = self.scene.handle(id) else {
                    return false;
                };
                let (edge, position) = (h.edge, h.position());
                self.scene.lock_structure();
                self.enter(InteractionState::DraggingHandle {
                    handle: id,
                    edge,
                    grab_offset: position - logical,
                    snapshot: self.scene.snapshot(),
                    moved: false,
                });
                true
            }
            ElementKind::Reaction => {
                let changed = if toggles {
                    self.scene.toggle(id)
                } else {
                    self.scene.select_only(id)
                };
                if changed {
                    self.publish_selection();
                }
                changed
            }
            ElementKind::Node | ElementKind::Compartment => {
                let changed = if toggles {
                    self.scene.toggle(id)
                } else if !self.scene.is_selected(id) {
                    self.scene.select_only(id)
                } else {
                    false
                };
                if changed {
                    self.publish_selection();
                }
                if !self.scene.is_selected(id) {
                    // Toggled off: nothing to drag.
                    return changed;
                }
                self.start_element_drag(logical);
                true
            }
        }
    }

    /// Advances the active interaction, or updates hover when idle.
    pub fn pointer_move(&mut self, event: PointerEvent) -> bool {
        let device = event.position;
        if !device.is_finite() {
            return false;
        }
        let logical = self.space.to_logical(device);

        match std::mem::take(&mut self.state) {
            InteractionState::Idle => self.update_hover(device),
            InteractionState::Selecting {
                origin,
                additive,
                previous,
                ..
            } => {
                let rect = Bounds::from_points(origin, logical);
                let mut ids = if additive { previous.clone() } else { Vec::new() };
                for id in self.scene.marquee_candidates(&rect) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                self.scene.select_ids(&ids);
                self.state = InteractionState::Selecting {
                    origin,
                    current: logical,
                    additive,
                    previous,
                };
                true
            }
            InteractionState::DraggingElements {
                start_pointer,
                targets,
                snapshot,
                moved,
            } => {
                if let Some((gone, _)) = targets.iter().find(|(id, _)| !self.scene.contains(*id)) {
                    self.abort(&snapshot, *gone);
                    return true;
                }
                let delta = logical - start_pointer;
                let moves: Vec<(ElementId, Point)> =
                    targets.iter().map(|(id, start)| (*id, *start + delta)).collect();
                let step = self.scene.move_elements(&moves);
                let moved = match step {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::debug!("Drag step rejected: {}", e);
                        moved
                    }
                };
                self.state = InteractionState::DraggingElements {
                    start_pointer,
                    targets,
                    snapshot,
                    moved,
                };
                true
            }
            InteractionState::DraggingHandle {
                handle,
                edge,
                grab_offset,
                snapshot,
                moved,
            } => {
                if !self.scene.contains(handle) || !self.scene.contains(edge) {
                    self.abort(&snapshot, handle);
                    return true;
                }
                let moved = match self.scene.move_handle(handle, logical + grab_offset) {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::debug!("Handle step rejected: {}", e);
                        moved
                    }
                };
                self.state = InteractionState::DraggingHandle {
                    handle,
                    edge,
                    grab_offset,
                    snapshot,
                    moved,
                };
                true
            }
            InteractionState::ResizingElement {
                id,
                handle,
                start_rect,
                start_pointer,
                current,
                snapshot,
            } => {
                let Some(kind) = self.scene.get(id).map(|o| o.kind()) else {
                    self.abort(&snapshot, id);
                    return true;
                };
                let (min_w, min_h) = self.minimum_size(kind);
                let proposed = handle.apply(&start_rect, logical - start_pointer, min_w, min_h);
                let current = match self.scene.resize(id, proposed) {
                    Ok(applied) => applied,
                    Err(e) => {
                        tracing::debug!("Resize step rejected: {}", e);
                        current
                    }
                };
                self.state = InteractionState::ResizingElement {
                    id,
                    handle,
                    start_rect,
                    start_pointer,
                    current,
                    snapshot,
                };
                true
            }
            InteractionState::Panning {
                source,
                last,
                previous,
            } => {
                match source {
                    PanSource::Canvas => self.space.pan(device - last),
                    PanSource::Minimap { grab } => {
                        self.minimap.drag_to(device, grab, &mut self.space);
                    }
                }
                self.state = InteractionState::Panning {
                    source,
                    last: device,
                    previous,
                };
                true
            }
        }
    }

    /// Applies the release position, then commits the interaction.
    pub fn pointer_up(&mut self, event: PointerEvent) -> bool {
        let redraw = self.pointer_move(event);
        let state = std::mem::take(&mut self.state);
        if state.is_idle() {
            return redraw;
        }
        tracing::debug!("{} -> Idle (commit)", state);

        match state {
            InteractionState::Idle => {}
            InteractionState::Selecting { previous, .. } => {
                if !same_ids(&previous, &self.scene.selected_ids()) {
                    self.publish_selection();
                }
            }
            InteractionState::DraggingElements {
                targets,
                moved,
                snapshot,
                ..
            } => {
                self.scene.unlock_structure();
                if moved {
                    let ids: Vec<ElementId> = targets.into_iter().map(|(id, _)| id).collect();
                    self.settle_dropped(ids, &snapshot);
                }
            }
            InteractionState::DraggingHandle {
                handle,
                edge,
                moved,
                ..
            } => {
                self.scene.unlock_structure();
                if moved {
                    if let Ok(h) = self.scene.handle(handle) {
                        let position = h.position();
                        self.publish(CanvasEvent::HandleMoved {
                            edge,
                            handle,
                            position,
                        });
                    }
                }
            }
            InteractionState::ResizingElement {
                id,
                start_rect,
                current,
                ..
            } => {
                self.scene.unlock_structure();
                if current != start_rect {
                    self.publish(CanvasEvent::ElementResized {
                        id,
                        bounds: current,
                    });
                }
            }
            InteractionState::Panning { source, .. } => {
                if let PanSource::Minimap { .. } = source {
                    self.minimap.end_drag();
                }
                self.publish_viewport();
            }
        }
        true
    }

    /// Zooms by `zoom_step ^ notches` keeping `anchor` fixed. Positive
    /// notches zoom in.
    pub fn wheel(&mut self, notches: f64, anchor: Point) -> bool {
        if notches == 0.0 || !notches.is_finite() {
            return false;
        }
        let factor = self.space.zoom_step().powf(notches);
        let changed = self.space.zoom(factor, anchor);
        if changed {
            self.publish_viewport();
        }
        changed
    }

    pub fn key_down(&mut self, event: KeyEvent) -> bool {
        match event.key {
            Key::Escape => self.cancel(),
            Key::Delete | Key::Backspace => self.delete_selection(),
            Key::SelectAll => {
                if !self.state.is_idle() {
                    return false;
                }
                let changed = self.scene.select_all();
                if changed {
                    self.publish_selection();
                }
                changed
            }
            Key::Copy => {
                self.clipboard = self.scene.copy_selected();
                tracing::debug!("Copied {} element(s)", self.clipboard.len());
                false
            }
            Key::Cut => self.cut(),
            Key::Paste => self.paste(),
            Key::ZoomIn => self.zoom_at_center(self.space.zoom_step()),
            Key::ZoomOut => self.zoom_at_center(1.0 / self.space.zoom_step()),
            Key::ResetZoom => {
                let changed = self.space.set_scale(1.0, self.space.device_center());
                if changed {
                    self.publish_viewport();
                }
                changed
            }
        }
    }

    /// Rolls back the active interaction. Idle stays untouched.
    pub fn cancel(&mut self) -> bool {
        let state = std::mem::take(&mut self.state);
        let name = state.name();
        match state {
            InteractionState::Idle => return false,
            InteractionState::Selecting { previous, .. } => {
                // The marquee may have changed the live selection, and ids
                // removed meanwhile cannot be restored.
                let live = self.scene.selected_ids();
                self.scene.select_ids(&previous);
                let restored = self.scene.selected_ids();
                if !same_ids(&live, &restored) || !same_ids(&previous, &restored) {
                    self.publish_selection();
                }
            }
            InteractionState::DraggingElements { snapshot, .. }
            | InteractionState::DraggingHandle { snapshot, .. }
            | InteractionState::ResizingElement { snapshot, .. } => {
                self.scene.restore(&snapshot);
                self.scene.unlock_structure();
            }
            InteractionState::Panning {
                source, previous, ..
            } => {
                self.space = previous;
                if let PanSource::Minimap { .. } = source {
                    self.minimap.end_drag();
                }
            }
        }
        tracing::debug!("{} -> Idle (cancel)", name);
        self.publish(CanvasEvent::InteractionCancelled {
            state: name.to_string(),
        });
        true
    }

    pub fn focus_lost(&mut self) -> bool {
        self.cancel()
    }

    pub fn resize_viewport(&mut self, width: f64, height: f64) -> bool {
        self.space.set_viewport_size(width, height);
        self.minimap.set_viewport_size(width, height);
        true
    }

    /// Cancels any active interaction, then applies an external batch.
    pub fn apply_import(
        &mut self,
        batch: &ImportBatch,
        mode: ImportMode,
    ) -> Result<ImportSummary, CanvasError> {
        self.cancel();
        let summary = self.scene.apply_import(batch, mode)?;
        self.publish(CanvasEvent::SceneImported {
            mode: summary.mode.to_string(),
            nodes: summary.nodes,
            compartments: summary.compartments,
            reactions: summary.reactions,
        });
        Ok(summary)
    }

    // ---------------------------------------------------------------------
    // Output
    // ---------------------------------------------------------------------

    pub fn cursor_hint(&self) -> CursorHint {
        match &self.state {
            InteractionState::Panning { .. } => CursorHint::Grabbing,
            InteractionState::Selecting { .. } => CursorHint::Crosshair,
            InteractionState::DraggingElements { .. } | InteractionState::DraggingHandle { .. } => {
                CursorHint::Move
            }
            InteractionState::ResizingElement { handle, .. } => handle.cursor(),
            InteractionState::Idle => {
                if self.hover_minimap {
                    return CursorHint::Grab;
                }
                if let Some(handle) = self.hover_resize {
                    return handle.cursor();
                }
                match self.scene.hovered().and_then(|id| self.scene.get(id)) {
                    Some(obj) => match obj.kind() {
                        ElementKind::Node | ElementKind::Compartment => CursorHint::Move,
                        ElementKind::Handle | ElementKind::Reaction => CursorHint::Pointer,
                    },
                    None => CursorHint::Default,
                }
            }
        }
    }

    /// Builds the frame for the paint surface.
    pub fn render(&mut self) -> RenderList {
        self.sync_minimap();
        let resize_handles = self
            .selected_resizable()
            .map(|(_, rect)| {
                ResizeHandle::squares(
                    &self.space.bounds_to_device(&rect),
                    self.config.resize.corner_size,
                )
            })
            .unwrap_or_default();
        RenderList {
            items: render::collect_items(&self.scene, &self.space),
            marquee: self
                .state
                .marquee()
                .map(|m| self.space.bounds_to_device(&m)),
            resize_handles,
            minimap: self.minimap.is_enabled().then(|| self.minimap.render()),
            cursor: self.cursor_hint(),
        }
    }

    pub fn paint(&mut self, surface: &mut impl PaintSurface) {
        let frame = self.render();
        surface.set_cursor(frame.cursor);
        surface.paint(&frame);
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn enter(&mut self, state: InteractionState) {
        tracing::debug!("{} -> {}", self.state, state);
        self.state = state;
    }

    /// Commits a drop: dragged nodes join the compartment they landed in.
    ///
    /// Nodes carried by a dragged compartment keep their membership. If the
    /// reassignment fails the whole drag is rolled back.
    fn settle_dropped(&mut self, ids: Vec<ElementId>, snapshot: &Snapshot) {
        let moving: HashSet<ElementId> = ids.iter().copied().collect();
        let nodes: Vec<ElementId> = ids
            .iter()
            .copied()
            .filter(|&id| {
                self.scene
                    .node(id)
                    .is_ok_and(|n| n.compartment.is_none_or(|c| !moving.contains(&c)))
            })
            .collect();

        match self.scene.assign_dropped_nodes(&nodes) {
            Ok((changed, compartment)) => {
                self.publish(CanvasEvent::ElementsMoved { ids });
                if !changed.is_empty() {
                    self.publish(CanvasEvent::CompartmentChanged {
                        nodes: changed,
                        compartment,
                    });
                }
            }
            Err(e) => {
                tracing::warn!("Rolling back drop: {}", e);
                self.scene.restore(snapshot);
                self.publish(CanvasEvent::InteractionCancelled {
                    state: "DraggingElements".to_string(),
                });
            }
        }
    }

    fn start_canvas_pan(&mut self, device: Point) {
        let previous = self.space.clone();
        self.enter(InteractionState::Panning {
            source: PanSource::Canvas,
            last: device,
            previous,
        });
    }

    fn start_element_drag(&mut self, logical: Point) {
        let targets: Vec<(ElementId, Point)> = self
            .scene
            .selected_ids()
            .into_iter()
            .filter_map(|id| {
                let obj = self.scene.get(id)?;
                match obj.kind() {
                    ElementKind::Node | ElementKind::Compartment => {
                        Some((id, obj.bounds().origin()))
                    }
                    _ => None,
                }
            })
            .collect();
        self.scene.lock_structure();
        self.enter(InteractionState::DraggingElements {
            start_pointer: logical,
            targets,
            snapshot: self.scene.snapshot(),
            moved: false,
        });
    }

    /// Gives up on a drag whose target vanished.
    fn abort(&mut self, snapshot: &Snapshot, missing: ElementId) {
        tracing::warn!("Element {} vanished during interaction, aborting", missing);
        self.scene.restore(snapshot);
        self.scene.unlock_structure();
        self.state = InteractionState::Idle;
    }

    fn minimum_size(&self, kind: ElementKind) -> (f64, f64) {
        let resize = &self.config.resize;
        match kind {
            ElementKind::Compartment => {
                (resize.min_compartment_width, resize.min_compartment_height)
            }
            _ => (resize.min_node_width, resize.min_node_height),
        }
    }

    /// The single selected node or compartment, with its rectangle.
    fn selected_resizable(&self) -> Option<(ElementId, Bounds)> {
        match self.scene.selected_ids().as_slice() {
            [id] => self
                .scene
                .get(*id)
                .filter(|o| o.kind().is_resizable())
                .map(|o| (*id, o.bounds())),
            _ => None,
        }
    }

    fn resize_square_at(&self, device: Point) -> Option<(ElementId, ResizeHandle, Bounds)> {
        let (id, rect) = self.selected_resizable()?;
        ResizeHandle::squares(
            &self.space.bounds_to_device(&rect),
            self.config.resize.corner_size,
        )
        .into_iter()
        .find(|(_, square)| square.contains_point(&device))
        .map(|(handle, _)| (id, handle, rect))
    }

    fn update_hover(&mut self, device: Point) -> bool {
        let on_minimap = self.minimap.contains(device);
        let resize = if on_minimap {
            None
        } else {
            self.resize_square_at(device).map(|(_, h, _)| h)
        };
        let target = if on_minimap || resize.is_some() {
            None
        } else {
            let logical = self.space.to_logical(device);
            self.scene.hit_test(&logical, &self.tolerances())
        };

        let mut changed = self.scene.set_hovered(target);
        if resize != self.hover_resize || on_minimap != self.hover_minimap {
            self.hover_resize = resize;
            self.hover_minimap = on_minimap;
            changed = true;
        }
        changed
    }

    fn delete_selection(&mut self) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        match self.scene.remove_selected() {
            Ok(removed) if !removed.is_empty() => {
                self.publish(CanvasEvent::ElementsRemoved { ids: removed });
                self.publish_selection();
                true
            }
            Ok(_) => false,
            Err(e) => {
                tracing::debug!("Delete rejected: {}", e);
                false
            }
        }
    }

    /// The clipboard is only replaced when the delete goes through.
    fn cut(&mut self) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        let copied = self.scene.copy_selected();
        if copied.is_empty() || !self.delete_selection() {
            return false;
        }
        tracing::debug!("Cut {} element(s)", copied.len());
        self.clipboard = copied;
        true
    }

    fn paste(&mut self) -> bool {
        if !self.state.is_idle() || self.clipboard.is_empty() {
            return false;
        }
        match self.scene.paste(&self.clipboard) {
            Ok(created) => {
                self.publish_selection();
                !created.is_empty()
            }
            Err(e) => {
                tracing::debug!("Paste rejected: {}", e);
                false
            }
        }
    }

    fn zoom_at_center(&mut self, factor: f64) -> bool {
        let changed = self.space.zoom(factor, self.space.device_center());
        if changed {
            self.publish_viewport();
        }
        changed
    }

    fn sync_minimap(&mut self) -> bool {
        self.minimap.is_enabled() && self.minimap.sync(&self.scene, &self.space)
    }

    fn publish_selection(&self) {
        self.publish(CanvasEvent::SelectionChanged {
            selected: self.scene.selected_elements(),
        });
    }

    fn publish_viewport(&self) {
        self.publish(CanvasEvent::ViewportChanged {
            origin: self.space.origin(),
            scale: self.space.scale(),
        });
    }

    fn publish(&self, event: CanvasEvent) {
        let Some(bus) = &self.event_bus else {
            return;
        };
        match bus.publish(event) {
            Ok(_) => {}
            Err(EventBusError::NoSubscribers) => {
                tracing::trace!("No subscribers for canvas event");
            }
        }
    }
}

/// Order-insensitive comparison of two id lists.
fn same_ids(a: &[ElementId], b: &[ElementId]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}
